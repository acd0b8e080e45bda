//! # Reconciliation Pipeline
//!
//! Recomputes an order wholesale from the current aggregate state.
//!
//! ## Pipeline Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Reconciliation Pipeline                             │
//! │                                                                         │
//! │   Basket ──► Processor ──► [ delivery                                  │
//! │                              discount                                   │
//! │                              products                                   │
//! │                              subtotal                                   │
//! │                              taxable                                    │
//! │                              tax                                        │
//! │                              total      ◄── reads subtotal/tax/delivery│
//! │                              value ]                                    │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │                  RawOrder (Money-typed totals + line clones)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator order is FIXED and load-bearing: `total` reads the
//! delivery, subtotal and tax fields the earlier calculators wrote into the
//! draft. Reordering the pipeline is a semantic change, not a refactor.
//!
//! There is no partial update: every run starts from a zeroed draft and
//! ends with a complete [`RawOrder`].

use crate::basket::Basket;
use crate::money::Money;
use crate::order::RawOrder;
use crate::types::Product;

// =============================================================================
// Reconciler
// =============================================================================

/// Per-line computations shared by the calculators.
///
/// ## Line Math
/// ```text
/// value    = unit price × quantity
/// discount = attached discount on the line value (0 if none)
/// delivery = flat per-line charge
/// subtotal = value − discount
/// tax      = rate × subtotal   (taxable, non-freebie lines only)
/// total    = subtotal + tax + delivery
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler;

impl Reconciler {
    /// Gross line value: unit price × quantity.
    pub fn value(&self, product: &Product) -> Money {
        product.line_value()
    }

    /// Discount amount on the line, zero when none is attached.
    pub fn discount(&self, product: &Product) -> Money {
        product
            .discount
            .as_ref()
            .map(|d| d.amount_for(product))
            .unwrap_or_default()
    }

    /// Flat per-line delivery charge.
    pub fn delivery(&self, product: &Product) -> Money {
        product.delivery
    }

    /// Line value after discount.
    pub fn subtotal(&self, product: &Product) -> Money {
        self.value(product) - self.discount(product)
    }

    /// Tax on the discounted line value.
    ///
    /// Freebies and non-taxable lines produce no tax regardless of rate.
    pub fn tax(&self, product: &Product) -> Money {
        if !product.taxable || product.freebie {
            return Money::zero();
        }

        self.subtotal(product).calculate_tax(product.rate)
    }

    /// Everything the line costs: subtotal + tax + delivery.
    pub fn total(&self, product: &Product) -> Money {
        self.subtotal(product) + self.tax(product) + self.delivery(product)
    }
}

// =============================================================================
// Order Draft
// =============================================================================

/// Mutable target the calculators write into, zeroed at the start of every
/// reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    pub delivery: Money,
    pub discount: Money,
    pub products_count: i64,
    pub subtotal: Money,
    pub taxable: i64,
    pub tax: Money,
    pub total: Money,
    pub value: Money,
    pub products: Vec<Product>,
}

impl OrderDraft {
    /// Freezes the draft into a raw order.
    fn into_raw(self) -> RawOrder {
        RawOrder {
            delivery: self.delivery,
            discount: self.discount,
            products_count: self.products_count,
            subtotal: self.subtotal,
            taxable: self.taxable,
            tax: self.tax,
            total: self.total,
            value: self.value,
            products: self.products,
        }
    }
}

// =============================================================================
// Meta Calculators
// =============================================================================

/// One step of the reconciliation pipeline.
///
/// A calculator owns exactly one draft field. Later calculators may read
/// fields earlier ones wrote; the [`Processor`] guarantees the order.
pub trait MetaCalculator {
    /// Field name, used in logs and pipeline introspection.
    fn name(&self) -> &'static str;

    /// Computes this calculator's field into the draft.
    fn apply(&self, reconciler: &Reconciler, basket: &Basket, draft: &mut OrderDraft);
}

/// Sums per-line delivery charges plus the basket-level fee.
pub struct DeliveryMeta;

impl MetaCalculator for DeliveryMeta {
    fn name(&self) -> &'static str {
        "delivery"
    }

    fn apply(&self, reconciler: &Reconciler, basket: &Basket, draft: &mut OrderDraft) {
        let lines: Money = basket
            .products()
            .iter()
            .fold(Money::zero(), |acc, p| acc + reconciler.delivery(p));

        draft.delivery = lines + basket.delivery_fee();
    }
}

/// Sums per-line discount amounts.
pub struct DiscountMeta;

impl MetaCalculator for DiscountMeta {
    fn name(&self) -> &'static str {
        "discount"
    }

    fn apply(&self, reconciler: &Reconciler, basket: &Basket, draft: &mut OrderDraft) {
        draft.discount = basket
            .products()
            .iter()
            .fold(Money::zero(), |acc, p| acc + reconciler.discount(p));
    }
}

/// Captures the line clones and the unit count.
pub struct ProductsMeta;

impl MetaCalculator for ProductsMeta {
    fn name(&self) -> &'static str {
        "products"
    }

    fn apply(&self, _reconciler: &Reconciler, basket: &Basket, draft: &mut OrderDraft) {
        draft.products_count = basket.total_quantity();
        draft.products = basket.products().to_vec();
    }
}

/// Sums discounted line values.
pub struct SubtotalMeta;

impl MetaCalculator for SubtotalMeta {
    fn name(&self) -> &'static str {
        "subtotal"
    }

    fn apply(&self, reconciler: &Reconciler, basket: &Basket, draft: &mut OrderDraft) {
        draft.subtotal = basket
            .products()
            .iter()
            .fold(Money::zero(), |acc, p| acc + reconciler.subtotal(p));
    }
}

/// Counts lines that actually produce tax.
pub struct TaxableMeta;

impl MetaCalculator for TaxableMeta {
    fn name(&self) -> &'static str {
        "taxable"
    }

    fn apply(&self, _reconciler: &Reconciler, basket: &Basket, draft: &mut OrderDraft) {
        draft.taxable = basket
            .products()
            .iter()
            .filter(|p| p.taxable && !p.freebie)
            .count() as i64;
    }
}

/// Sums per-line tax.
pub struct TaxMeta;

impl MetaCalculator for TaxMeta {
    fn name(&self) -> &'static str {
        "tax"
    }

    fn apply(&self, reconciler: &Reconciler, basket: &Basket, draft: &mut OrderDraft) {
        draft.tax = basket
            .products()
            .iter()
            .fold(Money::zero(), |acc, p| acc + reconciler.tax(p));
    }
}

/// Grand total. Reads the subtotal, tax and delivery fields computed earlier
/// in the same pass.
pub struct TotalMeta;

impl MetaCalculator for TotalMeta {
    fn name(&self) -> &'static str {
        "total"
    }

    fn apply(&self, _reconciler: &Reconciler, _basket: &Basket, draft: &mut OrderDraft) {
        draft.total = draft.subtotal + draft.tax + draft.delivery;
    }
}

/// Sums gross line values (before discounts).
pub struct ValueMeta;

impl MetaCalculator for ValueMeta {
    fn name(&self) -> &'static str {
        "value"
    }

    fn apply(&self, reconciler: &Reconciler, basket: &Basket, draft: &mut OrderDraft) {
        draft.value = basket
            .products()
            .iter()
            .fold(Money::zero(), |acc, p| acc + reconciler.value(p));
    }
}

// =============================================================================
// Processor
// =============================================================================

/// Runs the aggregate through the calculator pipeline.
pub struct Processor {
    reconciler: Reconciler,
    calculators: Vec<Box<dyn MetaCalculator>>,
}

impl Processor {
    /// The standard pipeline, in its one supported order.
    pub fn new() -> Self {
        Processor {
            reconciler: Reconciler,
            calculators: vec![
                Box::new(DeliveryMeta),
                Box::new(DiscountMeta),
                Box::new(ProductsMeta),
                Box::new(SubtotalMeta),
                Box::new(TaxableMeta),
                Box::new(TaxMeta),
                Box::new(TotalMeta),
                Box::new(ValueMeta),
            ],
        }
    }

    /// Recomputes a raw order from the aggregate. Infallible: a run either
    /// completes or (on a calculator panic) leaves no observable state.
    pub fn process(&self, basket: &Basket) -> RawOrder {
        let mut draft = OrderDraft::default();

        for calculator in &self.calculators {
            calculator.apply(&self.reconciler, basket, &mut draft);
        }

        draft.into_raw()
    }

    /// Calculator names, in execution order.
    pub fn pipeline(&self) -> Vec<&'static str> {
        self.calculators.iter().map(|c| c.name()).collect()
    }
}

impl Default for Processor {
    fn default() -> Self {
        Processor::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jurisdiction::Jurisdiction;
    use crate::money::Currency;
    use crate::types::{Discount, Product, ProductAction, TaxRate};

    fn line(sku: &str, price_minor: i64, rate_bps: u32) -> Product {
        Product::new(
            sku,
            format!("Product {}", sku),
            Money::from_minor(price_minor),
            TaxRate::from_bps(rate_bps),
        )
        .unwrap()
    }

    #[test]
    fn test_pipeline_order_is_fixed() {
        let processor = Processor::new();
        assert_eq!(
            processor.pipeline(),
            vec![
                "delivery", "discount", "products", "subtotal", "taxable", "tax", "total", "value"
            ]
        );
    }

    #[test]
    fn test_empty_basket_reconciles_to_zero() {
        let basket = Basket::new(Jurisdiction::germany());
        let raw = Processor::new().process(&basket);

        assert!(raw.total.is_zero());
        assert_eq!(raw.products_count, 0);
        assert!(raw.products.is_empty());
    }

    #[test]
    fn test_zero_rated_single_line() {
        let mut basket = Basket::new(Jurisdiction::zero_rated(Currency::Eur));
        basket.add(line("SKU1", 500, 0)).unwrap();

        let raw = Processor::new().process(&basket);

        assert_eq!(raw.total.minor(), 500);
        assert_eq!(raw.subtotal.minor(), 500);
        assert_eq!(raw.value.minor(), 500);
        assert!(raw.tax.is_zero());
        assert_eq!(raw.products_count, 1);
    }

    #[test]
    fn test_taxed_line() {
        let mut basket = Basket::new(Jurisdiction::germany());
        basket.add(line("SKU1", 1000, 1900)).unwrap();

        let raw = Processor::new().process(&basket);

        assert_eq!(raw.subtotal.minor(), 1000);
        assert_eq!(raw.tax.minor(), 190);
        assert_eq!(raw.total.minor(), 1190);
        assert_eq!(raw.taxable, 1);
    }

    #[test]
    fn test_discount_reduces_taxable_base() {
        let mut basket = Basket::new(Jurisdiction::germany());
        let mut product = line("SKU1", 1000, 1900);
        product.discount = Some(Discount::Percentage { bps: 1000 }); // 10%
        basket.add(product).unwrap();

        let raw = Processor::new().process(&basket);

        assert_eq!(raw.value.minor(), 1000);
        assert_eq!(raw.discount.minor(), 100);
        assert_eq!(raw.subtotal.minor(), 900);
        assert_eq!(raw.tax.minor(), 171); // 19% of 900
        assert_eq!(raw.total.minor(), 1071);
    }

    #[test]
    fn test_freebie_keeps_value_drops_tax() {
        let mut basket = Basket::new(Jurisdiction::germany());
        let mut product = line("SKU1", 1000, 1900);
        product.freebie = true;
        basket.add(product).unwrap();

        let raw = Processor::new().process(&basket);

        assert_eq!(raw.value.minor(), 1000);
        assert!(raw.tax.is_zero());
        assert_eq!(raw.taxable, 0);
    }

    #[test]
    fn test_delivery_feeds_total_but_not_subtotal() {
        let mut basket = Basket::new(Jurisdiction::zero_rated(Currency::Eur));
        basket.add(line("SKU1", 500, 0)).unwrap();
        basket
            .apply_actions("SKU1", &[ProductAction::Delivery(120)])
            .unwrap();
        basket.set_delivery_fee(Money::from_minor(300));

        let raw = Processor::new().process(&basket);

        assert_eq!(raw.delivery.minor(), 420); // line + basket fee
        assert_eq!(raw.subtotal.minor(), 500);
        assert_eq!(raw.total.minor(), 920);
    }

    #[test]
    fn test_quantity_scales_value_and_tax() {
        let mut basket = Basket::new(Jurisdiction::germany());
        let mut product = line("SKU1", 1000, 1900);
        product.set_quantity(3).unwrap();
        basket.add(product).unwrap();

        let raw = Processor::new().process(&basket);

        assert_eq!(raw.value.minor(), 3000);
        assert_eq!(raw.tax.minor(), 570);
        assert_eq!(raw.products_count, 3);
    }

    #[test]
    fn test_process_is_idempotent() {
        let mut basket = Basket::new(Jurisdiction::germany());
        basket.add(line("SKU1", 1000, 1900)).unwrap();
        basket.add(line("SKU2", 250, 1900)).unwrap();

        let processor = Processor::new();
        let first = serde_json::to_string(&processor.process(&basket)).unwrap();
        let second = serde_json::to_string(&processor.process(&basket)).unwrap();

        assert_eq!(first, second);
    }
}
