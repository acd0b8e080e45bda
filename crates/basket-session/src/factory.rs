//! # Basket Factory
//!
//! Owns one basket aggregate together with the snapshots of its last
//! reconciliation.
//!
//! ## The One Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │        EVERY MUTATION IS FOLLOWED BY A FULL RECONCILIATION              │
//! │                                                                         │
//! │   add / update / remove / discount / delivery_fee /                     │
//! │   increment / decrement / set_quantity / add_quick / update_quick       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   mutate aggregate ──ok──► reconcile() ──► fresh RawOrder + Order      │
//! │        │                                                                │
//! │        └──err──► return early, snapshots stay as they were             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The snapshots are never partially updated: a failed delegation skips
//! reconciliation entirely, and a successful one replaces both snapshots
//! wholesale. Accessors therefore always see an order that matches some
//! complete past state of the aggregate - the latest one on success.

use tracing::debug;

use basket_core::{
    Basket, CoreResult, Currency, Discount, Jurisdiction, Money, Order, Processor, Product,
    ProductAction, ProductSnapshot, RawOrder, TaxRate,
};

use crate::storage::BasketRecord;

// =============================================================================
// Basket Factory
// =============================================================================

/// One basket aggregate plus the last-computed order snapshots.
///
/// The snapshots exist from construction on: a fresh factory reconciles its
/// empty aggregate immediately, and a restored one carries the snapshots out
/// of the record. There is no state in which an accessor could observe "no
/// order yet".
#[derive(Debug, Clone)]
pub struct BasketFactory {
    basket: Basket,
    raw_order: RawOrder,
    order: Order,
}

impl BasketFactory {
    /// Creates a factory with a fresh aggregate scoped to `jurisdiction`.
    pub fn new(jurisdiction: Jurisdiction) -> Self {
        let basket = Basket::new(jurisdiction);
        let raw_order = Processor::new().process(&basket);
        let order = Order::from_raw(&raw_order, basket.jurisdiction());

        BasketFactory {
            basket,
            raw_order,
            order,
        }
    }

    /// Rebuilds a factory from a persisted record.
    pub fn from_record(record: BasketRecord) -> Self {
        BasketFactory {
            basket: record.basket,
            raw_order: record.raw_order,
            order: record.order,
        }
    }

    /// The persisted shape of this factory, stamped now.
    pub fn to_record(&self) -> BasketRecord {
        BasketRecord {
            basket: self.basket.clone(),
            raw_order: self.raw_order.clone(),
            order: self.order.clone(),
            jurisdiction: self.basket.jurisdiction().clone(),
            saved_at: chrono::Utc::now(),
        }
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Recomputes both order snapshots from the current aggregate.
    ///
    /// Always a full recompute through the fixed calculator pipeline; there
    /// is no incremental path.
    pub fn reconcile(&mut self) {
        let raw = Processor::new().process(&self.basket);
        self.order = Order::from_raw(&raw, self.basket.jurisdiction());
        self.raw_order = raw;

        debug!(
            total = self.order.total,
            products = self.order.products_count,
            "reconciled basket"
        );
    }

    // =========================================================================
    // Mutations (delegate, then reconcile)
    // =========================================================================

    /// Adds a product line.
    pub fn add(&mut self, product: Product) -> CoreResult<()> {
        self.basket.add(product)?;
        self.reconcile();
        Ok(())
    }

    /// Runs a mutation against the line with the given sku.
    pub fn update<F>(&mut self, sku: &str, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut Product) -> CoreResult<()>,
    {
        self.basket.update(sku, f)?;
        self.reconcile();
        Ok(())
    }

    /// Removes and returns the line with the given sku.
    pub fn remove(&mut self, sku: &str) -> CoreResult<Product> {
        let removed = self.basket.remove(sku)?;
        self.reconcile();
        Ok(removed)
    }

    /// Attaches a discount to every current line.
    pub fn discount(&mut self, discount: Discount) {
        self.basket.discount(discount);
        self.reconcile();
    }

    /// Sets the basket-level delivery fee.
    pub fn delivery_fee(&mut self, fee: Money) {
        self.basket.set_delivery_fee(fee);
        self.reconcile();
    }

    /// Adds one unit to the line with the given sku.
    pub fn increment(&mut self, sku: &str) -> CoreResult<()> {
        self.update(sku, |product| product.increment())
    }

    /// Removes one unit from the line with the given sku.
    pub fn decrement(&mut self, sku: &str) -> CoreResult<()> {
        self.update(sku, |product| {
            product.decrement();
            Ok(())
        })
    }

    /// Sets the quantity of the line with the given sku.
    pub fn set_quantity(&mut self, sku: &str, quantity: i64) -> CoreResult<()> {
        self.update(sku, |product| product.set_quantity(quantity))
    }

    /// Builds and adds a line in one call.
    ///
    /// `price_minor` is in minor units of the jurisdiction's currency. The
    /// action sequence is applied to the new line in order before it joins
    /// the aggregate.
    pub fn add_quick(
        &mut self,
        sku: &str,
        name: &str,
        price_minor: i64,
        actions: &[ProductAction],
    ) -> CoreResult<()> {
        let price = Money::from_minor(price_minor);
        let mut product = Product::new(sku, name, price, self.basket.rate())?;
        for action in actions {
            product.apply(action)?;
        }

        self.basket.add(product)?;
        self.reconcile();
        Ok(())
    }

    /// Applies an ordered action sequence to an existing line.
    pub fn update_quick(&mut self, sku: &str, actions: &[ProductAction]) -> CoreResult<()> {
        self.basket.apply_actions(sku, actions)?;
        self.reconcile();
        Ok(())
    }

    // =========================================================================
    // Aggregate Reads
    // =========================================================================

    /// Checks whether a line with the given sku exists.
    pub fn has(&self, sku: &str) -> bool {
        self.basket.has(sku)
    }

    /// Returns the line with the given sku.
    pub fn pick(&self, sku: &str) -> CoreResult<&Product> {
        self.basket.pick(sku)
    }

    /// Returns the number of distinct lines.
    pub fn count(&self) -> usize {
        self.basket.count()
    }

    /// Returns the lines in insertion order.
    pub fn products(&self) -> &[Product] {
        self.basket.products()
    }

    /// Checks if the basket has no lines.
    pub fn is_empty(&self) -> bool {
        self.basket.is_empty()
    }

    /// Returns the underlying aggregate.
    pub fn basket(&self) -> &Basket {
        &self.basket
    }

    /// Returns the basket's jurisdiction.
    pub fn jurisdiction(&self) -> &Jurisdiction {
        self.basket.jurisdiction()
    }

    /// Returns the jurisdiction's tax rate.
    pub fn rate(&self) -> TaxRate {
        self.basket.rate()
    }

    /// Returns the jurisdiction's currency.
    pub fn currency(&self) -> Currency {
        self.basket.currency()
    }

    // =========================================================================
    // Order Accessors (read the last-computed snapshot)
    // =========================================================================

    /// Delivery total in minor units.
    pub fn delivery(&self) -> i64 {
        self.order.delivery
    }

    /// Discount total in minor units.
    pub fn discount_total(&self) -> i64 {
        self.order.discount
    }

    /// Total units across all lines.
    pub fn products_count(&self) -> i64 {
        self.order.products_count
    }

    /// Subtotal in minor units.
    pub fn subtotal(&self) -> i64 {
        self.order.subtotal
    }

    /// Number of tax-producing lines.
    pub fn taxable(&self) -> i64 {
        self.order.taxable
    }

    /// Tax total in minor units.
    pub fn tax(&self) -> i64 {
        self.order.tax
    }

    /// Grand total in minor units.
    pub fn total(&self) -> i64 {
        self.order.total
    }

    /// Gross value in minor units.
    pub fn value(&self) -> i64 {
        self.order.value
    }

    /// The full plain snapshot.
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// The full Money-typed snapshot.
    pub fn raw_order(&self) -> &RawOrder {
        &self.raw_order
    }

    /// The snapshot's line views.
    pub fn order_products(&self) -> &[ProductSnapshot] {
        &self.order.products
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_rated() -> BasketFactory {
        BasketFactory::new(Jurisdiction::zero_rated(Currency::Eur))
    }

    #[test]
    fn test_fresh_factory_has_empty_order() {
        let factory = zero_rated();
        assert_eq!(factory.total(), 0);
        assert_eq!(factory.products_count(), 0);
        assert!(factory.is_empty());
    }

    #[test]
    fn test_add_quick_zero_rated_single_line() {
        let mut factory = zero_rated();
        factory.add_quick("SKU1", "Widget", 500, &[]).unwrap();

        assert_eq!(factory.total(), 500);
        assert_eq!(factory.products_count(), 1);
        assert_eq!(factory.tax(), 0);
    }

    #[test]
    fn test_increment_doubles_count_and_subtotal() {
        let mut factory = zero_rated();
        factory.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        factory.increment("SKU1").unwrap();

        assert_eq!(factory.products_count(), 2);
        assert_eq!(factory.subtotal(), 1000);
    }

    #[test]
    fn test_update_quick_tag_coercion_leaves_price_alone() {
        let mut factory = zero_rated();
        factory.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        factory
            .update_quick("SKU1", &[ProductAction::tag("sale")])
            .unwrap();

        let line = factory.pick("SKU1").unwrap();
        assert_eq!(line.tags.len(), 1);
        assert!(line.tags.contains("sale"));
        assert_eq!(factory.subtotal(), 500);
        assert_eq!(factory.total(), 500);
    }

    #[test]
    fn test_add_quick_applies_actions_before_first_reconcile() {
        let mut factory = zero_rated();
        factory
            .add_quick(
                "SKU1",
                "Widget",
                500,
                &[ProductAction::Quantity(2), ProductAction::Delivery(100)],
            )
            .unwrap();

        assert_eq!(factory.products_count(), 2);
        assert_eq!(factory.delivery(), 100);
        assert_eq!(factory.total(), 1100);
    }

    #[test]
    fn test_failed_mutation_leaves_snapshots_intact() {
        let mut factory = zero_rated();
        factory.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        let before = factory.order().clone();

        assert!(factory.increment("missing").is_err());
        assert_eq!(factory.order(), &before);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut factory = BasketFactory::new(Jurisdiction::germany());
        factory.add_quick("SKU1", "Widget", 1000, &[]).unwrap();

        factory.reconcile();
        let first = serde_json::to_string(factory.order()).unwrap();
        factory.reconcile();
        let second = serde_json::to_string(factory.order()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_record_round_trip() {
        let mut factory = BasketFactory::new(Jurisdiction::germany());
        factory.add_quick("SKU1", "Widget", 1000, &[]).unwrap();

        let record = factory.to_record();
        assert_eq!(record.jurisdiction, Jurisdiction::germany());

        let restored = BasketFactory::from_record(record);
        assert_eq!(restored.total(), factory.total());
        assert_eq!(restored.count(), 1);
    }

    #[test]
    fn test_discount_then_delivery_fee() {
        let mut factory = BasketFactory::new(Jurisdiction::germany());
        factory.add_quick("SKU1", "Widget", 1000, &[]).unwrap();

        factory.discount(Discount::Percentage { bps: 1000 });
        assert_eq!(factory.discount_total(), 100);
        assert_eq!(factory.subtotal(), 900);

        factory.delivery_fee(Money::from_minor(300));
        assert_eq!(factory.delivery(), 300);
        // subtotal 900 + 19% tax 171 + delivery 300
        assert_eq!(factory.total(), 1371);
    }

    #[test]
    fn test_remove_reconciles_to_empty() {
        let mut factory = zero_rated();
        factory.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        let removed = factory.remove("SKU1").unwrap();

        assert_eq!(removed.sku, "SKU1");
        assert_eq!(factory.total(), 0);
        assert_eq!(factory.products_count(), 0);
    }
}
