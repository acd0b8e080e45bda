//! # Basket Aggregate
//!
//! The mutable product collection a session works against.
//!
//! ## Aggregate Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Basket Aggregate Operations                          │
//! │                                                                         │
//! │  Caller Action            Aggregate Method        State Change          │
//! │  ─────────────            ────────────────        ────────────          │
//! │                                                                         │
//! │  Add product ────────────► add() ────────────────► products.push(line) │
//! │                                (same sku merges quantities)             │
//! │  Change a line ──────────► update(sku, f) ───────► f(&mut line)        │
//! │                                                                         │
//! │  Remove a line ──────────► remove(sku) ──────────► products.retain(..) │
//! │                                                                         │
//! │  Discount everything ────► discount(d) ──────────► every line          │
//! │                                                                         │
//! │  Read ───────────────────► pick / has / count ───► (read only)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The aggregate never computes order totals itself; that is the
//! reconciliation pipeline's job, which reads the aggregate wholesale after
//! every mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::jurisdiction::Jurisdiction;
use crate::money::{Currency, Money};
use crate::types::{Discount, Product, ProductAction, TaxRate};
use crate::MAX_BASKET_ITEMS;

// =============================================================================
// Basket
// =============================================================================

/// The basket aggregate: an insertion-ordered product collection scoped to
/// one jurisdiction.
///
/// ## Invariants
/// - Lines are unique by `sku` (adding the same product merges quantities)
/// - Maximum lines: 100, maximum units per line: 999 (crate constants)
/// - The jurisdiction is fixed for the aggregate's whole lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basket {
    /// Tax-and-currency policy, fixed at creation.
    jurisdiction: Jurisdiction,

    /// Product lines in insertion order.
    products: Vec<Product>,

    /// Basket-level delivery fee, added on top of per-line charges.
    delivery_fee: Money,

    /// When the basket was created.
    created_at: DateTime<Utc>,
}

impl Basket {
    /// Creates an empty basket scoped to the given jurisdiction.
    pub fn new(jurisdiction: Jurisdiction) -> Self {
        Basket {
            jurisdiction,
            products: Vec::new(),
            delivery_fee: Money::zero(),
            created_at: Utc::now(),
        }
    }

    /// Returns the basket's jurisdiction.
    pub fn jurisdiction(&self) -> &Jurisdiction {
        &self.jurisdiction
    }

    /// Returns the jurisdiction's tax rate.
    pub fn rate(&self) -> TaxRate {
        self.jurisdiction.rate()
    }

    /// Returns the jurisdiction's currency.
    pub fn currency(&self) -> Currency {
        self.jurisdiction.currency()
    }

    /// Adds a product line, or merges quantities if the sku is already
    /// present.
    ///
    /// ## Behavior
    /// - Existing sku: the new line's quantity is added to the existing line;
    ///   the existing line's other fields win
    /// - New sku: appended at the end of the collection
    pub fn add(&mut self, product: Product) -> CoreResult<()> {
        if let Some(existing) = self.products.iter_mut().find(|p| p.sku == product.sku) {
            let merged = existing.quantity + product.quantity;
            existing.set_quantity(merged)?;
            return Ok(());
        }

        if self.products.len() >= MAX_BASKET_ITEMS {
            return Err(CoreError::BasketTooLarge {
                max: MAX_BASKET_ITEMS,
            });
        }

        self.products.push(product);
        Ok(())
    }

    /// Runs a mutation against the line with the given sku.
    pub fn update<F>(&mut self, sku: &str, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut Product) -> CoreResult<()>,
    {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.sku == sku)
            .ok_or_else(|| CoreError::ProductNotFound(sku.to_string()))?;

        f(product)
    }

    /// Applies an ordered action sequence to the line with the given sku.
    pub fn apply_actions(&mut self, sku: &str, actions: &[ProductAction]) -> CoreResult<()> {
        self.update(sku, |product| {
            for action in actions {
                product.apply(action)?;
            }
            Ok(())
        })
    }

    /// Removes and returns the line with the given sku.
    pub fn remove(&mut self, sku: &str) -> CoreResult<Product> {
        let index = self
            .products
            .iter()
            .position(|p| p.sku == sku)
            .ok_or_else(|| CoreError::ProductNotFound(sku.to_string()))?;

        Ok(self.products.remove(index))
    }

    /// Attaches a discount to every current line.
    ///
    /// Lines added later are not discounted retroactively.
    pub fn discount(&mut self, discount: Discount) {
        for product in &mut self.products {
            product.discount = Some(discount.clone());
        }
    }

    /// Sets the basket-level delivery fee.
    pub fn set_delivery_fee(&mut self, fee: Money) {
        self.delivery_fee = fee;
    }

    /// Returns the basket-level delivery fee.
    pub fn delivery_fee(&self) -> Money {
        self.delivery_fee
    }

    /// Returns the line with the given sku.
    pub fn pick(&self, sku: &str) -> CoreResult<&Product> {
        self.products
            .iter()
            .find(|p| p.sku == sku)
            .ok_or_else(|| CoreError::ProductNotFound(sku.to_string()))
    }

    /// Checks whether a line with the given sku exists.
    pub fn has(&self, sku: &str) -> bool {
        self.products.iter().any(|p| p.sku == sku)
    }

    /// Returns the number of distinct lines.
    pub fn count(&self) -> usize {
        self.products.len()
    }

    /// Returns the total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.products.iter().map(|p| p.quantity).sum()
    }

    /// Returns the lines in insertion order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Checks if the basket has no lines.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// When the basket was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(sku: &str, price_minor: i64) -> Product {
        Product::new(
            sku,
            format!("Product {}", sku),
            Money::from_minor(price_minor),
            TaxRate::from_bps(1900),
        )
        .unwrap()
    }

    fn basket() -> Basket {
        Basket::new(Jurisdiction::germany())
    }

    #[test]
    fn test_add_line() {
        let mut basket = basket();
        basket.add(test_product("1", 999)).unwrap();

        assert_eq!(basket.count(), 1);
        assert_eq!(basket.total_quantity(), 1);
        assert!(basket.has("1"));
    }

    #[test]
    fn test_add_same_sku_merges_quantity() {
        let mut basket = basket();
        let mut second = test_product("1", 999);
        second.set_quantity(3).unwrap();

        basket.add(test_product("1", 999)).unwrap();
        basket.add(second).unwrap();

        assert_eq!(basket.count(), 1); // still one line
        assert_eq!(basket.total_quantity(), 4);
    }

    #[test]
    fn test_update_missing_sku_fails() {
        let mut basket = basket();
        let err = basket.update("nope", |p| p.increment()).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[test]
    fn test_remove_returns_line() {
        let mut basket = basket();
        basket.add(test_product("1", 999)).unwrap();

        let removed = basket.remove("1").unwrap();
        assert_eq!(removed.sku, "1");
        assert!(basket.is_empty());
        assert!(basket.remove("1").is_err());
    }

    #[test]
    fn test_discount_applies_to_all_current_lines() {
        let mut basket = basket();
        basket.add(test_product("1", 1000)).unwrap();
        basket.add(test_product("2", 2000)).unwrap();

        basket.discount(Discount::Percentage { bps: 1000 });

        assert!(basket.pick("1").unwrap().discount.is_some());
        assert!(basket.pick("2").unwrap().discount.is_some());

        // later lines are not discounted retroactively
        basket.add(test_product("3", 3000)).unwrap();
        assert!(basket.pick("3").unwrap().discount.is_none());
    }

    #[test]
    fn test_apply_actions_by_sku() {
        let mut basket = basket();
        basket.add(test_product("1", 1000)).unwrap();

        basket
            .apply_actions("1", &[ProductAction::Quantity(2), ProductAction::tag("sale")])
            .unwrap();

        let line = basket.pick("1").unwrap();
        assert_eq!(line.quantity, 2);
        assert!(line.tags.contains("sale"));
    }

    #[test]
    fn test_line_cap_enforced() {
        let mut basket = basket();
        for i in 0..MAX_BASKET_ITEMS {
            basket.add(test_product(&format!("SKU-{}", i), 100)).unwrap();
        }

        let err = basket.add(test_product("overflow", 100)).unwrap_err();
        assert!(matches!(err, CoreError::BasketTooLarge { .. }));
    }

    #[test]
    fn test_jurisdiction_accessors() {
        let basket = basket();
        assert_eq!(basket.rate().bps(), 1900);
        assert_eq!(basket.currency(), Currency::Eur);
    }
}
