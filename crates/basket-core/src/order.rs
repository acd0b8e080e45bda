//! # Order Snapshots
//!
//! The immutable results of a reconciliation run, in two shapes:
//!
//! - [`RawOrder`] - Money-typed totals plus full line clones; what the
//!   pipeline produces and what further domain code works with.
//! - [`Order`] - the plain minor-units snapshot handed to hosts, sessions
//!   and logs; every field is a plain integer or string so it serializes
//!   the same everywhere.
//!
//! Both are superseded wholesale on every reconciliation, never patched.
//! An order is a pure function of (aggregate, jurisdiction) at the moment
//! it was computed.

use serde::{Deserialize, Serialize};

use crate::jurisdiction::Jurisdiction;
use crate::meta::Reconciler;
use crate::money::Money;
use crate::types::Product;

// =============================================================================
// Raw Order
// =============================================================================

/// Money-typed reconciliation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOrder {
    /// Per-line delivery charges plus the basket-level fee.
    pub delivery: Money,
    /// Sum of per-line discount amounts.
    pub discount: Money,
    /// Total units across all lines.
    pub products_count: i64,
    /// Sum of discounted line values.
    pub subtotal: Money,
    /// Number of lines that produce tax.
    pub taxable: i64,
    /// Sum of per-line tax.
    pub tax: Money,
    /// subtotal + tax + delivery.
    pub total: Money,
    /// Sum of gross line values.
    pub value: Money,
    /// Line clones at the moment of reconciliation.
    pub products: Vec<Product>,
}

// =============================================================================
// Transformed Order
// =============================================================================

/// One line of a transformed order.
///
/// Uses the snapshot pattern: everything is frozen at reconciliation time,
/// so the snapshot stays meaningful even after the aggregate moves on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub sku: String,
    pub name: String,
    /// Unit price in minor units.
    pub price: i64,
    /// Tax rate in basis points.
    pub rate_bps: u32,
    pub quantity: i64,
    pub freebie: bool,
    pub taxable: bool,
    /// Per-line delivery charge in minor units.
    pub delivery: i64,
    pub coupons: Vec<String>,
    pub tags: Vec<String>,
    /// Discount amount on this line in minor units.
    pub discount: i64,
    /// Line total (subtotal + tax + delivery) in minor units.
    pub line_total: i64,
}

impl ProductSnapshot {
    fn from_product(reconciler: &Reconciler, product: &Product) -> Self {
        ProductSnapshot {
            sku: product.sku.clone(),
            name: product.name.clone(),
            price: product.price.minor(),
            rate_bps: product.rate.bps(),
            quantity: product.quantity,
            freebie: product.freebie,
            taxable: product.taxable,
            delivery: product.delivery.minor(),
            coupons: product.coupons.iter().cloned().collect(),
            tags: product.tags.iter().cloned().collect(),
            discount: reconciler.discount(product).minor(),
            line_total: reconciler.total(product).minor(),
        }
    }
}

/// The plain serializable order snapshot.
///
/// All amounts are minor units of `currency`. This is the shape persisted
/// into the session record and returned by every order accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// ISO 4217 code of the jurisdiction's currency.
    pub currency: String,
    pub delivery: i64,
    pub discount: i64,
    pub products_count: i64,
    pub subtotal: i64,
    pub taxable: i64,
    pub tax: i64,
    pub total: i64,
    pub value: i64,
    pub products: Vec<ProductSnapshot>,
}

impl Order {
    /// Transforms a raw order into the plain snapshot.
    pub fn from_raw(raw: &RawOrder, jurisdiction: &Jurisdiction) -> Self {
        let reconciler = Reconciler;

        Order {
            currency: jurisdiction.currency().code().to_string(),
            delivery: raw.delivery.minor(),
            discount: raw.discount.minor(),
            products_count: raw.products_count,
            subtotal: raw.subtotal.minor(),
            taxable: raw.taxable,
            tax: raw.tax.minor(),
            total: raw.total.minor(),
            value: raw.value.minor(),
            products: raw
                .products
                .iter()
                .map(|p| ProductSnapshot::from_product(&reconciler, p))
                .collect(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
