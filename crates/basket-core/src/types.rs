//! # Domain Types
//!
//! Core domain types shared by the basket aggregate and the reconciliation
//! pipeline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    TaxRate      │   │    Discount     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sku (business) │   │  bps (u32)      │   │  Percentage     │       │
//! │  │  price (minor)  │   │  1900 = 19%     │   │  Value          │       │
//! │  │  quantity, tags │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │   ProductAction: one named field mutation, applied in order  │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Freezing
//! A product's unit price is captured when the line is built. Whatever the
//! host catalog does afterwards, the basket keeps charging the price the
//! shopper saw.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::money::Money;
use crate::validation::{validate_name, validate_price, validate_quantity, validate_sku};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1900 bps = 19% (German VAT), 2000 bps = 20% (UK VAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A discount attached to a basket line.
///
/// Reconciliation asks the discount for its amount on the line's gross value
/// (unit price × quantity); the result reduces subtotal and the taxable base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discount {
    /// A percentage of the line value, in basis points (1000 = 10%).
    Percentage { bps: u32 },

    /// A flat amount off the line, clamped so a line never goes negative.
    Value { amount: Money },
}

impl Discount {
    /// Returns the discount amount for the given line.
    pub fn amount_for(&self, product: &Product) -> Money {
        let line_value = product.line_value();
        match self {
            Discount::Percentage { bps } => line_value.percentage_of(*bps),
            Discount::Value { amount } => {
                if *amount > line_value {
                    line_value
                } else {
                    *amount
                }
            }
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A line in the basket.
///
/// ## Design Notes
/// - `price` is the unit price, frozen at the moment the line was built
/// - `delivery` is a flat per-line charge; the aggregate carries a separate
///   basket-level fee on top
/// - `freebie` lines keep their value but never produce tax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Stock Keeping Unit - business identifier, unique within a basket.
    pub sku: String,

    /// Display name shown to the shopper.
    pub name: String,

    /// Unit price in minor units (frozen).
    pub price: Money,

    /// Tax rate applied to this line.
    pub rate: TaxRate,

    /// Units of this product in the basket.
    pub quantity: i64,

    /// Freebies keep their value but are never taxed.
    pub freebie: bool,

    /// Whether tax applies to this line at all.
    pub taxable: bool,

    /// Flat per-line delivery charge.
    pub delivery: Money,

    /// Coupon codes attached to this line.
    pub coupons: BTreeSet<String>,

    /// Free-form tags ("sale", "clearance", ...).
    pub tags: BTreeSet<String>,

    /// Discount applied to this line, if any.
    pub discount: Option<Discount>,

    /// When this line was added to the basket.
    pub added_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new line at quantity 1.
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        rate: TaxRate,
    ) -> CoreResult<Self> {
        let sku = sku.into();
        let name = name.into();
        validate_sku(&sku)?;
        validate_name(&name)?;
        validate_price(price.minor())?;

        Ok(Product {
            sku,
            name,
            price,
            rate,
            quantity: 1,
            freebie: false,
            taxable: true,
            delivery: Money::zero(),
            coupons: BTreeSet::new(),
            tags: BTreeSet::new(),
            discount: None,
            added_at: Utc::now(),
        })
    }

    /// The line's gross value: unit price × quantity.
    #[inline]
    pub fn line_value(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }

    /// Adds one unit to the line.
    pub fn increment(&mut self) -> CoreResult<()> {
        self.set_quantity(self.quantity + 1)
    }

    /// Removes one unit from the line, stopping at zero.
    pub fn decrement(&mut self) {
        if self.quantity > 0 {
            self.quantity -= 1;
        }
    }

    /// Sets the line quantity.
    pub fn set_quantity(&mut self, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    /// Applies one named field mutation.
    ///
    /// Sequences of actions apply strictly in the order given; a failing
    /// action aborts the rest of the sequence.
    pub fn apply(&mut self, action: &ProductAction) -> CoreResult<()> {
        match action {
            ProductAction::Quantity(quantity) => self.set_quantity(*quantity)?,
            ProductAction::Freebie(freebie) => self.freebie = *freebie,
            ProductAction::Taxable(taxable) => self.taxable = *taxable,
            // Minor units coerced into Money in the basket's currency
            ProductAction::Delivery(minor) => self.delivery = Money::from_minor(*minor),
            ProductAction::Coupon(code) => {
                self.coupons.insert(code.clone());
            }
            ProductAction::Tags(tags) => {
                self.tags = tags.iter().cloned().collect();
            }
            ProductAction::Discount(discount) => self.discount = Some(discount.clone()),
            ProductAction::Name(name) => {
                validate_name(name)?;
                self.name = name.clone();
            }
            ProductAction::Price(minor) => {
                validate_price(*minor)?;
                self.price = Money::from_minor(*minor);
            }
        }

        Ok(())
    }
}

// =============================================================================
// Product Actions
// =============================================================================

/// One named field mutation on a basket line.
///
/// The quick add/update operations take an ordered sequence of these instead
/// of a caller-supplied closure, so the full mutation surface stays visible
/// in the type system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductAction {
    /// Set the line quantity.
    Quantity(i64),
    /// Mark the line as a freebie (value kept, tax dropped).
    Freebie(bool),
    /// Toggle whether the line is taxed.
    Taxable(bool),
    /// Set the per-line delivery charge, in minor units of the basket's
    /// jurisdiction currency.
    Delivery(i64),
    /// Attach a coupon code.
    Coupon(String),
    /// Replace the line's tag set.
    Tags(Vec<String>),
    /// Attach a discount.
    Discount(Discount),
    /// Rename the line.
    Name(String),
    /// Reprice the line, in minor units.
    Price(i64),
}

impl ProductAction {
    /// A single tag, coerced into a one-element tag set.
    pub fn tag(tag: impl Into<String>) -> Self {
        ProductAction::Tags(vec![tag.into()])
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
