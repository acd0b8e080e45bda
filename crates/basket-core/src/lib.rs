//! # basket-core: Pure Business Logic for Basket
//!
//! This crate is the **heart** of Basket. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Basket Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   Host Application                              │   │
//! │  │    request handler ──► basket operations ──► render totals     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              basket-session (Integration Layer)                 │   │
//! │  │    Manager • Factory • Storage adapter • Events • Config        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ basket-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │   types   │  │  basket   │  │   meta    │  │   │
//! │  │   │   Money   │  │  Product  │  │  Basket   │  │ Processor │  │   │
//! │  │   │  Currency │  │ Discount  │  │ aggregate │  │Reconciler │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO SESSION • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money and Currency types with integer arithmetic (no floats!)
//! - [`types`] - Domain types (Product, TaxRate, Discount, ProductAction)
//! - [`jurisdiction`] - Tax-and-currency policy value object
//! - [`basket`] - The mutable basket aggregate
//! - [`meta`] - The reconciliation pipeline (Reconciler, Processor)
//! - [`order`] - Raw and transformed order snapshots
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every reconciliation is deterministic - same
//!    aggregate = same order
//! 2. **No I/O**: Session, network and file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are minor units (i64), never
//!    floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use basket_core::basket::Basket;
//! use basket_core::jurisdiction::Jurisdiction;
//! use basket_core::meta::Processor;
//! use basket_core::money::Money;
//! use basket_core::types::{Product, TaxRate};
//!
//! let mut basket = Basket::new(Jurisdiction::germany());
//! let product = Product::new(
//!     "COKE-330",
//!     "Cola 330ml",
//!     Money::from_minor(149),
//!     basket.rate(),
//! )?;
//! basket.add(product)?;
//!
//! let raw = Processor::new().process(&basket);
//! assert_eq!(raw.tax.minor(), 28); // 19% of 1.49, rounded half-up
//! # Ok::<(), basket_core::CoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod basket;
pub mod error;
pub mod jurisdiction;
pub mod meta;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use basket_core::Money` instead of
// `use basket_core::money::Money`

pub use basket::Basket;
pub use error::{CoreError, CoreResult, ValidationError};
pub use jurisdiction::Jurisdiction;
pub use meta::{MetaCalculator, Processor, Reconciler};
pub use money::{Currency, Money};
pub use order::{Order, ProductSnapshot, RawOrder};
pub use types::{Discount, Product, ProductAction, TaxRate};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single basket
///
/// ## Business Reason
/// Prevents runaway baskets and keeps session records a sane size.
pub const MAX_BASKET_ITEMS: usize = 100;

/// Maximum units of a single line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of a SKU.
pub const MAX_SKU_LENGTH: usize = 50;

/// Maximum length of a product display name.
pub const MAX_NAME_LENGTH: usize = 255;
