//! # basket-session: Session Integration Layer for Basket
//!
//! This crate plugs the basket domain into a host application's session
//! subsystem: it lazily creates or restores one basket per session instance,
//! reconciles an order snapshot after every mutation, and persists the
//! result before the mutating call returns.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Basket Data Flow                                 │
//! │                                                                         │
//! │  Host request handler                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  basket-session (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ BasketManager │───►│ BasketFactory │───►│BasketStorage │  │   │
//! │  │   │ (lifecycle)   │    │ (reconcile)   │    │ (records)    │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────┬───────┘  │   │
//! │  │           │ events                                  │          │   │
//! │  │           ▼                                         ▼          │   │
//! │  │   EventDispatcher                          SessionBackend      │   │
//! │  │   (host event bus)                         (host session)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  basket-core: Money, Basket aggregate, reconciliation pipeline          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`manager`] - Create-or-restore lifecycle and the forwarded surface
//! - [`factory`] - Aggregate ownership and mutate-then-reconcile discipline
//! - [`storage`] - Backend trait, memory backend, typed record adapter
//! - [`events`] - `basket.created` / `basket.restored` dispatch
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Storage and lifecycle error types
//!
//! ## Usage
//!
//! ```rust
//! use basket_session::config::BasketConfig;
//! use basket_session::events::NoopDispatcher;
//! use basket_session::manager::BasketManager;
//! use basket_session::storage::{MemoryHandler, MemoryStore};
//!
//! # fn main() -> basket_session::BasketResult<()> {
//! let handler = MemoryHandler::new();
//! let config = BasketConfig::default();
//!
//! // one manager per request
//! let mut basket = BasketManager::from_config(
//!     &config,
//!     MemoryStore::new(handler.clone()),
//!     NoopDispatcher,
//! )?;
//!
//! basket.add_quick("COKE-330", "Cola 330ml", 149, &[])?;
//! assert_eq!(basket.products_count()?, 1);
//!
//! // the next request restores the same basket from the session
//! let mut basket = BasketManager::from_config(
//!     &config,
//!     MemoryStore::new(handler),
//!     NoopDispatcher,
//! )?;
//! assert_eq!(basket.products_count()?, 1);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod events;
pub mod factory;
pub mod manager;
pub mod storage;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::BasketConfig;
pub use error::{BasketError, BasketResult};
pub use events::{BasketEvent, EventDispatcher, NoopDispatcher, RecordingDispatcher};
pub use factory::BasketFactory;
pub use manager::BasketManager;
pub use storage::{BasketRecord, BasketStorage, MemoryHandler, MemoryStore, SessionBackend};

// Domain types hosts need at the call site
pub use basket_core::{
    Basket, Currency, Discount, Jurisdiction, Money, Order, Product, ProductAction,
    ProductSnapshot, TaxRate,
};
