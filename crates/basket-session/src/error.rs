//! # Session Layer Error Types
//!
//! Error types for basket storage and lifecycle operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Domain error (basket_core::CoreError)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BasketError (this module) ← Adds storage and lifecycle failures       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller decides: every mutating operation may fail, and the in-memory  │
//! │  order only reflects the aggregate once the call returned Ok           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use basket_core::CoreError;

/// Storage and lifecycle errors.
///
/// Nothing here is retried internally; a failed mutation leaves the
/// previously persisted record untouched.
#[derive(Debug, Error)]
pub enum BasketError {
    /// Explicit load of an instance for which storage has no record.
    ///
    /// ## When This Occurs
    /// - `load()` on an instance that was never used in this session
    /// - `load()` after `forget()`
    ///
    /// The lazy create-or-restore flow never raises this; it creates
    /// instead.
    #[error("No basket found for the identifier [{identifier}]")]
    NotFound { identifier: String },

    /// A stored record exists but cannot be decoded.
    ///
    /// ## When This Occurs
    /// - Host application wrote unrelated data under the basket key
    /// - Record written by an incompatible version
    #[error("Stored basket under [{key}] could not be decoded: {reason}")]
    CorruptedRecord { key: String, reason: String },

    /// Configuration could not be parsed or resolved.
    #[error("Invalid basket configuration: {0}")]
    InvalidConfig(String),

    /// A record could not be encoded for the session store.
    #[error("Record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Domain error (wraps CoreError).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl BasketError {
    /// Creates a NotFound error for the given composite identifier.
    pub fn not_found(identifier: impl Into<String>) -> Self {
        BasketError::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Creates a CorruptedRecord error.
    pub fn corrupted(key: impl Into<String>, reason: impl Into<String>) -> Self {
        BasketError::CorruptedRecord {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for session layer operations.
pub type BasketResult<T> = Result<T, BasketError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = BasketError::not_found("basket.main");
        assert_eq!(
            err.to_string(),
            "No basket found for the identifier [basket.main]"
        );
    }

    #[test]
    fn test_core_error_passes_through() {
        let core = CoreError::ProductNotFound("SKU1".to_string());
        let err: BasketError = core.into();
        assert_eq!(err.to_string(), "Product not found: SKU1");
    }
}
