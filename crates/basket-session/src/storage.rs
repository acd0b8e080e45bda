//! # Session Storage
//!
//! Persists basket state into a session-like key/value store.
//!
//! ## Storage Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storage Layering                                   │
//! │                                                                         │
//! │  BasketStorage<S>  ── typed adapter, composite "{key}.{instance}" keys  │
//! │       │                BasketRecord ⇄ serde_json::Value                 │
//! │       ▼                                                                 │
//! │  SessionBackend    ── the host's session store behind a trait           │
//! │       │                get / put / has / forget / save / flush          │
//! │       ▼                                                                 │
//! │  MemoryStore       ── shipped backend: request-scoped attributes over   │
//! │                       a shared durable MemoryHandler                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Changing the instance changes the effective key for all subsequent
//! operations; previously stored records stay where they are.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use basket_core::{Basket, Jurisdiction, Order, RawOrder};

use crate::error::{BasketError, BasketResult};

// =============================================================================
// Session Backend Trait
// =============================================================================

/// The session-like key/value collaborator baskets persist into.
///
/// Host applications implement this over their real session store. `get`
/// never errors on a missing key; callers check `has` first. `save` flushes
/// the request-scoped attributes to the durable side; `flush` clears
/// everything.
pub trait SessionBackend {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Writes `value` under `key` in the request-scoped attributes.
    fn put(&mut self, key: &str, value: Value);

    /// Checks whether `key` is present.
    fn has(&self, key: &str) -> bool;

    /// Removes `key` from the request-scoped attributes.
    fn forget(&mut self, key: &str);

    /// Flushes the attributes to the durable backing.
    fn save(&mut self);

    /// Clears the attributes and the durable backing.
    fn flush(&mut self);
}

// =============================================================================
// Memory Backend
// =============================================================================

/// The durable side of [`MemoryStore`]: a map shared between "requests".
///
/// ## Thread Safety
/// `Arc<Mutex<_>>` because several request-scoped stores may be constructed
/// from (and saved back to) the same handler. There is deliberately no
/// cross-request locking beyond the map itself: concurrent requests for the
/// same key race, and the last `save` wins.
#[derive(Debug, Clone, Default)]
pub struct MemoryHandler {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryHandler {
    /// Creates an empty handler.
    pub fn new() -> Self {
        MemoryHandler::default()
    }

    /// Snapshot of the durable map, taken when a request-scoped store
    /// starts.
    fn load(&self) -> HashMap<String, Value> {
        self.inner.lock().expect("session handler mutex poisoned").clone()
    }

    /// Replaces the durable map with the given attributes.
    fn store(&self, attributes: &HashMap<String, Value>) {
        let mut inner = self.inner.lock().expect("session handler mutex poisoned");
        *inner = attributes.clone();
    }

    /// Clears the durable map.
    fn clear(&self) {
        self.inner
            .lock()
            .expect("session handler mutex poisoned")
            .clear();
    }
}

/// In-memory session backend.
///
/// A `MemoryStore` models one request: it loads a snapshot of the handler's
/// durable map at construction, works against its own attributes, and writes
/// them back on `save`. Construct a second store from the same handler to
/// model the next request.
#[derive(Debug)]
pub struct MemoryStore {
    attributes: HashMap<String, Value>,
    handler: MemoryHandler,
}

impl MemoryStore {
    /// Starts a request-scoped store over the given durable handler.
    pub fn new(handler: MemoryHandler) -> Self {
        MemoryStore {
            attributes: handler.load(),
            handler,
        }
    }
}

impl Default for MemoryStore {
    /// A store over a fresh, private handler; useful for one-shot tests.
    fn default() -> Self {
        MemoryStore::new(MemoryHandler::new())
    }
}

impl SessionBackend for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.attributes.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: Value) {
        self.attributes.insert(key.to_string(), value);
    }

    fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    fn forget(&mut self, key: &str) {
        self.attributes.remove(key);
    }

    fn save(&mut self) {
        self.handler.store(&self.attributes);
    }

    fn flush(&mut self) {
        self.attributes.clear();
        self.handler.clear();
    }
}

// =============================================================================
// Persisted Record
// =============================================================================

/// The tuple persisted per basket instance.
///
/// ## Invariant
/// A record exists in storage if and only if a basket has been created for
/// that instance in the current session lifetime. It is overwritten on every
/// reconciliation and removed only by an explicit forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketRecord {
    /// The aggregate itself.
    pub basket: Basket,

    /// Money-typed snapshot from the last reconciliation.
    pub raw_order: RawOrder,

    /// Plain snapshot from the last reconciliation.
    pub order: Order,

    /// The jurisdiction the basket was created under.
    pub jurisdiction: Jurisdiction,

    /// When this record was written.
    pub saved_at: DateTime<Utc>,
}

// =============================================================================
// Storage Adapter
// =============================================================================

/// Typed storage adapter over a [`SessionBackend`].
///
/// Keys are composite: `"{session_key}.{instance}"`. The session key scopes
/// all baskets of this integration inside the host's session; the instance
/// selects one basket slot within that namespace.
#[derive(Debug)]
pub struct BasketStorage<S: SessionBackend> {
    store: S,
    key: String,
    instance: String,
}

impl<S: SessionBackend> BasketStorage<S> {
    /// Creates an adapter with the given namespace key and instance.
    pub fn new(store: S, key: impl Into<String>, instance: impl Into<String>) -> Self {
        BasketStorage {
            store,
            key: key.into(),
            instance: instance.into(),
        }
    }

    /// Returns the namespace key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the current instance identifier.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Selects a different basket slot.
    ///
    /// Only the effective key changes; nothing is migrated or removed under
    /// the previous key.
    pub fn set_instance(&mut self, instance: impl Into<String>) {
        self.instance = instance.into();
    }

    /// Returns both namespace key and instance: the effective storage key.
    pub fn session_key(&self) -> String {
        format!("{}.{}", self.key, self.instance)
    }

    /// Reads the record for the current instance.
    ///
    /// `None` when no record exists; callers on the hot path check [`has`]
    /// first. A present-but-undecodable value is an error, not a miss.
    ///
    /// [`has`]: BasketStorage::has
    pub fn get(&self) -> BasketResult<Option<BasketRecord>> {
        let key = self.session_key();
        match self.store.get(&key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| BasketError::corrupted(key, e.to_string())),
        }
    }

    /// Writes the record for the current instance.
    pub fn put(&mut self, record: &BasketRecord) -> BasketResult<()> {
        let value = serde_json::to_value(record)?;
        self.store.put(&self.session_key(), value);
        Ok(())
    }

    /// Checks whether a record exists for the current instance.
    pub fn has(&self) -> bool {
        self.store.has(&self.session_key())
    }

    /// Removes the record for the current instance.
    pub fn forget(&mut self) {
        debug!(key = %self.session_key(), "forgetting basket record");
        self.store.forget(&self.session_key());
    }

    /// Flushes attributes to the durable backing.
    pub fn save(&mut self) {
        self.store.save();
    }

    /// Clears the whole session backend.
    pub fn flush(&mut self) {
        debug!(key = %self.key, "flushing session backend");
        self.store.flush();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use basket_core::{Money, Processor, Product, TaxRate};

    fn record() -> BasketRecord {
        let jurisdiction = Jurisdiction::germany();
        let mut basket = Basket::new(jurisdiction.clone());
        basket
            .add(
                Product::new(
                    "SKU1",
                    "Widget",
                    Money::from_minor(500),
                    TaxRate::from_bps(1900),
                )
                .unwrap(),
            )
            .unwrap();

        let raw_order = Processor::new().process(&basket);
        let order = Order::from_raw(&raw_order, &jurisdiction);

        BasketRecord {
            basket,
            raw_order,
            order,
            jurisdiction,
            saved_at: Utc::now(),
        }
    }

    fn storage() -> BasketStorage<MemoryStore> {
        BasketStorage::new(MemoryStore::default(), "basket", "main")
    }

    #[test]
    fn test_composite_session_key() {
        let storage = storage();
        assert_eq!(storage.session_key(), "basket.main");
    }

    #[test]
    fn test_put_get_round_trip() {
        let mut storage = storage();
        assert!(!storage.has());
        assert!(storage.get().unwrap().is_none());

        let record = record();
        storage.put(&record).unwrap();

        assert!(storage.has());
        assert_eq!(storage.get().unwrap().unwrap(), record);
    }

    #[test]
    fn test_set_instance_redirects_key_without_migrating() {
        let mut storage = storage();
        let record = record();
        storage.put(&record).unwrap();

        storage.set_instance("wishlist");
        assert_eq!(storage.session_key(), "basket.wishlist");
        assert!(!storage.has());

        // the record under the old key is untouched
        storage.set_instance("main");
        assert_eq!(storage.get().unwrap().unwrap(), record);
    }

    #[test]
    fn test_forget_removes_only_current_instance() {
        let mut storage = storage();
        let record = record();
        storage.put(&record).unwrap();

        storage.set_instance("wishlist");
        storage.put(&record).unwrap();
        storage.forget();
        assert!(!storage.has());

        storage.set_instance("main");
        assert!(storage.has());
    }

    #[test]
    fn test_corrupted_record_is_an_error_not_a_miss() {
        let mut store = MemoryStore::default();
        store.put("basket.main", Value::String("not a record".into()));

        let storage = BasketStorage::new(store, "basket", "main");
        assert!(storage.has());
        let err = storage.get().unwrap_err();
        assert!(matches!(err, BasketError::CorruptedRecord { .. }));
    }

    #[test]
    fn test_save_persists_across_requests() {
        let handler = MemoryHandler::new();

        let mut first = BasketStorage::new(MemoryStore::new(handler.clone()), "basket", "main");
        let record = record();
        first.put(&record).unwrap();
        first.save();

        // a second "request" over the same handler sees the saved record
        let second = BasketStorage::new(MemoryStore::new(handler.clone()), "basket", "main");
        assert_eq!(second.get().unwrap().unwrap(), record);
    }

    #[test]
    fn test_unsaved_put_is_request_scoped() {
        let handler = MemoryHandler::new();

        let mut first = BasketStorage::new(MemoryStore::new(handler.clone()), "basket", "main");
        first.put(&record()).unwrap();
        // no save()

        let second = BasketStorage::new(MemoryStore::new(handler), "basket", "main");
        assert!(!second.has());
    }

    #[test]
    fn test_flush_clears_durable_side() {
        let handler = MemoryHandler::new();

        let mut first = BasketStorage::new(MemoryStore::new(handler.clone()), "basket", "main");
        first.put(&record()).unwrap();
        first.save();
        first.flush();

        let second = BasketStorage::new(MemoryStore::new(handler), "basket", "main");
        assert!(!second.has());
    }
}
