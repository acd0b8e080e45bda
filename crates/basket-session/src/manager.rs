//! # Basket Manager
//!
//! The entry point of the session layer: one manager per request context.
//!
//! ## Lifecycle State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Create-or-Restore Lifecycle                          │
//! │                                                                         │
//! │                      ┌───────────────┐                                  │
//! │                      │ Uninitialized │                                  │
//! │                      └───────┬───────┘                                  │
//! │                              │ first forwarded operation                │
//! │                   ┌──────────┴──────────┐                               │
//! │        storage.has()                 !storage.has()                     │
//! │                   │                     │                               │
//! │                   ▼                     ▼                               │
//! │        decode record,          fresh aggregate under the                │
//! │        rebind + reconcile      default jurisdiction                     │
//! │        persist                 persist                                  │
//! │        fire basket.restored    fire basket.created                      │
//! │                   │                     │                               │
//! │                   └──────────┬──────────┘                               │
//! │                              ▼                                          │
//! │                   ┌─────────────────────┐                               │
//! │                   │ Resolved(factory)   │ ── cached for the manager's  │
//! │                   └─────────────────────┘    lifetime (or until the    │
//! │                                              instance changes)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one of the two events fires per resolution. Every mutating
//! operation afterwards is: delegate to the factory, then persist - the
//! stored record never drifts from memory across an operation boundary.
//!
//! ## Concurrency
//! One manager per request, discarded at the end of it. The durable session
//! backing may be shared between concurrent requests for the same instance;
//! there is no cross-request locking, and the last `save` wins. Hosts that
//! need stronger guarantees must serialize requests per session themselves.

use tracing::{debug, info};

use basket_core::{
    Basket, CoreResult, Discount, Jurisdiction, Money, Order, Product, ProductAction,
};

use crate::config::BasketConfig;
use crate::error::{BasketError, BasketResult};
use crate::events::{BasketEvent, EventDispatcher};
use crate::factory::BasketFactory;
use crate::storage::{BasketStorage, SessionBackend};

// =============================================================================
// Basket Manager
// =============================================================================

/// Session-scoped basket entry point.
///
/// Generic over the session backend and the event dispatcher so hosts plug
/// in their own; tests run on [`MemoryStore`] and [`RecordingDispatcher`].
///
/// [`MemoryStore`]: crate::storage::MemoryStore
/// [`RecordingDispatcher`]: crate::events::RecordingDispatcher
#[derive(Debug)]
pub struct BasketManager<S: SessionBackend, D: EventDispatcher> {
    storage: BasketStorage<S>,
    dispatcher: D,
    jurisdiction: Jurisdiction,
    factory: Option<BasketFactory>,
}

impl<S: SessionBackend, D: EventDispatcher> BasketManager<S, D> {
    /// Creates an unresolved manager.
    ///
    /// Nothing touches storage until the first forwarded operation.
    pub fn new(storage: BasketStorage<S>, dispatcher: D, jurisdiction: Jurisdiction) -> Self {
        BasketManager {
            storage,
            dispatcher,
            jurisdiction,
            factory: None,
        }
    }

    /// Creates a manager from configuration and a backend.
    pub fn from_config(config: &BasketConfig, store: S, dispatcher: D) -> BasketResult<Self> {
        let jurisdiction = config.jurisdiction()?;
        let storage = BasketStorage::new(store, config.session_key.clone(), config.instance.clone());

        Ok(BasketManager::new(storage, dispatcher, jurisdiction))
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Returns the resolved factory, running the create-or-restore
    /// transition if this manager has not resolved one yet.
    fn resolve(&mut self) -> BasketResult<&mut BasketFactory> {
        if self.factory.is_none() {
            self.initialize()?;
        }

        // the guard above always fills the slot
        Ok(self.factory.as_mut().expect("factory resolved above"))
    }

    /// The create-or-restore transition. Runs at most once per resolution.
    fn initialize(&mut self) -> BasketResult<()> {
        if self.storage.has() {
            let record = self
                .storage
                .get()?
                .ok_or_else(|| BasketError::not_found(self.storage.session_key()))?;

            let mut factory = BasketFactory::from_record(record);
            // rebinding re-runs the pipeline so the snapshots reflect this
            // process, then persists through the current storage
            factory.reconcile();

            self.persist(&factory)?;
            info!(instance = %self.storage.instance(), "restored basket from session");

            let event = BasketEvent::Restored {
                instance: self.storage.instance().to_string(),
                order: factory.order().clone(),
            };
            self.factory = Some(factory);
            self.dispatcher.dispatch(&event);
        } else {
            let factory = BasketFactory::new(self.jurisdiction.clone());

            self.persist(&factory)?;
            info!(instance = %self.storage.instance(), "created new basket");

            let event = BasketEvent::Created {
                instance: self.storage.instance().to_string(),
                order: factory.order().clone(),
            };
            self.factory = Some(factory);
            self.dispatcher.dispatch(&event);
        }

        Ok(())
    }

    fn persist(&mut self, factory: &BasketFactory) -> BasketResult<()> {
        self.storage.put(&factory.to_record())?;
        self.storage.save();
        Ok(())
    }

    /// Writes the resolved factory's record back to storage.
    fn commit(&mut self) -> BasketResult<()> {
        if let Some(ref factory) = self.factory {
            let record = factory.to_record();
            self.storage.put(&record)?;
            self.storage.save();
        }

        Ok(())
    }

    // =========================================================================
    // Instance & Jurisdiction
    // =========================================================================

    /// Returns the current instance identifier.
    pub fn instance(&self) -> &str {
        self.storage.instance()
    }

    /// Targets a different basket slot.
    ///
    /// The manager returns to the unresolved state: the next operation
    /// create-or-restores under the new key. The record under the previous
    /// key stays as it was.
    pub fn set_instance(&mut self, instance: impl Into<String>) {
        let instance = instance.into();
        debug!(from = %self.storage.instance(), to = %instance, "switching basket instance");
        self.storage.set_instance(instance);
        self.factory = None;
    }

    /// Returns the default jurisdiction for newly created baskets.
    pub fn jurisdiction(&self) -> &Jurisdiction {
        &self.jurisdiction
    }

    /// Sets the default jurisdiction for newly created baskets.
    ///
    /// An already-resolved factory keeps the jurisdiction it was created
    /// under; jurisdictions are fixed per basket lifetime.
    pub fn set_jurisdiction(&mut self, jurisdiction: Jurisdiction) {
        self.jurisdiction = jurisdiction;
    }

    /// Read access to the storage adapter.
    pub fn storage(&self) -> &BasketStorage<S> {
        &self.storage
    }

    // =========================================================================
    // Explicit Lifecycle
    // =========================================================================

    /// Restores the basket stored under the given instance.
    ///
    /// Unlike the lazy flow this never creates: a missing record is a
    /// [`BasketError::NotFound`].
    pub fn load(&mut self, instance: impl Into<String>) -> BasketResult<()> {
        self.set_instance(instance);

        if !self.storage.has() {
            return Err(BasketError::not_found(self.storage.session_key()));
        }

        self.resolve()?;
        Ok(())
    }

    /// Removes the record for the current instance and unresolves.
    ///
    /// The next operation takes the create path.
    pub fn forget(&mut self) {
        self.storage.forget();
        self.storage.save();
        self.factory = None;
    }

    /// Clears the whole session backend and unresolves.
    pub fn flush(&mut self) {
        self.storage.flush();
        self.factory = None;
    }

    // =========================================================================
    // Mutations (resolve → delegate → persist)
    // =========================================================================

    /// Adds a product line.
    pub fn add(&mut self, product: Product) -> BasketResult<()> {
        self.resolve()?.add(product)?;
        self.commit()
    }

    /// Runs a mutation against the line with the given sku.
    pub fn update<F>(&mut self, sku: &str, f: F) -> BasketResult<()>
    where
        F: FnOnce(&mut Product) -> CoreResult<()>,
    {
        self.resolve()?.update(sku, f)?;
        self.commit()
    }

    /// Removes and returns the line with the given sku.
    pub fn remove(&mut self, sku: &str) -> BasketResult<Product> {
        let removed = self.resolve()?.remove(sku)?;
        self.commit()?;
        Ok(removed)
    }

    /// Attaches a discount to every current line.
    pub fn discount(&mut self, discount: Discount) -> BasketResult<()> {
        self.resolve()?.discount(discount);
        self.commit()
    }

    /// Sets the basket-level delivery fee.
    pub fn delivery_fee(&mut self, fee: Money) -> BasketResult<()> {
        self.resolve()?.delivery_fee(fee);
        self.commit()
    }

    /// Adds one unit to the line with the given sku.
    pub fn increment(&mut self, sku: &str) -> BasketResult<()> {
        self.resolve()?.increment(sku)?;
        self.commit()
    }

    /// Removes one unit from the line with the given sku.
    pub fn decrement(&mut self, sku: &str) -> BasketResult<()> {
        self.resolve()?.decrement(sku)?;
        self.commit()
    }

    /// Sets the quantity of the line with the given sku.
    pub fn set_quantity(&mut self, sku: &str, quantity: i64) -> BasketResult<()> {
        self.resolve()?.set_quantity(sku, quantity)?;
        self.commit()
    }

    /// Builds and adds a line in one call.
    pub fn add_quick(
        &mut self,
        sku: &str,
        name: &str,
        price_minor: i64,
        actions: &[ProductAction],
    ) -> BasketResult<()> {
        self.resolve()?.add_quick(sku, name, price_minor, actions)?;
        self.commit()
    }

    /// Applies an ordered action sequence to an existing line.
    pub fn update_quick(&mut self, sku: &str, actions: &[ProductAction]) -> BasketResult<()> {
        self.resolve()?.update_quick(sku, actions)?;
        self.commit()
    }

    // =========================================================================
    // Reads (resolve → read; first access may still create)
    // =========================================================================

    /// Checks whether a line with the given sku exists.
    pub fn has(&mut self, sku: &str) -> BasketResult<bool> {
        Ok(self.resolve()?.has(sku))
    }

    /// Returns a copy of the line with the given sku.
    pub fn pick(&mut self, sku: &str) -> BasketResult<Product> {
        Ok(self.resolve()?.pick(sku)?.clone())
    }

    /// Returns the number of distinct lines.
    pub fn count(&mut self) -> BasketResult<usize> {
        Ok(self.resolve()?.count())
    }

    /// Returns the lines in insertion order.
    pub fn products(&mut self) -> BasketResult<&[Product]> {
        Ok(self.resolve()?.products())
    }

    /// The full plain snapshot of the last reconciliation.
    pub fn order(&mut self) -> BasketResult<&Order> {
        Ok(self.resolve()?.order())
    }

    /// Delivery total in minor units.
    pub fn delivery(&mut self) -> BasketResult<i64> {
        Ok(self.resolve()?.delivery())
    }

    /// Discount total in minor units.
    pub fn discount_total(&mut self) -> BasketResult<i64> {
        Ok(self.resolve()?.discount_total())
    }

    /// Total units across all lines.
    pub fn products_count(&mut self) -> BasketResult<i64> {
        Ok(self.resolve()?.products_count())
    }

    /// Subtotal in minor units.
    pub fn subtotal(&mut self) -> BasketResult<i64> {
        Ok(self.resolve()?.subtotal())
    }

    /// Number of tax-producing lines.
    pub fn taxable(&mut self) -> BasketResult<i64> {
        Ok(self.resolve()?.taxable())
    }

    /// Tax total in minor units.
    pub fn tax(&mut self) -> BasketResult<i64> {
        Ok(self.resolve()?.tax())
    }

    /// Grand total in minor units.
    pub fn total(&mut self) -> BasketResult<i64> {
        Ok(self.resolve()?.total())
    }

    /// Gross value in minor units.
    pub fn value(&mut self) -> BasketResult<i64> {
        Ok(self.resolve()?.value())
    }

    /// The underlying aggregate of the resolved basket.
    pub fn basket(&mut self) -> BasketResult<&Basket> {
        Ok(self.resolve()?.basket())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingDispatcher;
    use crate::storage::{MemoryHandler, MemoryStore};

    type TestManager = BasketManager<MemoryStore, RecordingDispatcher>;

    fn manager_over(handler: MemoryHandler, events: RecordingDispatcher) -> TestManager {
        let storage = BasketStorage::new(MemoryStore::new(handler), "basket", "main");
        BasketManager::new(storage, events, Jurisdiction::zero_rated(basket_core::Currency::Eur))
    }

    fn manager() -> (TestManager, RecordingDispatcher) {
        let events = RecordingDispatcher::new();
        (manager_over(MemoryHandler::new(), events.clone()), events)
    }

    #[test]
    fn test_construction_does_not_touch_storage() {
        let (mut manager, events) = manager();
        assert!(events.events().is_empty());
        assert!(!manager.storage.has());

        // first forwarded operation resolves
        manager.count().unwrap();
        assert_eq!(events.names(), vec!["basket.created"]);
    }

    #[test]
    fn test_first_access_creates_exactly_once() {
        let (mut manager, events) = manager();
        manager.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        manager.increment("SKU1").unwrap();
        manager.total().unwrap();

        assert_eq!(events.names(), vec!["basket.created"]);
    }

    #[test]
    fn test_second_manager_restores_exactly_once() {
        let handler = MemoryHandler::new();

        let first_events = RecordingDispatcher::new();
        let mut first = manager_over(handler.clone(), first_events.clone());
        first.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        assert_eq!(first_events.names(), vec!["basket.created"]);

        let second_events = RecordingDispatcher::new();
        let mut second = manager_over(handler, second_events.clone());
        assert_eq!(second.total().unwrap(), 500);
        assert_eq!(second.products_count().unwrap(), 1);
        assert_eq!(second_events.names(), vec!["basket.restored"]);
    }

    #[test]
    fn test_add_quick_zero_rated_scenario() {
        let (mut manager, _) = manager();
        manager.add_quick("SKU1", "Widget", 500, &[]).unwrap();

        assert_eq!(manager.total().unwrap(), 500);
        assert_eq!(manager.products_count().unwrap(), 1);
        assert_eq!(manager.tax().unwrap(), 0);
    }

    #[test]
    fn test_increment_scenario() {
        let (mut manager, _) = manager();
        manager.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        manager.increment("SKU1").unwrap();

        assert_eq!(manager.products_count().unwrap(), 2);
        assert_eq!(manager.subtotal().unwrap(), 1000);
    }

    #[test]
    fn test_memory_and_storage_never_drift() {
        let (mut manager, _) = manager();

        manager.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        let stored = manager.storage().get().unwrap().unwrap();
        assert_eq!(&stored.order, manager.order().unwrap());

        manager.increment("SKU1").unwrap();
        let stored = manager.storage().get().unwrap().unwrap();
        assert_eq!(&stored.order, manager.order().unwrap());
        assert_eq!(stored.basket, *manager.basket().unwrap());

        manager.remove("SKU1").unwrap();
        let stored = manager.storage().get().unwrap().unwrap();
        assert_eq!(&stored.order, manager.order().unwrap());
        assert_eq!(stored.jurisdiction, *manager.jurisdiction());
    }

    #[test]
    fn test_failed_mutation_leaves_stored_record_intact() {
        let (mut manager, _) = manager();
        manager.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        let before = manager.storage().get().unwrap().unwrap();

        assert!(manager.increment("missing").is_err());
        let after = manager.storage().get().unwrap().unwrap();
        assert_eq!(before.order, after.order);
        assert_eq!(before.basket, after.basket);
    }

    #[test]
    fn test_set_instance_redirects_without_touching_old_key() {
        let (mut manager, events) = manager();
        manager.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        let main_record = manager.storage().get().unwrap().unwrap();

        manager.set_instance("wishlist");
        manager.add_quick("SKU2", "Gadget", 900, &[]).unwrap();

        assert_eq!(manager.instance(), "wishlist");
        assert_eq!(manager.total().unwrap(), 900);
        // one creation per slot
        assert_eq!(events.names(), vec!["basket.created", "basket.created"]);

        // the record under the old key is unchanged
        manager.set_instance("main");
        assert_eq!(
            manager.storage().get().unwrap().unwrap().order,
            main_record.order
        );
        assert_eq!(manager.total().unwrap(), 500);
    }

    #[test]
    fn test_forget_forces_create_path() {
        let (mut manager, events) = manager();
        manager.add_quick("SKU1", "Widget", 500, &[]).unwrap();

        manager.forget();
        assert!(!manager.storage().has());

        assert_eq!(manager.total().unwrap(), 0);
        assert_eq!(events.names(), vec!["basket.created", "basket.created"]);
    }

    #[test]
    fn test_load_missing_instance_fails() {
        let (mut manager, _) = manager();
        let err = manager.load("nothing-here").unwrap_err();
        assert!(matches!(err, BasketError::NotFound { .. }));
        assert_eq!(
            err.to_string(),
            "No basket found for the identifier [basket.nothing-here]"
        );
    }

    #[test]
    fn test_load_existing_instance_restores() {
        let handler = MemoryHandler::new();
        let mut first = manager_over(handler.clone(), RecordingDispatcher::new());
        first.set_instance("wishlist");
        first.add_quick("SKU1", "Widget", 500, &[]).unwrap();

        let events = RecordingDispatcher::new();
        let mut second = manager_over(handler, events.clone());
        second.load("wishlist").unwrap();

        assert_eq!(events.names(), vec!["basket.restored"]);
        assert_eq!(second.total().unwrap(), 500);
        // load resolved already; the read above forwarded to the cache
        assert_eq!(events.events().len(), 1);
    }

    #[test]
    fn test_restore_persists_through_current_storage() {
        let handler = MemoryHandler::new();
        let mut first = manager_over(handler.clone(), RecordingDispatcher::new());
        first.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        let saved_before = first.storage().get().unwrap().unwrap().saved_at;

        let mut second = manager_over(handler, RecordingDispatcher::new());
        second.count().unwrap();
        let saved_after = second.storage().get().unwrap().unwrap().saved_at;

        assert!(saved_after >= saved_before);
    }

    #[test]
    fn test_jurisdiction_applies_to_next_created_basket() {
        let (mut manager, _) = manager();
        manager.set_jurisdiction(Jurisdiction::germany());
        manager.add_quick("SKU1", "Widget", 1000, &[]).unwrap();

        assert_eq!(manager.tax().unwrap(), 190);
        assert_eq!(manager.order().unwrap().currency, "EUR");
    }

    #[test]
    fn test_update_quick_tag_scenario() {
        let (mut manager, _) = manager();
        manager.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        manager
            .update_quick("SKU1", &[ProductAction::tag("sale")])
            .unwrap();

        let line = manager.pick("SKU1").unwrap();
        assert!(line.tags.contains("sale"));
        assert_eq!(manager.total().unwrap(), 500);
    }

    #[test]
    fn test_discount_and_delivery_surface() {
        let (mut manager, _) = manager();
        manager.add_quick("SKU1", "Widget", 1000, &[]).unwrap();

        manager
            .discount(Discount::Percentage { bps: 1000 })
            .unwrap();
        manager.delivery_fee(Money::from_minor(250)).unwrap();

        assert_eq!(manager.discount_total().unwrap(), 100);
        assert_eq!(manager.delivery().unwrap(), 250);
        assert_eq!(manager.total().unwrap(), 1150);
        assert_eq!(manager.value().unwrap(), 1000);
    }

    #[test]
    fn test_count_vs_products_count() {
        let (mut manager, _) = manager();
        manager.add_quick("SKU1", "Widget", 500, &[]).unwrap();
        manager.add_quick("SKU2", "Gadget", 900, &[]).unwrap();
        manager.set_quantity("SKU1", 3).unwrap();

        assert_eq!(manager.count().unwrap(), 2); // distinct lines
        assert_eq!(manager.products_count().unwrap(), 4); // total units
    }
}
