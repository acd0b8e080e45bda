//! # Lifecycle Events
//!
//! Two events mark the manager's create-or-restore transition:
//! `basket.created` when a fresh basket is built for an instance, and
//! `basket.restored` when one is rebuilt from storage. Exactly one of the
//! two fires per resolution.
//!
//! Dispatch is fire-and-forget: the manager never reads a result, and a
//! dispatcher must not fail.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use basket_core::Order;

/// Wire name of the creation event.
pub const BASKET_CREATED: &str = "basket.created";

/// Wire name of the restoration event.
pub const BASKET_RESTORED: &str = "basket.restored";

// =============================================================================
// Event
// =============================================================================

/// A basket lifecycle event with the resolved order payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event", content = "payload")]
pub enum BasketEvent {
    /// A fresh basket was created for `instance`.
    Created { instance: String, order: Order },

    /// A stored basket was restored for `instance`.
    Restored { instance: String, order: Order },
}

impl BasketEvent {
    /// Returns the event's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            BasketEvent::Created { .. } => BASKET_CREATED,
            BasketEvent::Restored { .. } => BASKET_RESTORED,
        }
    }

    /// Returns the instance the event refers to.
    pub fn instance(&self) -> &str {
        match self {
            BasketEvent::Created { instance, .. } | BasketEvent::Restored { instance, .. } => {
                instance
            }
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Receives lifecycle events.
///
/// Host applications bridge this to their own event bus. Dispatch must be
/// cheap and must not fail; the manager fires and moves on.
pub trait EventDispatcher {
    /// Handles one event.
    fn dispatch(&self, event: &BasketEvent);
}

/// Swallows every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl EventDispatcher for NoopDispatcher {
    fn dispatch(&self, event: &BasketEvent) {
        debug!(event = event.name(), instance = event.instance(), "basket event");
    }
}

/// Buffers every event for later inspection.
///
/// ## Thread Safety
/// The buffer is `Arc<Mutex<_>>` so the dispatcher can be cloned into a
/// manager while the test (or demo) keeps a handle to read it back.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    events: Arc<Mutex<Vec<BasketEvent>>>,
}

impl RecordingDispatcher {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        RecordingDispatcher::default()
    }

    /// Returns a copy of everything dispatched so far.
    pub fn events(&self) -> Vec<BasketEvent> {
        self.events.lock().expect("event buffer mutex poisoned").clone()
    }

    /// Returns the wire names of everything dispatched so far.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.name()).collect()
    }
}

impl EventDispatcher for RecordingDispatcher {
    fn dispatch(&self, event: &BasketEvent) {
        debug!(event = event.name(), instance = event.instance(), "basket event");
        self.events
            .lock()
            .expect("event buffer mutex poisoned")
            .push(event.clone());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order {
            currency: "EUR".to_string(),
            delivery: 0,
            discount: 0,
            products_count: 0,
            subtotal: 0,
            taxable: 0,
            tax: 0,
            total: 0,
            value: 0,
            products: Vec::new(),
        }
    }

    #[test]
    fn test_event_names() {
        let created = BasketEvent::Created {
            instance: "main".to_string(),
            order: order(),
        };
        let restored = BasketEvent::Restored {
            instance: "main".to_string(),
            order: order(),
        };

        assert_eq!(created.name(), "basket.created");
        assert_eq!(restored.name(), "basket.restored");
    }

    #[test]
    fn test_recording_dispatcher_buffers_in_order() {
        let dispatcher = RecordingDispatcher::new();
        dispatcher.dispatch(&BasketEvent::Created {
            instance: "main".to_string(),
            order: order(),
        });
        dispatcher.dispatch(&BasketEvent::Restored {
            instance: "main".to_string(),
            order: order(),
        });

        assert_eq!(dispatcher.names(), vec!["basket.created", "basket.restored"]);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let dispatcher = RecordingDispatcher::new();
        let clone = dispatcher.clone();
        clone.dispatch(&BasketEvent::Created {
            instance: "main".to_string(),
            order: order(),
        });

        assert_eq!(dispatcher.events().len(), 1);
    }
}
