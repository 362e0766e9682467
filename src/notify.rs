//! Locator-scoped change notification
//!
//! Process-wide publish/subscribe registry mapping locators to interested
//! observers. Publish is fire-and-forget: observers run synchronously in
//! registration order and their failures are logged, never propagated, so a
//! failing observer cannot abort delivery to later observers or fail the
//! triggering mutation.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::locator::Locator;

/// Error type observers may surface; publish logs and discards it.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Observer of locator-scoped changes.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, locator: &Locator) -> Result<(), ObserverError>;
}

/// Handle to one registration.
///
/// The notifier does not manage observer lifetime: a handle that is dropped
/// without `unsubscribe` leaks its registration for the life of the
/// process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
    locator: Locator,
}

impl Subscription {
    pub fn locator(&self) -> &Locator {
        &self.locator
    }
}

struct Registration {
    id: u64,
    locator: Locator,
    observer: Arc<dyn ChangeObserver>,
}

/// Registry mapping locators to interested observers.
pub struct ChangeNotifier {
    registrations: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            registrations: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register interest in a locator.
    pub fn subscribe(&self, locator: Locator, observer: Arc<dyn ChangeObserver>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registrations.lock().push(Registration {
            id,
            locator: locator.clone(),
            observer,
        });
        Subscription { id, locator }
    }

    /// Remove a registration. Unknown handles are a no-op.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        self.registrations.lock().retain(|r| r.id != subscription.id);
    }

    /// Deliver a change to every observer whose registered locator is an
    /// exact or segment-prefix match, synchronously, in registration order.
    pub fn publish(&self, locator: &Locator) {
        // Snapshot outside the lock so observers may subscribe/unsubscribe
        // reentrantly without deadlocking.
        let observers: Vec<Arc<dyn ChangeObserver>> = {
            let registrations = self.registrations.lock();
            registrations
                .iter()
                .filter(|r| r.locator.covers(locator))
                .map(|r| r.observer.clone())
                .collect()
        };

        for observer in observers {
            if let Err(e) = observer.on_change(locator) {
                log::warn!("Change observer failed for {}: {}", locator, e);
            }
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
