//! Triggers: long-lived event sources that notify attached observers.
//!
//! A trigger moves through `CREATED -> STARTED -> STOPPED` and may be
//! started again after a stop. Observers are attached by reference; the same
//! observer attached twice is notified once.

mod interval;

pub use interval::{IntervalParams, IntervalTrigger};

use std::sync::{Arc, PoisonError, RwLock};

/// Receives trigger firings.
///
/// Implementations must return quickly: the trigger calls observers one
/// after another from its own task. Long work belongs in a spawned task.
pub trait TriggerObserver: Send + Sync {
    fn on_trigger_fired(self: Arc<Self>, trigger_id: &str);
}

/// The set of observers attached to one trigger.
///
/// Clones share the same list, so a trigger can hand a clone to its
/// background task.
#[derive(Clone, Default)]
pub struct Observers {
    inner: Arc<RwLock<Vec<Arc<dyn TriggerObserver>>>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `observer` unless it is already attached.
    pub fn attach(&self, observer: Arc<dyn TriggerObserver>) {
        let mut observers = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !observers.iter().any(|existing| same_observer(existing, &observer)) {
            observers.push(observer);
        }
    }

    pub fn detach(&self, observer: &Arc<dyn TriggerObserver>) {
        let mut observers = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        observers.retain(|existing| !same_observer(existing, observer));
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every attached observer with `trigger_id`.
    ///
    /// The list is snapshotted first, so observers may attach or detach
    /// while being notified.
    pub fn notify(&self, trigger_id: &str) {
        let snapshot: Vec<_> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for observer in snapshot {
            observer.on_trigger_fired(trigger_id);
        }
    }
}

fn same_observer(a: &Arc<dyn TriggerObserver>, b: &Arc<dyn TriggerObserver>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// A subject that observers can attach to.
pub trait Trigger: Send + Sync {
    fn id(&self) -> &str;

    fn observers(&self) -> &Observers;

    /// Begin firing. Starting a running trigger does nothing.
    fn start(&self);

    /// Stop firing and cancel any pending wait.
    fn stop(&self);

    fn is_running(&self) -> bool;

    fn attach(&self, observer: Arc<dyn TriggerObserver>) {
        self.observers().attach(observer);
    }

    fn detach(&self, observer: &Arc<dyn TriggerObserver>) {
        self.observers().detach(observer);
    }

    /// Fire once, right now.
    fn notify(&self) {
        self.observers().notify(self.id());
    }

    fn observer_count(&self) -> usize {
        self.observers().len()
    }
}
