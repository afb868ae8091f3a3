//! Observer channel for engine state changes.
//!
//! Push model: subscribers register a callback and are notified
//! synchronously at the point of mutation. Subscriptions are identified
//! by an [`ObserverId`] handle for later removal.
//!
//! Callback order is FIFO (first-subscribed, first-called). Callbacks
//! must not call back into the bus; the registry lock is held while they
//! run.

use std::sync::{Arc, Mutex};

/// State change pushed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Playback position moved, ms.
    PositionChanged(i64),
    /// Timeline extent changed, ms.
    LengthChanged(i64),
}

/// Handle identifying a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback = Box<dyn FnMut(EngineEvent) + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: Vec<(u64, Callback)>,
}

/// Synchronous observer registry. Cloning yields another handle onto the
/// same subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it fires synchronously on every emit.
    pub fn subscribe<F>(&self, callback: F) -> ObserverId
    where
        F: FnMut(EngineEvent) + Send + 'static,
    {
        let mut reg = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = reg.next_id;
        reg.next_id += 1;
        reg.observers.push((id, Box::new(callback)));
        ObserverId(id)
    }

    /// Drop the subscription behind `id`. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ObserverId) {
        let mut reg = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        reg.observers.retain(|(oid, _)| *oid != id.0);
    }

    /// Notify every observer, in subscription order.
    pub fn emit(&self, event: EngineEvent) {
        let mut reg = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        for (_, callback) in reg.observers.iter_mut() {
            callback(event);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .observers
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn test_subscribe_emit() {
        let bus = EventBus::new();
        let seen = Arc::new(AtomicI64::new(0));
        let s = Arc::clone(&seen);

        bus.subscribe(move |e| {
            if let EngineEvent::PositionChanged(p) = e {
                s.store(p, Ordering::SeqCst);
            }
        });

        bus.emit(EngineEvent::PositionChanged(1234));
        assert_eq!(seen.load(Ordering::SeqCst), 1234);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicI64::new(0));
        let c = Arc::clone(&count);

        let id = bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(EngineEvent::LengthChanged(10));
        bus.unsubscribe(id);
        bus.emit(EngineEvent::LengthChanged(20));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.observer_count(), 0);
    }

    #[test]
    fn test_multiple_observers_fifo() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        bus.subscribe(move |_| o.lock().unwrap().push("first"));
        let o = Arc::clone(&order);
        bus.subscribe(move |_| o.lock().unwrap().push("second"));

        bus.emit(EngineEvent::PositionChanged(0));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_cloned_handle_shares_registry() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicI64::new(0));
        let c = Arc::clone(&count);

        bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let handle = bus.clone();
        handle.emit(EngineEvent::PositionChanged(5));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
