//! Callback fan-out used by durations, updatables and animations.
//!
//! Two flavours exist:
//! - [`Signal`] – repeatable; every subscriber is called on every emission
//!   until it is unsubscribed (duration completion, period boundaries, proxied ticks).
//! - [`OnceSignal`] – single-shot; the subscriber list is drained the first
//!   time it fires, and anyone subscribing afterwards is called immediately
//!   with the value it fired with (expiration, animation completion).
//!
//! Both are owned by the object that emits them and are emitted through
//! `&mut self`, so callbacks must not reach back into their owner.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Handle returned by every `subscribe`-style call; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn next() -> Self {
        SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

type Callback<T> = Box<dyn FnMut(T)>;
type OnceCallback<T> = Box<dyn FnOnce(T)>;

/// Repeatable signal.
pub struct Signal<T> {
    subscribers: SmallVec<[(SubscriptionId, Callback<T>); 2]>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Signal {
            subscribers: SmallVec::new(),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<T: Clone> Signal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(T) + 'static) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Calls every subscriber in subscription order.
    pub fn emit(&mut self, value: T) {
        for (_, cb) in self.subscribers.iter_mut() {
            cb(value.clone());
        }
    }
}

/// Single-shot broadcast.
pub struct OnceSignal<T> {
    subscribers: SmallVec<[(SubscriptionId, OnceCallback<T>); 2]>,
    fired: Option<T>,
}

impl<T> Default for OnceSignal<T> {
    fn default() -> Self {
        OnceSignal {
            subscribers: SmallVec::new(),
            fired: None,
        }
    }
}

impl<T> fmt::Debug for OnceSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceSignal")
            .field("subscribers", &self.subscribers.len())
            .field("fired", &self.fired.is_some())
            .finish()
    }
}

impl<T: Clone> OnceSignal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.fired.is_some()
    }

    /// Number of subscribers still waiting for the signal.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Queues `callback`, or runs it right away if the signal already fired.
    ///
    /// Returns `None` when the callback ran immediately.
    pub fn subscribe(&mut self, callback: impl FnOnce(T) + 'static) -> Option<SubscriptionId> {
        if let Some(value) = &self.fired {
            callback(value.clone());
            return None;
        }
        let id = SubscriptionId::next();
        self.subscribers.push((id, Box::new(callback)));
        Some(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Fires the signal. Returns `false` (and calls nobody) if it already fired.
    pub fn fire(&mut self, value: T) -> bool {
        if self.fired.is_some() {
            return false;
        }
        self.fired = Some(value.clone());
        let subscribers = std::mem::take(&mut self.subscribers);
        for (_, cb) in subscribers {
            cb(value.clone());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_signal_calls_every_subscriber_each_emit() {
        let hits = Rc::new(Cell::new(0));
        let mut signal = Signal::new();
        for _ in 0..2 {
            let hits = hits.clone();
            signal.subscribe(move |n: u32| hits.set(hits.get() + n));
        }
        signal.emit(1);
        signal.emit(10);
        assert_eq!(hits.get(), 22);
    }

    #[test]
    fn test_signal_unsubscribe() {
        let hits = Rc::new(Cell::new(0));
        let mut signal = Signal::new();
        let h = hits.clone();
        let id = signal.subscribe(move |_: ()| h.set(h.get() + 1));
        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        signal.emit(());
        assert_eq!(hits.get(), 0);
        assert!(signal.is_empty());
    }

    #[test]
    fn test_once_signal_fires_once_and_drains() {
        let hits = Rc::new(Cell::new(0));
        let mut signal = OnceSignal::new();
        let h = hits.clone();
        signal.subscribe(move |_: ()| h.set(h.get() + 1));
        assert_eq!(signal.len(), 1);

        assert!(signal.fire(()));
        assert!(!signal.fire(()));
        assert_eq!(hits.get(), 1);
        assert!(signal.is_empty());
    }

    #[test]
    fn test_once_signal_late_subscriber_runs_immediately() {
        let seen = Rc::new(Cell::new(0));
        let mut signal = OnceSignal::new();
        signal.fire(7);
        let s = seen.clone();
        assert!(signal.subscribe(move |v| s.set(v)).is_none());
        assert_eq!(seen.get(), 7);
    }
}
