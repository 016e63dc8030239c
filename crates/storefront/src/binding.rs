//! Store-to-view binding.
//!
//! Views never hold their own copy of cart or session state. They subscribe to
//! a store and receive the current snapshot immediately, then every committed
//! state after each mutation, synchronously and in subscription order.
//!
//! Callbacks are invoked after the store has released its state lock, so a
//! callback may read the store, mutate it, or unsubscribe itself. A callback
//! that panics is logged and skipped; the remaining subscribers still run.
//!
//! Committed states go through an [`Outbox`]. A mutation made from inside a
//! callback is queued and delivered once the current round has reached every
//! subscriber, so each subscriber sees states in commit order and the last
//! state it sees is the store's current one.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// An ordered list of observers for values of type `T`.
pub struct Subscribers<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.len())
            .finish()
    }
}

impl<T> Subscribers<T> {
    /// Create an empty observer list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    pub fn add<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Returns `false` if `id` was not registered.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `value` to a single subscriber, if it is still registered.
    pub fn notify_one(&self, id: SubscriptionId, value: &T) {
        let callback = self
            .lock()
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, cb)| Arc::clone(cb));
        if let Some(callback) = callback {
            invoke(id, &callback, value);
        }
    }

    /// Deliver `value` to every subscriber in registration order.
    ///
    /// Subscribers removed by an earlier callback in the same round are skipped.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<(SubscriptionId, Callback<T>)> = self
            .lock()
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();

        for (id, callback) in snapshot {
            let still_registered = self.lock().iter().any(|(existing, _)| *existing == id);
            if still_registered {
                invoke(id, &callback, value);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Callback<T>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn invoke<T>(id: SubscriptionId, callback: &Callback<T>, value: &T) {
    if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
        tracing::error!(subscription = %id, "Store subscriber panicked, continuing fan-out");
    }
}

/// FIFO queue of committed events awaiting delivery.
///
/// Stores push while holding their state lock, so queue order is commit order.
/// The first caller of [`drain`](Self::drain) delivers everything queued,
/// including events pushed while it runs. A nested or concurrent `drain`
/// returns at once and leaves its events to the active drainer.
pub struct Outbox<E> {
    state: Mutex<OutboxState<E>>,
}

struct OutboxState<E> {
    draining: bool,
    pending: VecDeque<E>,
}

impl<E> Default for Outbox<E> {
    fn default() -> Self {
        Self {
            state: Mutex::new(OutboxState {
                draining: false,
                pending: VecDeque::new(),
            }),
        }
    }
}

impl<E> fmt::Debug for Outbox<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Outbox")
            .field("draining", &state.draining)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl<E> Outbox<E> {
    /// Create an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event behind everything already pending.
    pub fn push(&self, event: E) {
        self.lock().pending.push_back(event);
    }

    /// Deliver pending events in order until the queue is empty.
    ///
    /// `deliver` must not panic; [`Subscribers::notify`] already contains
    /// subscriber panics.
    pub fn drain(&self, mut deliver: impl FnMut(E)) {
        {
            let mut state = self.lock();
            if state.draining {
                return;
            }
            state.draining = true;
        }

        loop {
            let next = {
                let mut state = self.lock();
                let next = state.pending.pop_front();
                // Cleared under the same lock as the final pop, so a concurrent
                // push either lands before it or finds the outbox idle.
                if next.is_none() {
                    state.draining = false;
                }
                next
            };
            match next {
                Some(event) => deliver(event),
                None => return,
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OutboxState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A store that views can subscribe to.
pub trait Observable {
    /// The state delivered to subscribers.
    type State: Clone + Send + Sync + 'static;

    /// The current committed state.
    fn snapshot(&self) -> Self::State;

    /// Subscribe to state changes.
    ///
    /// The callback receives the current state before this method returns,
    /// then every subsequent committed state.
    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Self::State) + Send + Sync + 'static;

    /// Stop receiving state changes. Unknown ids are ignored and return `false`.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl Fn(&i32) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v: &i32| sink.lock().unwrap().push(*v))
    }

    #[test]
    fn test_notify_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let subs = Subscribers::<i32>::new();
        for tag in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            subs.add(move |_| order.lock().unwrap().push(tag));
        }

        subs.notify(&1);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_unknown_id_is_false() {
        let subs = Subscribers::<i32>::new();
        let (_, cb) = recorder();
        let id = subs.add(cb);

        assert!(subs.remove(id));
        assert!(!subs.remove(id));
        assert!(subs.is_empty());
    }

    #[test]
    fn test_panicking_subscriber_does_not_stop_fanout() {
        let subs = Subscribers::<i32>::new();
        subs.add(|_| panic!("render failed"));
        let (seen, cb) = recorder();
        subs.add(cb);

        subs.notify(&5);
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }

    #[test]
    fn test_callback_can_unsubscribe_itself() {
        let subs = Arc::new(Subscribers::<i32>::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::default();

        let subs_in_cb = Arc::clone(&subs);
        let slot_in_cb = Arc::clone(&slot);
        let id = subs.add(move |_| {
            if let Some(id) = *slot_in_cb.lock().unwrap() {
                subs_in_cb.remove(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        subs.notify(&1);
        assert!(subs.is_empty());
    }

    #[test]
    fn test_outbox_delivers_nested_pushes_after_current_event() {
        let outbox = Arc::new(Outbox::<i32>::new());
        let (seen, record) = recorder();

        let inner = Arc::clone(&outbox);
        outbox.push(1);
        outbox.drain(|event| {
            record(&event);
            if event == 1 {
                inner.push(2);
                inner.push(3);
                // Already draining: returns without delivering.
                inner.drain(|_| unreachable!("nested drain must not deliver"));
                record(&-1);
            }
        });

        assert_eq!(*seen.lock().unwrap(), vec![1, -1, 2, 3]);
        assert_eq!(format!("{outbox:?}"), "Outbox { draining: false, pending: 0 }");
    }

    #[test]
    fn test_outbox_is_reusable_after_drain() {
        let outbox = Outbox::<i32>::new();
        let (seen, record) = recorder();

        outbox.push(1);
        outbox.drain(|e| record(&e));
        outbox.push(2);
        outbox.drain(|e| record(&e));

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_notify_one_targets_single_subscriber() {
        let subs = Subscribers::<i32>::new();
        let (first, cb1) = recorder();
        let (second, cb2) = recorder();
        let id1 = subs.add(cb1);
        subs.add(cb2);

        subs.notify_one(id1, &9);
        assert_eq!(*first.lock().unwrap(), vec![9]);
        assert!(second.lock().unwrap().is_empty());
    }
}
