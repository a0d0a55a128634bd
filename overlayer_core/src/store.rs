// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-side subscription protocol.
//!
//! A rendering surface talks to a store through two primitives:
//!
//! - [`subscribe`](ExternalStore::subscribe) registers a zero-argument
//!   [`Listener`] and returns a [`Subscription`] that removes exactly that
//!   listener when unsubscribed (or dropped).
//! - [`snapshot`](ExternalStore::snapshot) returns the current value by
//!   identity. Two reads with no mutation in between return identical
//!   snapshots ([`same_snapshot`](ExternalStore::same_snapshot) is `true`), so
//!   a surface can skip re-rendering on spurious notifications.
//!
//! [`StoreBinding`] packages both into the object a surface keeps while it is
//! mounted: it subscribes once, remembers the last snapshot it observed, and
//! reports whether a [`refresh`](StoreBinding::refresh) produced a new one.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;
use core::ops::Deref;

use crate::layer::{Layer, LayerKey};

/// Zero-argument change callback.
///
/// Identity is the allocation: subscribing the same `Rc` twice collapses into
/// one registration.
pub type Listener = Rc<dyn Fn()>;

/// Identity of a registered listener.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

/// An immutable, ordered view of the registry's layers.
///
/// Every mutation publishes a new snapshot; existing snapshots are never
/// modified. Compare snapshots with [`ptr_eq`](Self::ptr_eq), not by
/// contents.
pub struct Snapshot<V>(Rc<[Layer<V>]>);

impl<V> Snapshot<V> {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self(Rc::from(alloc::vec::Vec::new()))
    }

    pub(crate) fn from_layers(layers: Rc<[Layer<V>]>) -> Self {
        Self(layers)
    }

    /// Returns whether both snapshots are the same published value.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the layers as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Layer<V>] {
        &self.0
    }

    /// Iterates over layer keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &LayerKey> + '_ {
        self.0.iter().map(Layer::key)
    }
}

impl<V> Clone for Snapshot<V> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<V> Default for Snapshot<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V> Deref for Snapshot<V> {
    type Target = [Layer<V>];

    fn deref(&self) -> &[Layer<V>] {
        &self.0
    }
}

impl<V> fmt::Debug for Snapshot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(Layer::key)).finish()
    }
}

/// Capability that removes one listener from a store.
///
/// [`unsubscribe`](Self::unsubscribe) is idempotent: the first call removes
/// the listener, later calls do nothing. Dropping an active subscription
/// unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    listener: ListenerId,
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a subscription that runs `detach` on the first unsubscribe.
    ///
    /// Store implementations use this to hand out their removal capability.
    pub fn new(listener: ListenerId, detach: impl FnOnce() + 'static) -> Self {
        Self {
            listener,
            detach: Some(Box::new(detach)),
        }
    }

    /// Returns the identity of the subscribed listener.
    #[inline]
    #[must_use]
    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    /// Returns whether this subscription has not been unsubscribed yet.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }

    /// Removes the listener. Further calls are no-ops.
    pub fn unsubscribe(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &self.listener)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A store that surfaces can subscribe to.
pub trait ExternalStore {
    /// The value handed to readers. Cheap to clone.
    type Snapshot: Clone;

    /// Registers `on_change` to run after every change.
    fn subscribe(&self, on_change: Listener) -> Subscription;

    /// Returns the current value.
    fn snapshot(&self) -> Self::Snapshot;

    /// Returns whether two snapshots are the same published value.
    fn same_snapshot(a: &Self::Snapshot, b: &Self::Snapshot) -> bool;
}

/// A surface's live connection to an [`ExternalStore`].
///
/// The binding subscribes on construction. Each notification marks it stale
/// and runs the optional wake callback; the surface then calls
/// [`refresh`](Self::refresh) to pull the latest snapshot. Dropping the
/// binding unsubscribes.
pub struct StoreBinding<S: ExternalStore> {
    store: S,
    current: S::Snapshot,
    stale: Rc<Cell<bool>>,
    subscription: Subscription,
}

impl<S: ExternalStore> StoreBinding<S> {
    /// Subscribes to `store` and reads its current snapshot.
    pub fn new(store: S) -> Self {
        Self::with_wake(store, || {})
    }

    /// Like [`new`](Self::new), additionally running `wake` after every
    /// notification.
    ///
    /// `wake` runs inside the store's notification and must not expect the
    /// binding to have refreshed yet.
    pub fn with_wake(store: S, wake: impl Fn() + 'static) -> Self {
        let stale = Rc::new(Cell::new(false));
        let flag = Rc::clone(&stale);
        let subscription = store.subscribe(Rc::new(move || {
            flag.set(true);
            wake();
        }));
        // Read after subscribing so a change in between is not missed.
        let current = store.snapshot();
        Self {
            store,
            current,
            stale,
            subscription,
        }
    }

    /// Returns the snapshot observed by the last refresh.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &S::Snapshot {
        &self.current
    }

    /// Returns whether a notification arrived since the last refresh.
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale.get()
    }

    /// Re-reads the store. Returns `true` if the snapshot identity changed.
    pub fn refresh(&mut self) -> bool {
        self.stale.set(false);
        let next = self.store.snapshot();
        if S::same_snapshot(&self.current, &next) {
            false
        } else {
            self.current = next;
            true
        }
    }

    /// Returns the underlying store.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns whether the binding is still subscribed.
    #[inline]
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stops receiving notifications. Idempotent.
    pub fn unsubscribe(&mut self) {
        self.subscription.unsubscribe();
    }
}

impl<S: ExternalStore> fmt::Debug for StoreBinding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBinding")
            .field("stale", &self.stale.get())
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    /// Minimal store over a counter, publishing a fresh `Rc` per bump.
    #[derive(Clone, Default)]
    struct CounterStore {
        value: Rc<RefCell<Rc<u32>>>,
        listeners: Rc<RefCell<Vec<(ListenerId, Listener)>>>,
    }

    impl CounterStore {
        fn bump(&self) {
            let next = **self.value.borrow() + 1;
            *self.value.borrow_mut() = Rc::new(next);
            let listeners: Vec<Listener> =
                self.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
            for l in listeners {
                l();
            }
        }

        fn ping(&self) {
            let listeners: Vec<Listener> =
                self.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
            for l in listeners {
                l();
            }
        }
    }

    impl ExternalStore for CounterStore {
        type Snapshot = Rc<u32>;

        fn subscribe(&self, on_change: Listener) -> Subscription {
            let id = ListenerId(self.listeners.borrow().len() as u64);
            self.listeners.borrow_mut().push((id, on_change));
            let listeners = Rc::clone(&self.listeners);
            Subscription::new(id, move || listeners.borrow_mut().retain(|(l, _)| *l != id))
        }

        fn snapshot(&self) -> Rc<u32> {
            Rc::clone(&self.value.borrow())
        }

        fn same_snapshot(a: &Rc<u32>, b: &Rc<u32>) -> bool {
            Rc::ptr_eq(a, b)
        }
    }

    #[test]
    fn subscription_unsubscribe_is_idempotent() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut sub = Subscription::new(ListenerId(1), move || counter.set(counter.get() + 1));
        assert!(sub.is_active());
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        drop(sub);
        assert_eq!(calls.get(), 1, "detach runs exactly once");
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        drop(Subscription::new(ListenerId(1), move || counter.set(counter.get() + 1)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn binding_tracks_staleness_and_identity() {
        let store = CounterStore::default();
        let mut binding = StoreBinding::new(store.clone());
        assert_eq!(**binding.snapshot(), 0);
        assert!(!binding.is_stale());

        store.ping();
        assert!(binding.is_stale());
        assert!(!binding.refresh(), "notification without a new value");
        assert!(!binding.is_stale());

        store.bump();
        assert!(binding.refresh());
        assert_eq!(**binding.snapshot(), 1);
    }

    #[test]
    fn binding_wake_runs_per_notification() {
        let store = CounterStore::default();
        let wakes = Rc::new(Cell::new(0));
        let counter = Rc::clone(&wakes);
        let binding = StoreBinding::with_wake(store.clone(), move || counter.set(counter.get() + 1));
        store.bump();
        store.ping();
        assert_eq!(wakes.get(), 2);
        drop(binding);
        store.bump();
        assert_eq!(wakes.get(), 2, "dropped binding no longer listens");
        assert!(store.listeners.borrow().is_empty());
    }

    #[test]
    fn binding_unsubscribe_stops_staleness() {
        let store = CounterStore::default();
        let mut binding = StoreBinding::new(store.clone());
        binding.unsubscribe();
        binding.unsubscribe();
        assert!(!binding.is_subscribed());
        store.bump();
        assert!(!binding.is_stale());
    }

    #[test]
    fn snapshot_identity() {
        let empty: Snapshot<()> = Snapshot::empty();
        let same = empty.clone();
        assert!(empty.ptr_eq(&same));
        assert!(!empty.ptr_eq(&Snapshot::empty()));
        assert!(empty.is_empty());
    }

    // No `'static` bound on `V`: key access works for any view type.
    fn describe<V>(snapshot: &Snapshot<V>) -> (Vec<&str>, alloc::string::String) {
        (
            snapshot.keys().map(LayerKey::as_str).collect(),
            alloc::format!("{snapshot:?}"),
        )
    }

    #[test]
    fn snapshot_lists_keys_in_order() {
        use crate::error::RenderError;
        use crate::layer::Props;

        let layers: Vec<Layer<u8>> = ["a", "b", "a"]
            .into_iter()
            .map(|key| Layer::from_component(key, |_: &Props| Ok::<u8, RenderError>(0)))
            .collect();
        let snapshot = Snapshot::from_layers(Rc::from(layers));

        let (keys, debug) = describe(&snapshot);
        assert_eq!(keys, ["a", "b", "a"]);
        assert_eq!(debug, r#"[LayerKey("a"), LayerKey("b"), LayerKey("a")]"#);
    }
}
