// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layer registry: ordered active layers plus change listeners.
//!
//! [`LayerRegistry`] is the single source of truth for which overlay content
//! is active. It is an explicit object rather than ambient global state:
//! create one per application (or per test) and hand clones of the handle to
//! every collaborator that needs it.
//!
//! # Publication
//!
//! Every [`add`](LayerRegistry::add) and (under the default policy) every
//! [`destroy`](LayerRegistry::destroy) publishes a freshly built
//! [`Snapshot`]. Snapshots already handed out are never modified, so readers
//! can hold them across mutations and detect change by identity.
//!
//! # Notification
//!
//! Mutations notify listeners synchronously, inline with the mutating call.
//! The listener set is copied before iterating: every listener registered
//! when [`notify`](LayerRegistry::notify) begins is called exactly once in
//! that cycle, even if an earlier listener unsubscribes it; listeners added
//! during the cycle are first called by the next one. Listeners may read the
//! snapshot, mutate the registry, or (un)subscribe while being notified.
//!
//! Invocation order between listeners is not part of the contract.
//!
//! A listener that panics unwinds out of the mutating call and the remaining
//! listeners of that cycle are not called. The mutation itself has already
//! been published, and the registry holds no borrows while listeners run, so
//! it stays fully usable afterwards.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::layer::{DestroyHandle, Layer, LayerKey};
use crate::store::{ExternalStore, Listener, ListenerId, Snapshot, Subscription};
use crate::trace::{
    LayerAddedEvent, LayersDestroyedEvent, NotifyCause, NotifyEvent, SharedSink, SubscribeEvent,
    Tracer, UnsubscribeEvent,
};

/// When a destroy-by-key notifies listeners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NotifyPolicy {
    /// Every destroy publishes a new snapshot and notifies, even when no
    /// entry matched the key.
    #[default]
    Always,
    /// A destroy that removes nothing keeps the current snapshot and does
    /// not notify.
    OnChange,
}

/// Configuration for a [`LayerRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Notification behavior for destroys that match nothing.
    pub notify_policy: NotifyPolicy,
    /// Prefix of keys generated by [`LayerRegistry::create_layer`].
    pub key_prefix: &'static str,
}

impl RegistryConfig {
    /// Default configuration: notify on every mutation, keys `layer-N`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            notify_policy: NotifyPolicy::Always,
            key_prefix: "layer-",
        }
    }

    /// Configuration that skips notifications for no-op destroys.
    #[must_use]
    pub const fn on_change() -> Self {
        Self {
            notify_policy: NotifyPolicy::OnChange,
            key_prefix: "layer-",
        }
    }

    /// Returns this configuration with a different auto-key prefix.
    #[must_use]
    pub const fn with_key_prefix(mut self, key_prefix: &'static str) -> Self {
        self.key_prefix = key_prefix;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct Inner<V> {
    config: RegistryConfig,
    layers: RefCell<Snapshot<V>>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_listener: Cell<u64>,
    next_key: Cell<u64>,
    revision: Cell<u64>,
    tracer: RefCell<Tracer>,
}

impl<V> Inner<V> {
    fn tracer(&self) -> Tracer {
        self.tracer.borrow().clone()
    }

    fn bump_revision(&self) -> u64 {
        let revision = self.revision.get() + 1;
        self.revision.set(revision);
        revision
    }

    fn remove_listener(&self, id: ListenerId) {
        let remaining = {
            let mut listeners = self.listeners.borrow_mut();
            let Some(pos) = listeners.iter().position(|(l, _)| *l == id) else {
                return;
            };
            listeners.remove(pos);
            listeners.len()
        };
        self.tracer().unsubscribe(&UnsubscribeEvent {
            listener: id,
            listeners: remaining,
        });
    }

    fn notify(&self, cause: NotifyCause) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        self.tracer().notify(&NotifyEvent {
            revision: self.revision.get(),
            cause,
            listeners: listeners.len(),
        });
        for listener in listeners {
            listener();
        }
    }
}

/// Ordered collection of active layers with synchronous change notification.
///
/// `LayerRegistry` is a cheap-to-clone handle; clones share the same state.
/// It is single-threaded (`!Send`): all operations run to completion on the
/// caller's thread.
///
/// `V` is the view type components produce for the rendering surface.
pub struct LayerRegistry<V> {
    inner: Rc<Inner<V>>,
}

impl<V> Clone for LayerRegistry<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for LayerRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("config", &self.inner.config)
            .field("layers", &*self.inner.layers.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("revision", &self.inner.revision.get())
            .finish()
    }
}

impl<V: 'static> Default for LayerRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static> LayerRegistry<V> {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::new())
    }

    /// Creates an empty registry.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                layers: RefCell::new(Snapshot::empty()),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                next_key: Cell::new(0),
                revision: Cell::new(0),
                tracer: RefCell::new(Tracer::none()),
            }),
        }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Routes trace events to `sink` (only with the `trace` feature).
    pub fn set_trace_sink(&self, sink: SharedSink) {
        *self.inner.tracer.borrow_mut() = Tracer::new(sink);
    }

    /// Stops emitting trace events.
    pub fn clear_trace_sink(&self) {
        *self.inner.tracer.borrow_mut() = Tracer::none();
    }

    // -- Mutation API --

    /// Appends a layer and notifies listeners.
    ///
    /// No uniqueness check is made; a key may appear any number of times. If
    /// the layer has no destroy capability, one bound to its key and this
    /// registry is attached.
    pub fn add(&self, mut layer: Layer<V>) {
        let key = layer.key().clone();
        let weak = Rc::downgrade(&self.inner);
        layer.bind_destroy_if_missing(|| destroy_handle_for(weak, key.clone()));

        let len = {
            let mut layers = self.inner.layers.borrow_mut();
            let next: Rc<[Layer<V>]> = layers
                .iter()
                .cloned()
                .chain(core::iter::once(layer))
                .collect();
            *layers = Snapshot::from_layers(next);
            layers.len()
        };
        let revision = self.inner.bump_revision();

        self.inner.tracer().layer_added(&LayerAddedEvent {
            revision,
            key,
            index: len - 1,
            len,
        });
        self.inner.notify(NotifyCause::Add);
    }

    /// Removes every layer whose key equals `key`, preserving the order of
    /// the rest, and notifies listeners. Returns the number removed.
    ///
    /// An unknown key is not an error. Under [`NotifyPolicy::Always`] it
    /// still publishes a new (equal) snapshot and notifies; under
    /// [`NotifyPolicy::OnChange`] it does neither.
    pub fn destroy(&self, key: &str) -> usize {
        let always = self.inner.config.notify_policy == NotifyPolicy::Always;
        let (removed, len) = {
            let mut layers = self.inner.layers.borrow_mut();
            let remaining: Vec<Layer<V>> =
                layers.iter().filter(|l| l.key() != key).cloned().collect();
            let removed = layers.len() - remaining.len();
            if removed > 0 || always {
                *layers = Snapshot::from_layers(remaining.into());
            }
            (removed, layers.len())
        };
        let publish = removed > 0 || always;
        let revision = if publish {
            self.inner.bump_revision()
        } else {
            self.inner.revision.get()
        };

        self.inner.tracer().layers_destroyed(&LayersDestroyedEvent {
            revision,
            key: LayerKey::new(key),
            removed,
            len,
        });
        if publish {
            self.inner.notify(NotifyCause::Destroy);
        }
        removed
    }

    /// Invokes every registered listener once.
    pub fn notify(&self) {
        self.inner.notify(NotifyCause::Explicit);
    }

    // -- Read API --

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<V> {
        self.inner.layers.borrow().clone()
    }

    /// Returns the number of active layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.layers.borrow().len()
    }

    /// Returns whether no layer is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.layers.borrow().is_empty()
    }

    /// Returns whether any active layer has the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.layers.borrow().iter().any(|l| l.key() == key)
    }

    /// Returns the number of published snapshots so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.revision.get()
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    // -- Subscription API --

    /// Registers `listener` to run after every change.
    ///
    /// Subscribing an `Rc` that is already registered does not add a second
    /// entry; the returned subscription refers to the existing one, and
    /// unsubscribing either subscription removes it.
    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let (id, duplicate, count) = {
            let mut listeners = self.inner.listeners.borrow_mut();
            let existing = listeners
                .iter()
                .find(|(_, l)| core::ptr::addr_eq(Rc::as_ptr(l), Rc::as_ptr(&listener)))
                .map(|(id, _)| *id);
            match existing {
                Some(id) => (id, true, listeners.len()),
                None => {
                    let id = ListenerId(self.inner.next_listener.get());
                    self.inner.next_listener.set(id.0 + 1);
                    listeners.push((id, listener));
                    (id, false, listeners.len())
                }
            }
        };
        self.inner.tracer().subscribe(&SubscribeEvent {
            listener: id,
            listeners: count,
            duplicate,
        });

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove_listener(id);
            }
        })
    }

    /// Convenience for [`subscribe`](Self::subscribe) with a fresh closure.
    pub fn subscribe_fn(&self, on_change: impl Fn() + 'static) -> Subscription {
        self.subscribe(Rc::new(on_change))
    }

    /// Returns a capability that destroys `key` in this registry.
    ///
    /// The handle holds a weak reference and does nothing once every
    /// registry handle has been dropped.
    #[must_use]
    pub fn destroy_handle(&self, key: impl Into<LayerKey>) -> DestroyHandle {
        destroy_handle_for(Rc::downgrade(&self.inner), key.into())
    }

    pub(crate) fn next_auto_key(&self) -> LayerKey {
        let n = self.inner.next_key.get();
        self.inner.next_key.set(n + 1);
        LayerKey::from(alloc::format!("{}{n}", self.inner.config.key_prefix))
    }

    pub(crate) fn downgrade(&self) -> WeakRegistry<V> {
        WeakRegistry(Rc::downgrade(&self.inner))
    }
}

/// Non-owning registry reference.
pub(crate) struct WeakRegistry<V>(Weak<Inner<V>>);

impl<V> Clone for WeakRegistry<V> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<V> WeakRegistry<V> {
    pub(crate) fn upgrade(&self) -> Option<LayerRegistry<V>> {
        self.0.upgrade().map(|inner| LayerRegistry { inner })
    }
}

fn destroy_handle_for<V: 'static>(weak: Weak<Inner<V>>, key: LayerKey) -> DestroyHandle {
    DestroyHandle::new(move || {
        if let Some(inner) = weak.upgrade() {
            LayerRegistry { inner }.destroy(key.as_str());
        }
    })
}

impl<V: 'static> ExternalStore for LayerRegistry<V> {
    type Snapshot = Snapshot<V>;

    fn subscribe(&self, on_change: Listener) -> Subscription {
        Self::subscribe(self, on_change)
    }

    fn snapshot(&self) -> Snapshot<V> {
        Self::snapshot(self)
    }

    fn same_snapshot(a: &Snapshot<V>, b: &Snapshot<V>) -> bool {
        a.ptr_eq(b)
    }
}
