// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for registry activity.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`LayerRegistry`](crate::registry::LayerRegistry) calls on every mutation,
//! notification, and subscription change. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional shared sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Sinks are invoked synchronously from inside registry operations and must
//! not call back into the registry. A sink that is already running (because
//! it re-entered the registry anyway) is skipped rather than re-borrowed.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::layer::LayerKey;
use crate::store::ListenerId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which operation triggered a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotifyCause {
    /// A layer was added.
    Add,
    /// A destroy-by-key ran (whether or not it removed anything).
    Destroy,
    /// [`notify`](crate::registry::LayerRegistry::notify) was called directly.
    Explicit,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after a layer is appended.
#[derive(Clone, Debug)]
pub struct LayerAddedEvent {
    /// Registry revision after the add.
    pub revision: u64,
    /// Key of the added layer.
    pub key: LayerKey,
    /// Position of the new layer in the snapshot.
    pub index: usize,
    /// Snapshot length after the add.
    pub len: usize,
}

/// Emitted after a destroy-by-key.
#[derive(Clone, Debug)]
pub struct LayersDestroyedEvent {
    /// Registry revision after the destroy.
    pub revision: u64,
    /// Key that was destroyed.
    pub key: LayerKey,
    /// Number of entries removed (zero for a no-op destroy).
    pub removed: usize,
    /// Snapshot length after the destroy.
    pub len: usize,
}

/// Emitted before listeners are invoked.
#[derive(Clone, Copy, Debug)]
pub struct NotifyEvent {
    /// Registry revision being announced.
    pub revision: u64,
    /// What triggered the notification.
    pub cause: NotifyCause,
    /// Number of listeners that will be called.
    pub listeners: usize,
}

/// Emitted after a subscribe call.
#[derive(Clone, Copy, Debug)]
pub struct SubscribeEvent {
    /// Identity of the registered listener.
    pub listener: ListenerId,
    /// Listener count after the call.
    pub listeners: usize,
    /// Whether the listener was already registered (the call collapsed into
    /// the existing subscription).
    pub duplicate: bool,
}

/// Emitted when a listener is removed.
#[derive(Clone, Copy, Debug)]
pub struct UnsubscribeEvent {
    /// Identity of the removed listener.
    pub listener: ListenerId,
    /// Listener count after removal.
    pub listeners: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a registry.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a layer is added.
    fn on_layer_added(&mut self, e: &LayerAddedEvent) {
        _ = e;
    }

    /// Called after a destroy-by-key.
    fn on_layers_destroyed(&mut self, e: &LayersDestroyedEvent) {
        _ = e;
    }

    /// Called before listeners are notified.
    fn on_notify(&mut self, e: &NotifyEvent) {
        _ = e;
    }

    /// Called after a subscribe.
    fn on_subscribe(&mut self, e: &SubscribeEvent) {
        _ = e;
    }

    /// Called after an unsubscribe removed a listener.
    fn on_unsubscribe(&mut self, e: &UnsubscribeEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Shared handle to a trace sink.
pub type SharedSink = Rc<RefCell<dyn TraceSink>>;

/// Thin wrapper around an optional shared [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
#[derive(Clone, Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<SharedSink>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: SharedSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns whether events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Runs `f` against the sink unless it is absent or already running.
    #[cfg(feature = "trace")]
    #[inline]
    fn dispatch(&self, f: impl FnOnce(&mut dyn TraceSink)) {
        if let Some(sink) = &self.sink {
            if let Ok(mut sink) = sink.try_borrow_mut() {
                f(&mut *sink);
            }
        }
    }

    /// Emits a [`LayerAddedEvent`].
    #[inline]
    pub fn layer_added(&self, e: &LayerAddedEvent) {
        #[cfg(feature = "trace")]
        self.dispatch(|s| s.on_layer_added(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LayersDestroyedEvent`].
    #[inline]
    pub fn layers_destroyed(&self, e: &LayersDestroyedEvent) {
        #[cfg(feature = "trace")]
        self.dispatch(|s| s.on_layers_destroyed(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`NotifyEvent`].
    #[inline]
    pub fn notify(&self, e: &NotifyEvent) {
        #[cfg(feature = "trace")]
        self.dispatch(|s| s.on_notify(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SubscribeEvent`].
    #[inline]
    pub fn subscribe(&self, e: &SubscribeEvent) {
        #[cfg(feature = "trace")]
        self.dispatch(|s| s.on_subscribe(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`UnsubscribeEvent`].
    #[inline]
    pub fn unsubscribe(&self, e: &UnsubscribeEvent) {
        #[cfg(feature = "trace")]
        self.dispatch(|s| s.on_unsubscribe(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
