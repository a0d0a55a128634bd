// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer registry and subscription protocol for imperatively managed overlays.
//!
//! `overlayer_core` keeps track of "layer" components (modals, toasts,
//! drawers) that application code creates and destroys imperatively and that
//! are rendered outside the normal component tree, into one shared container.
//! It is `no_std` compatible (with `alloc`) and independent of any particular
//! UI framework: a component is anything that turns props into the surface's
//! view type.
//!
//! # Architecture
//!
//! ```text
//!   Application ──add / destroy──► LayerRegistry ──publishes──► Snapshot
//!                                       │
//!                                    notify()
//!                                       │
//!                                       ▼
//!   Surface ◄──refresh── StoreBinding ◄── Listener
//! ```
//!
//! **[`registry`]** — [`LayerRegistry`], the ordered list of active layers
//! plus its listener set. Mutations publish a new immutable [`Snapshot`] and
//! notify listeners synchronously.
//!
//! **[`store`]** — The read side: [`Subscription`], the [`ExternalStore`]
//! trait, and [`StoreBinding`], which a rendering surface keeps while
//! mounted.
//!
//! **[`layer`]** — The [`Layer`] model: key, [`Component`], [`Props`], and
//! [`DestroyHandle`].
//!
//! **[`factory`]** — [`LayerFactory`], a component bound to a (possibly
//! generated) key with `render` / `destroy`.
//!
//! **[`error`]** — [`RenderError`], the one error a component may return.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! registry instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod error;
pub mod factory;
pub mod layer;
pub mod registry;
pub mod store;
pub mod trace;

pub use error::RenderError;
pub use factory::LayerFactory;
pub use layer::{Component, DestroyHandle, Layer, LayerKey, Props};
pub use registry::{LayerRegistry, NotifyPolicy, RegistryConfig};
pub use store::{ExternalStore, Listener, ListenerId, Snapshot, StoreBinding, Subscription};
