// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed mount planning and rendering surfaces for overlayer.
//!
//! This crate sits between [`overlayer_core`]'s registry and a host's
//! container element. It defines:
//!
//! - [`MountPlan`] — the unmount/update/mount/reorder steps between two
//!   snapshots, keyed by [`SlotKey`]
//! - [`Surface`] — the container a host implements to receive those steps
//! - [`Portal`] — a mounted subscription that renders a registry into a
//!   surface on every [`sync`](Portal::sync)
//! - [`MemorySurface`] — a headless surface over a [`MemoryDocument`]

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod memory;
mod plan;
mod surface;

pub use memory::{MemoryDocument, MemorySurface, Mounted};
pub use plan::{MountPlan, SlotKey, slot_keys};
pub use surface::{Portal, RenderFailure, Surface};

/// Id of the container element overlays render into unless the host picks
/// another.
pub const DEFAULT_CONTAINER_ID: &str = "overlay-root";
