// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for overlayer.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomSurface`]: mounts rendered `Element`s into a container element
//! - [`FrameScheduler`]: coalesces sync requests into one
//!   `requestAnimationFrame` callback
//! - [`DomOverlay`]: a registry portal into the DOM, synced once per frame

#![no_std]

extern crate alloc;

mod overlay;
mod raf;
mod surface;

pub use overlay::DomOverlay;
pub use overlayer_render::{DEFAULT_CONTAINER_ID, Surface};
pub use raf::FrameScheduler;
pub use surface::{DomError, DomSurface, KEY_ATTRIBUTE};
