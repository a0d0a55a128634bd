// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component render errors.
//!
//! Registry operations never fail. The only error in the core vocabulary is a
//! [`RenderError`], which a [`Component`](crate::layer::Component) returns when
//! it cannot produce a view. Surfaces report these to their caller; the
//! registry never sees them.

use alloc::string::String;
use core::fmt;

/// Error returned by a [`Component`](crate::layer::Component) that failed to
/// render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderError {
    message: String,
}

impl RenderError {
    /// Creates a render error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component render failed: {}", self.message)
    }
}

impl core::error::Error for RenderError {}
