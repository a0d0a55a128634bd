// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM container management.
//!
//! Applies [`Surface`] calls from a [`Portal`](overlayer_render::Portal) to
//! the children of a container element.

use alloc::collections::BTreeMap;
use alloc::string::ToString as _;
use core::fmt;

use overlayer_render::{SlotKey, Surface};
use web_sys::{Document, Element};

/// Attribute set on every mounted element, holding its slot (`key#n`).
pub const KEY_ATTRIBUTE: &str = "data-overlay-key";

/// Errors from [`DomSurface::attach`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomError {
    /// The document has no `<body>` to append the container to.
    NoBody,
    /// `document.createElement` failed.
    CreateFailed,
    /// Appending the container to `<body>` failed.
    AppendFailed,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBody => f.write_str("document has no body"),
            Self::CreateFailed => f.write_str("failed to create overlay container"),
            Self::AppendFailed => f.write_str("failed to append overlay container to body"),
        }
    }
}

impl core::error::Error for DomError {}

/// A [`Surface`] whose views are DOM elements, kept as children of one
/// container element in layer order.
pub struct DomSurface {
    container: Element,
    mounted: BTreeMap<SlotKey, Element>,
}

impl fmt::Debug for DomSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomSurface")
            .field("container", &self.container.id())
            .field("mounted", &self.mounted.len())
            .finish()
    }
}

impl DomSurface {
    /// Uses the element with id `id` as the container, creating a `<div>`
    /// with that id at the end of `<body>` if none exists.
    pub fn attach(document: &Document, id: &str) -> Result<Self, DomError> {
        if let Some(container) = document.get_element_by_id(id) {
            return Ok(Self::new(container));
        }
        let container = document
            .create_element("div")
            .map_err(|_| DomError::CreateFailed)?;
        container.set_id(id);
        let body = document.body().ok_or(DomError::NoBody)?;
        body.append_child(&container)
            .map_err(|_| DomError::AppendFailed)?;
        Ok(Self::new(container))
    }

    /// Manages children of an existing container element.
    #[must_use]
    pub fn new(container: Element) -> Self {
        Self {
            container,
            mounted: BTreeMap::new(),
        }
    }

    /// Returns the container element.
    #[must_use]
    pub fn container(&self) -> &Element {
        &self.container
    }

    /// Returns the element mounted for `slot`, if any.
    #[must_use]
    pub fn element(&self, slot: &SlotKey) -> Option<&Element> {
        self.mounted.get(slot)
    }
}

impl Surface<Element> for DomSurface {
    fn mount(&mut self, slot: &SlotKey, view: Element) {
        let _ = view.set_attribute(KEY_ATTRIBUTE, &slot.to_string());
        let _ = self.container.append_child(&view);
        if let Some(stale) = self.mounted.insert(slot.clone(), view) {
            stale.remove();
        }
    }

    fn update(&mut self, slot: &SlotKey, view: Element) {
        let _ = view.set_attribute(KEY_ATTRIBUTE, &slot.to_string());
        match self.mounted.get(slot) {
            Some(old) => {
                let _ = self.container.replace_child(&view, old);
            }
            None => {
                let _ = self.container.append_child(&view);
            }
        }
        self.mounted.insert(slot.clone(), view);
    }

    fn unmount(&mut self, slot: &SlotKey) {
        if let Some(el) = self.mounted.remove(slot) {
            el.remove();
        }
    }

    fn reorder(&mut self, order: &[SlotKey]) {
        // Re-appending an attached child moves it to the end.
        for slot in order {
            if let Some(el) = self.mounted.get(slot) {
                let _ = self.container.append_child(el);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString as _;

    #[test]
    fn errors_display() {
        assert_eq!(DomError::NoBody.to_string(), "document has no body");
        assert!(DomError::AppendFailed.to_string().contains("append"));
    }
}
