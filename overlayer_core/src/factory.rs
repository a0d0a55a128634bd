// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Self-contained layer handles.
//!
//! [`LayerRegistry::create_layer`] binds a component to a key and returns a
//! [`LayerFactory`] that renders and destroys it without the caller touching
//! the registry again:
//!
//! ```rust
//! use overlayer_core::{LayerRegistry, Props, RenderError};
//!
//! let registry = LayerRegistry::<String>::new();
//! let toast = registry.create_layer(|props: &Props| {
//!     Ok::<String, RenderError>(props.get::<&str>().copied().unwrap_or("").into())
//! });
//!
//! toast.render(Props::new("Saved"));
//! assert_eq!(registry.len(), 1);
//!
//! toast.destroy();
//! assert!(registry.is_empty());
//! ```
//!
//! Rendering the same factory twice adds two entries under the same key; a
//! single [`destroy`](LayerFactory::destroy) removes both.

use alloc::rc::Rc;
use core::fmt;

use crate::layer::{Component, Layer, LayerKey, Props};
use crate::registry::{LayerRegistry, WeakRegistry};

/// A component bound to a key and a registry.
///
/// Holds the registry weakly; once every registry handle is dropped,
/// [`render`](Self::render) and [`destroy`](Self::destroy) do nothing.
pub struct LayerFactory<V> {
    registry: WeakRegistry<V>,
    component: Rc<dyn Component<V>>,
    key: LayerKey,
}

impl<V> Clone for LayerFactory<V> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            component: Rc::clone(&self.component),
            key: self.key.clone(),
        }
    }
}

impl<V> fmt::Debug for LayerFactory<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerFactory")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<V: 'static> LayerFactory<V> {
    /// Returns the key every rendered entry uses.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &LayerKey {
        &self.key
    }

    /// Adds an entry for this component with the given props.
    pub fn render(&self, props: Props) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let layer = Layer::new(self.key.clone(), Rc::clone(&self.component))
            .with_props(props)
            .with_destroy(registry.destroy_handle(self.key.clone()));
        registry.add(layer);
    }

    /// Removes every entry rendered under this factory's key.
    ///
    /// Returns the number of entries removed.
    pub fn destroy(&self) -> usize {
        self.registry
            .upgrade()
            .map_or(0, |registry| registry.destroy(self.key.as_str()))
    }

    /// Returns whether at least one entry with this key is active.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains_key(self.key.as_str()))
    }
}

impl<V: 'static> LayerRegistry<V> {
    /// Binds `component` to a generated key (`key_prefix` + counter).
    pub fn create_layer(&self, component: impl Component<V> + 'static) -> LayerFactory<V> {
        let key = self.next_auto_key();
        self.create_layer_with_key(key, component)
    }

    /// Binds `component` to an explicit key.
    pub fn create_layer_with_key(
        &self,
        key: impl Into<LayerKey>,
        component: impl Component<V> + 'static,
    ) -> LayerFactory<V> {
        LayerFactory {
            registry: self.downgrade(),
            component: Rc::new(component),
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::registry::RegistryConfig;
    use alloc::string::String;

    fn text(props: &Props) -> Result<String, RenderError> {
        Ok(props.get::<String>().cloned().unwrap_or_default())
    }

    #[test]
    fn generated_keys_are_sequential() {
        let registry = LayerRegistry::<String>::new();
        let a = registry.create_layer(text);
        let b = registry.create_layer(text);
        assert_eq!(a.key(), "layer-0");
        assert_eq!(b.key(), "layer-1");
    }

    #[test]
    fn key_prefix_is_configurable() {
        let registry =
            LayerRegistry::<String>::with_config(RegistryConfig::new().with_key_prefix("toast-"));
        let a = registry.create_layer(text);
        assert_eq!(a.key(), "toast-0");
    }

    #[test]
    fn render_then_destroy() {
        let registry = LayerRegistry::<String>::new();
        let modal = registry.create_layer_with_key("modal", text);
        assert!(!modal.is_rendered());

        modal.render(Props::new(String::from("hello")));
        assert!(modal.is_rendered());
        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].render().as_deref(), Ok("hello"));

        assert_eq!(modal.destroy(), 1);
        assert!(!modal.is_rendered());
    }

    #[test]
    fn repeated_render_duplicates_key() {
        let registry = LayerRegistry::<String>::new();
        let toast = registry.create_layer(text);
        toast.render(Props::none());
        toast.render(Props::none());
        assert_eq!(registry.len(), 2);
        assert_eq!(toast.destroy(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn rendered_layer_can_destroy_itself() {
        let registry = LayerRegistry::<String>::new();
        let drawer = registry.create_layer(text);
        drawer.render(Props::none());
        registry.snapshot()[0].destroy();
        assert!(!drawer.is_rendered());
    }

    #[test]
    fn factory_outliving_registry_is_inert() {
        let registry = LayerRegistry::<String>::new();
        let toast = registry.create_layer(text);
        drop(registry);
        toast.render(Props::none());
        assert_eq!(toast.destroy(), 0);
        assert!(!toast.is_rendered());
    }
}
