// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer data model.
//!
//! A *layer* is one registered overlay entry. Each layer has:
//!
//! - A [`LayerKey`]: a string identifier. Keys are not unique; several
//!   entries may share a key and [`destroy`](crate::registry::LayerRegistry::destroy)
//!   removes all of them.
//! - A [`Component`]: a capability that, given [`Props`], produces a view of
//!   whatever type the rendering surface works with.
//! - Optional [`Props`]: opaque data forwarded to the component at render
//!   time.
//! - An optional [`DestroyHandle`]: a zero-argument capability bound to the
//!   layer's key so the layer can remove itself without holding the registry.
//!
//! The registry stores layers and hands them back; it never renders or
//! inspects a component.

use alloc::rc::Rc;
use core::any::Any;
use core::borrow::Borrow;
use core::fmt;

use crate::error::RenderError;

/// String identifier of a layer.
///
/// Cheap to clone (reference-counted). Compares, orders, and hashes by its
/// string contents.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerKey(Rc<str>);

impl LayerKey {
    /// Creates a key from a string.
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self(Rc::from(key))
    }

    /// Returns the key as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerKey({:?})", &*self.0)
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for LayerKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LayerKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayerKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<alloc::string::String> for LayerKey {
    fn from(key: alloc::string::String) -> Self {
        Self(Rc::from(key))
    }
}

impl PartialEq<str> for LayerKey {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for LayerKey {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// Opaque, optional data forwarded to a component at render time.
///
/// The shape is caller-defined. Components recover it with
/// [`get`](Self::get). Cloning shares the same allocation, so identity
/// comparison via [`ptr_eq`](Self::ptr_eq) tells a surface whether props were
/// replaced.
#[derive(Clone, Default)]
pub struct Props(Option<Rc<dyn Any>>);

impl Props {
    /// Empty props.
    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Wraps a value as props.
    #[must_use]
    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Rc::new(value)))
    }

    /// Wraps an already shared value as props.
    #[must_use]
    pub fn from_rc(value: Rc<dyn Any>) -> Self {
        Self(Some(value))
    }

    /// Returns the props value if present and of type `T`.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref()?.downcast_ref::<T>()
    }

    /// Returns whether no props were given.
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Returns whether both values refer to the same props allocation (or are
    /// both empty).
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(_) => f.write_str("Props(..)"),
            None => f.write_str("Props(None)"),
        }
    }
}

/// Something a rendering surface can instantiate with props.
///
/// `V` is the surface's view type (a DOM element, a line of text, a widget
/// tree). Closures `Fn(&Props) -> Result<V, RenderError>` implement this
/// trait, so most components are written as closures.
pub trait Component<V> {
    /// Produces a view for the given props.
    fn render(&self, props: &Props) -> Result<V, RenderError>;
}

impl<V, F> Component<V> for F
where
    F: Fn(&Props) -> Result<V, RenderError>,
{
    fn render(&self, props: &Props) -> Result<V, RenderError> {
        self(props)
    }
}

/// A zero-argument capability that removes a layer.
///
/// Handles created by [`LayerRegistry::destroy_handle`] hold only a weak
/// reference to the registry and do nothing once it is dropped.
///
/// [`LayerRegistry::destroy_handle`]: crate::registry::LayerRegistry::destroy_handle
#[derive(Clone)]
pub struct DestroyHandle(Rc<dyn Fn()>);

impl DestroyHandle {
    /// Wraps an arbitrary action as a destroy capability.
    #[must_use]
    pub fn new(action: impl Fn() + 'static) -> Self {
        Self(Rc::new(action))
    }

    /// Runs the action.
    #[inline]
    pub fn call(&self) {
        (self.0)();
    }
}

impl fmt::Debug for DestroyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestroyHandle").finish_non_exhaustive()
    }
}

/// One registered overlay entry.
///
/// Cloning a layer shares the component, props, and destroy handle.
pub struct Layer<V> {
    key: LayerKey,
    component: Rc<dyn Component<V>>,
    props: Props,
    destroy: Option<DestroyHandle>,
}

impl<V> Clone for Layer<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            component: Rc::clone(&self.component),
            props: self.props.clone(),
            destroy: self.destroy.clone(),
        }
    }
}

impl<V> fmt::Debug for Layer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("key", &self.key)
            .field("props", &self.props)
            .field("destroy", &self.destroy.is_some())
            .finish_non_exhaustive()
    }
}

impl<V> Layer<V> {
    /// Creates a layer from a shared component.
    ///
    /// The layer has no props and no destroy handle;
    /// [`LayerRegistry::add`](crate::registry::LayerRegistry::add) binds one.
    #[must_use]
    pub fn new(key: impl Into<LayerKey>, component: Rc<dyn Component<V>>) -> Self {
        Self {
            key: key.into(),
            component,
            props: Props::none(),
            destroy: None,
        }
    }

    /// Creates a layer from an owned component.
    #[must_use]
    pub fn from_component(key: impl Into<LayerKey>, component: impl Component<V> + 'static) -> Self {
        Self::new(key, Rc::new(component))
    }

    /// Sets the props forwarded to the component.
    #[must_use]
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Sets the destroy capability.
    #[must_use]
    pub fn with_destroy(mut self, destroy: DestroyHandle) -> Self {
        self.destroy = Some(destroy);
        self
    }

    /// Returns the layer key.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &LayerKey {
        &self.key
    }

    /// Returns the component.
    #[inline]
    #[must_use]
    pub fn component(&self) -> &Rc<dyn Component<V>> {
        &self.component
    }

    /// Returns the props.
    #[inline]
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Returns the destroy capability, if bound.
    #[inline]
    #[must_use]
    pub fn destroy_handle(&self) -> Option<&DestroyHandle> {
        self.destroy.as_ref()
    }

    /// Removes this layer (and every other entry sharing its key) through the
    /// bound destroy capability. Does nothing if none is bound.
    pub fn destroy(&self) {
        if let Some(handle) = &self.destroy {
            handle.call();
        }
    }

    /// Instantiates the component with this layer's props.
    pub fn render(&self) -> Result<V, RenderError> {
        self.component.render(&self.props)
    }

    /// Returns whether both layers share the same component allocation.
    #[must_use]
    pub fn same_component(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.component), Rc::as_ptr(&other.component))
    }

    /// Returns whether both layers would render identically: same component
    /// and same props allocation.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.same_component(other) && self.props.ptr_eq(&other.props)
    }

    pub(crate) fn bind_destroy_if_missing(&mut self, make: impl FnOnce() -> DestroyHandle) {
        if self.destroy.is_none() {
            self.destroy = Some(make());
        }
    }
}
