// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering surfaces and the portal that keeps them in sync with a registry.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt;

use overlayer_core::{LayerRegistry, RenderError, Snapshot, StoreBinding};

use crate::plan::{MountPlan, SlotKey};

/// Host-side container that mounted layer views live in.
///
/// DOM-based and in-memory surfaces implement this trait, enabling generic
/// portals and test doubles. The [`Portal`] calls the methods in plan order:
/// unmounts, updates, mounts, then an optional reorder.
pub trait Surface<V> {
    /// Appends a freshly rendered view for `slot`.
    fn mount(&mut self, slot: &SlotKey, view: V);

    /// Replaces the view of an already mounted `slot`, keeping its instance.
    fn update(&mut self, slot: &SlotKey, view: V);

    /// Removes the view of `slot`.
    fn unmount(&mut self, slot: &SlotKey);

    /// Rearranges mounted views to follow `order`. Slots in `order` that are
    /// not mounted are skipped.
    fn reorder(&mut self, order: &[SlotKey]);
}

/// A component that failed to render into a slot.
///
/// The layer stays registered; the slot is simply not mounted until its
/// component or props change and a later render succeeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderFailure {
    /// The slot whose component failed.
    pub slot: SlotKey,
    /// The component's error.
    pub error: RenderError,
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer {}: {}", self.slot, self.error)
    }
}

impl core::error::Error for RenderFailure {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Mirrors a [`LayerRegistry`] onto a [`Surface`].
///
/// The portal subscribes on construction and renders the initial snapshot.
/// Registry notifications only mark it stale; call [`sync`](Self::sync) to
/// render the latest snapshot (typically once per frame, or from the wake
/// callback's scheduled task). [`unmount`](Self::unmount) unsubscribes and
/// clears the surface.
pub struct Portal<V: 'static, S: Surface<V>> {
    binding: StoreBinding<LayerRegistry<V>>,
    surface: S,
    applied: Snapshot<V>,
    plan: MountPlan,
    failed: BTreeSet<SlotKey>,
    failures: Vec<RenderFailure>,
}

impl<V: 'static, S: Surface<V>> fmt::Debug for Portal<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Portal")
            .field("binding", &self.binding)
            .field("applied", &self.applied)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl<V: 'static, S: Surface<V>> Portal<V, S> {
    /// Subscribes `surface` to `registry` and renders the current layers.
    pub fn mount(registry: &LayerRegistry<V>, surface: S) -> Self {
        Self::from_binding(StoreBinding::new(registry.clone()), surface)
    }

    /// Like [`mount`](Self::mount), additionally running `wake` on every
    /// registry notification so the host can schedule a [`sync`](Self::sync).
    pub fn mount_with_wake(
        registry: &LayerRegistry<V>,
        surface: S,
        wake: impl Fn() + 'static,
    ) -> Self {
        Self::from_binding(StoreBinding::with_wake(registry.clone(), wake), surface)
    }

    fn from_binding(binding: StoreBinding<LayerRegistry<V>>, surface: S) -> Self {
        let initial = binding.snapshot().clone();
        let mut portal = Self {
            binding,
            surface,
            applied: Snapshot::empty(),
            plan: MountPlan::default(),
            failed: BTreeSet::new(),
            failures: Vec::new(),
        };
        portal.apply(initial);
        portal
    }

    /// Returns whether the registry changed since the last sync.
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.binding.is_stale()
    }

    /// Renders the latest snapshot if the registry notified since the last
    /// sync and published a new one. Returns whether anything was applied.
    pub fn sync(&mut self) -> bool {
        if !self.binding.is_stale() || !self.binding.refresh() {
            return false;
        }
        let next = self.binding.snapshot().clone();
        self.apply(next);
        true
    }

    fn apply(&mut self, next: Snapshot<V>) {
        self.plan.diff_into(&self.applied, &next);
        self.failures.clear();
        let mut remounted = false;

        for slot in &self.plan.removed {
            if !self.failed.remove(slot) {
                self.surface.unmount(slot);
            }
        }

        for &i in &self.plan.updated {
            let slot = &self.plan.order[i];
            match next[i].render() {
                Ok(view) => {
                    if self.failed.remove(slot) {
                        self.surface.mount(slot, view);
                        remounted = true;
                    } else {
                        self.surface.update(slot, view);
                    }
                }
                Err(error) => {
                    if self.failed.insert(slot.clone()) {
                        self.surface.unmount(slot);
                    }
                    self.failures.push(RenderFailure {
                        slot: slot.clone(),
                        error,
                    });
                }
            }
        }

        for &i in &self.plan.added {
            let slot = &self.plan.order[i];
            match next[i].render() {
                Ok(view) => self.surface.mount(slot, view),
                Err(error) => {
                    self.failed.insert(slot.clone());
                    self.failures.push(RenderFailure {
                        slot: slot.clone(),
                        error,
                    });
                }
            }
        }

        if self.plan.reordered || remounted {
            self.surface.reorder(&self.plan.order);
        }
        self.applied = next;
    }

    /// Returns the render failures of the most recent sync (or of the
    /// initial mount).
    #[must_use]
    pub fn failures(&self) -> &[RenderFailure] {
        &self.failures
    }

    /// Returns whether `slot` is registered but not mounted because its last
    /// render failed.
    #[must_use]
    pub fn is_failed(&self, slot: &SlotKey) -> bool {
        self.failed.contains(slot)
    }

    /// Returns the plan applied by the most recent sync.
    #[must_use]
    pub fn last_plan(&self) -> &MountPlan {
        &self.plan
    }

    /// Returns the snapshot currently shown on the surface.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot<V> {
        &self.applied
    }

    /// Returns the surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Returns the surface mutably.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Unsubscribes, unmounts every mounted slot, and returns the surface.
    pub fn unmount(mut self) -> S {
        self.binding.unsubscribe();
        for slot in crate::plan::slot_keys(&self.applied) {
            if !self.failed.contains(&slot) {
                self.surface.unmount(&slot);
            }
        }
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDocument, MemorySurface};
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec;
    use core::cell::Cell;
    use overlayer_core::{Layer, Props};

    fn text(props: &Props) -> Result<String, RenderError> {
        Ok(props.get::<&str>().copied().unwrap_or("").into())
    }

    fn broken(_: &Props) -> Result<String, RenderError> {
        Err(RenderError::new("boom"))
    }

    fn setup() -> (LayerRegistry<String>, MemoryDocument<String>) {
        (LayerRegistry::new(), MemoryDocument::new())
    }

    #[test]
    fn initial_mount_renders_existing_layers() {
        let (registry, doc) = setup();
        registry.add(Layer::from_component("a", text).with_props(Props::new("A")));

        let portal = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        assert_eq!(portal.surface().views(), vec![String::from("A")]);
        assert_eq!(registry.listener_count(), 1);
    }

    #[test]
    fn changes_apply_on_sync() {
        let (registry, doc) = setup();
        let mut portal = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        assert!(!portal.is_stale());

        registry.add(Layer::from_component("a", text).with_props(Props::new("A")));
        assert!(portal.is_stale());
        assert!(portal.surface().views().is_empty(), "nothing before sync");

        assert!(portal.sync());
        assert_eq!(portal.surface().views(), vec![String::from("A")]);
        assert!(!portal.sync(), "second sync has nothing to apply");
    }

    #[test]
    fn explicit_notify_without_change_applies_nothing() {
        let (registry, doc) = setup();
        let mut portal = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        registry.notify();
        assert!(portal.is_stale());
        assert!(!portal.sync());
        assert!(!portal.is_stale());
    }

    #[test]
    fn destroy_unmounts_every_duplicate() {
        let (registry, doc) = setup();
        let mut portal = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        registry.add(Layer::from_component("toast", text).with_props(Props::new("1")));
        registry.add(Layer::from_component("modal", text).with_props(Props::new("M")));
        registry.add(Layer::from_component("toast", text).with_props(Props::new("2")));
        portal.sync();
        assert_eq!(portal.surface().views().len(), 3);

        registry.destroy("toast");
        portal.sync();
        assert_eq!(portal.surface().slots(), vec![SlotKey::new("modal", 0)]);
    }

    #[test]
    fn readded_key_is_moved_to_the_end() {
        let (registry, doc) = setup();
        let mut portal = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        registry.add(Layer::from_component("a", text).with_props(Props::new("A1")));
        registry.add(Layer::from_component("b", text).with_props(Props::new("B")));
        portal.sync();

        registry.destroy("a");
        registry.add(Layer::from_component("a", text).with_props(Props::new("A2")));
        portal.sync();

        let mounted = doc.container("root");
        assert_eq!(mounted[0].slot, SlotKey::new("b", 0));
        assert_eq!(mounted[1].slot, SlotKey::new("a", 0));
        assert_eq!(mounted[1].view, "A2");
    }

    #[test]
    fn failed_render_is_reported_and_not_mounted() {
        let (registry, doc) = setup();
        let mut portal = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        registry.add(Layer::from_component("ok", text).with_props(Props::new("fine")));
        registry.add(Layer::from_component("bad", broken));
        portal.sync();

        assert_eq!(portal.surface().views(), vec![String::from("fine")]);
        assert_eq!(portal.failures().len(), 1);
        assert_eq!(portal.failures()[0].slot, SlotKey::new("bad", 0));
        assert!(portal.is_failed(&SlotKey::new("bad", 0)));
        assert_eq!(registry.len(), 2, "the registry keeps the layer");
    }

    #[test]
    fn failed_slot_recovers_when_replaced() {
        let (registry, doc) = setup();
        let mut portal = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        registry.add(Layer::from_component("x", broken));
        registry.add(Layer::from_component("y", text).with_props(Props::new("Y")));
        portal.sync();

        registry.destroy("x");
        registry.add(Layer::from_component("x", text).with_props(Props::new("X")));
        portal.sync();

        assert!(portal.failures().is_empty());
        assert!(!portal.is_failed(&SlotKey::new("x", 0)));
        assert_eq!(
            portal.surface().views(),
            vec![String::from("Y"), String::from("X")]
        );
    }

    #[test]
    fn unmount_unsubscribes_and_clears() {
        let (registry, doc) = setup();
        registry.add(Layer::from_component("a", text));
        registry.add(Layer::from_component("b", broken));
        let portal = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));

        let surface = portal.unmount();
        assert_eq!(registry.listener_count(), 0);
        assert!(surface.slots().is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn wake_runs_on_notification() {
        let (registry, doc) = setup();
        let woken = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&woken);
        let mut portal = Portal::mount_with_wake(
            &registry,
            MemorySurface::attach(&doc, "root"),
            move || counter.set(counter.get() + 1),
        );

        registry.add(Layer::from_component("a", text));
        registry.destroy("a");
        assert_eq!(woken.get(), 2);
        assert!(portal.sync(), "a new empty snapshot was published");
        assert!(portal.last_plan().is_empty());
        assert!(portal.surface().slots().is_empty());
    }

    #[test]
    fn two_portals_share_one_container() {
        let (registry, doc) = setup();
        let first = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        let second = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        assert_eq!(doc.containers_created(), 1);
        assert_eq!(registry.listener_count(), 2);
        drop(first);
        assert_eq!(registry.listener_count(), 1);
        drop(second);
        assert_eq!(registry.listener_count(), 0);
    }

    #[test]
    fn unmounting_one_portal_keeps_the_other() {
        let (registry, doc) = setup();
        registry.add(Layer::from_component("a", text).with_props(Props::new("A")));
        let first = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        let mut second = Portal::mount(&registry, MemorySurface::attach(&doc, "root"));
        assert_eq!(doc.container("root").len(), 2);

        let first = first.unmount();
        assert!(first.slots().is_empty());
        assert_eq!(second.surface().views(), vec![String::from("A")]);
        assert_eq!(doc.container("root").len(), 1);

        registry.add(Layer::from_component("b", text).with_props(Props::new("B")));
        assert!(second.sync());
        assert_eq!(
            second.surface().views(),
            vec![String::from("A"), String::from("B")]
        );
        assert_eq!(registry.listener_count(), 1);
    }
}
