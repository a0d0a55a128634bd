// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed mount planning between two snapshots.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt;

use overlayer_core::{Layer, LayerKey};

/// Stable identity of a mounted layer instance.
///
/// Keys are not unique, so a slot is the key plus its occurrence index among
/// entries with that key (`0` for the first, `1` for the second, ...). As
/// long as a key stays registered, its slots keep their identity across
/// snapshots.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    /// Layer key.
    pub key: LayerKey,
    /// Occurrence index among layers sharing `key`.
    pub occurrence: u32,
}

impl SlotKey {
    /// Creates a slot key.
    #[must_use]
    pub fn new(key: impl Into<LayerKey>, occurrence: u32) -> Self {
        Self {
            key: key.into(),
            occurrence,
        }
    }
}

impl fmt::Debug for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotKey({}#{})", self.key, self.occurrence)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.key, self.occurrence)
    }
}

/// Computes the slot of every layer, in order.
#[must_use]
pub fn slot_keys<V: 'static>(layers: &[Layer<V>]) -> Vec<SlotKey> {
    let mut seen: BTreeMap<&LayerKey, u32> = BTreeMap::new();
    layers
        .iter()
        .map(|layer| {
            let count = seen.entry(layer.key()).or_insert(0);
            let slot = SlotKey {
                key: layer.key().clone(),
                occurrence: *count,
            };
            *count += 1;
            slot
        })
        .collect()
}

/// The changes a surface must apply to move from one snapshot to the next.
///
/// Produced by [`diff`](Self::diff). Surfaces consume it in this order:
/// unmount [`removed`](Self::removed), apply [`updated`](Self::updated),
/// mount [`added`](Self::added) (appending), then rearrange to
/// [`order`](Self::order) if [`reordered`](Self::reordered) is set.
#[derive(Clone, Debug, Default)]
pub struct MountPlan {
    /// Slots present in the previous snapshot and absent from the next.
    pub removed: Vec<SlotKey>,
    /// Indices into the next snapshot of slots that are new.
    pub added: Vec<usize>,
    /// Indices into the next snapshot of surviving slots whose component or
    /// props changed identity.
    pub updated: Vec<usize>,
    /// Slot of every layer in the next snapshot, in order.
    pub order: Vec<SlotKey>,
    /// Whether appending the added slots after the survivors does not yield
    /// [`order`](Self::order).
    pub reordered: bool,
}

impl MountPlan {
    /// Plans the transition from `prev` to `next`.
    #[must_use]
    pub fn diff<V: 'static>(prev: &[Layer<V>], next: &[Layer<V>]) -> Self {
        let mut plan = Self::default();
        plan.diff_into(prev, next);
        plan
    }

    /// Like [`diff`](Self::diff), reusing this plan's buffers.
    pub fn diff_into<V: 'static>(&mut self, prev: &[Layer<V>], next: &[Layer<V>]) {
        self.clear();

        let prev_slots = slot_keys(prev);
        self.order = slot_keys(next);

        let prev_index: BTreeMap<&SlotKey, usize> = prev_slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot, i))
            .collect();
        let next_set: BTreeSet<&SlotKey> = self.order.iter().collect();

        self.removed.extend(
            prev_slots
                .iter()
                .filter(|slot| !next_set.contains(slot))
                .cloned(),
        );

        // (previous index, next index) of every surviving slot.
        let mut survivors: Vec<(usize, usize)> = Vec::new();
        for (i, slot) in self.order.iter().enumerate() {
            match prev_index.get(slot) {
                Some(&p) => {
                    if !next[i].same_content(&prev[p]) {
                        self.updated.push(i);
                    }
                    survivors.push((p, i));
                }
                None => self.added.push(i),
            }
        }

        // Surfaces keep survivors in their old order and append new slots.
        survivors.sort_unstable_by_key(|&(p, _)| p);
        let expected = survivors
            .iter()
            .map(|&(_, i)| i)
            .chain(self.added.iter().copied());
        self.reordered = expected.enumerate().any(|(pos, i)| pos != i);
    }

    /// Returns whether applying this plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.updated.is_empty() && !self.reordered
    }

    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.removed.clear();
        self.added.clear();
        self.updated.clear();
        self.order.clear();
        self.reordered = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use overlayer_core::{Component, Props, RenderError};

    fn component() -> Rc<dyn Component<()>> {
        Rc::new(|_: &Props| Ok::<_, RenderError>(()))
    }

    fn layers(keys: &[&str], component: &Rc<dyn Component<()>>) -> Vec<Layer<()>> {
        keys.iter()
            .map(|k| Layer::new(*k, Rc::clone(component)))
            .collect()
    }

    #[test]
    fn slot_keys_number_duplicates() {
        let c = component();
        let slots = slot_keys(&layers(&["a", "b", "a", "a"], &c));
        assert_eq!(
            slots,
            vec![
                SlotKey::new("a", 0),
                SlotKey::new("b", 0),
                SlotKey::new("a", 1),
                SlotKey::new("a", 2),
            ]
        );
    }

    #[test]
    fn identical_snapshots_plan_nothing() {
        let c = component();
        let snapshot = layers(&["a", "b"], &c);
        let plan = MountPlan::diff(&snapshot, &snapshot);
        assert!(plan.is_empty());
        assert_eq!(plan.order.len(), 2);
    }

    #[test]
    fn appended_layers_are_added_in_place() {
        let c = component();
        let prev = layers(&["a"], &c);
        let mut next = prev.clone();
        next.extend(layers(&["b", "c"], &c));

        let plan = MountPlan::diff(&prev, &next);
        assert_eq!(plan.added, vec![1, 2]);
        assert!(plan.removed.is_empty());
        assert!(plan.updated.is_empty());
        assert!(!plan.reordered);
    }

    #[test]
    fn destroyed_key_removes_every_occurrence() {
        let c = component();
        let prev = layers(&["a", "k", "b", "k"], &c);
        let next: Vec<_> = prev.iter().filter(|l| l.key() != "k").cloned().collect();

        let plan = MountPlan::diff(&prev, &next);
        assert_eq!(plan.removed, vec![SlotKey::new("k", 0), SlotKey::new("k", 1)]);
        assert!(plan.added.is_empty());
        assert!(!plan.reordered, "survivors keep their relative order");
    }

    #[test]
    fn replaced_props_are_updates() {
        let c = component();
        let prev = layers(&["a", "b"], &c);
        let mut next = prev.clone();
        next[1] = next[1].clone().with_props(Props::new(5_u8));

        let plan = MountPlan::diff(&prev, &next);
        assert_eq!(plan.updated, vec![1]);
        assert!(plan.added.is_empty());
        assert!(plan.removed.is_empty());
    }

    #[test]
    fn readded_key_moves_to_the_end() {
        let c = component();
        let prev = layers(&["a", "b"], &c);
        // destroy("a") then add("a"), observed as one transition.
        let next = vec![prev[1].clone(), Layer::new("a", component())];

        let plan = MountPlan::diff(&prev, &next);
        assert!(plan.removed.is_empty());
        assert!(plan.added.is_empty());
        assert_eq!(plan.updated, vec![1], "new component under a surviving slot");
        assert!(plan.reordered);
        assert_eq!(plan.order, vec![SlotKey::new("b", 0), SlotKey::new("a", 0)]);
    }

    #[test]
    fn added_before_survivor_is_reordered() {
        let c = component();
        let prev = layers(&["a", "b"], &c);
        // destroy("a"), add("c"), add("a")
        let next = vec![prev[1].clone(), Layer::new("c", Rc::clone(&c)), prev[0].clone()];

        let plan = MountPlan::diff(&prev, &next);
        assert_eq!(plan.added, vec![1]);
        assert!(plan.updated.is_empty());
        assert!(plan.reordered);
    }

    #[test]
    fn diff_into_reuses_buffer() {
        let c = component();
        let a = layers(&["a"], &c);
        let ab = layers(&["a", "b"], &c);
        let mut plan = MountPlan::default();

        plan.diff_into(&[], &a);
        assert_eq!(plan.added, vec![0]);

        plan.diff_into(&a, &a);
        assert!(plan.added.is_empty(), "added should be cleared");
        assert!(plan.is_empty());

        plan.diff_into(&ab, &a);
        assert_eq!(plan.removed, vec![SlotKey::new("b", 0)]);
        assert_eq!(plan.order, vec![SlotKey::new("a", 0)]);
    }
}
