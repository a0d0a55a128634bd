// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless document and surface.
//!
//! [`MemoryDocument`] stands in for a host document: a set of named
//! containers, each holding mounted views in display order. A
//! [`MemorySurface`] attaches to one container, creating it on first use.
//! Every mount gets a fresh instance number, so callers can tell an in-place
//! update from a remount.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::plan::SlotKey;
use crate::surface::Surface;

/// A view mounted in a [`MemoryDocument`] container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mounted<V> {
    /// The slot this view belongs to.
    pub slot: SlotKey,
    /// Document-wide mount counter value; changes only on remount.
    pub instance: u64,
    /// The rendered view.
    pub view: V,
    /// Number of in-place updates since mount.
    pub updates: u32,
}

struct DocState<V> {
    containers: BTreeMap<String, Vec<Mounted<V>>>,
    next_instance: u64,
    created: usize,
}

/// Shared in-memory document.
///
/// Cloning yields another handle to the same document.
pub struct MemoryDocument<V> {
    state: Rc<RefCell<DocState<V>>>,
}

impl<V> Clone for MemoryDocument<V> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<V> Default for MemoryDocument<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for MemoryDocument<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MemoryDocument")
            .field("containers", &state.containers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<V> MemoryDocument<V> {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(DocState {
                containers: BTreeMap::new(),
                next_instance: 0,
                created: 0,
            })),
        }
    }

    /// Returns whether a container named `id` exists.
    #[must_use]
    pub fn has_container(&self, id: &str) -> bool {
        self.state.borrow().containers.contains_key(id)
    }

    /// Returns how many containers were ever created.
    #[must_use]
    pub fn containers_created(&self) -> usize {
        self.state.borrow().created
    }

    /// Returns the slots mounted in container `id`, in display order.
    #[must_use]
    pub fn slots(&self, id: &str) -> Vec<SlotKey> {
        self.with_container(id, |mounted| mounted.iter().map(|m| m.slot.clone()).collect())
    }

    /// Runs `f` over the contents of container `id` (empty if missing).
    pub fn with_container<R>(&self, id: &str, f: impl FnOnce(&[Mounted<V>]) -> R) -> R {
        let state = self.state.borrow();
        f(state.containers.get(id).map_or(&[][..], Vec::as_slice))
    }

    /// Returns a copy of container `id`'s contents.
    #[must_use]
    pub fn container(&self, id: &str) -> Vec<Mounted<V>>
    where
        V: Clone,
    {
        self.with_container(id, <[Mounted<V>]>::to_vec)
    }

    fn ensure_container(&self, id: &str) {
        let mut state = self.state.borrow_mut();
        if !state.containers.contains_key(id) {
            state.containers.insert(id.into(), Vec::new());
            state.created += 1;
        }
    }

    fn edit<R>(&self, id: &str, f: impl FnOnce(&mut Vec<Mounted<V>>, &mut u64) -> R) -> R {
        let mut state = self.state.borrow_mut();
        let DocState {
            containers,
            next_instance,
            ..
        } = &mut *state;
        f(containers.entry(id.into()).or_default(), next_instance)
    }
}

/// A [`Surface`] backed by one container of a [`MemoryDocument`].
///
/// A surface only touches the views it mounted itself, so several surfaces
/// can share one container.
pub struct MemorySurface<V> {
    document: MemoryDocument<V>,
    container: String,
    /// Instance currently mounted for each of this surface's slots.
    owned: BTreeMap<SlotKey, u64>,
}

impl<V> fmt::Debug for MemorySurface<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySurface")
            .field("container", &self.container)
            .field("mounted", &self.owned.len())
            .finish_non_exhaustive()
    }
}

impl<V> MemorySurface<V> {
    /// Attaches to container `id`, creating it if it does not exist yet.
    ///
    /// Several surfaces may attach to the same container.
    #[must_use]
    pub fn attach(document: &MemoryDocument<V>, id: &str) -> Self {
        document.ensure_container(id);
        Self {
            document: document.clone(),
            container: id.into(),
            owned: BTreeMap::new(),
        }
    }

    /// Returns the container id.
    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container
    }

    /// Returns the document this surface mounts into.
    #[must_use]
    pub fn document(&self) -> &MemoryDocument<V> {
        &self.document
    }

    /// Returns the slots this surface has mounted, in display order.
    #[must_use]
    pub fn slots(&self) -> Vec<SlotKey> {
        self.document.with_container(&self.container, |mounted| {
            mounted
                .iter()
                .filter(|m| owns(&self.owned, m))
                .map(|m| m.slot.clone())
                .collect()
        })
    }

    /// Returns a copy of this surface's views in display order.
    #[must_use]
    pub fn views(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.document.with_container(&self.container, |mounted| {
            mounted
                .iter()
                .filter(|m| owns(&self.owned, m))
                .map(|m| m.view.clone())
                .collect()
        })
    }
}

fn owns<V>(owned: &BTreeMap<SlotKey, u64>, mounted: &Mounted<V>) -> bool {
    owned.get(&mounted.slot) == Some(&mounted.instance)
}

impl<V> Surface<V> for MemorySurface<V> {
    fn mount(&mut self, slot: &SlotKey, view: V) {
        let previous = self.owned.get(slot).copied();
        let instance = self.document.edit(&self.container, |mounted, next_instance| {
            if let Some(previous) = previous {
                mounted.retain(|m| m.instance != previous);
            }
            let instance = *next_instance;
            *next_instance += 1;
            mounted.push(Mounted {
                slot: slot.clone(),
                instance,
                view,
                updates: 0,
            });
            instance
        });
        self.owned.insert(slot.clone(), instance);
    }

    fn update(&mut self, slot: &SlotKey, view: V) {
        let Some(&instance) = self.owned.get(slot) else {
            return;
        };
        self.document.edit(&self.container, |mounted, _| {
            if let Some(m) = mounted.iter_mut().find(|m| m.instance == instance) {
                m.view = view;
                m.updates += 1;
            }
        });
    }

    fn unmount(&mut self, slot: &SlotKey) {
        let Some(instance) = self.owned.remove(slot) else {
            return;
        };
        self.document.edit(&self.container, |mounted, _| {
            mounted.retain(|m| m.instance != instance);
        });
    }

    fn reorder(&mut self, order: &[SlotKey]) {
        let owned = &self.owned;
        self.document.edit(&self.container, |mounted, _| {
            // Positions held by this surface; other surfaces' views stay put.
            let positions: Vec<usize> = (0..mounted.len())
                .filter(|&i| owns(owned, &mounted[i]))
                .collect();
            let mut sources: Vec<usize> = order
                .iter()
                .filter_map(|slot| {
                    let instance = owned.get(slot)?;
                    positions
                        .iter()
                        .copied()
                        .find(|&p| mounted[p].instance == *instance)
                })
                .collect();
            for &p in &positions {
                if !sources.contains(&p) {
                    sources.push(p);
                }
            }

            let mut cells: Vec<Option<Mounted<V>>> = mounted.drain(..).map(Some).collect();
            let mut sources = sources.into_iter();
            for i in 0..cells.len() {
                let from = if positions.binary_search(&i).is_ok() {
                    sources.next().unwrap_or(i)
                } else {
                    i
                };
                if let Some(m) = cells[from].take() {
                    mounted.push(m);
                }
            }
        });
    }
}
