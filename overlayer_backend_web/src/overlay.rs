// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A registry rendered into the page.

use alloc::rc::Rc;
use core::cell::RefCell;

use overlayer_core::LayerRegistry;
use overlayer_render::Portal;
use web_sys::{Document, Element};

use crate::raf::FrameScheduler;
use crate::surface::{DomError, DomSurface};

type DomPortal = Portal<Element, DomSurface>;

/// Mirrors a registry of DOM-producing components into a container element.
///
/// Layers present at mount time are rendered immediately. After that, every
/// registry notification requests an animation frame, and the frame callback
/// syncs the portal once no matter how many notifications arrived. Dropping
/// the overlay cancels the pending frame, unsubscribes, and leaves the
/// container's mounted children in place; call [`unmount`](Self::unmount) to
/// remove them.
pub struct DomOverlay {
    portal: Rc<RefCell<Option<DomPortal>>>,
    scheduler: FrameScheduler,
}

impl core::fmt::Debug for DomOverlay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomOverlay")
            .field("portal", &self.portal)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl DomOverlay {
    /// Attaches to (or creates) container `container_id` and renders
    /// `registry` into it.
    pub fn mount(
        registry: &LayerRegistry<Element>,
        document: &Document,
        container_id: &str,
    ) -> Result<Self, DomError> {
        let surface = DomSurface::attach(document, container_id)?;
        let portal: Rc<RefCell<Option<DomPortal>>> = Rc::new(RefCell::new(None));

        let target = Rc::downgrade(&portal);
        let scheduler = FrameScheduler::new(move || {
            if let Some(portal) = target.upgrade()
                && let Ok(mut portal) = portal.try_borrow_mut()
                && let Some(portal) = portal.as_mut()
            {
                portal.sync();
            }
        });

        *portal.borrow_mut() = Some(Portal::mount_with_wake(
            registry,
            surface,
            scheduler.waker(),
        ));
        Ok(Self { portal, scheduler })
    }

    /// Syncs immediately instead of waiting for the next frame.
    pub fn flush(&self) -> bool {
        self.scheduler.cancel();
        self.portal
            .borrow_mut()
            .as_mut()
            .is_some_and(Portal::sync)
    }

    /// Runs `f` with the portal, e.g. to inspect render failures.
    pub fn with_portal<R>(&self, f: impl FnOnce(&DomPortal) -> R) -> Option<R> {
        self.portal.borrow().as_ref().map(f)
    }

    /// Unsubscribes, removes every mounted element, and returns the surface.
    pub fn unmount(self) -> Option<DomSurface> {
        self.scheduler.cancel();
        let portal = self.portal.borrow_mut().take();
        portal.map(Portal::unmount)
    }
}
