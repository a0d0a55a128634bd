// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` sync scheduling.
//!
//! Registry notifications arrive synchronously, possibly many per frame.
//! [`FrameScheduler`] turns any number of [`request`](FrameScheduler::request)
//! calls within one frame into a single callback on the next animation frame.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct SchedulerInner {
    /// The JS closure registered with `requestAnimationFrame`. Created once
    /// and reused for every request.
    closure: RefCell<Option<RafClosure>>,

    /// The user-supplied callback run once per requested frame.
    callback: RefCell<Box<dyn FnMut()>>,

    /// Whether a frame is requested and has not run yet.
    pending: Cell<bool>,

    /// The ID returned by the most recent `requestAnimationFrame` call.
    raf_id: Cell<i32>,
}

/// Runs a callback at most once per animation frame, on demand.
pub struct FrameScheduler {
    inner: Rc<SchedulerInner>,
}

impl FrameScheduler {
    /// Creates a scheduler with nothing requested.
    pub fn new(callback: impl FnMut() + 'static) -> Self {
        let inner = Rc::new(SchedulerInner {
            closure: RefCell::new(None),
            callback: RefCell::new(Box::new(callback)),
            pending: Cell::new(false),
            raf_id: Cell::new(0),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |_timestamp_ms: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !inner.pending.replace(false) {
                return;
            }
            // A request made from inside the callback schedules the next frame.
            if let Ok(mut callback) = inner.callback.try_borrow_mut() {
                callback();
            }
        }) as Box<dyn FnMut(f64)>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Schedules the callback for the next animation frame. Does nothing if
    /// a frame is already pending.
    pub fn request(&self) {
        request(&self.inner);
    }

    /// Returns a closure that calls [`request`](Self::request), suitable as
    /// a portal wake callback. It does nothing once the scheduler is dropped.
    pub fn waker(&self) -> impl Fn() + 'static {
        let weak: Weak<SchedulerInner> = Rc::downgrade(&self.inner);
        move || {
            if let Some(inner) = weak.upgrade() {
                request(&inner);
            }
        }
    }

    /// Cancels a pending frame, if any.
    pub fn cancel(&self) {
        if self.inner.pending.replace(false) {
            cancel_animation_frame(self.inner.raf_id.get());
        }
    }

    /// Returns `true` if a frame is requested and has not run yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get()
    }
}

fn request(inner: &SchedulerInner) {
    if inner.pending.get() {
        return;
    }
    if let Some(ref closure) = *inner.closure.borrow() {
        inner.pending.set(true);
        let id = request_animation_frame(closure.as_ref().unchecked_ref());
        inner.raf_id.set(id);
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.cancel();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.inner.pending.get())
            .finish_non_exhaustive()
    }
}
