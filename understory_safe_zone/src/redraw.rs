// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-synchronized redraw of the safe-zone polygon.
//!
//! While running, [`RedrawLoop`] performs one tick per display frame:
//!
//! 1. sample the live layout (container rect, target rect) and the latest pointer,
//! 2. compute the polygon with [`compute_polygon`],
//! 3. hand a [`SafeZoneFrame`] to the [`SafeZoneRenderer`],
//! 4. request the next frame.
//!
//! A sample that cannot be taken (an element is detached) skips step 2 and 3
//! but still reschedules, so the loop recovers once layout is available again.
//! At most one frame request is outstanding at any time; [`RedrawLoop::start`]
//! on a running loop and [`RedrawLoop::stop`] on a stopped one are no-ops.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::{Point, Rect};

use crate::geometry::{SafeZonePolygon, compute_polygon};
use crate::host::{FrameHandle, Host};

/// Layout and pointer inputs of a single tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameSample {
    /// Current container rectangle.
    pub container_rect: Rect,
    /// Current target rectangle.
    pub target_rect: Rect,
    /// Latest pointer position.
    pub pointer: Point,
}

/// Everything a renderer needs to draw one frame of the zone.
#[derive(Clone, Debug, PartialEq)]
pub struct SafeZoneFrame {
    /// Container rectangle measured for this frame.
    pub container_rect: Rect,
    /// Target rectangle measured for this frame.
    pub target_rect: Rect,
    /// Pointer position used for this frame.
    pub pointer: Point,
    /// Polygon computed from the three values above.
    pub polygon: SafeZonePolygon,
}

/// Draws the zone shape.
///
/// Any `FnMut(&SafeZoneFrame)` closure is a renderer.
pub trait SafeZoneRenderer {
    /// Draws `frame`, replacing whatever was drawn before.
    fn render(&mut self, frame: &SafeZoneFrame);

    /// Removes the shape; called when the loop stops.
    fn clear(&mut self) {}
}

impl<F: FnMut(&SafeZoneFrame)> SafeZoneRenderer for F {
    fn render(&mut self, frame: &SafeZoneFrame) {
        self(frame);
    }
}

type Sampler = Box<dyn Fn() -> Option<FrameSample>>;

struct LoopShared<H> {
    host: Rc<H>,
    sample: Sampler,
    renderer: RefCell<Box<dyn SafeZoneRenderer>>,
    running: Cell<bool>,
    handle: Cell<Option<FrameHandle>>,
    last: RefCell<Option<SafeZonePolygon>>,
    published: Cell<u64>,
}

/// Start/stop controller for the per-frame redraw.
///
/// Cloning yields another handle to the same loop.
pub struct RedrawLoop<H> {
    shared: Rc<LoopShared<H>>,
}

impl<H> Clone for RedrawLoop<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<H> fmt::Debug for RedrawLoop<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedrawLoop")
            .field("running", &self.shared.running.get())
            .field("handle", &self.shared.handle.get())
            .field("published", &self.shared.published.get())
            .finish_non_exhaustive()
    }
}

impl<H: Host + 'static> RedrawLoop<H> {
    /// Creates a stopped loop.
    ///
    /// `sample` is called once per tick and returns `None` when the layout
    /// cannot be measured.
    pub fn new(
        host: Rc<H>,
        sample: impl Fn() -> Option<FrameSample> + 'static,
        renderer: impl SafeZoneRenderer + 'static,
    ) -> Self {
        Self {
            shared: Rc::new(LoopShared {
                host,
                sample: Box::new(sample),
                renderer: RefCell::new(Box::new(renderer)),
                running: Cell::new(false),
                handle: Cell::new(None),
                last: RefCell::new(None),
                published: Cell::new(0),
            }),
        }
    }

    /// Starts ticking. No-op while already running.
    pub fn start(&self) {
        if self.shared.running.replace(true) {
            return;
        }
        zone_debug!("redraw loop started");
        Self::schedule(&self.shared);
    }

    /// Stops ticking and cancels the pending frame. Idempotent.
    pub fn stop(&self) {
        if !self.shared.running.replace(false) {
            return;
        }
        if let Some(handle) = self.shared.handle.take() {
            self.shared.host.cancel_frame(handle);
        }
        self.shared.last.borrow_mut().take();
        // A renderer stopping the loop from inside `render` is already borrowed.
        if let Ok(mut renderer) = self.shared.renderer.try_borrow_mut() {
            renderer.clear();
        }
        zone_debug!("redraw loop stopped");
    }

    /// Returns `true` between [`start`](Self::start) and [`stop`](Self::stop).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.get()
    }

    /// Returns `true` while a frame request is outstanding.
    #[must_use]
    pub fn has_pending_frame(&self) -> bool {
        self.shared.handle.get().is_some()
    }

    /// Returns the polygon published by the latest tick of the current run.
    #[must_use]
    pub fn current_polygon(&self) -> Option<SafeZonePolygon> {
        self.shared.last.borrow().clone()
    }

    /// Returns how many frames have been handed to the renderer so far.
    #[must_use]
    pub fn published_frames(&self) -> u64 {
        self.shared.published.get()
    }

    fn schedule(shared: &Rc<LoopShared<H>>) {
        if let Some(stale) = shared.handle.take() {
            shared.host.cancel_frame(stale);
        }
        let weak = Rc::downgrade(shared);
        let handle = shared.host.request_frame(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                Self::tick(&shared);
            }
        }));
        if handle.is_none() {
            zone_debug!("no frame scheduler available; redraw loop idle");
        }
        shared.handle.set(handle);
    }

    fn tick(shared: &Rc<LoopShared<H>>) {
        shared.handle.set(None);
        if !shared.running.get() {
            return;
        }

        if let Some(sample) = (shared.sample)() {
            let polygon =
                compute_polygon(sample.container_rect, sample.target_rect, sample.pointer);
            let frame = SafeZoneFrame {
                container_rect: sample.container_rect,
                target_rect: sample.target_rect,
                pointer: sample.pointer,
                polygon,
            };
            *shared.last.borrow_mut() = Some(frame.polygon.clone());
            shared.published.set(shared.published.get() + 1);
            zone_trace!(pointer = ?frame.pointer, "publishing safe zone");
            shared.renderer.borrow_mut().render(&frame);
        } else {
            zone_trace!("layout unavailable; skipping safe zone frame");
        }

        // The renderer may have stopped the loop.
        if shared.running.get() {
            Self::schedule(shared);
        }
    }
}
