// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic in-memory [`Host`] for tests and headless runs.
//!
//! [`SimHost`] keeps a virtual millisecond clock, a queue of frame callbacks
//! and a registry of pointer listeners. Nothing happens on its own: time moves
//! with [`SimHost::advance`], frames run with [`SimHost::run_frame`] and
//! pointer events are delivered with [`SimHost::dispatch`].
//!
//! ```
//! use core::time::Duration;
//! use std::rc::Rc;
//! use std::cell::Cell;
//! use understory_safe_zone::host::Host;
//! use understory_safe_zone::sim::SimHost;
//!
//! let host = SimHost::new();
//! let fired = Rc::new(Cell::new(false));
//! let flag = fired.clone();
//! host.set_timeout(Duration::from_millis(100), Box::new(move || flag.set(true)));
//!
//! host.advance(Duration::from_millis(99));
//! assert!(!fired.get());
//! host.advance(Duration::from_millis(1));
//! assert!(fired.get());
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::time::Duration;

use kurbo::{Point, Rect};

use crate::host::{
    FrameHandle, Host, Listener, ListenerHandle, PointerEvent, PointerKind, TimerHandle,
    duration_ms,
};

/// Element identity used by [`SimHost`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimElement(pub u32);

/// Scheduling counters collected by [`SimHost`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Calls to `set_timeout` that returned a handle.
    pub timeouts_scheduled: u64,
    /// Pending timers removed by `clear_timeout`.
    pub timeouts_cleared: u64,
    /// Timers whose callback ran.
    pub timeouts_fired: u64,
    /// Calls to `request_frame` that returned a handle.
    pub frames_requested: u64,
    /// Pending frames removed by `cancel_frame`.
    pub frames_canceled: u64,
    /// Listeners registered.
    pub listeners_added: u64,
    /// Listeners removed.
    pub listeners_removed: u64,
}

struct PendingTimer {
    id: u64,
    due: u64,
    callback: Box<dyn FnOnce()>,
}

struct Registered {
    id: u64,
    element: SimElement,
    kind: PointerKind,
    listener: Listener,
}

struct SimState {
    now: u64,
    next_id: u64,
    timers: Vec<PendingTimer>,
    frames: Vec<(u64, Box<dyn FnOnce()>)>,
    listeners: Vec<Registered>,
    rects: Vec<(SimElement, Rect)>,
    stats: SimStats,
    timers_enabled: bool,
    frames_enabled: bool,
}

impl SimState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A deterministic, manually driven host.
pub struct SimHost {
    state: RefCell<SimState>,
}

impl fmt::Debug for SimHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SimHost")
            .field("now", &state.now)
            .field("timers", &state.timers.len())
            .field("frames", &state.frames.len())
            .field("listeners", &state.listeners.len())
            .field("stats", &state.stats)
            .finish_non_exhaustive()
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    /// Creates a host at time zero with timers and frames available.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RefCell::new(SimState {
                now: 0,
                next_id: 0,
                timers: Vec::new(),
                frames: Vec::new(),
                listeners: Vec::new(),
                rects: Vec::new(),
                stats: SimStats::default(),
                timers_enabled: true,
                frames_enabled: true,
            }),
        }
    }

    /// Simulates a host without a delay-timer service.
    #[must_use]
    pub fn without_timers(self) -> Self {
        self.state.borrow_mut().timers_enabled = false;
        self
    }

    /// Simulates a host without a display-frame service.
    #[must_use]
    pub fn without_frames(self) -> Self {
        self.state.borrow_mut().frames_enabled = false;
        self
    }

    /// Current virtual time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.state.borrow().now
    }

    /// Sets (or with `None`, removes) the layout rectangle of `element`.
    pub fn set_rect(&self, element: SimElement, rect: Option<Rect>) {
        let mut state = self.state.borrow_mut();
        state.rects.retain(|(e, _)| *e != element);
        if let Some(rect) = rect {
            state.rects.push((element, rect));
        }
    }

    /// Moves the clock forward, firing due timers in deadline order.
    ///
    /// Returns the number of timers fired. Timers scheduled by a callback
    /// fire in the same call if they fall due before the new time.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.borrow().now.saturating_add(duration_ms(by));
        let mut fired = 0;
        loop {
            let callback = {
                let mut state = self.state.borrow_mut();
                let next = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);
                let Some(index) = next else {
                    break;
                };
                let timer = state.timers.remove(index);
                state.now = timer.due;
                state.stats.timeouts_fired += 1;
                timer.callback
            };
            callback();
            fired += 1;
        }
        self.state.borrow_mut().now = target;
        fired
    }

    /// Runs every frame callback requested before this call.
    ///
    /// Callbacks requested while running wait for the next call. Returns the
    /// number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let ids: Vec<u64> = self.state.borrow().frames.iter().map(|(id, _)| *id).collect();
        let mut ran = 0;
        for id in ids {
            let callback = {
                let mut state = self.state.borrow_mut();
                let Some(index) = state.frames.iter().position(|(f, _)| *f == id) else {
                    // Canceled by an earlier callback of this frame.
                    continue;
                };
                state.frames.remove(index).1
            };
            callback();
            ran += 1;
        }
        ran
    }

    /// Delivers a pointer event to every listener of `kind` on `element`.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, element: SimElement, kind: PointerKind, position: Point) -> usize {
        let listeners: Vec<Listener> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|r| r.element == element && r.kind == kind)
            .map(|r| Rc::clone(&r.listener))
            .collect();
        let event = PointerEvent::new(kind, position);
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    /// Number of registered listeners across all elements.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Number of registered listeners on `element`.
    #[must_use]
    pub fn listeners_on(&self, element: SimElement) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|r| r.element == element)
            .count()
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn pending_timeouts(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Number of frame callbacks waiting to run.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    /// Scheduling counters since creation.
    #[must_use]
    pub fn stats(&self) -> SimStats {
        self.state.borrow().stats
    }
}

impl Host for SimHost {
    type Element = SimElement;

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Option<TimerHandle> {
        let mut state = self.state.borrow_mut();
        if !state.timers_enabled {
            return None;
        }
        let id = state.next_id();
        let due = state.now.saturating_add(duration_ms(delay));
        state.timers.push(PendingTimer { id, due, callback });
        state.stats.timeouts_scheduled += 1;
        Some(TimerHandle(id))
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(index) = state.timers.iter().position(|t| t.id == handle.0) {
            state.timers.remove(index);
            state.stats.timeouts_cleared += 1;
        }
    }

    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Option<FrameHandle> {
        let mut state = self.state.borrow_mut();
        if !state.frames_enabled {
            return None;
        }
        let id = state.next_id();
        state.frames.push((id, callback));
        state.stats.frames_requested += 1;
        Some(FrameHandle(id))
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(index) = state.frames.iter().position(|(id, _)| *id == handle.0) {
            state.frames.remove(index);
            state.stats.frames_canceled += 1;
        }
    }

    fn add_listener(
        &self,
        element: &SimElement,
        kind: PointerKind,
        listener: Listener,
    ) -> Option<ListenerHandle> {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.listeners.push(Registered {
            id,
            element: *element,
            kind,
            listener,
        });
        state.stats.listeners_added += 1;
        Some(ListenerHandle(id))
    }

    fn remove_listener(&self, handle: ListenerHandle) {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|r| r.id != handle.0);
        if state.listeners.len() != before {
            state.stats.listeners_removed += 1;
        }
    }

    fn measure(&self, element: &SimElement) -> Option<Rect> {
        self.state
            .borrow()
            .rects
            .iter()
            .find(|(e, _)| e == element)
            .map(|(_, r)| *r)
    }
}
