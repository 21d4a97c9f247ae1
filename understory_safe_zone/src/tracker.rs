// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer tracking over the target, the container and the zone shape.
//!
//! [`PointerTracker`] owns the native listeners, the latest pointer position
//! and the inactivity timeout. It drives the [`ActivationStore`] with named
//! [`Trigger`]s:
//!
//! | surface   | event  | effect                                                      |
//! |-----------|--------|-------------------------------------------------------------|
//! | container | enter  | clear timeout, [`Trigger::ContainerEnter`]                  |
//! | target    | move   | record pointer, clear timeout, [`Trigger::TargetMove`]      |
//! | zone      | enter  | user `on_enter`, then re-arm the timeout                    |
//! | zone      | move   | user `on_move`                                              |
//! | zone      | leave  | user `on_leave`                                             |
//! | timer     | fire   | [`Trigger::TimeoutFire`], then user `on_timeout`            |
//!
//! Leaving the zone shape does not touch the timeout: the pointer may briefly
//! overshoot the shape and come back before it expires.
//!
//! The pointer cell is written only by the target move handler and read only
//! by [`PointerTracker::sample`].

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;
use core::time::Duration;

use kurbo::Point;

use crate::activation::{ActivationStore, Trigger};
use crate::config::SafeZoneConfig;
use crate::host::{Host, Listener, ListenerHandle, PointerEvent, PointerKind, TimerHandle};
use crate::redraw::FrameSample;

type PointHandler = Box<dyn Fn(Point)>;

/// Optional user callbacks for zone-shape activity and timeout.
///
/// ```
/// use understory_safe_zone::SafeZoneHandlers;
///
/// let handlers = SafeZoneHandlers::new()
///     .on_enter(|p| println!("entered zone at {p:?}"))
///     .on_timeout(|| println!("closing submenu"));
/// assert!(handlers.has_timeout_handler());
/// ```
#[derive(Default)]
pub struct SafeZoneHandlers {
    enter: Option<PointHandler>,
    moved: Option<PointHandler>,
    leave: Option<PointHandler>,
    timeout: Option<Box<dyn Fn()>>,
}

impl fmt::Debug for SafeZoneHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeZoneHandlers")
            .field("enter", &self.enter.is_some())
            .field("moved", &self.moved.is_some())
            .field("leave", &self.leave.is_some())
            .field("timeout", &self.timeout.is_some())
            .finish()
    }
}

impl SafeZoneHandlers {
    /// No callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the pointer enters the zone shape.
    #[must_use]
    pub fn on_enter(mut self, f: impl Fn(Point) + 'static) -> Self {
        self.enter = Some(Box::new(f));
        self
    }

    /// Called when the pointer moves inside the zone shape.
    #[must_use]
    pub fn on_move(mut self, f: impl Fn(Point) + 'static) -> Self {
        self.moved = Some(Box::new(f));
        self
    }

    /// Called when the pointer leaves the zone shape.
    #[must_use]
    pub fn on_leave(mut self, f: impl Fn(Point) + 'static) -> Self {
        self.leave = Some(Box::new(f));
        self
    }

    /// Called after the inactivity timeout closed the zone.
    #[must_use]
    pub fn on_timeout(mut self, f: impl Fn() + 'static) -> Self {
        self.timeout = Some(Box::new(f));
        self
    }

    /// Returns `true` if a timeout callback is registered.
    #[must_use]
    pub fn has_timeout_handler(&self) -> bool {
        self.timeout.is_some()
    }
}

struct Surface<E> {
    element: Option<E>,
    listener: Option<ListenerHandle>,
}

impl<E> Surface<E> {
    const fn empty() -> Self {
        Self {
            element: None,
            listener: None,
        }
    }
}

struct TrackerShared<H: Host> {
    host: Rc<H>,
    store: ActivationStore,
    handlers: SafeZoneHandlers,
    timeout: Duration,
    enabled: bool,
    disposed: Cell<bool>,
    pointer: Cell<Option<Point>>,
    pending_timeout: Cell<Option<TimerHandle>>,
    timeout_epoch: Cell<u64>,
    container: RefCell<Surface<H::Element>>,
    target: RefCell<Surface<H::Element>>,
}

/// Listener and timer owner for one target/container pair.
///
/// Cloning yields another handle to the same tracker.
pub struct PointerTracker<H: Host> {
    shared: Rc<TrackerShared<H>>,
}

impl<H: Host> Clone for PointerTracker<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<H: Host> fmt::Debug for PointerTracker<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.shared;
        f.debug_struct("PointerTracker")
            .field("enabled", &s.enabled)
            .field("disposed", &s.disposed.get())
            .field("pointer", &s.pointer.get())
            .field("pending_timeout", &s.pending_timeout.get())
            .field("container", &s.container.borrow().element)
            .field("target", &s.target.borrow().element)
            .field("handlers", &s.handlers)
            .finish_non_exhaustive()
    }
}

impl<H: Host + 'static> PointerTracker<H> {
    /// Creates a tracker with no attached surfaces.
    ///
    /// A `disabled` config makes every attach a no-op.
    pub fn new(
        host: Rc<H>,
        store: ActivationStore,
        config: &SafeZoneConfig,
        handlers: SafeZoneHandlers,
    ) -> Self {
        Self {
            shared: Rc::new(TrackerShared {
                host,
                store,
                handlers,
                timeout: config.timeout,
                enabled: !config.disabled,
                disposed: Cell::new(false),
                pointer: Cell::new(None),
                pending_timeout: Cell::new(None),
                timeout_epoch: Cell::new(0),
                container: RefCell::new(Surface::empty()),
                target: RefCell::new(Surface::empty()),
            }),
        }
    }

    /// Attaches the container surface, or detaches it with `None`.
    pub fn set_container(&self, element: Option<H::Element>) {
        let weak = Rc::downgrade(&self.shared);
        self.attach(&self.shared.container, element, PointerKind::Enter, move |_| {
            if let Some(shared) = weak.upgrade() {
                Self { shared }.handle_container_enter();
            }
        });
    }

    /// Attaches the target surface, or detaches it with `None`.
    ///
    /// Detaching cancels the pending timeout and deactivates the zone before
    /// the element is released.
    pub fn set_target(&self, element: Option<H::Element>) {
        if element.is_none() {
            self.clear_timeout();
            self.shared.store.apply(Trigger::Detach);
        }
        let weak = Rc::downgrade(&self.shared);
        self.attach(&self.shared.target, element, PointerKind::Move, move |event| {
            if let Some(shared) = weak.upgrade() {
                Self { shared }.handle_target_move(event.position);
            }
        });
    }

    fn attach(
        &self,
        surface: &RefCell<Surface<H::Element>>,
        element: Option<H::Element>,
        kind: PointerKind,
        listener: impl Fn(PointerEvent) + 'static,
    ) {
        let s = &self.shared;
        if !s.enabled || (s.disposed.get() && element.is_some()) {
            return;
        }
        let mut surface = surface.borrow_mut();
        if surface.element == element && (element.is_none() || surface.listener.is_some()) {
            return;
        }
        if let Some(handle) = surface.listener.take() {
            s.host.remove_listener(handle);
        }
        surface.element = element;
        if let Some(element) = &surface.element {
            let listener: Listener = Rc::new(listener);
            let handle = s.host.add_listener(element, kind, listener);
            zone_debug!(?element, ?kind, "surface attached");
            surface.listener = handle;
        } else {
            zone_debug!(?kind, "surface detached");
        }
    }

    /// Container surface: the pointer reached the destination.
    pub fn handle_container_enter(&self) {
        if !self.is_live() {
            return;
        }
        self.clear_timeout();
        self.shared.store.apply(Trigger::ContainerEnter);
    }

    /// Target surface: record the pointer and open the zone.
    pub fn handle_target_move(&self, position: Point) {
        if !self.is_live() {
            return;
        }
        self.shared.pointer.set(Some(position));
        self.clear_timeout();
        if !self.shared.store.is_active() {
            self.shared.store.apply(Trigger::TargetMove);
        }
    }

    /// Zone shape: the pointer entered; re-arms the inactivity timeout.
    ///
    /// Ignored while the zone is inactive: there is no shape to enter.
    pub fn zone_enter(&self, position: Point) {
        if !self.is_live() || !self.shared.store.is_active() {
            return;
        }
        self.shared.store.apply(Trigger::ZoneEnter);
        if let Some(f) = &self.shared.handlers.enter {
            f(position);
        }
        // The callback may have torn the zone down.
        if self.is_live() && self.shared.store.is_active() {
            self.arm_timeout();
        }
    }

    /// Zone shape: the pointer moved inside.
    pub fn zone_move(&self, position: Point) {
        if !self.is_live() {
            return;
        }
        if let Some(f) = &self.shared.handlers.moved {
            f(position);
        }
    }

    /// Zone shape: the pointer left. Timers are left alone.
    pub fn zone_leave(&self, position: Point) {
        if !self.is_live() {
            return;
        }
        self.shared.store.apply(Trigger::ZoneLeave);
        if let Some(f) = &self.shared.handlers.leave {
            f(position);
        }
    }

    /// Latest pointer position seen on the target.
    #[must_use]
    pub fn pointer(&self) -> Option<Point> {
        self.shared.pointer.get()
    }

    /// Currently attached container element.
    #[must_use]
    pub fn container(&self) -> Option<H::Element> {
        self.shared.container.borrow().element.clone()
    }

    /// Currently attached target element.
    #[must_use]
    pub fn target(&self) -> Option<H::Element> {
        self.shared.target.borrow().element.clone()
    }

    /// Returns `true` while an inactivity timeout is armed.
    #[must_use]
    pub fn has_pending_timeout(&self) -> bool {
        self.shared.pending_timeout.get().is_some()
    }

    /// Measures both surfaces and pairs them with the latest pointer.
    ///
    /// `None` if either element is missing or unmeasurable, or no pointer
    /// position has been recorded yet.
    #[must_use]
    pub fn sample(&self) -> Option<FrameSample> {
        let pointer = self.shared.pointer.get()?;
        let container = self.container()?;
        let target = self.target()?;
        Some(FrameSample {
            container_rect: self.shared.host.measure(&container)?,
            target_rect: self.shared.host.measure(&target)?,
            pointer,
        })
    }

    /// A sampler closure that does not keep the tracker alive.
    pub(crate) fn sampler(&self) -> impl Fn() -> Option<FrameSample> + 'static {
        let weak = Rc::downgrade(&self.shared);
        move || {
            weak.upgrade().and_then(|shared| Self { shared }.sample())
        }
    }

    /// Detaches both surfaces and cancels the timeout. Idempotent.
    ///
    /// After this no listener, timer or user callback of this tracker runs.
    pub fn dispose(&self) {
        if self.shared.disposed.replace(true) {
            return;
        }
        self.clear_timeout();
        for surface in [&self.shared.container, &self.shared.target] {
            let mut surface = surface.borrow_mut();
            if let Some(handle) = surface.listener.take() {
                self.shared.host.remove_listener(handle);
            }
            surface.element = None;
        }
        zone_debug!("pointer tracker disposed");
    }

    fn is_live(&self) -> bool {
        self.shared.enabled && !self.shared.disposed.get()
    }

    fn arm_timeout(&self) {
        self.clear_timeout();
        let epoch = self.shared.timeout_epoch.get();
        let weak: Weak<TrackerShared<H>> = Rc::downgrade(&self.shared);
        let handle = self.shared.host.set_timeout(
            self.shared.timeout,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Self { shared }.fire_timeout(epoch);
                }
            }),
        );
        if handle.is_some() {
            zone_trace!(timeout = ?self.shared.timeout, "inactivity timeout armed");
        } else {
            zone_debug!("no timer available; zone stays open until toggled off");
        }
        self.shared.pending_timeout.set(handle);
    }

    fn clear_timeout(&self) {
        let s = &self.shared;
        s.timeout_epoch.set(s.timeout_epoch.get().wrapping_add(1));
        if let Some(handle) = s.pending_timeout.take() {
            s.host.clear_timeout(handle);
            zone_trace!("inactivity timeout cleared");
        }
    }

    fn fire_timeout(&self, epoch: u64) {
        // A host that runs canceled timers must not close a newer zone.
        if self.shared.timeout_epoch.get() != epoch || !self.is_live() {
            return;
        }
        self.shared.pending_timeout.set(None);
        zone_debug!("inactivity timeout fired");
        self.shared.store.apply(Trigger::TimeoutFire);
        if let Some(f) = &self.shared.handlers.timeout {
            f();
        }
    }
}
