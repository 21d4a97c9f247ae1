// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The orchestrator: one safe zone per target/container pair.
//!
//! [`SafeZone`] wires an [`ActivationStore`], a [`PointerTracker`] and a
//! [`RedrawLoop`] together. The store's transitions start and stop the loop;
//! the tracker turns host pointer events into transitions.
//!
//! Callers receive two attachment handles ([`SafeZone::container_ref`],
//! [`SafeZone::target_ref`]) to hand to whatever creates the elements, and
//! one renderable element ([`SafeZone::shape`]) whose pointer callbacks feed
//! back into the tracker. Dropping the [`SafeZone`] disposes it.

use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Point;

use crate::activation::{ActivationState, ActivationStore, Subscription, Trigger};
use crate::config::SafeZoneConfig;
use crate::geometry::SafeZonePolygon;
use crate::host::Host;
use crate::redraw::{RedrawLoop, SafeZoneRenderer};
use crate::tracker::{PointerTracker, SafeZoneHandlers};

struct ZoneInner<H: Host> {
    config: SafeZoneConfig,
    store: ActivationStore,
    tracker: PointerTracker<H>,
    redraw: RedrawLoop<H>,
    subscription: RefCell<Option<Subscription>>,
    disposed: Cell<bool>,
    /// Whether synthesized hit testing last saw the pointer inside the shape.
    /// Cleared whenever the zone closes.
    hovered: Rc<Cell<bool>>,
}

/// Safe-zone tracker for one target/container pair.
///
/// See the [crate documentation](crate) for a walkthrough.
pub struct SafeZone<H: Host + 'static> {
    inner: Rc<ZoneInner<H>>,
}

impl<H: Host + 'static> fmt::Debug for SafeZone<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeZone")
            .field("config", &self.inner.config)
            .field("state", &self.inner.store.state())
            .field("disposed", &self.inner.disposed.get())
            .field("tracker", &self.inner.tracker)
            .field("redraw", &self.inner.redraw)
            .finish_non_exhaustive()
    }
}

impl<H: Host + 'static> SafeZone<H> {
    /// Creates a safe zone drawing through `renderer`.
    ///
    /// Nothing is attached yet; hand [`container_ref`](Self::container_ref)
    /// and [`target_ref`](Self::target_ref) to the code creating the elements.
    pub fn new(
        host: Rc<H>,
        config: SafeZoneConfig,
        handlers: SafeZoneHandlers,
        renderer: impl SafeZoneRenderer + 'static,
    ) -> Self {
        let store = ActivationStore::new();
        let tracker = PointerTracker::new(Rc::clone(&host), store.clone(), &config, handlers);
        let redraw = RedrawLoop::new(host, tracker.sampler(), renderer);
        let hovered = Rc::new(Cell::new(false));
        let subscription = if config.disabled {
            None
        } else {
            let redraw = redraw.clone();
            let hovered = Rc::clone(&hovered);
            Some(store.subscribe(move |active| {
                if active {
                    redraw.start();
                } else {
                    hovered.set(false);
                    redraw.stop();
                }
            }))
        };
        Self {
            inner: Rc::new(ZoneInner {
                config,
                store,
                tracker,
                redraw,
                subscription: RefCell::new(subscription),
                disposed: Cell::new(false),
                hovered,
            }),
        }
    }

    /// The configuration this zone was created with.
    #[must_use]
    pub fn config(&self) -> SafeZoneConfig {
        self.inner.config
    }

    /// Current activation state.
    #[must_use]
    pub fn state(&self) -> ActivationState {
        self.inner.store.state()
    }

    /// Returns `true` while the container should be kept open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.store.is_active()
    }

    /// Latest pointer position seen on the target.
    #[must_use]
    pub fn pointer(&self) -> Option<Point> {
        self.inner.tracker.pointer()
    }

    /// Polygon published by the most recent redraw tick, while active.
    #[must_use]
    pub fn current_polygon(&self) -> Option<SafeZonePolygon> {
        self.inner.redraw.current_polygon()
    }

    /// The pointer tracker, for hosts that route pointer events themselves.
    #[must_use]
    pub fn tracker(&self) -> &PointerTracker<H> {
        &self.inner.tracker
    }

    /// The redraw loop driving the renderer.
    #[must_use]
    pub fn redraw_loop(&self) -> &RedrawLoop<H> {
        &self.inner.redraw
    }

    /// Observes activation changes, e.g. to keep a submenu open.
    #[must_use = "dropping the subscription keeps the subscriber registered; call `unsubscribe` to remove it"]
    pub fn subscribe(&self, subscriber: impl Fn(bool) + 'static) -> Subscription {
        self.inner.store.subscribe(subscriber)
    }

    /// Attachment handle for the container element.
    #[must_use]
    pub fn container_ref(&self) -> ElementRef<H> {
        ElementRef {
            zone: Rc::downgrade(&self.inner),
            role: SurfaceRole::Container,
        }
    }

    /// Attachment handle for the target element.
    #[must_use]
    pub fn target_ref(&self) -> ElementRef<H> {
        ElementRef {
            zone: Rc::downgrade(&self.inner),
            role: SurfaceRole::Target,
        }
    }

    /// Attaches (or with `None`, detaches) the container element.
    pub fn set_container(&self, element: Option<H::Element>) {
        self.inner.set_container(element);
    }

    /// Attaches (or with `None`, detaches) the target element.
    pub fn set_target(&self, element: Option<H::Element>) {
        self.inner.set_target(element);
    }

    /// The element to render, or `None` when disabled or disposed.
    #[must_use]
    pub fn shape(&self) -> Option<ZoneShape<H>> {
        if self.inner.config.disabled || self.inner.disposed.get() {
            return None;
        }
        Some(ZoneShape {
            zone: Rc::downgrade(&self.inner),
            fill: if self.inner.config.debug {
                ShapeFill::Debug
            } else {
                ShapeFill::Transparent
            },
        })
    }

    /// Returns `true` once [`dispose`](Self::dispose) ran.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Tears everything down. Idempotent; also runs on drop.
    ///
    /// Cancels the pending frame and timeout and removes both native
    /// listeners. An active zone is closed first, so subscribers observe a
    /// final `false`; then every store subscriber is dropped and no callback
    /// fires afterwards.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl<H: Host + 'static> Drop for SafeZone<H> {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl<H: Host + 'static> ZoneInner<H> {
    fn set_container(&self, element: Option<H::Element>) {
        self.tracker.set_container(element);
    }

    fn set_target(&self, element: Option<H::Element>) {
        if element.is_none() {
            // Cancel the frame before the tracker releases the element.
            self.redraw.stop();
        }
        self.tracker.set_target(element);
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.redraw.stop();
        self.tracker.dispose();
        self.store.apply(Trigger::Detach);
        if let Some(subscription) = self.subscription.borrow_mut().take() {
            subscription.unsubscribe();
        }
        self.store.clear_subscribers();
        zone_debug!("safe zone disposed");
    }
}

/// Which surface an [`ElementRef`] attaches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    /// The floating container (submenu, popover).
    Container,
    /// The trigger the pointer starts from.
    Target,
}

/// Attachment handle for one surface of a [`SafeZone`].
///
/// Behaves like a callback ref: call [`set`](Self::set) with the element once
/// it exists and with `None` before it goes away. The handle does not keep the
/// zone alive; after the zone is dropped it does nothing.
pub struct ElementRef<H: Host + 'static> {
    zone: Weak<ZoneInner<H>>,
    role: SurfaceRole,
}

impl<H: Host + 'static> Clone for ElementRef<H> {
    fn clone(&self) -> Self {
        Self {
            zone: Weak::clone(&self.zone),
            role: self.role,
        }
    }
}

impl<H: Host + 'static> fmt::Debug for ElementRef<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("role", &self.role)
            .field("live", &(self.zone.strong_count() > 0))
            .finish()
    }
}

impl<H: Host + 'static> ElementRef<H> {
    /// The surface this handle attaches.
    #[must_use]
    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    /// Attaches `element`, or detaches the current one with `None`.
    pub fn set(&self, element: Option<H::Element>) {
        let Some(zone) = self.zone.upgrade() else {
            return;
        };
        match self.role {
            SurfaceRole::Container => zone.set_container(element),
            SurfaceRole::Target => zone.set_target(element),
        }
    }
}

/// How the zone shape should be painted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeFill {
    /// Visibly, for debugging the geometry.
    Debug,
    /// Invisible but still receiving pointer events.
    Transparent,
}

/// The renderable zone shape and its pointer callbacks.
///
/// Hosts that render the shape as a real element forward its native
/// enter/move/leave events to [`pointer_enter`](Self::pointer_enter),
/// [`pointer_move`](Self::pointer_move) and
/// [`pointer_leave`](Self::pointer_leave). Hosts without per-shape events can
/// call [`pointer_moved`](Self::pointer_moved) with every pointer position
/// instead; it hit-tests the current polygon and synthesizes the three.
pub struct ZoneShape<H: Host + 'static> {
    zone: Weak<ZoneInner<H>>,
    fill: ShapeFill,
}

impl<H: Host + 'static> Clone for ZoneShape<H> {
    fn clone(&self) -> Self {
        Self {
            zone: Weak::clone(&self.zone),
            fill: self.fill,
        }
    }
}

impl<H: Host + 'static> fmt::Debug for ZoneShape<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneShape")
            .field("fill", &self.fill)
            .field("live", &(self.zone.strong_count() > 0))
            .finish()
    }
}

impl<H: Host + 'static> ZoneShape<H> {
    /// Paint mode derived from the `debug` flag.
    #[must_use]
    pub fn fill(&self) -> ShapeFill {
        self.fill
    }

    /// Returns `true` if the shape should be painted visibly.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.fill == ShapeFill::Debug
    }

    /// The polygon to draw, if the zone is active and has been measured.
    #[must_use]
    pub fn polygon(&self) -> Option<SafeZonePolygon> {
        self.zone.upgrade()?.redraw.current_polygon()
    }

    /// Returns `true` if `position` lies inside the current polygon.
    #[must_use]
    pub fn hit_test(&self, position: Point) -> bool {
        self.polygon().is_some_and(|p| p.contains(position))
    }

    /// Native enter event on the shape.
    pub fn pointer_enter(&self, position: Point) {
        if let Some(zone) = self.zone.upgrade() {
            zone.tracker.zone_enter(position);
        }
    }

    /// Native move event on the shape.
    pub fn pointer_move(&self, position: Point) {
        if let Some(zone) = self.zone.upgrade() {
            zone.tracker.zone_move(position);
        }
    }

    /// Native leave event on the shape.
    pub fn pointer_leave(&self, position: Point) {
        if let Some(zone) = self.zone.upgrade() {
            zone.tracker.zone_leave(position);
        }
    }

    /// Raw pointer position; synthesizes enter/move/leave by hit testing.
    ///
    /// Ignored while the zone is inactive.
    pub fn pointer_moved(&self, position: Point) {
        let Some(zone) = self.zone.upgrade() else {
            return;
        };
        if !zone.store.is_active() {
            zone.hovered.set(false);
            return;
        }
        let inside = self.hit_test(position);
        let was_inside = zone.hovered.replace(inside);
        match (was_inside, inside) {
            (false, true) => zone.tracker.zone_enter(position),
            (true, true) => zone.tracker.zone_move(position),
            (true, false) => zone.tracker.zone_leave(position),
            (false, false) => {}
        }
    }
}
