// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host collaborator: timers, display frames, pointer listeners and layout.
//!
//! The safe zone never talks to a windowing system directly. Everything it
//! needs from the outside world goes through [`Host`]:
//!
//! - a one-shot delay timer ([`Host::set_timeout`] / [`Host::clear_timeout`]),
//! - a per-display-frame callback ([`Host::request_frame`] / [`Host::cancel_frame`]),
//! - pointer listener registration on arbitrary elements
//!   ([`Host::add_listener`] / [`Host::remove_listener`]),
//! - live layout measurement ([`Host::measure`]).
//!
//! Schedulers return `None` when the host cannot provide the service (for
//! example, no window is available yet). Callers treat that as a no-op.
//!
//! All methods take `&self`; hosts are expected to use interior mutability
//! because callbacks may re-enter the host while it is dispatching.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt::Debug;
use core::time::Duration;

use kurbo::{Point, Rect};

/// Kind of a native pointer event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// The pointer entered the element.
    Enter,
    /// The pointer moved within the element.
    Move,
    /// The pointer left the element.
    Leave,
}

/// A native pointer event in viewport coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// What happened.
    pub kind: PointerKind,
    /// Pointer position, in the same space as [`Host::measure`] rectangles.
    pub position: Point,
}

impl PointerEvent {
    /// Creates a new pointer event.
    #[must_use]
    pub const fn new(kind: PointerKind, position: Point) -> Self {
        Self { kind, position }
    }
}

/// Cancelable handle of a pending one-shot timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Cancelable handle of a pending display-frame callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Handle of a registered pointer listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle(pub u64);

/// A pointer listener as registered with the host.
pub type Listener = Rc<dyn Fn(PointerEvent)>;

/// Services the safe zone needs from its embedding environment.
pub trait Host {
    /// Host element identity (a DOM node, a widget id, a box-tree key, ...).
    type Element: Clone + PartialEq + Debug;

    /// Runs `callback` once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Option<TimerHandle>;

    /// Cancels a pending timer. Unknown or already fired handles are ignored.
    fn clear_timeout(&self, handle: TimerHandle);

    /// Runs `callback` before the next display refresh.
    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Option<FrameHandle>;

    /// Cancels a pending frame callback. Unknown or already run handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);

    /// Registers `listener` for pointer events of `kind` on `element`.
    fn add_listener(
        &self,
        element: &Self::Element,
        kind: PointerKind,
        listener: Listener,
    ) -> Option<ListenerHandle>;

    /// Unregisters a listener. Unknown handles are ignored.
    fn remove_listener(&self, handle: ListenerHandle);

    /// Measures the current layout rectangle of `element`.
    ///
    /// Returns `None` when the element is detached or has no layout.
    fn measure(&self, element: &Self::Element) -> Option<Rect>;
}

/// Converts a duration to whole milliseconds, saturating.
pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
