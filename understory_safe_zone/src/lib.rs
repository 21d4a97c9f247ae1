// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_safe_zone --heading-base-level=0

//! Understory Safe Zone: keep a floating container open while the pointer heads for it.
//!
//! Menus with submenus, tooltips with interactive content and popovers share a
//! problem: the pointer leaves the trigger on its way to the container, and
//! naive hover logic closes the container before the pointer arrives. This
//! crate tracks the pointer between a **target** (the trigger) and a
//! **container** (the floating element) and maintains a triangular *safe zone*
//! connecting the two. While the zone is active the container should stay
//! open.
//!
//! The crate is split into small pieces that can be used on their own:
//!
//! - [`activation`]: an observable active/inactive flag with named transitions.
//! - [`geometry`]: the pure polygon computation.
//! - [`tracker`]: listener attachment, pointer capture and the inactivity timeout.
//! - [`redraw`]: the frame-synchronized redraw loop and the renderer trait.
//! - [`zone`]: [`SafeZone`], which wires everything together.
//! - [`host`]: the [`Host`] trait through which all of the above reach the
//!   outside world (timers, frames, pointer listeners, layout).
//! - [`sim`]: [`SimHost`](sim::SimHost), a deterministic host for tests and
//!   headless use.
//!
//! ## Lifecycle
//!
//! 1. A pointer move over the target records the position and activates the zone.
//! 2. While active, every display frame re-measures both elements, recomputes
//!    the polygon and hands it to the renderer.
//! 3. Entering the zone shape arms an inactivity timeout (default 1500 ms).
//! 4. Entering the container, or the timeout firing, deactivates the zone and
//!    stops the redraw loop. The timeout also notifies the `on_timeout` handler
//!    so the caller can close the container.
//!
//! ## Minimal example
//!
//! ```rust
//! use std::rc::Rc;
//! use core::time::Duration;
//! use kurbo::{Point, Rect};
//! use understory_safe_zone::host::PointerKind;
//! use understory_safe_zone::sim::{SimElement, SimHost};
//! use understory_safe_zone::{SafeZone, SafeZoneConfig, SafeZoneFrame, SafeZoneHandlers};
//!
//! let host = Rc::new(SimHost::new());
//! let (trigger, submenu) = (SimElement(1), SimElement(2));
//! host.set_rect(trigger, Some(Rect::new(0.0, 0.0, 100.0, 30.0)));
//! host.set_rect(submenu, Some(Rect::new(120.0, 0.0, 320.0, 200.0)));
//!
//! let zone = SafeZone::new(
//!     host.clone(),
//!     SafeZoneConfig::default(),
//!     SafeZoneHandlers::new().on_timeout(|| println!("close the submenu")),
//!     |frame: &SafeZoneFrame| println!("draw {:?}", frame.polygon.points()),
//! );
//! zone.target_ref().set(Some(trigger));
//! zone.container_ref().set(Some(submenu));
//!
//! // Pointer moves over the trigger: the zone opens and draws on the next frame.
//! host.dispatch(trigger, PointerKind::Move, Point::new(90.0, 15.0));
//! assert!(zone.is_active());
//! host.run_frame();
//! assert!(zone.current_polygon().is_some());
//!
//! // Pointer enters the shape, then stalls: the timeout closes the zone.
//! zone.shape().unwrap().pointer_enter(Point::new(105.0, 20.0));
//! host.advance(Duration::from_millis(1500));
//! assert!(!zone.is_active());
//! ```
//!
//! ## Features
//!
//! - `std` (default): forward to `kurbo/std`.
//! - `libm`: forward to `kurbo/libm` for `no_std` builds.
//! - `tracing`: emit `tracing` events for transitions, timers and the redraw loop.
//!
//! This crate is `no_std` compatible (with `alloc`).

#![no_std]

extern crate alloc;

#[macro_use]
mod log;

pub mod activation;
mod config;
pub mod geometry;
pub mod host;
pub mod redraw;
pub mod sim;
pub mod tracker;
pub mod zone;

pub use activation::{ActivationState, ActivationStore, Subscription, Trigger};
pub use config::{DEFAULT_TIMEOUT, SafeZoneConfig};
pub use geometry::{SafeZonePolygon, compute_polygon};
pub use host::{Host, PointerEvent, PointerKind};
pub use redraw::{FrameSample, RedrawLoop, SafeZoneFrame, SafeZoneRenderer};
pub use tracker::{PointerTracker, SafeZoneHandlers};
pub use zone::{ElementRef, SafeZone, ShapeFill, SurfaceRole, ZoneShape};
