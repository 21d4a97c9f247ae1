// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests for `SafeZone` driven through `SimHost`.
//!
//! These cover the activation lifecycle (target move, container enter,
//! timeout), the redraw loop bookkeeping, and teardown guarantees.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use kurbo::{Point, Rect};
use understory_safe_zone::host::PointerKind;
use understory_safe_zone::sim::{SimElement, SimHost};
use understory_safe_zone::{
    ActivationState, SafeZone, SafeZoneConfig, SafeZoneFrame, SafeZoneHandlers, ShapeFill,
    SurfaceRole, compute_polygon,
};

const TARGET: SimElement = SimElement(1);
const CONTAINER: SimElement = SimElement(2);

const TARGET_RECT: Rect = Rect::new(0.0, 0.0, 100.0, 30.0);
const CONTAINER_RECT: Rect = Rect::new(120.0, 0.0, 320.0, 200.0);

#[derive(Default)]
struct Calls {
    enter: Cell<u32>,
    moved: Cell<u32>,
    leave: Cell<u32>,
    timeout: Cell<u32>,
}

struct Fixture {
    host: Rc<SimHost>,
    zone: SafeZone<SimHost>,
    frames: Rc<RefCell<Vec<SafeZoneFrame>>>,
    calls: Rc<Calls>,
}

fn fixture(config: SafeZoneConfig) -> Fixture {
    let host = Rc::new(SimHost::new());
    fixture_on(host, config)
}

fn fixture_on(host: Rc<SimHost>, config: SafeZoneConfig) -> Fixture {
    host.set_rect(TARGET, Some(TARGET_RECT));
    host.set_rect(CONTAINER, Some(CONTAINER_RECT));

    let calls = Rc::new(Calls::default());
    let (c1, c2, c3, c4) = (
        Rc::clone(&calls),
        Rc::clone(&calls),
        Rc::clone(&calls),
        Rc::clone(&calls),
    );
    let handlers = SafeZoneHandlers::new()
        .on_enter(move |_| c1.enter.set(c1.enter.get() + 1))
        .on_move(move |_| c2.moved.set(c2.moved.get() + 1))
        .on_leave(move |_| c3.leave.set(c3.leave.get() + 1))
        .on_timeout(move || c4.timeout.set(c4.timeout.get() + 1));

    let frames = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&frames);
    let zone = SafeZone::new(
        Rc::clone(&host),
        config,
        handlers,
        move |frame: &SafeZoneFrame| sink.borrow_mut().push(frame.clone()),
    );
    zone.target_ref().set(Some(TARGET));
    zone.container_ref().set(Some(CONTAINER));

    Fixture {
        host,
        zone,
        frames,
        calls,
    }
}

fn move_on_target(f: &Fixture, x: f64, y: f64) {
    assert_eq!(
        f.host.dispatch(TARGET, PointerKind::Move, Point::new(x, y)),
        1,
        "exactly one target listener should be registered"
    );
}

#[test]
fn target_move_activates_and_first_tick_uses_that_pointer() {
    let f = fixture(SafeZoneConfig::default());

    move_on_target(&f, 10.0, 20.0);
    assert_eq!(f.zone.state(), ActivationState::Active);
    assert!(f.frames.borrow().is_empty(), "nothing is drawn before the first frame");

    assert_eq!(f.host.run_frame(), 1);

    let frames = f.frames.borrow();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].pointer, Point::new(10.0, 20.0));
    assert_eq!(frames[0].container_rect, CONTAINER_RECT);
    assert_eq!(frames[0].target_rect, TARGET_RECT);
    assert_eq!(
        frames[0].polygon,
        compute_polygon(CONTAINER_RECT, TARGET_RECT, Point::new(10.0, 20.0))
    );
}

#[test]
fn repeated_target_moves_start_a_single_loop() {
    let f = fixture(SafeZoneConfig::default());

    move_on_target(&f, 10.0, 20.0);
    move_on_target(&f, 11.0, 20.0);
    move_on_target(&f, 12.0, 21.0);

    assert_eq!(f.host.stats().frames_requested, 1);
    assert_eq!(f.host.pending_frames(), 1);

    f.host.run_frame();
    assert_eq!(f.host.pending_frames(), 1);
    assert_eq!(f.frames.borrow()[0].pointer, Point::new(12.0, 21.0));
}

#[test]
fn each_tick_remeasures_layout() {
    let f = fixture(SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);
    f.host.run_frame();

    let moved = Rect::new(140.0, 10.0, 340.0, 210.0);
    f.host.set_rect(CONTAINER, Some(moved));
    f.host.run_frame();

    assert_eq!(f.frames.borrow()[1].container_rect, moved);
}

#[test]
fn detached_container_skips_frames_without_stopping_loop() {
    let f = fixture(SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);

    f.host.set_rect(CONTAINER, None);
    f.host.run_frame();
    f.host.run_frame();
    assert!(f.frames.borrow().is_empty());
    assert_eq!(f.host.pending_frames(), 1);

    f.host.set_rect(CONTAINER, Some(CONTAINER_RECT));
    f.host.run_frame();
    assert_eq!(f.frames.borrow().len(), 1);
}

#[test]
fn container_enter_deactivates_and_cancels_everything() {
    let f = fixture(SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);
    f.zone.shape().unwrap().pointer_enter(Point::new(105.0, 20.0));
    assert_eq!(f.host.pending_timeouts(), 1);

    f.host.dispatch(CONTAINER, PointerKind::Enter, Point::new(125.0, 20.0));

    assert!(!f.zone.is_active());
    assert_eq!(f.host.pending_timeouts(), 0);
    assert_eq!(f.host.pending_frames(), 0);
    assert_eq!(f.host.stats().timeouts_cleared, 1);
    assert_eq!(f.host.stats().frames_canceled, 1);

    f.host.advance(Duration::from_secs(5));
    assert_eq!(f.calls.timeout.get(), 0);
}

#[test]
fn timeout_fires_after_configured_duration_exactly_once() {
    let f = fixture(SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);
    f.zone.shape().unwrap().pointer_enter(Point::new(105.0, 20.0));
    assert_eq!(f.calls.enter.get(), 1);

    f.host.advance(Duration::from_millis(1499));
    assert!(f.zone.is_active());
    assert_eq!(f.calls.timeout.get(), 0);

    f.host.advance(Duration::from_millis(1));
    assert!(!f.zone.is_active());
    assert_eq!(f.calls.timeout.get(), 1);
    assert_eq!(f.host.pending_frames(), 0);

    f.host.advance(Duration::from_secs(10));
    assert_eq!(f.calls.timeout.get(), 1);
}

#[test]
fn custom_timeout_is_honored() {
    let f = fixture(SafeZoneConfig::default().with_timeout(Duration::from_millis(300)));
    move_on_target(&f, 10.0, 20.0);
    f.zone.shape().unwrap().pointer_enter(Point::new(105.0, 20.0));

    f.host.advance(Duration::from_millis(299));
    assert!(f.zone.is_active());
    f.host.advance(Duration::from_millis(1));
    assert!(!f.zone.is_active());
}

#[test]
fn reentering_zone_restarts_timeout() {
    let f = fixture(SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);
    let shape = f.zone.shape().unwrap();

    shape.pointer_enter(Point::new(105.0, 20.0));
    f.host.advance(Duration::from_millis(1000));
    shape.pointer_leave(Point::new(105.0, 60.0));
    shape.pointer_enter(Point::new(106.0, 20.0));

    // The first timeout would have fired at 1500 ms.
    f.host.advance(Duration::from_millis(1000));
    assert!(f.zone.is_active());
    assert_eq!(f.calls.timeout.get(), 0);

    f.host.advance(Duration::from_millis(500));
    assert!(!f.zone.is_active());
    assert_eq!(f.calls.timeout.get(), 1);
    assert_eq!(f.host.stats().timeouts_scheduled, 2);
    assert_eq!(f.host.stats().timeouts_fired, 1);
}

#[test]
fn zone_move_and_leave_only_call_user_handlers() {
    let f = fixture(SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);
    let shape = f.zone.shape().unwrap();

    shape.pointer_move(Point::new(105.0, 20.0));
    shape.pointer_leave(Point::new(105.0, 80.0));

    assert_eq!(f.calls.moved.get(), 1);
    assert_eq!(f.calls.leave.get(), 1);
    assert_eq!(f.host.stats().timeouts_scheduled, 0);
    assert!(f.zone.is_active());
}

#[test]
fn target_move_cancels_pending_timeout() {
    let f = fixture(SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);
    f.zone.shape().unwrap().pointer_enter(Point::new(105.0, 20.0));

    move_on_target(&f, 50.0, 20.0);

    assert_eq!(f.host.pending_timeouts(), 0);
    f.host.advance(Duration::from_secs(5));
    assert!(f.zone.is_active());
    assert_eq!(f.calls.timeout.get(), 0);
}

#[test]
fn disabled_registers_nothing_and_renders_nothing() {
    let f = fixture(SafeZoneConfig::default().with_disabled(true));

    assert_eq!(f.host.listener_count(), 0);
    assert!(f.zone.shape().is_none());

    assert_eq!(f.host.dispatch(TARGET, PointerKind::Move, Point::new(10.0, 20.0)), 0);
    f.zone.tracker().handle_target_move(Point::new(10.0, 20.0));
    assert!(!f.zone.is_active());
    assert_eq!(f.host.stats().frames_requested, 0);
}

#[test]
fn debug_flag_selects_visible_fill() {
    let plain = fixture(SafeZoneConfig::default());
    assert_eq!(plain.zone.shape().unwrap().fill(), ShapeFill::Transparent);

    let debug = fixture(SafeZoneConfig::default().with_debug(true));
    assert!(debug.zone.shape().unwrap().is_debug());
}

#[test]
fn detaching_target_cancels_timeout_and_frame() {
    let f = fixture(SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);
    f.zone.shape().unwrap().pointer_enter(Point::new(105.0, 20.0));
    assert_eq!(f.host.pending_timeouts(), 1);
    assert_eq!(f.host.pending_frames(), 1);

    f.zone.target_ref().set(None);

    assert_eq!(f.host.pending_timeouts(), 0);
    assert_eq!(f.host.pending_frames(), 0);
    assert_eq!(f.host.listeners_on(TARGET), 0);
    assert!(!f.zone.is_active());

    f.host.advance(Duration::from_secs(5));
    f.host.run_frame();
    assert_eq!(f.calls.timeout.get(), 0);
    assert!(f.frames.borrow().is_empty());
}

#[test]
fn reattached_target_can_reactivate() {
    let f = fixture(SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);
    f.zone.set_target(None);

    f.zone.set_target(Some(TARGET));
    move_on_target(&f, 15.0, 20.0);

    assert!(f.zone.is_active());
    assert_eq!(f.host.pending_frames(), 1);
}

#[test]
fn dispose_is_idempotent_and_silences_everything() {
    let f = fixture(SafeZoneConfig::default());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _observer = f.zone.subscribe(move |active| sink.borrow_mut().push(active));
    move_on_target(&f, 10.0, 20.0);
    let shape = f.zone.shape().unwrap();
    shape.pointer_enter(Point::new(105.0, 20.0));

    f.zone.dispose();
    f.zone.dispose();

    assert!(f.zone.is_disposed());
    assert!(!f.zone.is_active());
    assert_eq!(f.host.listener_count(), 0);
    assert_eq!(f.host.pending_timeouts(), 0);
    assert_eq!(f.host.pending_frames(), 0);
    assert!(f.zone.shape().is_none());

    shape.pointer_enter(Point::new(105.0, 20.0));
    f.zone.tracker().handle_target_move(Point::new(1.0, 1.0));
    f.host.advance(Duration::from_secs(5));
    assert_eq!(f.calls.enter.get(), 1);
    assert_eq!(f.calls.timeout.get(), 0);
    assert_eq!(*seen.borrow(), [true, false]);
}

#[test]
fn dropping_zone_releases_host_resources() {
    let host = Rc::new(SimHost::new());
    let f = fixture_on(Rc::clone(&host), SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);
    let target_ref = f.zone.target_ref();
    let shape = f.zone.shape().unwrap();
    f.zone.shape().unwrap().pointer_enter(Point::new(105.0, 20.0));

    drop(f);

    assert_eq!(host.listener_count(), 0);
    assert_eq!(host.pending_timeouts(), 0);
    assert_eq!(host.pending_frames(), 0);
    target_ref.set(Some(TARGET));
    shape.pointer_enter(Point::ZERO);
    assert_eq!(host.listener_count(), 0);
    assert_eq!(host.pending_timeouts(), 0);
}

#[test]
fn element_refs_report_their_role() {
    let f = fixture(SafeZoneConfig::default());
    assert_eq!(f.zone.container_ref().role(), SurfaceRole::Container);
    assert_eq!(f.zone.target_ref().role(), SurfaceRole::Target);
    assert_eq!(f.zone.tracker().container(), Some(CONTAINER));
    assert_eq!(f.zone.tracker().target(), Some(TARGET));
}

#[test]
fn synthesized_hit_testing_drives_zone_callbacks() {
    let f = fixture(SafeZoneConfig::default());
    move_on_target(&f, 90.0, 15.0);
    f.host.run_frame();
    let shape = f.zone.shape().unwrap();

    shape.pointer_moved(Point::new(110.0, 40.0));
    shape.pointer_moved(Point::new(112.0, 45.0));
    shape.pointer_moved(Point::new(95.0, 190.0));

    assert_eq!(f.calls.enter.get(), 1);
    assert_eq!(f.calls.moved.get(), 1);
    assert_eq!(f.calls.leave.get(), 1);
    assert_eq!(f.host.pending_timeouts(), 1);
}

#[test]
fn synthesized_enter_rearms_timeout_after_reactivation() {
    let f = fixture(SafeZoneConfig::default());
    let shape = f.zone.shape().unwrap();
    move_on_target(&f, 90.0, 15.0);
    f.host.run_frame();
    shape.pointer_moved(Point::new(110.0, 40.0));
    assert_eq!(f.calls.enter.get(), 1);

    // Close while the pointer was last seen inside the shape.
    f.host.dispatch(CONTAINER, PointerKind::Enter, Point::new(125.0, 20.0));
    assert!(!f.zone.is_active());

    move_on_target(&f, 90.0, 15.0);
    f.host.run_frame();
    shape.pointer_moved(Point::new(112.0, 45.0));

    assert_eq!(f.calls.enter.get(), 2);
    assert_eq!(f.calls.moved.get(), 0);
    assert_eq!(f.host.pending_timeouts(), 1);

    f.host.advance(Duration::from_millis(1500));
    assert!(!f.zone.is_active());
    assert_eq!(f.calls.timeout.get(), 1);
}

#[test]
fn synthesized_positions_are_ignored_while_inactive() {
    let f = fixture(SafeZoneConfig::default());
    let shape = f.zone.shape().unwrap();
    move_on_target(&f, 90.0, 15.0);
    f.host.run_frame();
    shape.pointer_moved(Point::new(110.0, 40.0));
    f.host.advance(Duration::from_millis(1500));
    assert!(!f.zone.is_active());
    assert_eq!(f.calls.timeout.get(), 1);

    shape.pointer_moved(Point::new(112.0, 45.0));
    shape.pointer_moved(Point::new(95.0, 190.0));
    assert_eq!(f.calls.enter.get(), 1);
    assert_eq!(f.calls.moved.get(), 0);
    assert_eq!(f.calls.leave.get(), 0);
    assert_eq!(f.host.pending_timeouts(), 0);

    // Closed by the timeout, the next activation starts from outside again.
    move_on_target(&f, 90.0, 15.0);
    f.host.run_frame();
    shape.pointer_moved(Point::new(112.0, 45.0));
    assert_eq!(f.calls.enter.get(), 2);
    assert_eq!(f.host.pending_timeouts(), 1);
}

#[test]
fn shape_enter_on_inactive_zone_arms_no_timeout() {
    let f = fixture(SafeZoneConfig::default());
    let shape = f.zone.shape().unwrap();

    shape.pointer_enter(Point::new(165.0, 55.0));
    f.host.advance(Duration::from_millis(1500));

    assert_eq!(f.calls.enter.get(), 0);
    assert_eq!(f.calls.timeout.get(), 0);
    assert_eq!(f.host.stats().timeouts_scheduled, 0);

    move_on_target(&f, 10.0, 20.0);
    f.host.dispatch(CONTAINER, PointerKind::Enter, Point::new(125.0, 20.0));
    shape.pointer_enter(Point::new(105.0, 20.0));
    f.host.advance(Duration::from_secs(5));
    assert_eq!(f.calls.timeout.get(), 0);
    assert_eq!(f.host.pending_timeouts(), 0);
}

#[test]
fn missing_timer_service_keeps_zone_open() {
    let host = Rc::new(SimHost::new().without_timers());
    let f = fixture_on(host, SafeZoneConfig::default());
    move_on_target(&f, 10.0, 20.0);

    f.zone.shape().unwrap().pointer_enter(Point::new(105.0, 20.0));
    f.host.advance(Duration::from_secs(60));

    assert!(f.zone.is_active());
    assert_eq!(f.calls.enter.get(), 1);

    f.host.dispatch(CONTAINER, PointerKind::Enter, Point::new(125.0, 20.0));
    assert!(!f.zone.is_active());
}

#[test]
fn external_subscribers_see_open_and_close() {
    let f = fixture(SafeZoneConfig::default());
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let subscription = f.zone.subscribe(move |active| sink.borrow_mut().push(active));

    move_on_target(&f, 10.0, 20.0);
    move_on_target(&f, 12.0, 20.0);
    f.host.dispatch(CONTAINER, PointerKind::Enter, Point::new(125.0, 20.0));

    assert_eq!(*log.borrow(), [true, false]);
    subscription.unsubscribe();
}
