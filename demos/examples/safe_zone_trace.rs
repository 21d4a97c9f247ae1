// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Safe zone walkthrough.
//!
//! Drive a submenu safe zone through a simulated host and print what a
//! renderer would draw on each frame.
//!
//! Run:
//! - `cargo run -p understory_examples --example safe_zone_trace`
//! - `RUST_LOG=understory_safe_zone=trace cargo run -p understory_examples --example safe_zone_trace`

use std::rc::Rc;
use std::time::Duration;

use kurbo::{Point, Rect};
use tracing_subscriber::EnvFilter;
use understory_examples::format_polygon;
use understory_safe_zone::host::PointerKind;
use understory_safe_zone::sim::{SimElement, SimHost};
use understory_safe_zone::{SafeZone, SafeZoneConfig, SafeZoneFrame, SafeZoneHandlers};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = Rc::new(SimHost::new());
    let trigger = SimElement(1);
    let submenu = SimElement(2);
    host.set_rect(trigger, Some(Rect::new(0.0, 40.0, 160.0, 64.0)));
    host.set_rect(submenu, Some(Rect::new(170.0, 20.0, 370.0, 220.0)));

    let zone = SafeZone::new(
        Rc::clone(&host),
        SafeZoneConfig::default().with_debug(true),
        SafeZoneHandlers::new()
            .on_enter(|p| println!("  zone enter at ({}, {})", p.x, p.y))
            .on_leave(|p| println!("  zone leave at ({}, {})", p.x, p.y))
            .on_timeout(|| println!("  timeout: close the submenu")),
        |frame: &SafeZoneFrame| {
            println!(
                "  draw [{}] area={:.0}",
                format_polygon(&frame.polygon),
                frame.polygon.area()
            );
        },
    );
    zone.target_ref().set(Some(trigger));
    zone.container_ref().set(Some(submenu));

    println!("hover trigger");
    for x in [120.0, 140.0, 155.0] {
        host.dispatch(trigger, PointerKind::Move, Point::new(x, 52.0));
        host.run_frame();
    }

    println!("head for the submenu");
    let shape = zone.shape().expect("zone is enabled");
    for x in [162.0, 165.0, 168.0] {
        shape.pointer_moved(Point::new(x, 60.0));
        host.run_frame();
    }

    println!("reach the submenu (active: {})", zone.is_active());
    host.dispatch(submenu, PointerKind::Enter, Point::new(172.0, 62.0));
    println!("active: {}", zone.is_active());

    println!("hover trigger again, then stall in the zone");
    host.dispatch(trigger, PointerKind::Move, Point::new(150.0, 50.0));
    host.run_frame();
    shape.pointer_moved(Point::new(164.0, 55.0));
    host.advance(Duration::from_millis(1500));
    println!("active: {}", zone.is_active());
}
