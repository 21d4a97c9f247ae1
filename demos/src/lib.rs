// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared helpers for the Understory examples.

use understory_safe_zone::SafeZonePolygon;

/// Formats polygon vertices as `(x, y)` pairs rounded to whole pixels.
pub fn format_polygon(polygon: &SafeZonePolygon) -> String {
    let pts: Vec<String> = polygon
        .points()
        .iter()
        .map(|p| format!("({:.0}, {:.0})", p.x, p.y))
        .collect();
    pts.join(" ")
}
