// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Safe-zone geometry.
//!
//! The zone is the triangle spanned by the pointer and the two corners of the
//! container edge that faces the target. While the pointer travels inside it
//! the user is heading for the container, so the container should stay open.
//!
//! Which edge faces the target is decided from the separation of the two
//! rectangles ([`NearSide::facing`]); the pointer only contributes the apex.
//! This keeps the result stable while the pointer moves and makes
//! [`compute_polygon`] a pure function of its inputs.
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_safe_zone::geometry::compute_polygon;
//!
//! // Trigger on the left, submenu opening to its right.
//! let target = Rect::new(0.0, 0.0, 100.0, 30.0);
//! let container = Rect::new(120.0, 0.0, 320.0, 200.0);
//!
//! let zone = compute_polygon(container, target, Point::new(90.0, 15.0));
//! assert_eq!(zone.len(), 3);
//! assert!(zone.contains(Point::new(110.0, 40.0)));
//! assert!(!zone.contains(Point::new(95.0, 190.0)));
//! ```

use kurbo::{BezPath, Point, Rect};
use smallvec::SmallVec;

/// Areas at or below this are treated as collinear.
const DEGENERATE_AREA: f64 = 1e-9;

/// Edge of the container rectangle that faces the target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NearSide {
    /// The container's left edge (`x0`); the target sits to its left.
    Left,
    /// The container's right edge (`x1`); the target sits to its right.
    Right,
    /// The container's top edge (`y0`); the target sits above it.
    Top,
    /// The container's bottom edge (`y1`); the target sits below it.
    Bottom,
}

impl NearSide {
    /// Picks the container edge with the widest gap towards `target`.
    ///
    /// Overlapping rectangles still yield an edge (the one with the least
    /// overlap). Ties resolve in declaration order.
    #[must_use]
    pub fn facing(container: Rect, target: Rect) -> Self {
        let container = container.abs();
        let target = target.abs();
        let candidates = [
            (Self::Left, container.x0 - target.x1),
            (Self::Right, target.x0 - container.x1),
            (Self::Top, container.y0 - target.y1),
            (Self::Bottom, target.y0 - container.y1),
        ];
        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        best.0
    }

    /// Returns the two corners of `rect` on this edge.
    #[must_use]
    pub fn corners(self, rect: Rect) -> (Point, Point) {
        let r = rect.abs();
        match self {
            Self::Left => (Point::new(r.x0, r.y0), Point::new(r.x0, r.y1)),
            Self::Right => (Point::new(r.x1, r.y0), Point::new(r.x1, r.y1)),
            Self::Top => (Point::new(r.x0, r.y0), Point::new(r.x1, r.y0)),
            Self::Bottom => (Point::new(r.x0, r.y1), Point::new(r.x1, r.y1)),
        }
    }
}

/// Computes the safe-zone polygon for the current layout and pointer.
///
/// The result is always a triangle `[pointer, a, b]` with non-negative signed
/// area, so it never self-intersects. Zero-area rectangles or a pointer on the
/// line through the near edge produce a collinear (degenerate) triangle.
#[must_use]
pub fn compute_polygon(container: Rect, target: Rect, pointer: Point) -> SafeZonePolygon {
    let side = NearSide::facing(container, target);
    let (a, b) = side.corners(container);
    if cross(pointer, a, b) < 0.0 {
        SafeZonePolygon::from_points([pointer, b, a])
    } else {
        SafeZonePolygon::from_points([pointer, a, b])
    }
}

/// Ordered vertices of a convex safe-zone polygon.
///
/// Vertices wind so that the signed area is non-negative. Polygons are handed
/// to renderers by value and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SafeZonePolygon {
    points: SmallVec<[Point; 4]>,
}

impl SafeZonePolygon {
    /// Builds a polygon from vertices in winding order.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    /// Returns the vertices.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if there are no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed area (shoelace); non-negative for polygons from [`compute_polygon`].
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0.0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            twice += p.x * q.y - q.x * p.y;
        }
        twice * 0.5
    }

    /// Unsigned area.
    #[must_use]
    pub fn area(&self) -> f64 {
        let area = self.signed_area();
        if area < 0.0 { -area } else { area }
    }

    /// Returns `true` when all vertices are (nearly) collinear.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let area = self.area();
        area.is_nan() || area <= DEGENERATE_AREA
    }

    /// Returns `true` if `pt` lies inside or on the boundary.
    ///
    /// Degenerate polygons contain nothing.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let orientation = self.signed_area();
        let n = self.points.len();
        (0..n).all(|i| {
            let c = cross(self.points[i], self.points[(i + 1) % n], pt);
            if orientation > 0.0 { c >= 0.0 } else { c <= 0.0 }
        })
    }

    /// Returns the smallest rectangle containing every vertex.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        let (first, rest) = self.points.split_first()?;
        Some(
            rest.iter()
                .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
        )
    }

    /// Converts the polygon into a closed path for rendering.
    #[must_use]
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some((first, rest)) = self.points.split_first() else {
            return path;
        };
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        path.close_path();
        path
    }
}

/// Z component of `(b - a) x (c - a)`.
fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_picks_edge_towards_target() {
        let container = Rect::new(100.0, 100.0, 200.0, 200.0);
        let left = Rect::new(0.0, 120.0, 80.0, 140.0);
        let right = Rect::new(220.0, 120.0, 300.0, 140.0);
        let above = Rect::new(120.0, 0.0, 180.0, 60.0);
        let below = Rect::new(120.0, 260.0, 180.0, 300.0);

        assert_eq!(NearSide::facing(container, left), NearSide::Left);
        assert_eq!(NearSide::facing(container, right), NearSide::Right);
        assert_eq!(NearSide::facing(container, above), NearSide::Top);
        assert_eq!(NearSide::facing(container, below), NearSide::Bottom);
    }

    #[test]
    fn submenu_to_the_right_spans_left_edge() {
        let target = Rect::new(0.0, 0.0, 100.0, 30.0);
        let container = Rect::new(120.0, 0.0, 320.0, 200.0);
        let pointer = Point::new(80.0, 15.0);

        let zone = compute_polygon(container, target, pointer);

        assert_eq!(zone.points()[0], pointer);
        assert!(zone.points().contains(&Point::new(120.0, 0.0)));
        assert!(zone.points().contains(&Point::new(120.0, 200.0)));
        assert!(zone.signed_area() > 0.0);
        assert!((zone.area() - 0.5 * 200.0 * 40.0).abs() < 1e-9);
    }

    #[test]
    fn winding_is_normalized_on_every_side() {
        let container = Rect::new(100.0, 100.0, 200.0, 200.0);
        for (target, pointer) in [
            (Rect::new(0.0, 120.0, 80.0, 140.0), Point::new(50.0, 130.0)),
            (Rect::new(220.0, 120.0, 300.0, 140.0), Point::new(250.0, 130.0)),
            (Rect::new(120.0, 0.0, 180.0, 60.0), Point::new(150.0, 30.0)),
            (Rect::new(120.0, 260.0, 180.0, 300.0), Point::new(150.0, 280.0)),
        ] {
            let zone = compute_polygon(container, target, pointer);
            assert!(zone.signed_area() > 0.0, "zone {zone:?} should wind positively");
        }
    }

    #[test]
    fn contains_checks_interior_and_boundary() {
        let zone = SafeZonePolygon::from_points([
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ]);
        assert!(zone.contains(Point::new(2.0, 2.0)));
        assert!(zone.contains(Point::new(5.0, 0.0)));
        assert!(!zone.contains(Point::new(8.0, 8.0)));
        assert!(!zone.contains(Point::new(-1.0, 1.0)));
    }

    #[test]
    fn contains_accepts_either_winding() {
        let zone = SafeZonePolygon::from_points([
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        ]);
        assert!(zone.signed_area() < 0.0);
        assert!(zone.contains(Point::new(2.0, 2.0)));
    }

    #[test]
    fn zero_area_container_is_degenerate_not_a_panic() {
        let target = Rect::new(0.0, 0.0, 10.0, 10.0);
        let container = Rect::new(50.0, 5.0, 50.0, 5.0);

        let zone = compute_polygon(container, target, Point::new(5.0, 5.0));

        assert_eq!(zone.len(), 3);
        assert!(zone.is_degenerate());
        assert!(!zone.contains(Point::new(20.0, 5.0)));
    }

    #[test]
    fn pointer_on_near_edge_line_is_degenerate() {
        let target = Rect::new(0.0, 0.0, 100.0, 30.0);
        let container = Rect::new(120.0, 0.0, 320.0, 200.0);

        let zone = compute_polygon(container, target, Point::new(120.0, 300.0));

        assert!(zone.is_degenerate());
    }

    #[test]
    fn unnormalized_rects_are_accepted() {
        let target = Rect::new(100.0, 30.0, 0.0, 0.0);
        let container = Rect::new(320.0, 200.0, 120.0, 0.0);
        let pointer = Point::new(80.0, 15.0);

        assert_eq!(
            compute_polygon(container, target, pointer),
            compute_polygon(container.abs(), target.abs(), pointer)
        );
    }

    #[test]
    fn bounding_box_and_path() {
        let zone = SafeZonePolygon::from_points([
            Point::new(1.0, 2.0),
            Point::new(5.0, 2.0),
            Point::new(3.0, 7.0),
        ]);
        assert_eq!(zone.bounding_box(), Some(Rect::new(1.0, 2.0, 5.0, 7.0)));
        // move_to + 2 * line_to + close_path
        assert_eq!(zone.to_path().elements().len(), 4);

        let empty = SafeZonePolygon::default();
        assert!(empty.is_empty());
        assert_eq!(empty.bounding_box(), None);
        assert!(empty.to_path().elements().is_empty());
    }
}
