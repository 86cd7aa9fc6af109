//! Plan-view (2D) polygon helpers. Home items live in a plan where `x` grows
//! to the right and `y` grows downward; elevation is handled separately.

use serde::{Deserialize, Serialize};

/// A point in plan coordinates.
pub type Point2 = [f32; 2];

/// An axis-aligned rectangle in plan coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect2 {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect2 {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn union(&self, other: &Rect2) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn intersects(&self, other: &Rect2) -> bool {
        self.min_x <= other.max_x && self.max_x >= other.min_x
            && self.min_y <= other.max_y && self.max_y >= other.min_y
    }

    pub fn points(&self) -> [Point2; 4] {
        [
            [self.min_x, self.min_y],
            [self.max_x, self.min_y],
            [self.max_x, self.max_y],
            [self.min_x, self.max_y],
        ]
    }
}

/// Returns the bounding rectangle of `points`, `None` when empty.
pub fn polygon_bounds(points: &[Point2]) -> Option<Rect2> {
    let (first, rest) = points.split_first()?;
    Some(rest.iter().fold(
        Rect2::new(first[0], first[1], first[0], first[1]),
        |rect, p| Rect2::new(rect.min_x.min(p[0]), rect.min_y.min(p[1]), rect.max_x.max(p[0]), rect.max_y.max(p[1])),
    ))
}

/// Even-odd containment test.
pub fn polygon_contains_point(points: &[Point2], point: Point2) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (points[i], points[j]);
        if (pi[1] > point[1]) != (pj[1] > point[1]) {
            let x = (pj[0] - pi[0]) * (point[1] - pi[1]) / (pj[1] - pi[1]) + pi[0];
            if point[0] < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn orientation(a: Point2, b: Point2, c: Point2) -> f32 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn on_segment(a: Point2, b: Point2, p: Point2) -> bool {
    p[0] >= a[0].min(b[0]) && p[0] <= a[0].max(b[0]) && p[1] >= a[1].min(b[1]) && p[1] <= a[1].max(b[1])
}

fn segments_intersect(a1: Point2, a2: Point2, b1: Point2, b2: Point2) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

/// Returns `true` when the two polygon areas share at least one point.
pub fn polygons_intersect(a: &[Point2], b: &[Point2]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    match (polygon_bounds(a), polygon_bounds(b)) {
        (Some(ra), Some(rb)) if !ra.intersects(&rb) => return false,
        _ => {}
    }
    for i in 0..a.len() {
        let (a1, a2) = (a[i], a[(i + 1) % a.len()]);
        for j in 0..b.len() {
            if segments_intersect(a1, a2, b[j], b[(j + 1) % b.len()]) {
                return true;
            }
        }
    }
    polygon_contains_point(a, b[0]) || polygon_contains_point(b, a[0])
}

pub fn rectangle_intersects_polygon(rect: &Rect2, polygon: &[Point2]) -> bool {
    polygons_intersect(&rect.points(), polygon)
}

/// Corners of a `width` × `depth` rectangle centered on `(x, y)` and rotated
/// by `angle` radians, in the order used for piece footprints.
pub fn rotated_rectangle(x: f32, y: f32, width: f32, depth: f32, angle: f32) -> [Point2; 4] {
    let (sin, cos) = angle.sin_cos();
    let (hw, hd) = (width / 2.0, depth / 2.0);
    [[-hw, -hd], [hw, -hd], [hw, hd], [-hw, hd]]
        .map(|[dx, dy]| [x + dx * cos - dy * sin, y + dx * sin + dy * cos])
}
