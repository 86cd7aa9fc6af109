//! Geometry primitives shared by the scene graph and the synchronization engine.

mod aabb;
mod color;
mod polygon;
mod ray;

pub use aabb::Aabb;
pub use color::RgbaColor;
pub use polygon::{
    polygon_bounds, polygon_contains_point, polygons_intersect,
    rectangle_intersects_polygon, rotated_rectangle, Point2, Rect2,
};
pub use ray::Ray;

/// Tolerance used by intersection and containment tests.
pub const EPSILON: f32 = 1e-6;
