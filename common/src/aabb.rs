use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

use crate::{Ray, EPSILON};

/// An axis-aligned bounding box.
///
/// Used both for the approximate home bounds that drive clip distances and
/// for coarse picking tests against scene shapes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Builds the smallest box containing `points`, or `None` for an empty slice.
    pub fn from_points(points: &[Point3<f32>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(
            rest.iter()
                .fold(Self::new(*first, *first), |aabb, point| aabb.expand(*point)),
        )
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Returns the axis-aligned box enclosing this box after `matrix` is applied.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = self.corners().map(|corner| {
            Point3::from_homogeneous(matrix * corner.to_homogeneous())
        });
        let [first, rest @ ..] = corners;
        rest.iter().fold(Self::new(first, first), |aabb, corner| aabb.expand(*corner))
    }

    pub fn expand(&self, point: Point3<f32>) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(point.x),
                self.min.y.min(point.y),
                self.min.z.min(point.z),
            ),
            max: Point3::new(
                self.max.x.max(point.x),
                self.max.y.max(point.y),
                self.max.z.max(point.z),
            ),
        }
    }

    pub fn merge(&self, other: &Aabb) -> Self {
        self.expand(other.min).expand(other.max)
    }

    pub fn center(&self) -> Point3<f32> {
        self.min.midpoint(self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Inclusive containment test.
    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x && point.x <= self.max.x
            && point.y >= self.min.y && point.y <= self.max.y
            && point.z >= self.min.z && point.z <= self.max.z
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
            && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Returns the shortest distance from `point` to the surface of the box.
    ///
    /// Each of the six faces is a rectangle; the distance to a face is the
    /// distance to its closest point, so a point outside the box gets its
    /// euclidean distance to the box and a point inside gets the distance to
    /// the nearest face.
    pub fn distance_to_point(&self, point: Point3<f32>) -> f32 {
        let clamp = |p: Point3<f32>| {
            Point3::new(
                p.x.clamp(self.min.x, self.max.x),
                p.y.clamp(self.min.y, self.max.y),
                p.z.clamp(self.min.z, self.max.z),
            )
        };

        let faces = [
            (Some(self.min.x), None, None),
            (Some(self.max.x), None, None),
            (None, Some(self.min.y), None),
            (None, Some(self.max.y), None),
            (None, None, Some(self.min.z)),
            (None, None, Some(self.max.z)),
        ]
        .into_iter()
        .map(|(x, y, z): (Option<f32>, Option<f32>, Option<f32>)| {
            let mut closest = clamp(point);
            if let Some(x) = x {
                closest.x = x;
            }
            if let Some(y) = y {
                closest.y = y;
            }
            if let Some(z) = z {
                closest.z = z;
            }
            (point - closest).magnitude()
        });

        faces.fold(f32::INFINITY, f32::min)
    }

    /// Slab test. Returns the ray parameter of the entry point, `Some(0.0)`
    /// when the ray starts inside the box.
    pub fn intersects_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        let axes = [
            (ray.origin.x, ray.direction.x, self.min.x, self.max.x),
            (ray.origin.y, ray.direction.y, self.min.y, self.max.y),
            (ray.origin.z, ray.direction.z, self.min.z, self.max.z),
        ];
        for (origin, direction, min, max) in axes {
            if direction.abs() < EPSILON {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }
            let (t1, t2) = ((min - origin) / direction, (max - origin) / direction);
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
            if t_near > t_far {
                return None;
            }
        }

        if t_near >= 0.0 {
            Some(t_near)
        } else if t_far >= 0.0 {
            Some(0.0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_from_points() {
        let aabb = Aabb::from_points(&[
            Point3::new(1.0, -2.0, 3.0),
            Point3::new(-1.0, 2.0, 0.0),
            Point3::new(0.5, 0.0, 5.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Point3::new(1.0, 2.0, 5.0));
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn test_merge_and_center() {
        let other = Aabb::new(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0));
        let merged = unit_box().merge(&other);
        assert_eq!(merged.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(merged.max, Point3::new(3.0, 3.0, 3.0));
        assert_eq!(merged.center(), Point3::new(1.5, 1.5, 1.5));
    }

    #[test]
    fn test_transform_translation() {
        let moved = unit_box().transform(&Matrix4::from_translation(Vector3::new(5.0, 0.0, -1.0)));
        assert_eq!(moved.min, Point3::new(5.0, 0.0, -1.0));
        assert_eq!(moved.max, Point3::new(6.0, 1.0, 0.0));
    }

    // ===== Distance Tests =====

    #[test]
    fn test_distance_facing_a_face() {
        let d = unit_box().distance_to_point(Point3::new(0.5, 0.5, 4.0));
        assert!((d - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_distance_to_edge_and_vertex() {
        let edge = unit_box().distance_to_point(Point3::new(2.0, 2.0, 0.5));
        assert!((edge - 2.0f32.sqrt()).abs() < 1e-5);
        let vertex = unit_box().distance_to_point(Point3::new(-1.0, -1.0, -1.0));
        assert!((vertex - 3.0f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_distance_from_inside_is_nearest_face() {
        let d = unit_box().distance_to_point(Point3::new(0.5, 0.9, 0.5));
        assert!((d - 0.1).abs() < 1e-5);
    }

    // ===== Ray Tests =====

    #[test]
    fn test_ray_hits_box() {
        let ray = Ray::new(Point3::new(-1.0, 0.5, 0.5), Vector3::new(1.0, 0.0, 0.0));
        let t = unit_box().intersects_ray(&ray).unwrap();
        assert!((t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_from_inside_and_behind() {
        let inside = Ray::new(Point3::new(0.5, 0.5, 0.5), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(unit_box().intersects_ray(&inside), Some(0.0));
        let behind = Ray::new(Point3::new(0.5, 0.5, 3.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(unit_box().intersects_ray(&behind).is_none());
    }
}
