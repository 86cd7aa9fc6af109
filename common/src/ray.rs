use cgmath::{InnerSpace, Matrix4, Point3, Vector3};

use crate::EPSILON;

/// A half-line with a normalized direction, used to pick shapes under a pixel.
#[derive(Debug, Copy, Clone)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Creates the ray starting at `from` and passing through `through`.
    pub fn between(from: Point3<f32>, through: Point3<f32>) -> Self {
        Self::new(from, through - from)
    }

    pub fn point_at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Maps the ray into another space; the direction is renormalized so `t`
    /// values are distances in the target space.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let origin = Point3::from_homogeneous(matrix * self.origin.to_homogeneous());
        let direction = (matrix * self.direction.extend(0.0)).truncate();
        Self::new(origin, direction)
    }

    /// Double-sided Möller-Trumbore test. Returns the distance to the hit
    /// point, or `None` when the triangle is missed or behind the origin.
    pub fn intersect_triangle(
        &self,
        v0: Point3<f32>,
        v1: Point3<f32>,
        v2: Point3<f32>,
    ) -> Option<f32> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let h = self.direction.cross(edge2);
        let det = edge1.dot(h);
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - v0;
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = inv_det * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * edge2.dot(q);
        (t > EPSILON).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Rad;

    #[test]
    fn test_new_normalizes() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 3.0, 4.0));
        assert!((ray.direction.magnitude() - 1.0).abs() < EPSILON);
        let p = ray.point_at(5.0);
        assert!((p.y - 3.0).abs() < 1e-5 && (p.z - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_between() {
        let ray = Ray::between(Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, -9.0));
        assert!((ray.direction.z + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_transform_rotation() {
        let ray = Ray::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        let rotated = ray.transform(&Matrix4::from_angle_y(Rad(std::f32::consts::FRAC_PI_2)));
        assert!((rotated.origin.z + 1.0).abs() < 1e-5);
        assert!((rotated.direction.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_hit_and_miss() {
        let (v0, v1, v2) = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        );
        let hit = Ray::new(Point3::new(0.5, 0.5, 3.0), Vector3::new(0.0, 0.0, -1.0));
        assert!((hit.intersect_triangle(v0, v1, v2).unwrap() - 3.0).abs() < 1e-5);

        let from_behind = Ray::new(Point3::new(0.5, 0.5, -3.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(from_behind.intersect_triangle(v0, v1, v2).is_some());

        let outside = Ray::new(Point3::new(1.5, 1.5, 3.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(outside.intersect_triangle(v0, v1, v2).is_none());

        let parallel = Ray::new(Point3::new(0.5, 0.5, 1.0), Vector3::new(1.0, 0.0, 0.0));
        assert!(parallel.intersect_triangle(v0, v1, v2).is_none());
    }
}
