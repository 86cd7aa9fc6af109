use cgmath::{EuclideanSpace, Matrix4, Point3, Rad, SquareMatrix, Vector4};

use crate::common::Ray;

/// Renderer-facing view state: canvas size, projection parameters and the
/// view-platform transform that places the eye in the world.
///
/// `field_of_view` is the horizontal angle in radians; the vertical angle is
/// derived from the canvas aspect ratio.
#[derive(Debug, Clone)]
pub struct View {
    width: u32,
    height: u32,
    depth_bits: u32,
    field_of_view: f32,
    front_clip_distance: f32,
    back_clip_distance: f32,
    view_platform_transform: Matrix4<f32>,
}

impl View {
    pub fn new(width: u32, height: u32, depth_bits: u32) -> Self {
        Self {
            width,
            height,
            depth_bits,
            field_of_view: std::f32::consts::FRAC_PI_4,
            front_clip_distance: 1.0,
            back_clip_distance: 1000.0,
            view_platform_transform: Matrix4::identity(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Bits of the depth buffer; 16 or less means clip distances must stay conservative.
    pub fn depth_bits(&self) -> u32 {
        self.depth_bits
    }

    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn set_field_of_view(&mut self, field_of_view: f32) {
        self.field_of_view = field_of_view;
    }

    pub fn front_clip_distance(&self) -> f32 {
        self.front_clip_distance
    }

    pub fn set_front_clip_distance(&mut self, distance: f32) {
        self.front_clip_distance = distance;
    }

    pub fn back_clip_distance(&self) -> f32 {
        self.back_clip_distance
    }

    pub fn set_back_clip_distance(&mut self, distance: f32) {
        self.back_clip_distance = distance;
    }

    pub fn view_platform_transform(&self) -> Matrix4<f32> {
        self.view_platform_transform
    }

    pub fn set_view_platform_transform(&mut self, transform: Matrix4<f32>) {
        self.view_platform_transform = transform;
    }

    pub fn vertical_field_of_view(&self) -> f32 {
        if !self.has_area() {
            return self.field_of_view;
        }
        2.0 * ((self.field_of_view / 2.0).tan() * self.height as f32 / self.width as f32).atan()
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let aspect = if self.has_area() {
            self.width as f32 / self.height as f32
        } else {
            1.0
        };
        cgmath::perspective(
            Rad(self.vertical_field_of_view()),
            aspect,
            self.front_clip_distance,
            self.back_clip_distance,
        )
    }

    /// Position of the eye in world space.
    pub fn eye_position(&self) -> Point3<f32> {
        Point3::from_vec(self.view_platform_transform.w.truncate())
    }

    /// Converts canvas pixel coordinates (origin at the top left corner) to
    /// normalized device coordinates.
    pub fn pixel_to_ndc(&self, x: f32, y: f32) -> (f32, f32) {
        let width = self.width.max(1) as f32;
        let height = self.height.max(1) as f32;
        ((x / width - 0.5) * 2.0, (0.5 - y / height) * 2.0)
    }

    /// Maps a point in normalized device coordinates back to world space.
    pub fn unproject(&self, ndc_x: f32, ndc_y: f32, ndc_z: f32) -> Option<Point3<f32>> {
        let inverse_projection = self.projection_matrix().invert()?;
        let view_point = inverse_projection * Vector4::new(ndc_x, ndc_y, ndc_z, 1.0);
        if view_point.w.abs() < f32::EPSILON {
            return None;
        }
        let view_point = Point3::from_homogeneous(view_point);
        Some(Point3::from_homogeneous(
            self.view_platform_transform * view_point.to_homogeneous(),
        ))
    }

    /// World point under a canvas pixel, taken in the middle of the depth range.
    pub fn pixel_to_world(&self, x: f32, y: f32) -> Option<Point3<f32>> {
        let (ndc_x, ndc_y) = self.pixel_to_ndc(x, y);
        self.unproject(ndc_x, ndc_y, 0.0)
    }

    /// Ray from the eye through a canvas pixel.
    pub fn pick_ray(&self, x: f32, y: f32) -> Option<Ray> {
        let target = self.pixel_to_world(x, y)?;
        Some(Ray::between(self.eye_position(), target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_pixel_to_ndc_corners() {
        let view = View::new(200, 100, 24);
        assert_eq!(view.pixel_to_ndc(0.0, 0.0), (-1.0, 1.0));
        assert_eq!(view.pixel_to_ndc(200.0, 100.0), (1.0, -1.0));
        assert_eq!(view.pixel_to_ndc(100.0, 50.0), (0.0, 0.0));
    }

    #[test]
    fn test_vertical_field_of_view_follows_aspect() {
        let mut view = View::new(200, 100, 24);
        view.set_field_of_view(std::f32::consts::FRAC_PI_2);
        let expected = 2.0 * (0.5f32).atan();
        assert!((view.vertical_field_of_view() - expected).abs() < EPSILON);
    }

    #[test]
    fn test_center_pick_ray_looks_down_negative_z() {
        let mut view = View::new(100, 100, 24);
        view.set_view_platform_transform(Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)));
        let ray = view.pick_ray(50.0, 50.0).unwrap();
        assert!((ray.origin - Point3::new(1.0, 2.0, 3.0)).magnitude() < EPSILON);
        assert!((ray.direction - Vector3::new(0.0, 0.0, -1.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_right_edge_pick_ray_leans_right() {
        let view = View::new(100, 100, 24);
        let ray = view.pick_ray(100.0, 50.0).unwrap();
        assert!(ray.direction.x > 0.0);
        assert!(ray.direction.y.abs() < EPSILON);
    }
}
