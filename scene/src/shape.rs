use bitflags::bitflags;
use cgmath::{Point3, Vector3};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::common::{Aabb, Point2, RgbaColor};

bitflags! {
    /// Rendering hints attached to a shape appearance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AppearanceFlags: u32 {
        /// Faces are visible from both sides.
        const DOUBLE_SIDED = 1 << 0;
        /// Color alpha is below one and must be blended.
        const TRANSPARENT = 1 << 1;
        /// Placeholder displayed because content failed to load.
        const ERROR = 1 << 2;
        /// Shape belongs to a selected item.
        const SELECTED = 1 << 3;
        /// Drawn without lighting (annotations, background).
        const UNLIT = 1 << 4;
    }
}

/// Surface attributes of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Appearance {
    pub color: RgbaColor,
    pub texture: Option<String>,
    pub shininess: f32,
    pub flags: AppearanceFlags,
}

impl Appearance {
    pub fn new(color: RgbaColor) -> Self {
        let flags = if color.a < 1.0 {
            AppearanceFlags::TRANSPARENT
        } else {
            AppearanceFlags::empty()
        };
        Self {
            color,
            texture: None,
            shininess: 0.0,
            flags,
        }
    }

    /// The conspicuous red appearance used in place of content that failed to load.
    pub fn error() -> Self {
        Self::new(RgbaColor::RED).with_flags(AppearanceFlags::ERROR)
    }

    pub fn with_flags(mut self, flags: AppearanceFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_texture(mut self, texture: Option<String>) -> Self {
        self.texture = texture;
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self::new(RgbaColor::WHITE)
    }
}

/// How the indices of a [`Geometry`] are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Lines,
}

/// Indexed vertex data in renderer space (y up).
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Point3<f32>>,
    pub indices: Vec<u32>,
    pub primitive: Primitive,
}

impl Geometry {
    pub fn triangles(positions: Vec<Point3<f32>>, indices: Vec<u32>) -> Self {
        Self { positions, indices, primitive: Primitive::Triangles }
    }

    pub fn lines(positions: Vec<Point3<f32>>, indices: Vec<u32>) -> Self {
        Self { positions, indices, primitive: Primitive::Lines }
    }

    /// A polyline joining consecutive points, closed when `closed` is set.
    pub fn polyline(points: Vec<Point3<f32>>, closed: bool) -> Self {
        let n = points.len() as u32;
        let segments = if closed { n } else { n.saturating_sub(1) };
        let indices = (0..segments).flat_map(|i| [i, (i + 1) % n]).collect();
        Self::lines(points, indices)
    }

    /// Axis-aligned box of the given extents whose bottom face is centered on the origin.
    pub fn box_on_ground(width: f32, height: f32, depth: f32) -> Self {
        let (hw, hd) = (width / 2.0, depth / 2.0);
        let bottom = [[-hw, -hd], [hw, -hd], [hw, hd], [-hw, hd]];
        Self::extrusion(&bottom, 0.0, height)
    }

    /// A vertical prism built from a plan polygon, plan `(x, y)` mapping to renderer `(x, z)`.
    pub fn extrusion(outline: &[Point2], bottom: f32, top: f32) -> Self {
        let n = outline.len() as u32;
        let mut positions = Vec::with_capacity(outline.len() * 2);
        positions.extend(outline.iter().map(|p| Point3::new(p[0], bottom, p[1])));
        positions.extend(outline.iter().map(|p| Point3::new(p[0], top, p[1])));

        let mut indices = Vec::new();
        for i in 0..n {
            let j = (i + 1) % n;
            indices.extend_from_slice(&[i, j, n + j, i, n + j, n + i]);
        }
        // Fan triangulation is enough for the convex outlines used here
        for i in 1..n.saturating_sub(1) {
            indices.extend_from_slice(&[0, i + 1, i]);
            indices.extend_from_slice(&[n, n + i, n + i + 1]);
        }
        Self::triangles(positions, indices)
    }

    /// A flat horizontal polygon at `elevation`.
    pub fn horizontal_polygon(outline: &[Point2], elevation: f32) -> Self {
        let n = outline.len() as u32;
        let positions = outline.iter().map(|p| Point3::new(p[0], elevation, p[1])).collect();
        let indices = (1..n.saturating_sub(1)).flat_map(|i| [0, i, i + 1]).collect();
        Self::triangles(positions, indices)
    }

    /// Half sphere of `radius` split in `divisions` slices, upper or lower.
    pub fn hemisphere(radius: f32, divisions: u32, upper: bool) -> Self {
        let rings = (divisions / 4).max(1);
        let mut positions = Vec::new();
        for ring in 0..=rings {
            let latitude = FRAC_PI_2 * ring as f32 / rings as f32;
            let y = if upper { latitude.sin() } else { -latitude.sin() } * radius;
            let r = latitude.cos() * radius;
            for slice in 0..divisions {
                let longitude = 2.0 * PI * slice as f32 / divisions as f32;
                positions.push(Point3::new(r * longitude.cos(), y, r * longitude.sin()));
            }
        }
        let mut indices = Vec::new();
        for ring in 0..rings {
            for slice in 0..divisions {
                let a = ring * divisions + slice;
                let b = ring * divisions + (slice + 1) % divisions;
                indices.extend_from_slice(&[a, b, a + divisions, b, b + divisions, a + divisions]);
            }
        }
        Self::triangles(positions, indices)
    }

    pub fn translated(mut self, offset: Vector3<f32>) -> Self {
        for position in &mut self.positions {
            *position += offset;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// Iterates over triangle corners; empty for line geometry.
    pub fn triangles_iter(&self) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
        let chunks = match self.primitive {
            Primitive::Triangles => self.indices.chunks_exact(3),
            Primitive::Lines => self.indices[..0].chunks_exact(3),
        };
        chunks.map(move |c| {
            [
                self.positions[c[0] as usize],
                self.positions[c[1] as usize],
                self.positions[c[2] as usize],
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_on_ground_bounds() {
        let geometry = Geometry::box_on_ground(2.0, 3.0, 4.0);
        let bounds = geometry.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(-1.0, 0.0, -2.0));
        assert_eq!(bounds.max, Point3::new(1.0, 3.0, 2.0));
        // 4 sides and 2 caps of 2 triangles each
        assert_eq!(geometry.triangles_iter().count(), 12);
    }

    #[test]
    fn test_polyline_indices() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 1.0)];
        assert_eq!(Geometry::polyline(points.clone(), false).indices, vec![0, 1, 1, 2]);
        assert_eq!(Geometry::polyline(points, true).indices, vec![0, 1, 1, 2, 2, 0]);
    }

    #[test]
    fn test_hemisphere_orientation() {
        let sky = Geometry::hemisphere(1.0, 48, true).bounds().unwrap();
        assert!(sky.min.y >= -1e-6 && (sky.max.y - 1.0).abs() < 1e-5);
        let ground = Geometry::hemisphere(1.0, 48, false).bounds().unwrap();
        assert!(ground.max.y <= 1e-6);
    }

    #[test]
    fn test_appearance_flags() {
        assert!(Appearance::new(RgbaColor::WHITE.with_alpha(0.5)).flags.contains(AppearanceFlags::TRANSPARENT));
        assert!(Appearance::error().flags.contains(AppearanceFlags::ERROR));
        assert_eq!(Appearance::error().color, RgbaColor::RED);
    }
}
