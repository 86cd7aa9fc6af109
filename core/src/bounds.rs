//! Quickly computed extents of the visible home, used to choose clip distances.
//!
//! Coordinates are plan coordinates: `x`, `y` in plan and `z` the elevation.

use cgmath::Point3;

use crate::common::Aabb;
use crate::home::{HomeItem, Home};

/// Approximate bounds of the items displayed at viewable levels, `None` for
/// an empty home.
pub fn approximate_home_bounds(home: &Home) -> Option<Aabb> {
    let mut points: Vec<Point3<f32>> = Vec::new();

    for id in home.all_pieces() {
        let Some(piece) = home.piece(id) else { continue };
        if piece.visible && home.is_level_viewable(piece.level) {
            let half = piece.width_in_plan().max(piece.depth_in_plan()) / 2.0;
            let elevation = home.piece_ground_elevation(piece);
            points.push(Point3::new(piece.x - half, piece.y - half, elevation));
            points.push(Point3::new(piece.x + half, piece.y + half, elevation + piece.height_in_plan()));
        }
    }
    for &id in home.walls() {
        let Some(wall) = home.wall(id) else { continue };
        if home.is_level_viewable(wall.level) {
            let elevation = home.level_elevation(wall.level);
            points.push(Point3::new(wall.x_start, wall.y_start, elevation));
            points.push(Point3::new(wall.x_end, wall.y_end, elevation + home.wall_height_or_default(wall)));
        }
    }
    for &id in home.rooms() {
        let Some(room) = home.room(id) else { continue };
        if home.is_level_viewable(room.level) {
            let [x, y] = room.center();
            points.push(Point3::new(x, y, home.level_elevation(room.level)));
        }
    }
    for &id in home.dimension_lines() {
        if let Some(HomeItem::DimensionLine(line)) = home.item(id) {
            if line.visible_in_3d && home.is_level_viewable(line.level) {
                let elevation = home.level_elevation(line.level);
                points.push(Point3::new(line.x_start, line.y_start, elevation + line.elevation_start));
                points.push(Point3::new(line.x_end, line.y_end, elevation + line.elevation_end));
            }
        }
    }
    for &id in home.labels() {
        if let Some(HomeItem::Label(label)) = home.item(id) {
            if label.pitch.is_some() && home.is_level_viewable(label.level) {
                points.push(Point3::new(label.x, label.y, home.level_elevation(label.level) + label.elevation));
            }
        }
    }
    for &id in home.polylines() {
        if let Some(HomeItem::Polyline(polyline)) = home.item(id) {
            if polyline.visible_in_3d && home.is_level_viewable(polyline.level) {
                let elevation = home.level_elevation(polyline.level) + polyline.elevation;
                points.extend(polyline.points.iter().map(|p| Point3::new(p[0], p[1], elevation)));
            }
        }
    }
    Aabb::from_points(&points)
}

/// Highest elevation reached by the displayed items, at least `0`.
pub fn home_height(home: &Home) -> f32 {
    let mut height: f32 = 0.0;
    for id in home.all_pieces() {
        let Some(piece) = home.piece(id) else { continue };
        if piece.visible && home.is_level_viewable(piece.level) {
            height = height.max(home.piece_ground_elevation(piece) + piece.height);
        }
    }
    for &id in home.walls() {
        let Some(wall) = home.wall(id) else { continue };
        if home.is_level_viewable(wall.level) {
            let elevation = home.level_elevation(wall.level);
            height = height.max(elevation + home.wall_height_or_default(wall));
            if let (Some(_), Some(at_end)) = (wall.height, wall.height_at_end) {
                height = height.max(elevation + at_end);
            }
        }
    }
    for &id in home.rooms() {
        let Some(room) = home.room(id) else { continue };
        if room.level.is_some() && home.is_level_viewable(room.level) {
            height = height.max(home.level_elevation(room.level));
        }
    }
    for &id in home.polylines() {
        if let Some(HomeItem::Polyline(polyline)) = home.item(id) {
            if polyline.visible_in_3d && home.is_level_viewable(polyline.level) {
                height = height.max(home.level_elevation(polyline.level) + polyline.elevation);
            }
        }
    }
    for &id in home.dimension_lines() {
        if let Some(HomeItem::DimensionLine(line)) = home.item(id) {
            if line.visible_in_3d && home.is_level_viewable(line.level) {
                height = height.max(home.level_elevation(line.level) + line.elevation_start.max(line.elevation_end));
            }
        }
    }
    for &id in home.labels() {
        if let Some(HomeItem::Label(label)) = home.item(id) {
            if label.pitch.is_some() && home.is_level_viewable(label.level) {
                height = height.max(home.level_elevation(label.level) + label.elevation);
            }
        }
    }
    height
}

/// Lazily computed bounds and height, dropped on every geometry change.
#[derive(Debug, Default)]
pub struct BoundsCache {
    bounds: Option<Option<Aabb>>,
    height: Option<f32>,
}

impl BoundsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.bounds = None;
        self.height = None;
    }

    pub fn is_valid(&self) -> bool {
        self.bounds.is_some() || self.height.is_some()
    }

    pub fn bounds(&mut self, home: &Home) -> Option<Aabb> {
        *self.bounds.get_or_insert_with(|| approximate_home_bounds(home))
    }

    pub fn home_height(&mut self, home: &Home) -> f32 {
        *self.height.get_or_insert_with(|| home_height(home))
    }
}
