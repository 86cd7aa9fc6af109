use crate::common::{polygons_intersect, Point2, RgbaColor};
use crate::home::{Home, ObjectId, Piece, Wall};
use crate::scene::{Appearance, Geometry, NodeId, NodeKind, Scene};

use super::{level_visibility, packed_color, Object3D, Object3DBase};

const DEFAULT_WALL_COLOR: RgbaColor = RgbaColor::rgb(0.9, 0.9, 0.9);

/// Part of a wall opening: `[start, end]` along the wall axis, `[bottom, top]`
/// relative to the wall base.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Opening {
    start: f32,
    end: f32,
    bottom: f32,
    top: f32,
}

/// A wall drawn as vertical blocks around the openings of its doors and windows.
pub struct Wall3D {
    base: Object3DBase,
}

impl Wall3D {
    pub fn create(
        home: &Home,
        item: ObjectId,
        scene: &mut Scene,
        parent: NodeId,
        index: Option<usize>,
    ) -> anyhow::Result<Self> {
        let base = Object3DBase::create(item, scene, parent, index, "wall", NodeKind::Group)?;
        let wall = Self { base };
        wall.rebuild(home, scene)?;
        Ok(wall)
    }

    fn rebuild(&self, home: &Home, scene: &mut Scene) -> anyhow::Result<()> {
        self.base.clear(scene);
        let Some(wall) = home.wall(self.base.item) else {
            return Ok(());
        };
        let length = wall.length();
        if length <= 0.0 {
            return Ok(());
        }

        let base_elevation = home.level_elevation(wall.level);
        let openings = wall_openings(home, wall, base_elevation);
        let alpha = 1.0 - home.environment().walls_alpha;
        let color = packed_color(wall.left_side_color, DEFAULT_WALL_COLOR).with_alpha(alpha);

        for (index, (start, end, bottom, top)) in wall_blocks(home, wall, &openings).into_iter().enumerate() {
            let outline = block_outline(wall, start, end);
            let geometry = Geometry::extrusion(&outline, base_elevation + bottom, base_elevation + top);
            scene.add_node(
                Some(self.base.node),
                Some(format!("wall-block-{}", index)),
                NodeKind::Shape {
                    geometry,
                    appearance: Appearance::new(color),
                },
            )?;
        }
        scene.set_visibility(self.base.node, level_visibility(home, wall.level));
        Ok(())
    }
}

impl Object3D for Wall3D {
    fn item(&self) -> ObjectId {
        self.base.item
    }

    fn node(&self) -> NodeId {
        self.base.node
    }

    fn update(&mut self, home: &Home, scene: &mut Scene) -> anyhow::Result<()> {
        self.base.update_count += 1;
        self.rebuild(home, scene)
    }

    fn update_count(&self) -> u32 {
        self.base.update_count
    }
}

/// Height of the wall at `distance` from its start.
fn height_at(home: &Home, wall: &Wall, distance: f32) -> f32 {
    let start = home.wall_height_or_default(wall);
    match wall.height_at_end {
        Some(end) => {
            let length = wall.length();
            if length > 0.0 {
                start + (end - start) * distance / length
            } else {
                start
            }
        }
        None => start,
    }
}

/// Openings cut by visible doors and windows whose footprint crosses the wall.
fn wall_openings(home: &Home, wall: &Wall, base_elevation: f32) -> Vec<Opening> {
    let wall_points = wall.points();
    let length = wall.length();
    let axis = [(wall.x_end - wall.x_start) / length, (wall.y_end - wall.y_start) / length];

    let mut openings: Vec<Opening> = home
        .all_pieces()
        .into_iter()
        .filter_map(|id| home.piece(id))
        .filter(|piece| piece.door_or_window && piece.visible && home.is_level_viewable(piece.level))
        .filter(|piece| polygons_intersect(&piece.points(), &wall_points))
        .map(|piece| opening_of(home, piece, wall, axis, length, base_elevation))
        .filter(|opening| opening.end > opening.start && opening.top > opening.bottom)
        .collect();
    openings.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<Opening> = Vec::with_capacity(openings.len());
    for opening in openings {
        match merged.last_mut() {
            Some(last) if opening.start <= last.end => {
                last.end = last.end.max(opening.end);
                last.bottom = last.bottom.min(opening.bottom);
                last.top = last.top.max(opening.top);
            }
            _ => merged.push(opening),
        }
    }
    merged
}

fn opening_of(home: &Home, piece: &Piece, wall: &Wall, axis: Point2, length: f32, base_elevation: f32) -> Opening {
    let (start, end) = piece.points().iter().fold((f32::MAX, f32::MIN), |(min, max), point| {
        let t = (point[0] - wall.x_start) * axis[0] + (point[1] - wall.y_start) * axis[1];
        (min.min(t), max.max(t))
    });
    let bottom = home.piece_ground_elevation(piece) - base_elevation;
    Opening {
        start: start.clamp(0.0, length),
        end: end.clamp(0.0, length),
        bottom: bottom.max(0.0),
        top: bottom + piece.height_in_plan(),
    }
}

/// Splits the wall into `(start, end, bottom, top)` blocks around `openings`.
fn wall_blocks(home: &Home, wall: &Wall, openings: &[Opening]) -> Vec<(f32, f32, f32, f32)> {
    let length = wall.length();
    let mut blocks = Vec::new();
    let mut cursor = 0.0;
    for opening in openings {
        let top = height_at(home, wall, (opening.start + opening.end) / 2.0);
        if opening.start > cursor {
            blocks.push((cursor, opening.start, 0.0, height_at(home, wall, (cursor + opening.start) / 2.0)));
        }
        if opening.bottom > 0.0 {
            blocks.push((opening.start, opening.end, 0.0, opening.bottom.min(top)));
        }
        if opening.top < top {
            blocks.push((opening.start, opening.end, opening.top.max(0.0), top));
        }
        cursor = opening.end;
    }
    if cursor < length {
        blocks.push((cursor, length, 0.0, height_at(home, wall, (cursor + length) / 2.0)));
    }
    blocks
}

/// Plan outline of the wall part between `start` and `end` along its axis.
fn block_outline(wall: &Wall, start: f32, end: f32) -> [Point2; 4] {
    let length = wall.length();
    let (ux, uy) = ((wall.x_end - wall.x_start) / length, (wall.y_end - wall.y_start) / length);
    let (nx, ny) = (-uy * wall.thickness / 2.0, ux * wall.thickness / 2.0);
    let at = |t: f32| [wall.x_start + ux * t, wall.y_start + uy * t];
    let (a, b) = (at(start), at(end));
    [
        [a[0] - nx, a[1] - ny],
        [b[0] - nx, b[1] - ny],
        [b[0] + nx, b[1] + ny],
        [a[0] + nx, a[1] + ny],
    ]
}
