use crate::common::{polygons_intersect, Point2, RgbaColor};
use crate::home::{Home, ObjectId, Room};
use crate::scene::{Appearance, AppearanceFlags, Geometry, NodeId, NodeKind, Scene};

use super::{carved_surface, level_visibility, packed_color, Object3D, Object3DBase};

const DEFAULT_FLOOR_COLOR: RgbaColor = RgbaColor::rgb(0.75, 0.75, 0.75);
const DEFAULT_CEILING_COLOR: RgbaColor = RgbaColor::WHITE;

/// Floor and ceiling of a room, with holes where staircases cross them.
pub struct Room3D {
    base: Object3DBase,
}

impl Room3D {
    pub fn create(
        home: &Home,
        item: ObjectId,
        scene: &mut Scene,
        parent: NodeId,
        index: Option<usize>,
    ) -> anyhow::Result<Self> {
        let base = Object3DBase::create(item, scene, parent, index, "room", NodeKind::Group)?;
        let room = Self { base };
        room.rebuild(home, scene)?;
        Ok(room)
    }

    fn rebuild(&self, home: &Home, scene: &mut Scene) -> anyhow::Result<()> {
        self.base.clear(scene);
        let Some(room) = home.room(self.base.item) else {
            return Ok(());
        };
        if room.points.len() < 3 {
            return Ok(());
        }

        let floor_elevation = home.level_elevation(room.level);
        let ceiling_elevation = floor_elevation
            + room
                .level
                .and_then(|id| home.level(id))
                .map_or(home.wall_height(), |level| level.height);

        if room.floor_visible {
            let holes = staircase_holes(home, room, floor_elevation);
            let appearance = Appearance::new(packed_color(room.floor_color, DEFAULT_FLOOR_COLOR))
                .with_texture(room.floor_texture.clone())
                .with_shininess(room.floor_shininess);
            scene.add_node(
                Some(self.base.node),
                Some("floor".to_string()),
                NodeKind::Shape {
                    geometry: carved_surface(&room.points, &holes, floor_elevation),
                    appearance,
                },
            )?;
        }
        if room.ceiling_visible {
            let holes = staircase_holes(home, room, ceiling_elevation);
            let alpha = 1.0 - home.environment().walls_alpha;
            let appearance = Appearance::new(packed_color(room.ceiling_color, DEFAULT_CEILING_COLOR).with_alpha(alpha))
                .with_texture(room.ceiling_texture.clone())
                .with_shininess(room.ceiling_shininess)
                .with_flags(AppearanceFlags::DOUBLE_SIDED);
            scene.add_node(
                Some(self.base.node),
                Some("ceiling".to_string()),
                NodeKind::Shape {
                    geometry: carved_surface(&room.points, &holes, ceiling_elevation),
                    appearance,
                },
            )?;
        }
        scene.set_visibility(self.base.node, level_visibility(home, room.level));
        Ok(())
    }
}

impl Object3D for Room3D {
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

/// Footprints of the staircases crossing the horizontal plane at `elevation` inside `room`.
fn staircase_holes(home: &Home, room: &Room, elevation: f32) -> Vec<Vec<Point2>> {
    home.all_pieces()
        .into_iter()
        .filter_map(|id| home.piece(id))
        .filter(|piece| piece.is_staircase() && piece.visible)
        .filter(|piece| {
            let bottom = home.piece_ground_elevation(piece);
            bottom < elevation && bottom + piece.height_in_plan() > elevation
        })
        .map(|piece| piece.points())
        .filter(|footprint| polygons_intersect(footprint, &room.points))
        .map(|footprint| footprint.to_vec())
        .collect()
}
