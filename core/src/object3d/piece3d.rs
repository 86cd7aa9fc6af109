use std::rc::Rc;

use cgmath::{Matrix4, Point3, Rad, Vector3};

use crate::common::RgbaColor;
use crate::home::{Home, ObjectId, Piece};
use crate::scene::{Appearance, AppearanceFlags, Geometry, NodeId, NodeKind, Scene, Visibility};

use super::{is_selected, packed_color, ModelLoader, Object3D, Object3DBase};

const SELECTION_COLOR: RgbaColor = RgbaColor::rgb(0.4, 0.6, 1.0);

/// A piece of furniture: its model scaled to the piece size, plus a selection
/// outline while it is selected and editing in 3D is enabled.
pub struct Piece3D {
    base: Object3DBase,
    loader: Rc<dyn ModelLoader>,
    /// Last loaded model, `None` geometry when loading failed.
    model: Option<(String, Option<Geometry>)>,
}

impl Piece3D {
    pub fn create(
        home: &Home,
        item: ObjectId,
        scene: &mut Scene,
        parent: NodeId,
        index: Option<usize>,
        loader: Rc<dyn ModelLoader>,
    ) -> anyhow::Result<Self> {
        let base = Object3DBase::create(item, scene, parent, index, "piece", NodeKind::Transform(Matrix4::from_scale(1.0)))?;
        let mut piece = Self { base, loader, model: None };
        piece.rebuild(home, scene)?;
        Ok(piece)
    }

    /// Returns `true` if the displayed model is the error placeholder.
    pub fn is_fallback(&self) -> bool {
        matches!(self.model, Some((_, None)))
    }

    /// Normalized model geometry, loaded once per model reference.
    fn model_geometry(&mut self, piece: &Piece) -> Option<Geometry> {
        let Some(model) = &piece.model else {
            return Some(unit_box());
        };
        let cached = matches!(&self.model, Some((loaded, _)) if loaded == model);
        if !cached {
            let geometry = match self.loader.load_model(model) {
                Ok(geometry) => Some(normalize(geometry)),
                Err(error) => {
                    log::warn!("Failed to load model {} of piece {}: {}", model, piece.name, error);
                    None
                }
            };
            self.model = Some((model.clone(), geometry));
        }
        self.model.as_ref().and_then(|(_, geometry)| geometry.clone())
    }

    fn rebuild(&mut self, home: &Home, scene: &mut Scene) -> anyhow::Result<()> {
        self.base.clear(scene);
        let Some(piece) = home.piece(self.base.item) else {
            return Ok(());
        };
        scene.set_transform(self.base.node, piece_transform(home, &piece))?;

        let (geometry, appearance) = match self.model_geometry(&piece) {
            Some(geometry) => {
                let appearance = Appearance::new(packed_color(piece.color, RgbaColor::WHITE))
                    .with_texture(piece.texture.clone())
                    .with_shininess(piece.shininess);
                (geometry, appearance)
            }
            None => (unit_box(), Appearance::error()),
        };
        let appearance = if piece.model_mirrored {
            appearance.with_flags(AppearanceFlags::DOUBLE_SIDED)
        } else {
            appearance
        };
        scene.add_node(Some(self.base.node), Some("model".to_string()), NodeKind::Shape { geometry, appearance })?;

        let visible = piece.visible && home.is_level_viewable(piece.level);
        if visible && home.preferences().editing_in_3d_enabled && is_selected(home, self.base.item) {
            scene.add_node(
                Some(self.base.node),
                Some("selection".to_string()),
                NodeKind::Shape {
                    geometry: box_outline(),
                    appearance: Appearance::new(SELECTION_COLOR)
                        .with_flags(AppearanceFlags::SELECTED | AppearanceFlags::UNLIT),
                },
            )?;
        }
        scene.set_visibility(
            self.base.node,
            if visible { Visibility::Visible } else { Visibility::Invisible },
        );
        Ok(())
    }
}

impl Object3D for Piece3D {
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

/// Places a model normalized to a unit box centered at the origin at the
/// piece location, orientation and size.
pub fn piece_transform(home: &Home, piece: &Piece) -> Matrix4<f32> {
    let elevation = home.piece_ground_elevation(piece) + piece.height_in_plan() / 2.0;
    let mirror = if piece.model_mirrored { -1.0 } else { 1.0 };
    Matrix4::from_translation(Vector3::new(piece.x, elevation, piece.y))
        * Matrix4::from_angle_y(Rad(-piece.angle))
        * Matrix4::from_angle_x(Rad(-piece.pitch))
        * Matrix4::from_angle_z(Rad(piece.roll))
        * Matrix4::from_nonuniform_scale(piece.width * mirror, piece.height, piece.depth)
}

fn unit_box() -> Geometry {
    Geometry::box_on_ground(1.0, 1.0, 1.0).translated(Vector3::new(0.0, -0.5, 0.0))
}

/// Centers `geometry` at the origin and scales it to a unit box.
fn normalize(geometry: Geometry) -> Geometry {
    let Some(bounds) = geometry.bounds() else {
        return geometry;
    };
    let center = bounds.center();
    let size = bounds.size();
    let scale = |extent: f32| if extent > 0.0 { 1.0 / extent } else { 1.0 };
    let (sx, sy, sz) = (scale(size.x), scale(size.y), scale(size.z));
    let mut normalized = geometry;
    for position in &mut normalized.positions {
        *position = Point3::new(
            (position.x - center.x) * sx,
            (position.y - center.y) * sy,
            (position.z - center.z) * sz,
        );
    }
    normalized
}

/// The twelve edges of the unit box.
fn box_outline() -> Geometry {
    let corners: Vec<Point3<f32>> = (0..8)
        .map(|i| {
            let coordinate = |bit: u32| if i & bit != 0 { 0.5 } else { -0.5 };
            Point3::new(coordinate(1), coordinate(2), coordinate(4))
        })
        .collect();
    let mut indices = Vec::new();
    for i in 0..8u32 {
        for bit in [1, 2, 4] {
            if i & bit == 0 {
                indices.extend_from_slice(&[i, i | bit]);
            }
        }
    }
    Geometry::lines(corners, indices)
}
