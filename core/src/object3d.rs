//! Scene representations of home items.
//!
//! Each tracked item owns one subtree, rooted at a node whose identity never
//! changes. [`Object3D::update`] rebuilds what lies below that root from the
//! item's current state, so calling it again without changes produces the
//! same subtree.

mod annotations;
mod ground3d;
mod piece3d;
mod room3d;
mod wall3d;

use std::rc::Rc;

use anyhow::bail;
use cgmath::Point3;

pub use annotations::{DimensionLine3D, Label3D, Polyline3D};
pub use ground3d::{Ground3D, GROUND_ORIGIN, GROUND_SIZE};
pub use piece3d::Piece3D;
pub use room3d::Room3D;
pub use wall3d::Wall3D;

use crate::common::{polygon_bounds, polygon_contains_point, Point2, RgbaColor};
use crate::error::LoadError;
use crate::home::{Home, HomeItem, LevelId, ObjectId};
use crate::scene::{Geometry, NodeId, NodeKind, Scene, Visibility};

/// The subtree displaying one home item.
pub trait Object3D {
    /// The home item this subtree displays.
    fn item(&self) -> ObjectId;

    /// Root node of the subtree, stable for the object's whole life.
    fn node(&self) -> NodeId;

    /// Rebuilds the subtree from the current state of the item.
    fn update(&mut self, home: &Home, scene: &mut Scene) -> anyhow::Result<()>;

    /// Number of times [`Object3D::update`] ran.
    fn update_count(&self) -> u32;
}

/// Creates the subtree of a home item.
///
/// Hosts override it to change how items are built, for example when
/// exporting the scene.
pub trait Object3DFactory {
    /// Builds the subtree of `item` and inserts its root under `parent` at
    /// `index`, or last when `index` is `None`.
    fn create_object3d(
        &self,
        home: &Home,
        item: ObjectId,
        scene: &mut Scene,
        parent: NodeId,
        index: Option<usize>,
    ) -> anyhow::Result<Box<dyn Object3D>>;
}

/// Resolves model references to geometry.
pub trait ModelLoader {
    fn load_model(&self, model: &str) -> Result<Geometry, LoadError>;
}

/// Loader resolving every model to a unit box, for hosts without a content
/// pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoxModelLoader;

impl ModelLoader for BoxModelLoader {
    fn load_model(&self, _model: &str) -> Result<Geometry, LoadError> {
        Ok(Geometry::box_on_ground(1.0, 1.0, 1.0))
    }
}

/// Factory building the standard subtree of each item kind.
#[derive(Clone)]
pub struct DefaultObject3DFactory {
    loader: Rc<dyn ModelLoader>,
}

impl DefaultObject3DFactory {
    pub fn new(loader: Rc<dyn ModelLoader>) -> Self {
        Self { loader }
    }
}

impl Object3DFactory for DefaultObject3DFactory {
    fn create_object3d(
        &self,
        home: &Home,
        item: ObjectId,
        scene: &mut Scene,
        parent: NodeId,
        index: Option<usize>,
    ) -> anyhow::Result<Box<dyn Object3D>> {
        let Some(home_item) = home.item(item) else {
            bail!("Item {} not found in home", item);
        };
        let object: Box<dyn Object3D> = match home_item {
            HomeItem::Wall(_) => Box::new(Wall3D::create(home, item, scene, parent, index)?),
            HomeItem::Room(_) => Box::new(Room3D::create(home, item, scene, parent, index)?),
            HomeItem::Piece(_) => Box::new(Piece3D::create(home, item, scene, parent, index, self.loader.clone())?),
            HomeItem::FurnitureGroup(_) => Box::new(Group3D::create(item, scene, parent, index)?),
            HomeItem::Polyline(_) => Box::new(Polyline3D::create(home, item, scene, parent, index)?),
            HomeItem::DimensionLine(_) => Box::new(DimensionLine3D::create(home, item, scene, parent, index)?),
            HomeItem::Label(_) => Box::new(Label3D::create(home, item, scene, parent, index)?),
        };
        Ok(object)
    }
}

/// Empty branch standing for a furniture group, which has no shape of its own.
pub struct Group3D {
    base: Object3DBase,
}

impl Group3D {
    pub fn create(item: ObjectId, scene: &mut Scene, parent: NodeId, index: Option<usize>) -> anyhow::Result<Self> {
        let base = Object3DBase::create(item, scene, parent, index, "group", NodeKind::Group)?;
        Ok(Self { base })
    }
}

impl Object3D for Group3D {
    fn item(&self) -> ObjectId {
        self.base.item
    }

    fn node(&self) -> NodeId {
        self.base.node
    }

    fn update(&mut self, _home: &Home, _scene: &mut Scene) -> anyhow::Result<()> {
        self.base.update_count += 1;
        Ok(())
    }

    fn update_count(&self) -> u32 {
        self.base.update_count
    }
}

/// State shared by every object3D: the item, the subtree root and the update counter.
pub(crate) struct Object3DBase {
    pub item: ObjectId,
    pub node: NodeId,
    pub update_count: u32,
}

impl Object3DBase {
    pub fn create(
        item: ObjectId,
        scene: &mut Scene,
        parent: NodeId,
        index: Option<usize>,
        name: &str,
        kind: NodeKind,
    ) -> anyhow::Result<Self> {
        let node = scene.insert_node(parent, index.unwrap_or(usize::MAX), Some(format!("{}-{}", name, item)), kind)?;
        Ok(Self {
            item,
            node,
            update_count: 0,
        })
    }

    /// Clears the subtree below the root before a rebuild.
    pub fn clear(&self, scene: &mut Scene) {
        scene.remove_children(self.node);
    }
}

/// Maps a plan point at `elevation` to renderer space, where y is up.
pub(crate) fn plan_point(point: Point2, elevation: f32) -> Point3<f32> {
    Point3::new(point[0], elevation, point[1])
}

pub(crate) fn level_visibility(home: &Home, level: Option<LevelId>) -> Visibility {
    if home.is_level_viewable(level) {
        Visibility::Visible
    } else {
        Visibility::Invisible
    }
}

pub(crate) fn packed_color(color: Option<u32>, default: RgbaColor) -> RgbaColor {
    color.map(RgbaColor::from_packed_rgb).unwrap_or(default)
}

/// Cells per side of the grid used to carve holes in a surface.
const MAX_CARVING_GRID: usize = 64;

/// Horizontal surface covering `outline` minus `holes`.
///
/// Without holes the outline is fan triangulated. Otherwise the outline
/// bounds are split in a grid whose cells are kept when their center lies
/// inside the outline and outside every hole.
pub(crate) fn carved_surface(outline: &[Point2], holes: &[Vec<Point2>], elevation: f32) -> Geometry {
    if holes.is_empty() {
        return Geometry::horizontal_polygon(outline, elevation);
    }
    let Some(bounds) = polygon_bounds(outline) else {
        return Geometry::triangles(Vec::new(), Vec::new());
    };

    let width = bounds.max_x - bounds.min_x;
    let depth = bounds.max_y - bounds.min_y;
    let columns = MAX_CARVING_GRID.min(width.max(1.0).ceil() as usize).max(1);
    let rows = MAX_CARVING_GRID.min(depth.max(1.0).ceil() as usize).max(1);
    let cell_width = width / columns as f32;
    let cell_depth = depth / rows as f32;

    let mut positions: Vec<Point3<f32>> = Vec::new();
    let mut indices = Vec::new();
    for row in 0..rows {
        for column in 0..columns {
            let x = bounds.min_x + column as f32 * cell_width;
            let y = bounds.min_y + row as f32 * cell_depth;
            let center = [x + cell_width / 2.0, y + cell_depth / 2.0];
            if !polygon_contains_point(outline, center) || holes.iter().any(|hole| polygon_contains_point(hole, center)) {
                continue;
            }
            let first = positions.len() as u32;
            positions.extend([
                plan_point([x, y], elevation),
                plan_point([x + cell_width, y], elevation),
                plan_point([x + cell_width, y + cell_depth], elevation),
                plan_point([x, y + cell_depth], elevation),
            ]);
            indices.extend_from_slice(&[first, first + 1, first + 2, first, first + 2, first + 3]);
        }
    }
    Geometry::triangles(positions, indices)
}

/// Returns `true` if `item` is selected on its own or through a selected group.
pub(crate) fn is_selected(home: &Home, item: ObjectId) -> bool {
    home.selected_items()
        .iter()
        .any(|&selected| selected == item || home.furniture_pieces(selected).contains(&item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::home::{Piece, Room, Wall};

    fn factory() -> DefaultObject3DFactory {
        DefaultObject3DFactory::new(Rc::new(BoxModelLoader))
    }

    #[test]
    fn test_factory_builds_each_kind() {
        let mut home = Home::new();
        let wall = home.add_wall(Wall::new(0.0, 0.0, 400.0, 0.0, 10.0));
        let room = home.add_room(Room::new(vec![[0.0, 0.0], [400.0, 0.0], [400.0, 300.0], [0.0, 300.0]]));
        let piece = home.add_piece(Piece::new("bed", 200.0, 150.0, 160.0, 200.0, 50.0));

        let mut scene = Scene::new();
        let root = scene.add_node(None, None, NodeKind::Group).unwrap();
        let factory = factory();
        for item in [wall, room, piece] {
            let object = factory.create_object3d(&home, item, &mut scene, root, None).unwrap();
            assert_eq!(object.item(), item);
            assert_eq!(object.update_count(), 0);
            assert!(!scene.descendants(object.node()).is_empty());
        }
        assert_eq!(scene.get_node(root).unwrap().children().len(), 3);
    }

    #[test]
    fn test_factory_rejects_unknown_item() {
        let home = Home::new();
        let mut scene = Scene::new();
        let root = scene.add_node(None, None, NodeKind::Group).unwrap();
        assert!(factory().create_object3d(&home, 42, &mut scene, root, None).is_err());
    }

    #[test]
    fn test_factory_inserts_at_index() {
        let mut home = Home::new();
        let first = home.add_wall(Wall::new(0.0, 0.0, 100.0, 0.0, 10.0));
        let second = home.add_wall(Wall::new(0.0, 0.0, 0.0, 100.0, 10.0));
        let mut scene = Scene::new();
        let root = scene.add_node(None, None, NodeKind::Group).unwrap();
        let factory = factory();
        let a = factory.create_object3d(&home, first, &mut scene, root, None).unwrap();
        let b = factory.create_object3d(&home, second, &mut scene, root, Some(0)).unwrap();
        assert_eq!(scene.get_node(root).unwrap().children(), &[b.node(), a.node()]);
    }

    #[test]
    fn test_group_has_no_shape() {
        let mut home = Home::new();
        let group = home.add_furniture_group("set", vec![Piece::new("a", 0.0, 0.0, 10.0, 10.0, 10.0)]);
        let mut scene = Scene::new();
        let root = scene.add_node(None, None, NodeKind::Group).unwrap();
        let object = factory().create_object3d(&home, group, &mut scene, root, None).unwrap();
        assert!(scene.descendants(object.node()).is_empty());
    }
}
