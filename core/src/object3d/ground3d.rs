use std::rc::Rc;

use cgmath::Point3;

use crate::common::{polygon_bounds, Point2, Rect2, RgbaColor};
use crate::home::Home;
use crate::scene::{Appearance, AppearanceFlags, Geometry, NodeId, NodeKind, Scene};

use super::{carved_surface, plan_point, ModelLoader};

/// Plan coordinate of the ground square corner.
pub const GROUND_ORIGIN: f32 = -0.5e5;
/// Side of the ground square.
pub const GROUND_SIZE: f32 = 1e5;
/// Side of the flat box shown when the home structure model fails to load.
const STRUCTURE_FALLBACK_SIZE: f32 = 1e7;

/// The ground of the home, or its imported structure model when it has one.
///
/// Rooms of levels below zero are dug out of the ground: their polygons are
/// carved as holes, with excavation sides down to the level elevation.
pub struct Ground3D {
    node: NodeId,
    loader: Rc<dyn ModelLoader>,
    update_count: u32,
}

impl Ground3D {
    pub fn create(home: &Home, scene: &mut Scene, parent: NodeId, loader: Rc<dyn ModelLoader>) -> anyhow::Result<Self> {
        let node = scene.add_node(Some(parent), Some("ground".to_string()), NodeKind::Group)?;
        let ground = Self {
            node,
            loader,
            update_count: 0,
        };
        ground.rebuild(home, scene)?;
        Ok(ground)
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn update_count(&self) -> u32 {
        self.update_count
    }

    pub fn update(&mut self, home: &Home, scene: &mut Scene) -> anyhow::Result<()> {
        self.update_count += 1;
        self.rebuild(home, scene)
    }

    fn rebuild(&self, home: &Home, scene: &mut Scene) -> anyhow::Result<()> {
        scene.remove_children(self.node);
        if let Some(structure) = home.structure() {
            let (geometry, appearance) = match self.loader.load_model(structure) {
                Ok(geometry) => (geometry, Appearance::default()),
                Err(error) => {
                    log::warn!("Failed to load home structure {}: {}", structure, error);
                    let half = STRUCTURE_FALLBACK_SIZE / 2.0;
                    let square = [[-half, -half], [half, -half], [half, half], [-half, half]];
                    (Geometry::horizontal_polygon(&square, 0.0), Appearance::error())
                }
            };
            scene.add_node(Some(self.node), Some("structure".to_string()), NodeKind::Shape { geometry, appearance })?;
            return Ok(());
        }

        let environment = home.environment();
        let texture = match (environment.background_image_visible_on_ground_3d, home.background_image()) {
            (true, Some(image)) => Some(image.to_string()),
            _ => environment.ground_texture.clone(),
        };
        let appearance = Appearance::new(RgbaColor::from_packed_rgb(environment.ground_color)).with_texture(texture);

        let areas = underground_areas(home);
        let ground = Rect2::new(GROUND_ORIGIN, GROUND_ORIGIN, GROUND_ORIGIN + GROUND_SIZE, GROUND_ORIGIN + GROUND_SIZE);
        let holes: Vec<Vec<Point2>> = areas.iter().map(|(points, _)| points.clone()).collect();
        scene.add_node(
            Some(self.node),
            Some("ground-surface".to_string()),
            NodeKind::Shape {
                geometry: ground_surface(&ground, &holes),
                appearance: appearance.clone(),
            },
        )?;

        for (index, (points, elevation)) in areas.iter().enumerate() {
            let sides = Geometry::extrusion(points, *elevation, 0.0);
            scene.add_node(
                Some(self.node),
                Some(format!("underground-{}", index)),
                NodeKind::Shape {
                    geometry: sides,
                    appearance: appearance.clone().with_flags(AppearanceFlags::DOUBLE_SIDED),
                },
            )?;
        }
        Ok(())
    }
}

/// Polygons of the rooms at viewable levels below the ground, with their elevation.
fn underground_areas(home: &Home) -> Vec<(Vec<Point2>, f32)> {
    home.rooms()
        .iter()
        .filter_map(|&id| home.room(id))
        .filter(|room| room.points.len() >= 3 && home.is_level_viewable(room.level))
        .filter_map(|room| {
            let elevation = home.level_elevation(room.level);
            (elevation < 0.0).then(|| (room.points.clone(), elevation))
        })
        .collect()
}

/// The ground square minus `holes`: four plain strips around the holes
/// bounds, and a carved grid inside them.
fn ground_surface(ground: &Rect2, holes: &[Vec<Point2>]) -> Geometry {
    let Some(inner) = holes
        .iter()
        .filter_map(|hole| polygon_bounds(hole))
        .reduce(|a, b| a.union(&b))
    else {
        return Geometry::horizontal_polygon(&ground.points(), 0.0);
    };

    let strips = [
        Rect2::new(ground.min_x, ground.min_y, ground.max_x, inner.min_y),
        Rect2::new(ground.min_x, inner.max_y, ground.max_x, ground.max_y),
        Rect2::new(ground.min_x, inner.min_y, inner.min_x, inner.max_y),
        Rect2::new(inner.max_x, inner.min_y, ground.max_x, inner.max_y),
    ];
    let mut positions: Vec<Point3<f32>> = Vec::new();
    let mut indices = Vec::new();
    let mut append = |geometry: Geometry| {
        let offset = positions.len() as u32;
        positions.extend(geometry.positions);
        indices.extend(geometry.indices.into_iter().map(|index| index + offset));
    };
    for strip in strips.iter().filter(|strip| strip.max_x > strip.min_x && strip.max_y > strip.min_y) {
        let corners: Vec<Point3<f32>> = strip.points().iter().map(|&point| plan_point(point, 0.0)).collect();
        append(Geometry::triangles(corners, vec![0, 1, 2, 0, 2, 3]));
    }
    append(carved_surface(&inner.points(), holes, 0.0));
    Geometry::triangles(positions, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::home::{Level, Room};
    use crate::object3d::BoxModelLoader;

    struct MissingLoader;

    impl ModelLoader for MissingLoader {
        fn load_model(&self, model: &str) -> Result<Geometry, LoadError> {
            Err(LoadError::NotFound(model.to_string()))
        }
    }

    fn build(home: &Home, loader: Rc<dyn ModelLoader>) -> (Scene, Ground3D) {
        let mut scene = Scene::new();
        let root = scene.add_node(None, None, NodeKind::Group).unwrap();
        let ground = Ground3D::create(home, &mut scene, root, loader).unwrap();
        (scene, ground)
    }

    fn children(scene: &Scene, ground: &Ground3D) -> Vec<NodeId> {
        scene.get_node(ground.node()).unwrap().children().to_vec()
    }

    #[test]
    fn test_plain_ground_is_one_square() {
        let home = Home::new();
        let (scene, ground) = build(&home, Rc::new(BoxModelLoader));
        let nodes = children(&scene, &ground);
        assert_eq!(nodes.len(), 1);
        let NodeKind::Shape { geometry, .. } = scene.get_node(nodes[0]).unwrap().kind() else {
            panic!("ground is not a shape");
        };
        let bounds = geometry.bounds().unwrap();
        assert_eq!(bounds.min.x, GROUND_ORIGIN);
        assert_eq!(bounds.max.z, GROUND_ORIGIN + GROUND_SIZE);
    }

    #[test]
    fn test_basement_room_is_dug_out() {
        let mut home = Home::new();
        let basement = home.add_level(Level::new("basement", -250.0, 12.0, 250.0));
        home.add_room(Room::new(vec![[0.0, 0.0], [400.0, 0.0], [400.0, 300.0], [0.0, 300.0]]).at_level(Some(basement)));
        let (scene, ground) = build(&home, Rc::new(BoxModelLoader));
        assert_eq!(children(&scene, &ground).len(), 2);
    }

    #[test]
    fn test_background_image_replaces_ground_texture() {
        let mut home = Home::new();
        home.set_background_image(Some("plan.png".to_string()));
        home.modify_environment(|environment| environment.background_image_visible_on_ground_3d = true);
        let (mut scene, mut ground) = build(&home, Rc::new(BoxModelLoader));
        let surface = children(&scene, &ground)[0];
        assert_eq!(scene.appearance_mut(surface).unwrap().texture.as_deref(), Some("plan.png"));

        home.modify_environment(|environment| environment.background_image_visible_on_ground_3d = false);
        ground.update(&home, &mut scene).unwrap();
        let surface = children(&scene, &ground)[0];
        assert_eq!(scene.appearance_mut(surface).unwrap().texture, None);
        assert_eq!(ground.update_count(), 1);
    }

    #[test]
    fn test_missing_structure_falls_back_to_red_box() {
        let mut home = Home::new();
        home.set_structure(Some("site.obj".to_string()));
        let (mut scene, ground) = build(&home, Rc::new(MissingLoader));
        let nodes = children(&scene, &ground);
        assert_eq!(nodes.len(), 1);
        let appearance = scene.appearance_mut(nodes[0]).unwrap();
        assert!(appearance.flags.contains(AppearanceFlags::ERROR));
        assert_eq!(appearance.color, RgbaColor::RED);
    }
}
