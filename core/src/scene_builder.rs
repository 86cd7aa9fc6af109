//! Initial scene graph of a home.
//!
//! The scene has one root group holding, in order: the background (sky and
//! ground seen at the horizon), the ground, the lights and the home tree.
//! The home tree holds one subtree per tracked item, labels first and
//! furniture last.

use std::rc::Rc;

use cgmath::{Matrix4, Point3, Vector3};

use crate::common::RgbaColor;
use crate::home::Home;
use crate::object3d::{Ground3D, ModelLoader, Object3DFactory};
use crate::scene::{Appearance, AppearanceFlags, Geometry, Light, NodeId, NodeKind, Scene, Visibility};
use crate::sync::ObjectRegistry;

/// Slices of the sky and bottom hemispheres.
pub const BACKGROUND_DIVISIONS: u32 = 48;
/// Elevation of the ground plane completing the landscape at the horizon.
const GROUND_BACKGROUND_ELEVATION: f32 = -0.01;
/// The ground is lowered a little so floors at elevation 0 stay visible.
const GROUND_OFFSET: f32 = -0.2;

/// Gray level and direction of the directional lights.
const DIRECTIONAL_LIGHTS: [(f32, [f32; 3]); 4] = [
    (0.9, [1.5, -0.8, -1.0]),
    (0.9, [-1.5, -0.8, -1.0]),
    (0.9, [0.0, -0.8, 1.0]),
    (0.7, [0.0, 1.0, 0.0]),
];
const AMBIENT_LIGHT: f32 = 0.2;

/// Nodes of the background branch.
#[derive(Debug, Clone, Copy)]
pub struct BackgroundNodes {
    pub root: NodeId,
    pub sky: NodeId,
    pub bottom: NodeId,
    /// Shown only while the camera is above the ground.
    pub ground_plane: NodeId,
}

/// A light node with the color it has under a white environment light.
#[derive(Debug, Clone, Copy)]
pub struct SceneLight {
    pub node: NodeId,
    pub default_color: RgbaColor,
}

/// The scene of a home with the nodes the synchronizer keeps updating.
pub struct HomeScene {
    pub scene: Scene,
    pub root: NodeId,
    pub background: BackgroundNodes,
    pub ground: Ground3D,
    pub lights: Vec<SceneLight>,
    pub home_root: NodeId,
    pub registry: ObjectRegistry,
}

/// Builds the complete scene of `home`.
///
/// # Errors
/// Returns an error if the factory fails to build one of the home items.
pub fn build_home_scene(
    home: &Home,
    factory: &dyn Object3DFactory,
    loader: Rc<dyn ModelLoader>,
) -> anyhow::Result<HomeScene> {
    let mut scene = Scene::new();
    let root = scene.add_node(None, Some("root".to_string()), NodeKind::Group)?;

    let background = create_background(home, &mut scene, root)?;

    let ground_offset = if home.structure().is_some() { 0.0 } else { GROUND_OFFSET };
    let ground_transform = scene.add_node(
        Some(root),
        Some("ground-transform".to_string()),
        NodeKind::Transform(Matrix4::from_translation(Vector3::new(0.0, ground_offset, 0.0))),
    )?;
    let ground = Ground3D::create(home, &mut scene, ground_transform, loader)?;

    let lights = create_lights(home, &mut scene, root)?;

    let home_root = scene.add_node(Some(root), Some("home".to_string()), NodeKind::Group)?;
    let mut registry = ObjectRegistry::new();
    let items = home
        .labels()
        .iter()
        .chain(home.dimension_lines())
        .chain(home.polylines())
        .chain(home.rooms())
        .chain(home.walls())
        .copied()
        .chain(home.all_pieces());
    for item in items {
        let object = factory.create_object3d(home, item, &mut scene, home_root, None)?;
        registry.insert(item, object);
    }
    log::debug!("Built home scene with {} objects", registry.len());

    Ok(HomeScene {
        scene,
        root,
        background,
        ground,
        lights,
        home_root,
        registry,
    })
}

fn create_background(home: &Home, scene: &mut Scene, root: NodeId) -> anyhow::Result<BackgroundNodes> {
    let background = scene.add_node(Some(root), Some("background".to_string()), NodeKind::Background)?;
    let sky = scene.add_node(
        Some(background),
        Some("sky".to_string()),
        NodeKind::Shape {
            geometry: Geometry::hemisphere(1.0, BACKGROUND_DIVISIONS, true),
            appearance: Appearance::default(),
        },
    )?;
    let bottom = scene.add_node(
        Some(background),
        Some("sky-bottom".to_string()),
        NodeKind::Shape {
            geometry: Geometry::hemisphere(1.0, BACKGROUND_DIVISIONS, false),
            appearance: Appearance::default().with_flags(AppearanceFlags::UNLIT),
        },
    )?;
    let corners = [[-1.0, -1.0], [-1.0, 1.0], [1.0, 1.0], [1.0, -1.0]]
        .iter()
        .map(|[x, z]| Point3::new(*x, GROUND_BACKGROUND_ELEVATION, *z))
        .collect();
    let ground_plane = scene.add_node(
        Some(background),
        Some("ground-background".to_string()),
        NodeKind::Shape {
            geometry: Geometry::triangles(corners, vec![0, 1, 2, 0, 2, 3]),
            appearance: Appearance::default(),
        },
    )?;

    let nodes = BackgroundNodes {
        root: background,
        sky,
        bottom,
        ground_plane,
    };
    update_background(home, scene, &nodes);
    update_ground_background_visibility(home, scene, &nodes);
    Ok(nodes)
}

/// Copies the sky and ground colors and textures to the background shapes.
pub fn update_background(home: &Home, scene: &mut Scene, background: &BackgroundNodes) {
    let environment = home.environment();
    if let Some(appearance) = scene.appearance_mut(background.sky) {
        *appearance = Appearance::new(RgbaColor::from_packed_rgb(environment.sky_color))
            .with_texture(environment.sky_texture.clone())
            .with_flags(AppearanceFlags::UNLIT);
    }
    if let Some(appearance) = scene.appearance_mut(background.ground_plane) {
        *appearance = Appearance::new(RgbaColor::from_packed_rgb(environment.ground_color))
            .with_texture(environment.ground_texture.clone());
    }
}

/// Hides the horizon ground plane when the camera is below the ground.
pub fn update_ground_background_visibility(home: &Home, scene: &mut Scene, background: &BackgroundNodes) {
    let visibility = if home.camera().z >= 0.0 {
        Visibility::Visible
    } else {
        Visibility::Invisible
    };
    scene.set_visibility(background.ground_plane, visibility);
}

fn create_lights(home: &Home, scene: &mut Scene, root: NodeId) -> anyhow::Result<Vec<SceneLight>> {
    let mut lights = Vec::new();
    for (index, (gray, [x, y, z])) in DIRECTIONAL_LIGHTS.into_iter().enumerate() {
        let default_color = RgbaColor::rgb(gray, gray, gray);
        let node = scene.add_node(
            Some(root),
            Some(format!("light-{}", index)),
            NodeKind::Light(Light::directional(default_color, Vector3::new(x, y, z))),
        )?;
        lights.push(SceneLight { node, default_color });
    }
    update_light_colors(home, scene, &lights);

    scene.add_node(
        Some(root),
        Some("ambient-light".to_string()),
        NodeKind::Light(Light::ambient(RgbaColor::rgb(AMBIENT_LIGHT, AMBIENT_LIGHT, AMBIENT_LIGHT))),
    )?;
    Ok(lights)
}

/// Tints the directional lights with the environment light color.
pub fn update_light_colors(home: &Home, scene: &mut Scene, lights: &[SceneLight]) {
    let tint = RgbaColor::from_packed_rgb(home.environment().light_color);
    for light in lights {
        if let Some(node_light) = scene.light_mut(light.node) {
            node_light.set_color(light.default_color.modulate(&tint));
        }
    }
}
