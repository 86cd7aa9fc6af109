use super::*;
use cgmath::{InnerSpace, Point3, Vector3};
use crate::common::{Ray, RgbaColor};

fn shape(width: f32, height: f32, depth: f32) -> NodeKind {
    NodeKind::Shape {
        geometry: Geometry::box_on_ground(width, height, depth),
        appearance: Appearance::new(RgbaColor::GRAY),
    }
}

// ========================================================================
// Tree Construction
// ========================================================================

#[test]
fn test_add_root_and_children() {
    let mut scene = Scene::new();
    let root = scene.add_node(None, None, NodeKind::Group).unwrap();
    let a = scene.add_node(Some(root), Some("a".into()), NodeKind::Group).unwrap();
    let b = scene.add_node(Some(root), None, NodeKind::Group).unwrap();

    assert_eq!(scene.root_nodes(), &[root]);
    assert_eq!(scene.get_node(root).unwrap().children(), &[a, b]);
    assert_eq!(scene.get_node(a).unwrap().parent(), Some(root));
    assert_eq!(scene.get_node(a).unwrap().name.as_deref(), Some("a"));
}

#[test]
fn test_insert_at_index() {
    let mut scene = Scene::new();
    let root = scene.add_node(None, None, NodeKind::Group).unwrap();
    let a = scene.add_node(Some(root), None, NodeKind::Group).unwrap();
    let b = scene.add_node(Some(root), None, NodeKind::Group).unwrap();
    let c = scene.insert_node(root, 1, None, NodeKind::Group).unwrap();
    let d = scene.insert_node(root, 99, None, NodeKind::Group).unwrap();

    assert_eq!(scene.get_node(root).unwrap().children(), &[a, c, b, d]);
    assert_eq!(scene.child_index(c), Some(1));
}

#[test]
fn test_add_to_missing_or_leaf_parent_fails() {
    let mut scene = Scene::new();
    assert!(scene.add_node(Some(42), None, NodeKind::Group).is_err());

    let root = scene.add_node(None, None, NodeKind::Group).unwrap();
    let leaf = scene.add_node(Some(root), None, shape(1.0, 1.0, 1.0)).unwrap();
    assert!(scene.add_node(Some(leaf), None, NodeKind::Group).is_err());
}

#[test]
fn test_remove_node_drops_subtree() {
    let mut scene = Scene::new();
    let root = scene.add_node(None, None, NodeKind::Group).unwrap();
    let branch = scene.add_node(Some(root), None, NodeKind::Group).unwrap();
    let leaf = scene.add_node(Some(branch), None, shape(1.0, 1.0, 1.0)).unwrap();

    assert!(scene.remove_node(branch));
    assert!(!scene.contains(branch));
    assert!(!scene.contains(leaf));
    assert!(scene.get_node(root).unwrap().children().is_empty());
    assert_eq!(scene.node_count(), 1);
    assert!(!scene.remove_node(branch));
}

#[test]
fn test_remove_children_keeps_node() {
    let mut scene = Scene::new();
    let root = scene.add_node(None, None, NodeKind::Group).unwrap();
    let branch = scene.add_node(Some(root), None, NodeKind::Group).unwrap();
    scene.add_node(Some(branch), None, shape(1.0, 1.0, 1.0)).unwrap();
    scene.add_node(Some(branch), None, shape(1.0, 1.0, 1.0)).unwrap();

    scene.remove_children(branch);
    assert!(scene.contains(branch));
    assert!(scene.descendants(branch).is_empty());
    assert_eq!(scene.node_count(), 2);
}

// ========================================================================
// Transforms and Visibility
// ========================================================================

#[test]
fn test_world_transform_composes_and_invalidates() {
    let mut scene = Scene::new();
    let outer = scene
        .add_node(None, None, NodeKind::Transform(Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0))))
        .unwrap();
    let inner = scene
        .add_node(Some(outer), None, NodeKind::Transform(Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0))))
        .unwrap();
    let leaf = scene.add_node(Some(inner), None, shape(1.0, 1.0, 1.0)).unwrap();

    let origin = scene.world_transform(leaf) * Point3::new(0.0, 0.0, 0.0).to_homogeneous();
    assert_eq!(Point3::from_homogeneous(origin), Point3::new(1.0, 2.0, 0.0));
    assert!(!scene.get_node(leaf).unwrap().transform_dirty());

    scene
        .set_transform(outer, Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0)))
        .unwrap();
    assert!(scene.get_node(leaf).unwrap().transform_dirty());
    let origin = scene.world_transform(leaf) * Point3::new(0.0, 0.0, 0.0).to_homogeneous();
    assert_eq!(Point3::from_homogeneous(origin), Point3::new(5.0, 2.0, 0.0));

    assert!(scene.set_transform(leaf, Matrix4::identity()).is_err());
}

#[test]
fn test_visibility_is_inherited() {
    let mut scene = Scene::new();
    let root = scene.add_node(None, None, NodeKind::Group).unwrap();
    let leaf = scene.add_node(Some(root), None, shape(1.0, 1.0, 1.0)).unwrap();
    assert!(scene.is_visible(leaf));

    scene.set_visibility(root, Visibility::Invisible);
    assert!(!scene.is_visible(leaf));
}

#[test]
fn test_light_and_appearance_access() {
    let mut scene = Scene::new();
    let root = scene.add_node(None, None, NodeKind::Group).unwrap();
    let light = scene
        .add_node(Some(root), None, NodeKind::Light(Light::ambient(RgbaColor::GRAY)))
        .unwrap();
    let leaf = scene.add_node(Some(root), None, shape(1.0, 1.0, 1.0)).unwrap();

    scene.light_mut(light).unwrap().set_color(RgbaColor::RED);
    assert_eq!(scene.light_mut(light).unwrap().color(), RgbaColor::RED);
    scene.appearance_mut(leaf).unwrap().flags |= AppearanceFlags::SELECTED;
    assert!(scene.appearance_mut(leaf).unwrap().flags.contains(AppearanceFlags::SELECTED));
    assert!(scene.light_mut(leaf).is_none());
}

// ========================================================================
// Picking
// ========================================================================

#[test]
fn test_pick_closest_of_two_shapes() {
    let mut scene = Scene::new();
    let root = scene.add_node(None, None, NodeKind::Group).unwrap();
    let near_group = scene
        .add_node(Some(root), None, NodeKind::Transform(Matrix4::from_translation(Vector3::new(0.0, 0.0, 10.0))))
        .unwrap();
    let near = scene.add_node(Some(near_group), None, shape(2.0, 2.0, 2.0)).unwrap();
    let _far = scene.add_node(Some(root), None, shape(2.0, 2.0, 2.0)).unwrap();

    let ray = Ray::new(Point3::new(0.0, 1.0, 50.0), Vector3::new(0.0, 0.0, -1.0));
    let hit = pick_closest_shape(&scene, root, &ray).unwrap();
    assert_eq!(hit.node_id, near);
    assert!((hit.distance - 39.0).abs() < 1e-3);
    assert!((hit.point.z - 11.0).abs() < 1e-3);
}

#[test]
fn test_pick_skips_invisible_and_background() {
    let mut scene = Scene::new();
    let root = scene.add_node(None, None, NodeKind::Group).unwrap();
    let background = scene.add_node(Some(root), None, NodeKind::Background).unwrap();
    scene.add_node(Some(background), None, shape(100.0, 100.0, 100.0)).unwrap();
    let hidden = scene.add_node(Some(root), None, shape(2.0, 2.0, 2.0)).unwrap();
    scene.set_visibility(hidden, Visibility::Invisible);

    let ray = Ray::new(Point3::new(0.0, 1.0, 50.0), Vector3::new(0.0, 0.0, -1.0));
    assert!(pick_closest_shape(&scene, root, &ray).is_none());
}

#[test]
fn test_pick_through_view() {
    let mut scene = Scene::new();
    let root = scene.add_node(None, None, NodeKind::Group).unwrap();
    let target = scene.add_node(Some(root), None, shape(10.0, 10.0, 10.0)).unwrap();

    let mut view = View::new(100, 100, 24);
    view.set_view_platform_transform(Matrix4::from_translation(Vector3::new(0.0, 5.0, 100.0)));
    let ray = view.pick_ray(50.0, 50.0).unwrap();
    assert!((ray.direction.magnitude() - 1.0).abs() < 1e-5);
    assert_eq!(pick_closest_shape(&scene, root, &ray).map(|hit| hit.node_id), Some(target));
    let miss = view.pick_ray(0.0, 0.0).unwrap();
    assert!(pick_closest_shape(&scene, root, &miss).is_none());
}
