use cgmath::{InnerSpace, Point3, SquareMatrix};

use crate::common::Ray;
use crate::{walk_tree, NodeId, NodeKind, Scene, ShapeCollector};

/// Closest shape hit by a pick ray.
#[derive(Debug, Clone, Copy)]
pub struct PickHit {
    pub node_id: NodeId,
    /// World-space distance from the ray origin.
    pub distance: f32,
    pub point: Point3<f32>,
}

/// Casts `ray` (world space) against every visible shape under `root` and
/// returns the nearest triangle hit. Background branches are ignored.
pub fn pick_closest_shape(scene: &Scene, root: NodeId, ray: &Ray) -> Option<PickHit> {
    let mut collector = ShapeCollector::default();
    walk_tree(scene, root, &mut collector);

    let mut closest: Option<PickHit> = None;
    for shape in collector.shapes {
        let Some(NodeKind::Shape { geometry, .. }) = scene.get_node(shape.node_id).map(|n| n.kind()) else {
            continue;
        };
        let Some(inverse) = shape.world_transform.invert() else {
            continue;
        };

        let local_ray = ray.transform(&inverse);
        let passes_bounds = geometry
            .bounds()
            .is_some_and(|bounds| bounds.intersects_ray(&local_ray).is_some());
        if !passes_bounds {
            continue;
        }

        for [v0, v1, v2] in geometry.triangles_iter() {
            let Some(t) = local_ray.intersect_triangle(v0, v1, v2) else {
                continue;
            };
            let local_point = local_ray.point_at(t);
            let point = Point3::from_homogeneous(shape.world_transform * local_point.to_homogeneous());
            let distance = (point - ray.origin).magnitude();
            if closest.map_or(true, |hit| distance < hit.distance) {
                closest = Some(PickHit {
                    node_id: shape.node_id,
                    distance,
                    point,
                });
            }
        }
    }

    if let Some(hit) = &closest {
        log::trace!("picked node {} at distance {}", hit.node_id, hit.distance);
    }
    closest
}
