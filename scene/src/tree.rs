use cgmath::Matrix4;

use crate::{Node, NodeId, NodeKind, Scene, Visibility};

/// Callbacks invoked while walking the scene graph.
pub trait TreeVisitor {
    /// Called before a node's children. Returning `false` skips the subtree.
    fn enter_node(&mut self, scene: &Scene, node: &Node) -> bool;

    /// Called after a node's children.
    fn exit_node(&mut self, _scene: &Scene, _node: &Node) {}
}

/// Depth-first walk starting at `node_id`. Unknown ids are ignored.
pub fn walk_tree<V: TreeVisitor>(scene: &Scene, node_id: NodeId, visitor: &mut V) {
    let Some(node) = scene.get_node(node_id) else {
        return;
    };

    if visitor.enter_node(scene, node) {
        for &child_id in node.children() {
            walk_tree(scene, child_id, visitor);
        }
    }

    visitor.exit_node(scene, node);
}

/// A visible shape found by [`ShapeCollector`] with its world transform.
#[derive(Debug, Clone)]
pub struct CollectedShape {
    pub node_id: NodeId,
    pub world_transform: Matrix4<f32>,
}

/// Collects the visible shape leaves of a subtree, skipping background branches.
#[derive(Default)]
pub struct ShapeCollector {
    pub shapes: Vec<CollectedShape>,
}

impl TreeVisitor for ShapeCollector {
    fn enter_node(&mut self, scene: &Scene, node: &Node) -> bool {
        if node.visibility() == Visibility::Invisible {
            return false;
        }
        match node.kind() {
            NodeKind::Background => false,
            NodeKind::Shape { .. } => {
                self.shapes.push(CollectedShape {
                    node_id: node.id,
                    world_transform: scene.world_transform(node.id),
                });
                false
            }
            _ => true,
        }
    }
}
