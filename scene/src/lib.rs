//! Retained-mode scene graph consumed by the home 3D view.
//!
//! The graph is a forest of [`Node`]s addressed by [`NodeId`]. Branch nodes
//! (groups, transforms, background) hold children; leaves carry shapes or
//! lights. A [`View`] holds the projection and view-platform transform used
//! to render the graph and to map pixels back to rays for picking.

pub use home3d_common as common;

mod light;
mod node;
mod picking;
mod shape;
mod tree;
mod view;

#[cfg(test)]
mod scene_tests;

use cgmath::{Matrix4, SquareMatrix};
use std::collections::HashMap;

pub use light::Light;
pub use node::{Node, NodeId, NodeKind, Visibility};
pub use picking::{pick_closest_shape, PickHit};
pub use shape::{Appearance, AppearanceFlags, Geometry, Primitive};
pub use tree::{walk_tree, CollectedShape, ShapeCollector, TreeVisitor};
pub use view::View;

/// Container of every node of the 3D scene.
#[derive(Default)]
pub struct Scene {
    nodes: HashMap<NodeId, Node>,
    root_nodes: Vec<NodeId>,
    next_node_id: NodeId,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn root_nodes(&self) -> &[NodeId] {
        &self.root_nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Appends a new node under `parent`, or as a root when `parent` is `None`.
    ///
    /// # Errors
    /// Returns an error if `parent` is given but does not exist or is a leaf.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: Option<String>,
        kind: NodeKind,
    ) -> anyhow::Result<NodeId> {
        match parent {
            Some(parent_id) => self.insert_node(parent_id, usize::MAX, name, kind),
            None => {
                let id = self.allocate(name, kind);
                self.root_nodes.push(id);
                Ok(id)
            }
        }
    }

    /// Inserts a new node at `index` among the children of `parent`.
    /// Indices past the end append.
    pub fn insert_node(
        &mut self,
        parent: NodeId,
        index: usize,
        name: Option<String>,
        kind: NodeKind,
    ) -> anyhow::Result<NodeId> {
        match self.nodes.get(&parent) {
            None => anyhow::bail!("Parent node with ID {} not found in scene", parent),
            Some(node) if !node.kind().is_branch() => {
                anyhow::bail!("Node {} is a leaf and cannot hold children", parent)
            }
            Some(_) => {}
        }

        let id = self.allocate(name, kind);
        // Safe to unwrap since both nodes were validated or created above
        self.nodes.get_mut(&id).unwrap().set_parent(Some(parent));
        self.nodes.get_mut(&parent).unwrap().insert_child(index, id);
        Ok(id)
    }

    fn allocate(&mut self, name: Option<String>, kind: NodeKind) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes.insert(id, Node::new(id, name, kind));
        id
    }

    /// Detaches a node from its parent and drops it with all its descendants.
    ///
    /// Returns `false` if the node was not in the scene.
    pub fn remove_node(&mut self, node_id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&node_id) else {
            return false;
        };
        match node.parent() {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.get_mut(&parent_id) {
                    parent.remove_child(node_id);
                }
            }
            None => self.root_nodes.retain(|&id| id != node_id),
        }
        self.drop_subtree(node_id);
        true
    }

    /// Removes every descendant of `node_id`, keeping the node itself.
    pub fn remove_children(&mut self, node_id: NodeId) {
        let children = match self.nodes.get_mut(&node_id) {
            Some(node) => node.take_children(),
            None => return,
        };
        for child in children {
            self.drop_subtree(child);
        }
    }

    fn drop_subtree(&mut self, node_id: NodeId) {
        if let Some(mut node) = self.nodes.remove(&node_id) {
            for child in node.take_children() {
                self.drop_subtree(child);
            }
        }
    }

    /// Replaces the matrix of a transform node and invalidates cached world
    /// transforms below it.
    pub fn set_transform(&mut self, node_id: NodeId, matrix: Matrix4<f32>) -> anyhow::Result<()> {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            anyhow::bail!("Node with ID {} not found in scene", node_id);
        };
        match node.kind_mut() {
            NodeKind::Transform(current) => *current = matrix,
            _ => anyhow::bail!("Node {} is not a transform node", node_id),
        }
        self.invalidate_subtree_transforms(node_id);
        Ok(())
    }

    /// Replaces the content of a shape node.
    pub fn set_shape(
        &mut self,
        node_id: NodeId,
        geometry: Geometry,
        appearance: Appearance,
    ) -> anyhow::Result<()> {
        match self.nodes.get_mut(&node_id) {
            Some(node) if matches!(node.kind(), NodeKind::Shape { .. }) => {
                node.set_kind(NodeKind::Shape { geometry, appearance });
                Ok(())
            }
            _ => anyhow::bail!("Node {} is not a shape node", node_id),
        }
    }

    pub fn appearance_mut(&mut self, node_id: NodeId) -> Option<&mut Appearance> {
        match self.nodes.get_mut(&node_id)?.kind_mut() {
            NodeKind::Shape { appearance, .. } => Some(appearance),
            _ => None,
        }
    }

    pub fn light_mut(&mut self, node_id: NodeId) -> Option<&mut Light> {
        match self.nodes.get_mut(&node_id)?.kind_mut() {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    fn invalidate_subtree_transforms(&self, node_id: NodeId) {
        if let Some(node) = self.nodes.get(&node_id) {
            node.mark_transform_dirty();
            for &child in node.children() {
                self.invalidate_subtree_transforms(child);
            }
        }
    }

    pub fn set_visibility(&mut self, node_id: NodeId, visibility: Visibility) {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.set_visibility(visibility);
        }
    }

    /// Returns `true` if the node and all its ancestors are visible.
    pub fn is_visible(&self, node_id: NodeId) -> bool {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(&id) else {
                return false;
            };
            if node.visibility() == Visibility::Invisible {
                return false;
            }
            current = node.parent();
        }
        true
    }

    /// Position of `child` among its parent's children.
    pub fn child_index(&self, child: NodeId) -> Option<usize> {
        let parent = self.nodes.get(&child)?.parent()?;
        self.nodes.get(&parent)?.children().iter().position(|&id| id == child)
    }

    /// All nodes below `node_id`, depth first, excluding the node itself.
    pub fn descendants(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = match self.nodes.get(&node_id) {
            Some(node) => node.children().iter().rev().copied().collect(),
            None => return result,
        };
        while let Some(id) = stack.pop() {
            result.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children().iter().rev().copied());
            }
        }
        result
    }

    /// World transform of a node, computed from the root down and cached.
    /// Unknown nodes yield the identity.
    pub fn world_transform(&self, node_id: NodeId) -> Matrix4<f32> {
        let Some(node) = self.nodes.get(&node_id) else {
            return Matrix4::identity();
        };
        if let Some(cached) = node.cached_world_transform() {
            return cached;
        }
        let parent_transform = node
            .parent()
            .map(|parent| self.world_transform(parent))
            .unwrap_or_else(Matrix4::identity);
        let world = parent_transform * node.local_transform();
        node.set_cached_world_transform(world);
        world
    }
}
