use cgmath::{Matrix4, SquareMatrix};
use std::cell::Cell;

use crate::{Appearance, Geometry, Light};

/// Unique identifier for a node in the scene graph.
pub type NodeId = u32;

/// Explicit visibility of a node. An invisible node hides its whole subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Invisible,
}

/// What a node contributes to the rendered image.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Plain branch node.
    Group,
    /// Branch node applying a local transform to its children.
    Transform(Matrix4<f32>),
    /// Leaf carrying renderable geometry.
    Shape {
        geometry: Geometry,
        appearance: Appearance,
    },
    /// Leaf carrying a light source.
    Light(Light),
    /// Branch whose children are drawn behind everything else, centered on the eye.
    Background,
}

impl NodeKind {
    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Group | Self::Transform(_) | Self::Background)
    }
}

/// A node of the scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: Option<String>,
    kind: NodeKind,

    parent: Option<NodeId>,
    children: Vec<NodeId>,

    visibility: Visibility,
    cached_world_transform: Cell<Option<Matrix4<f32>>>,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: Option<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name,
            kind,
            parent: None,
            children: Vec::new(),
            visibility: Visibility::default(),
            cached_world_transform: Cell::new(None),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Replaces the node content. Transform nodes go through
    /// [`crate::Scene::set_transform`] so descendants get invalidated.
    pub(crate) fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Local transform of this node; identity for everything but transform nodes.
    pub fn local_transform(&self) -> Matrix4<f32> {
        match &self.kind {
            NodeKind::Transform(matrix) => *matrix,
            _ => Matrix4::identity(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
        self.mark_transform_dirty();
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Inserts `child` at `index`, clamped to the children count.
    pub(crate) fn insert_child(&mut self, index: usize, child: NodeId) {
        if !self.children.contains(&child) {
            let index = index.min(self.children.len());
            self.children.insert(index, child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&id| id != child);
    }

    pub(crate) fn take_children(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.children)
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub(crate) fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub(crate) fn mark_transform_dirty(&self) {
        self.cached_world_transform.set(None);
    }

    pub fn transform_dirty(&self) -> bool {
        self.cached_world_transform.get().is_none()
    }

    pub(crate) fn cached_world_transform(&self) -> Option<Matrix4<f32>> {
        self.cached_world_transform.get()
    }

    pub(crate) fn set_cached_world_transform(&self, transform: Matrix4<f32>) {
        self.cached_world_transform.set(Some(transform));
    }
}
