//! Scene graph: the spatial hierarchy that gets rendered
//!
//! Nodes live in an arena owned by [`SceneGraph`] and are addressed by
//! [`SceneNodeId`]. Nodes are only ever added; there is no removal or
//! re-parenting. Children of a node stay sorted by the [`NodeId`] of the
//! assembly node they mirror, so a mesh that finishes loading late still
//! lands at its declared position.

use std::fmt;
use std::sync::Arc;

use crate::traits::{extend_bounds, Bounds};
use crate::{Error, NodeId, Result, Transform3D, TriangleMesh};

/// Handle to a node in a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneNodeId(usize);

impl SceneNodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SceneNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene node #{}", self.0)
    }
}

/// What a scene node holds
#[derive(Debug, Clone)]
pub enum SceneContent {
    Root,
    Group,
    Mesh(Arc<TriangleMesh>),
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Local transform relative to the parent
    pub transform: Transform3D,
    /// The node's own flag; ancestors may still hide it
    pub visible: bool,
    pub content: SceneContent,
    /// Assembly node this mirrors, `None` for the root
    pub source: Option<NodeId>,
    parent: Option<SceneNodeId>,
    children: Vec<SceneNodeId>,
}

impl SceneNode {
    pub fn parent(&self) -> Option<SceneNodeId> {
        self.parent
    }

    pub fn children(&self) -> &[SceneNodeId] {
        &self.children
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.content, SceneContent::Mesh(_))
    }
}

/// A visible mesh with its world transform, ready to draw
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub id: SceneNodeId,
    pub world: Transform3D,
    pub mesh: Arc<TriangleMesh>,
}

/// Arena-backed spatial hierarchy
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Create a scene holding only its root
    pub fn new() -> Self {
        Self {
            nodes: vec![SceneNode {
                name: "scene".to_string(),
                transform: Transform3D::identity(),
                visible: true,
                content: SceneContent::Root,
                source: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> SceneNodeId {
        SceneNodeId(0)
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, id: SceneNodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    fn node(&self, id: SceneNodeId) -> Result<&SceneNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn node_mut(&mut self, id: SceneNodeId) -> Result<&mut SceneNode> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Children of a node in render order
    pub fn children(&self, id: SceneNodeId) -> &[SceneNodeId] {
        self.get(id).map(SceneNode::children).unwrap_or(&[])
    }

    /// Add a group node under `parent`
    pub fn add_group(
        &mut self,
        parent: SceneNodeId,
        name: impl Into<String>,
        transform: Transform3D,
        source: NodeId,
    ) -> Result<SceneNodeId> {
        self.insert(parent, name.into(), transform, SceneContent::Group, source)
    }

    /// Add a mesh node under `parent`
    pub fn add_mesh(
        &mut self,
        parent: SceneNodeId,
        name: impl Into<String>,
        transform: Transform3D,
        mesh: Arc<TriangleMesh>,
        source: NodeId,
    ) -> Result<SceneNodeId> {
        self.insert(parent, name.into(), transform, SceneContent::Mesh(mesh), source)
    }

    fn insert(
        &mut self,
        parent: SceneNodeId,
        name: String,
        transform: Transform3D,
        content: SceneContent,
        source: NodeId,
    ) -> Result<SceneNodeId> {
        if matches!(self.node(parent)?.content, SceneContent::Mesh(_)) {
            return Err(Error::InvalidData(format!(
                "cannot attach '{}' under mesh {}",
                name, parent
            )));
        }

        let id = SceneNodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            name,
            transform,
            visible: true,
            content,
            source: Some(source),
            parent: Some(parent),
            children: Vec::new(),
        });

        // keep siblings sorted by assembly order
        let position = {
            let nodes = &self.nodes;
            nodes[parent.0]
                .children
                .partition_point(|sibling| nodes[sibling.0].source < Some(source))
        };
        self.nodes[parent.0].children.insert(position, id);
        Ok(id)
    }

    /// Set a node's own visibility flag
    pub fn set_visible(&mut self, id: SceneNodeId, visible: bool) -> Result<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    /// Flip a node's own visibility flag and return the new value
    pub fn toggle_visibility(&mut self, id: SceneNodeId) -> Result<bool> {
        let node = self.node_mut(id)?;
        node.visible = !node.visible;
        Ok(node.visible)
    }

    /// True when the node and all of its ancestors are visible
    pub fn is_effectively_visible(&self, id: SceneNodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.get(node_id) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Product of the transforms from the root down to `id`
    pub fn world_transform(&self, id: SceneNodeId) -> Result<Transform3D> {
        let mut world = self.node(id)?.transform;
        let mut current = self.node(id)?.parent;
        while let Some(parent_id) = current {
            let parent = self.node(parent_id)?;
            world = parent.transform * world;
            current = parent.parent;
        }
        Ok(world)
    }

    /// Visible meshes in render order.
    ///
    /// Hidden nodes prune their whole subtree without touching the flags of
    /// the nodes below them.
    pub fn drawables(&self) -> Vec<DrawItem> {
        let mut out = Vec::new();
        let mut stack = vec![(self.root(), Transform3D::identity())];

        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform;
            if let SceneContent::Mesh(mesh) = &node.content {
                out.push(DrawItem {
                    id,
                    world,
                    mesh: Arc::clone(mesh),
                });
            }
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        out
    }

    /// World-space bounds of everything currently drawn
    pub fn visible_bounds(&self) -> Option<Bounds> {
        self.drawables().iter().fold(None, |bounds, item| {
            item.mesh.vertices.iter().fold(bounds, |acc, v| {
                Some(extend_bounds(acc, &item.world.transform_point(v)))
            })
        })
    }

    /// Find the node mirroring an assembly node
    pub fn find_by_source(&self, source: NodeId) -> Option<SceneNodeId> {
        self.nodes
            .iter()
            .position(|node| node.source == Some(source))
            .map(SceneNodeId)
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
