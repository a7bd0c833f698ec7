//! Assembly descriptions: the static input tree of parts
//!
//! An assembly is a tree of named nodes, each carrying a row-major 4x4
//! transform. A node is either a group with ordered children or a leaf that
//! references an external mesh file. On disk the variant is implied by which
//! field is present (`children` or `stl`); in memory it is an explicit
//! [`AssemblyKind`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Transform3D};

/// Identity of an assembly node: its pre-order index, the root being 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node #{}", self.0)
    }
}

/// What an assembly node contains
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyKind {
    /// Ordered child nodes, no geometry of its own
    Group { children: Vec<AssemblyNode> },
    /// Reference to an external mesh resource
    Leaf { mesh: String },
}

/// A named part or sub-assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAssemblyNode", into = "RawAssemblyNode")]
pub struct AssemblyNode {
    pub name: String,
    pub transform: Transform3D,
    pub kind: AssemblyKind,
}

/// On-disk shape of a node
#[derive(Serialize, Deserialize)]
struct RawAssemblyNode {
    name: String,
    matrix: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<AssemblyNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stl: Option<String>,
}

impl TryFrom<RawAssemblyNode> for AssemblyNode {
    type Error = Error;

    fn try_from(raw: RawAssemblyNode) -> Result<Self> {
        let transform = Transform3D::from_row_major(&raw.matrix).map_err(|e| {
            Error::InvalidAssembly {
                name: raw.name.clone(),
                reason: e.to_string(),
            }
        })?;

        let kind = match (raw.children, raw.stl) {
            (Some(children), None) => AssemblyKind::Group { children },
            (None, Some(mesh)) => AssemblyKind::Leaf { mesh },
            (Some(_), Some(_)) => {
                return Err(Error::InvalidAssembly {
                    name: raw.name,
                    reason: "node has both 'children' and 'stl'".to_string(),
                })
            }
            (None, None) => {
                return Err(Error::InvalidAssembly {
                    name: raw.name,
                    reason: "node needs either 'children' or 'stl'".to_string(),
                })
            }
        };

        Ok(Self {
            name: raw.name,
            transform,
            kind,
        })
    }
}

impl From<AssemblyNode> for RawAssemblyNode {
    fn from(node: AssemblyNode) -> Self {
        let matrix = node.transform.to_row_major().to_vec();
        let (children, stl) = match node.kind {
            AssemblyKind::Group { children } => (Some(children), None),
            AssemblyKind::Leaf { mesh } => (None, Some(mesh)),
        };
        Self {
            name: node.name,
            matrix,
            children,
            stl,
        }
    }
}

impl AssemblyNode {
    /// Create a group node
    pub fn group(
        name: impl Into<String>,
        transform: Transform3D,
        children: Vec<AssemblyNode>,
    ) -> Self {
        Self {
            name: name.into(),
            transform,
            kind: AssemblyKind::Group { children },
        }
    }

    /// Create a leaf node referencing a mesh file
    pub fn leaf(
        name: impl Into<String>,
        transform: Transform3D,
        mesh: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            transform,
            kind: AssemblyKind::Leaf { mesh: mesh.into() },
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, AssemblyKind::Group { .. })
    }

    /// Children in declared order; empty for leaves
    pub fn children(&self) -> &[AssemblyNode] {
        match &self.kind {
            AssemblyKind::Group { children } => children,
            AssemblyKind::Leaf { .. } => &[],
        }
    }

    /// Mesh reference of a leaf
    pub fn mesh_ref(&self) -> Option<&str> {
        match &self.kind {
            AssemblyKind::Group { .. } => None,
            AssemblyKind::Leaf { mesh } => Some(mesh),
        }
    }

    /// Number of nodes in this subtree, including `self`
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(AssemblyNode::node_count).sum::<usize>()
    }
}

/// One step of a pre-order walk
#[derive(Debug, Clone, Copy)]
pub struct WalkEntry<'a> {
    pub id: NodeId,
    pub depth: usize,
    pub node: &'a AssemblyNode,
}

/// Pre-order iterator over an assembly
pub struct Walk<'a> {
    stack: Vec<(usize, &'a AssemblyNode)>,
    next_id: usize,
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        for child in node.children().iter().rev() {
            self.stack.push((depth + 1, child));
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        Some(WalkEntry { id, depth, node })
    }
}

/// A complete assembly rooted at a single node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assembly {
    root: AssemblyNode,
}

impl Assembly {
    pub fn new(root: AssemblyNode) -> Self {
        Self { root }
    }

    /// Parse an assembly from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read an assembly from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn root(&self) -> &AssemblyNode {
        &self.root
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Walk all nodes in pre-order; the yielded ids match [`NodeId`] numbering
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, &self.root)],
            next_id: 0,
        }
    }

    /// The five-cube demonstration assembly embedded in the viewer
    pub fn sample() -> Self {
        let at_x = |x: f32| Transform3D::translation(crate::Vector3f::new(x, 0.0, 0.0));
        Self::new(AssemblyNode::group(
            "assembly",
            Transform3D::identity(),
            vec![
                AssemblyNode::leaf("cube1", at_x(-2.0), "cube1.stl"),
                AssemblyNode::leaf("cube2", at_x(-1.0), "cube2.stl"),
                AssemblyNode::group(
                    "group",
                    Transform3D::identity(),
                    vec![
                        AssemblyNode::leaf("cube3", at_x(0.0), "cube3.stl"),
                        AssemblyNode::leaf("cube4", at_x(1.0), "cube4.stl"),
                    ],
                ),
                AssemblyNode::leaf("cube5", at_x(2.0), "cube5.stl"),
            ],
        ))
    }
}
