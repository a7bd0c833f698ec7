//! Links between tree items and the scene nodes they control

use std::collections::HashMap;

use crate::{Error, NodeId, Result, SceneNodeId, TreeItemId};

/// One assembly node's pair of live counterparts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub node: NodeId,
    pub tree_item: TreeItemId,
    /// `None` until the scene node exists
    pub scene_node: Option<SceneNodeId>,
}

impl Binding {
    pub fn is_bound(&self) -> bool {
        self.scene_node.is_some()
    }
}

/// Table of bindings keyed by assembly node, with a reverse index by tree item
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    entries: HashMap<NodeId, Binding>,
    by_item: HashMap<TreeItemId, NodeId>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register a freshly created tree item as unbound
    pub fn register(&mut self, node: NodeId, tree_item: TreeItemId) -> Result<()> {
        if self.entries.contains_key(&node) || self.by_item.contains_key(&tree_item) {
            return Err(Error::InvalidData(format!(
                "{} / {} registered twice",
                node, tree_item
            )));
        }
        self.entries.insert(
            node,
            Binding {
                node,
                tree_item,
                scene_node: None,
            },
        );
        self.by_item.insert(tree_item, node);
        Ok(())
    }

    /// Attach a scene node to a registered tree item.
    ///
    /// A missing scene node is logged and skipped, returning `Ok(false)`.
    pub fn bind(&mut self, tree_item: TreeItemId, scene_node: Option<SceneNodeId>) -> Result<bool> {
        let node = *self
            .by_item
            .get(&tree_item)
            .ok_or_else(|| Error::NotFound(tree_item.to_string()))?;

        let Some(scene_node) = scene_node else {
            log::warn!("No scene node to bind to {} ({})", tree_item, node);
            return Ok(false);
        };

        let entry = self
            .entries
            .get_mut(&node)
            .ok_or_else(|| Error::NotFound(node.to_string()))?;
        if entry.scene_node.is_some() {
            return Err(Error::AlreadyBound(tree_item));
        }
        entry.scene_node = Some(scene_node);
        Ok(true)
    }

    pub fn get(&self, node: NodeId) -> Option<&Binding> {
        self.entries.get(&node)
    }

    pub fn for_item(&self, tree_item: TreeItemId) -> Option<&Binding> {
        self.by_item.get(&tree_item).and_then(|node| self.entries.get(node))
    }

    /// Scene node controlled by a tree item, if it is bound yet
    pub fn scene_node_for(&self, tree_item: TreeItemId) -> Option<SceneNodeId> {
        self.for_item(tree_item).and_then(|b| b.scene_node)
    }

    pub fn is_bound(&self, tree_item: TreeItemId) -> bool {
        self.scene_node_for(tree_item).is_some()
    }

    /// Registered items still waiting for a scene node, in node order
    pub fn unbound(&self) -> Vec<Binding> {
        let mut pending: Vec<Binding> = self
            .entries
            .values()
            .filter(|b| !b.is_bound())
            .copied()
            .collect();
        pending.sort_by_key(|b| b.node);
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SceneGraph, Transform3D, TreeView};

    fn fixture() -> (BindingTable, TreeItemId, SceneNodeId) {
        let mut tree = TreeView::new();
        let item = tree.add_item(None, "part", false).unwrap();
        let mut scene = SceneGraph::new();
        let node = scene
            .add_group(scene.root(), "part", Transform3D::identity(), NodeId(0))
            .unwrap();

        let mut table = BindingTable::new();
        table.register(NodeId(0), item).unwrap();
        (table, item, node)
    }

    #[test]
    fn test_registered_item_starts_unbound() {
        let (table, item, _) = fixture();
        assert_eq!(table.len(), 1);
        assert!(!table.is_bound(item));
        assert_eq!(table.unbound().len(), 1);
    }

    #[test]
    fn test_bind_attaches_scene_node() {
        let (mut table, item, node) = fixture();
        assert!(table.bind(item, Some(node)).unwrap());
        assert_eq!(table.scene_node_for(item), Some(node));
        assert_eq!(table.get(NodeId(0)).unwrap().tree_item, item);
        assert!(table.unbound().is_empty());
    }

    #[test]
    fn test_missing_scene_node_is_skipped() {
        let (mut table, item, _) = fixture();
        assert!(!table.bind(item, None).unwrap());
        assert!(!table.is_bound(item));
    }

    #[test]
    fn test_rebinding_is_an_error() {
        let (mut table, item, node) = fixture();
        table.bind(item, Some(node)).unwrap();
        assert!(matches!(table.bind(item, Some(node)), Err(Error::AlreadyBound(_))));
    }

    #[test]
    fn test_unknown_item_is_an_error() {
        let (mut table, item, node) = fixture();
        let mut other_tree = TreeView::new();
        other_tree.add_item(None, "x", false).unwrap();
        let stranger = other_tree.add_item(None, "y", false).unwrap();
        assert_ne!(stranger, item);
        assert!(matches!(table.bind(stranger, Some(node)), Err(Error::NotFound(_))));
        assert!(table.register(NodeId(0), stranger).is_err());
    }
}
