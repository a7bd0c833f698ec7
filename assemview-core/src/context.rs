//! The live viewer state for one loaded assembly
//!
//! [`ViewerContext::new`] walks the assembly once and builds the scene graph
//! and the tree view side by side. Groups are bound to their tree items
//! before `new` returns; leaves are bound as their meshes arrive through
//! [`ViewerContext::pump`]. All tree interaction goes through
//! [`ViewerContext::handle_click`].

use std::collections::HashMap;

use crate::binding::BindingTable;
use crate::loader::{completion_channel, CompletionSender, MeshCompletion, MeshLoader, MeshRequest};
use crate::tree::{ExpandState, LabelStyle, TreeView};
use crate::{
    Assembly, AssemblyKind, AssemblyNode, NodeId, Result, SceneGraph, SceneNodeId, Transform3D,
    TreeItemId,
};

/// Which part of a tree row was clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The expand/collapse glyph
    Expander,
    /// The item's name
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeClick {
    pub item: TreeItemId,
    pub target: ClickTarget,
}

impl TreeClick {
    pub fn expander(item: TreeItemId) -> Self {
        Self {
            item,
            target: ClickTarget::Expander,
        }
    }

    pub fn label(item: TreeItemId) -> Self {
        Self {
            item,
            target: ClickTarget::Label,
        }
    }
}

/// What a click did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    ExpandToggled {
        item: TreeItemId,
        state: ExpandState,
    },
    VisibilityToggled {
        item: TreeItemId,
        scene_node: SceneNodeId,
        visible: bool,
    },
    /// Expander on a leaf, or label of an item that is not bound yet
    Ignored,
}

/// Everything needed to place a leaf once its mesh arrives
#[derive(Debug, Clone)]
struct PendingLoad {
    scene_parent: SceneNodeId,
    tree_item: TreeItemId,
    name: String,
    transform: Transform3D,
}

/// Recursive builder producing one tree item and one scene node per
/// assembly node
struct DualTreeBuilder<'a> {
    scene: &'a mut SceneGraph,
    tree: &'a mut TreeView,
    bindings: &'a mut BindingTable,
    pending: &'a mut HashMap<NodeId, PendingLoad>,
    loader: &'a dyn MeshLoader,
    completions: &'a CompletionSender,
    next_id: usize,
}

impl DualTreeBuilder<'_> {
    fn build(
        &mut self,
        node: &AssemblyNode,
        scene_parent: SceneNodeId,
        tree_parent: Option<TreeItemId>,
    ) -> Result<TreeItemId> {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let item = self.tree.add_item(tree_parent, &node.name, node.is_group())?;
        self.bindings.register(id, item)?;

        match &node.kind {
            AssemblyKind::Group { children } => {
                let group = self
                    .scene
                    .add_group(scene_parent, &node.name, node.transform, id)?;
                for child in children {
                    self.build(child, group, Some(item))?;
                }
                self.bindings.bind(item, Some(group))?;
            }
            AssemblyKind::Leaf { mesh } => {
                self.pending.insert(
                    id,
                    PendingLoad {
                        scene_parent,
                        tree_item: item,
                        name: node.name.clone(),
                        transform: node.transform,
                    },
                );
                log::debug!("Requesting mesh '{}' for {} ({})", mesh, node.name, id);
                self.loader.load(
                    MeshRequest {
                        node: id,
                        reference: mesh.clone(),
                    },
                    self.completions.clone(),
                );
            }
        }
        Ok(item)
    }
}

/// Scene graph, tree view and bindings for one assembly
pub struct ViewerContext {
    assembly: Assembly,
    scene: SceneGraph,
    tree: TreeView,
    bindings: BindingTable,
    pending: HashMap<NodeId, PendingLoad>,
    completions: flume::Receiver<MeshCompletion>,
}

impl ViewerContext {
    /// Build both trees for `assembly` and request every leaf mesh from
    /// `loader`
    pub fn new(assembly: Assembly, loader: &dyn MeshLoader) -> Result<Self> {
        let (sender, receiver) = completion_channel();
        let mut scene = SceneGraph::new();
        let mut tree = TreeView::new();
        let mut bindings = BindingTable::new();
        let mut pending = HashMap::new();

        let scene_root = scene.root();
        DualTreeBuilder {
            scene: &mut scene,
            tree: &mut tree,
            bindings: &mut bindings,
            pending: &mut pending,
            loader,
            completions: &sender,
            next_id: 0,
        }
        .build(assembly.root(), scene_root, None)?;

        log::info!(
            "Built '{}': {} tree items, {} meshes pending",
            assembly.root().name,
            tree.len(),
            pending.len()
        );

        Ok(Self {
            assembly,
            scene,
            tree,
            bindings,
            pending,
            completions: receiver,
        })
    }

    pub fn assembly(&self) -> &Assembly {
        &self.assembly
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn tree(&self) -> &TreeView {
        &self.tree
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Number of leaves whose mesh has not arrived
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Apply every mesh completion received so far. Returns how many leaves
    /// were attached.
    pub fn pump(&mut self) -> Result<usize> {
        let mut applied = 0;
        while let Ok(completion) = self.completions.try_recv() {
            if self.apply_completion(completion)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    fn apply_completion(&mut self, completion: MeshCompletion) -> Result<bool> {
        let Some(load) = self.pending.remove(&completion.node) else {
            log::warn!("Ignoring unexpected mesh for {}", completion.node);
            return Ok(false);
        };

        let mesh_node = self.scene.add_mesh(
            load.scene_parent,
            load.name,
            load.transform,
            completion.mesh,
            completion.node,
        )?;
        self.bindings.bind(load.tree_item, Some(mesh_node))
    }

    /// Route a click on the tree panel
    pub fn handle_click(&mut self, click: TreeClick) -> Result<ClickOutcome> {
        match click.target {
            ClickTarget::Expander => Ok(match self.tree.toggle_expanded(click.item)? {
                Some(state) => ClickOutcome::ExpandToggled {
                    item: click.item,
                    state,
                },
                None => ClickOutcome::Ignored,
            }),
            ClickTarget::Label => {
                let Some(scene_node) = self.bindings.scene_node_for(click.item) else {
                    return Ok(ClickOutcome::Ignored);
                };
                let visible = self.scene.toggle_visibility(scene_node)?;
                let style = if visible {
                    LabelStyle::Normal
                } else {
                    LabelStyle::Hidden
                };
                self.tree.set_label_style(click.item, style)?;
                Ok(ClickOutcome::VisibilityToggled {
                    item: click.item,
                    scene_node,
                    visible,
                })
            }
        }
    }

    /// Drop the context. Meshes still in flight are discarded when they
    /// complete.
    pub fn teardown(self) -> Assembly {
        if !self.pending.is_empty() {
            log::info!(
                "Tearing down '{}' with {} mesh loads outstanding",
                self.assembly.root().name,
                self.pending.len()
            );
        }
        self.assembly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoLoads;

    impl MeshLoader for NoLoads {
        fn load(&self, _request: MeshRequest, _completions: CompletionSender) {}
    }

    #[test]
    fn test_label_click_toggles_group_visibility_and_style() {
        let mut ctx = ViewerContext::new(Assembly::sample(), &NoLoads).unwrap();
        let root_item = ctx.tree().roots()[0];

        let outcome = ctx.handle_click(TreeClick::label(root_item)).unwrap();
        let ClickOutcome::VisibilityToggled { scene_node, visible, .. } = outcome else {
            panic!("expected a visibility toggle, got {:?}", outcome);
        };
        assert!(!visible);
        assert!(!ctx.scene().get(scene_node).unwrap().visible);
        assert_eq!(ctx.tree().get(root_item).unwrap().label_style, LabelStyle::Hidden);
    }

    #[test]
    fn test_expander_click_on_leaf_is_ignored() {
        let mut ctx = ViewerContext::new(Assembly::sample(), &NoLoads).unwrap();
        let cube1 = ctx.tree().get(ctx.tree().roots()[0]).unwrap().children()[0];
        assert_eq!(
            ctx.handle_click(TreeClick::expander(cube1)).unwrap(),
            ClickOutcome::Ignored
        );
        assert_eq!(ctx.pending_loads(), 5);
        assert_eq!(ctx.pump().unwrap(), 0);
    }
}
