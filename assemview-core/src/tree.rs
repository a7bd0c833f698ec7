//! Tree view model: the collapsible part list shown next to the 3D view
//!
//! This is the state behind the tree panel. The panel draws
//! [`TreeView::visible_rows`] and reports clicks back; all expand/collapse
//! and label-style changes happen here.

use std::fmt;

use crate::{Error, Result};

/// Glyph shown on a collapsed item (click to expand)
pub const EXPAND_GLYPH: &str = "⊞";
/// Glyph shown on an expanded item (click to collapse)
pub const COLLAPSE_GLYPH: &str = "⊟";

/// Handle to an item in a [`TreeView`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeItemId(usize);

impl TreeItemId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TreeItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree item #{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandState {
    Expanded,
    Collapsed,
}

impl ExpandState {
    pub fn toggled(self) -> Self {
        match self {
            ExpandState::Expanded => ExpandState::Collapsed,
            ExpandState::Collapsed => ExpandState::Expanded,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            ExpandState::Expanded => COLLAPSE_GLYPH,
            ExpandState::Collapsed => EXPAND_GLYPH,
        }
    }
}

/// Visual state of an item's label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelStyle {
    #[default]
    Normal,
    /// Struck through and greyed: the bound scene node is hidden
    Hidden,
}

#[derive(Debug, Clone)]
pub struct TreeItem {
    pub label: String,
    pub label_style: LabelStyle,
    /// Present only on items that own a child container
    expander: Option<ExpandState>,
    parent: Option<TreeItemId>,
    children: Vec<TreeItemId>,
}

impl TreeItem {
    pub fn expander(&self) -> Option<ExpandState> {
        self.expander
    }

    pub fn is_expandable(&self) -> bool {
        self.expander.is_some()
    }

    pub fn parent(&self) -> Option<TreeItemId> {
        self.parent
    }

    pub fn children(&self) -> &[TreeItemId] {
        &self.children
    }
}

/// One line the tree panel has to draw
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow<'a> {
    pub id: TreeItemId,
    pub depth: usize,
    pub label: &'a str,
    pub glyph: Option<&'static str>,
    pub label_style: LabelStyle,
}

/// Arena of tree items plus the ordered list of top-level items
#[derive(Debug, Clone, Default)]
pub struct TreeView {
    items: Vec<TreeItem>,
    roots: Vec<TreeItemId>,
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: TreeItemId) -> Option<&TreeItem> {
        self.items.get(id.0)
    }

    fn item_mut(&mut self, id: TreeItemId) -> Result<&mut TreeItem> {
        self.items
            .get_mut(id.0)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Top-level items in display order
    pub fn roots(&self) -> &[TreeItemId] {
        &self.roots
    }

    /// Append an item to `parent`'s child container, or to the top level.
    ///
    /// Expandable items start expanded. Appending under an item without a
    /// child container is an error.
    pub fn add_item(
        &mut self,
        parent: Option<TreeItemId>,
        label: impl Into<String>,
        expandable: bool,
    ) -> Result<TreeItemId> {
        let label = label.into();
        let id = TreeItemId(self.items.len());

        match parent {
            Some(parent_id) => {
                let parent_item = self.item_mut(parent_id)?;
                if !parent_item.is_expandable() {
                    return Err(Error::InvalidData(format!(
                        "{} has no child container for '{}'",
                        parent_id, label
                    )));
                }
                parent_item.children.push(id);
            }
            None => self.roots.push(id),
        }

        self.items.push(TreeItem {
            label,
            label_style: LabelStyle::Normal,
            expander: expandable.then_some(ExpandState::Expanded),
            parent,
            children: Vec::new(),
        });
        Ok(id)
    }

    /// Flip an item's expand state. Returns `None` for items without an
    /// expand affordance.
    pub fn toggle_expanded(&mut self, id: TreeItemId) -> Result<Option<ExpandState>> {
        let item = self.item_mut(id)?;
        let Some(state) = item.expander else {
            return Ok(None);
        };
        let next = state.toggled();
        item.expander = Some(next);
        Ok(Some(next))
    }

    pub fn set_label_style(&mut self, id: TreeItemId, style: LabelStyle) -> Result<()> {
        self.item_mut(id)?.label_style = style;
        Ok(())
    }

    /// True when no ancestor of `id` is collapsed
    pub fn is_displayed(&self, id: TreeItemId) -> bool {
        let mut current = self.get(id).and_then(TreeItem::parent);
        while let Some(parent_id) = current {
            match self.get(parent_id) {
                Some(parent) if parent.expander != Some(ExpandState::Collapsed) => {
                    current = parent.parent
                }
                _ => return false,
            }
        }
        self.get(id).is_some()
    }

    /// Rows to draw, pre-order, skipping the contents of collapsed items
    pub fn visible_rows(&self) -> Vec<TreeRow<'_>> {
        let mut rows = Vec::with_capacity(self.items.len());
        let mut stack: Vec<(TreeItemId, usize)> =
            self.roots.iter().rev().map(|id| (*id, 0)).collect();

        while let Some((id, depth)) = stack.pop() {
            let item = &self.items[id.0];
            rows.push(TreeRow {
                id,
                depth,
                label: &item.label,
                glyph: item.expander.map(ExpandState::glyph),
                label_style: item.label_style,
            });
            if item.expander == Some(ExpandState::Expanded) {
                for child in item.children.iter().rev() {
                    stack.push((*child, depth + 1));
                }
            }
        }
        rows
    }
}
