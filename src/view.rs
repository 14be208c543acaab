//! Arena-based view tree for one report.
//!
//! Nodes own their children through a name-keyed mapping of arena indices;
//! the parent link is a plain index used only for upward lookups, never for
//! ownership. An external builder assembles the tree before any render pass.

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::instrument;

use crate::document::{Fragment, StructureTemplate};
use crate::errors::{RenderError, RenderResult};

/// Data payload for a view node.
#[derive(Debug, Clone)]
pub struct ViewData {
    /// Name the parent's placeholders refer to this view by
    pub name: String,
    /// Structure template with placeholder elements for child views
    pub template: StructureTemplate,
}

impl ViewData {
    pub fn new(name: impl Into<String>, template: StructureTemplate) -> Self {
        Self {
            name: name.into(),
            template,
        }
    }
}

/// Render lifecycle of a single view node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Unrendered,
    Rendering,
    Rendered,
}

/// View node in the arena-based hierarchy.
#[derive(Debug)]
pub struct ViewNode {
    /// Name and template of this view
    pub data: ViewData,
    /// Index of the parent view in the arena, None for the root
    pub parent: Option<Index>,
    /// Child views keyed by name; registering an existing name overwrites
    pub children: HashMap<String, Index>,
    /// Where this node is in the current render pass
    pub state: RenderState,
    /// Latest render result for this view
    pub rendered: Option<Fragment>,
}

/// Arena-based tree of views making up one report.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
#[derive(Debug)]
pub struct ViewArena {
    /// Arena storage for all view nodes
    arena: Arena<ViewNode>,
    /// Index of the root view, None for empty trees
    root: Option<Index>,
}

impl Default for ViewArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Inserts a view, registering it under its name in the parent's children
    /// mapping. A view inserted without a parent becomes the root; a parent
    /// index no longer in the arena leaves the view detached.
    #[instrument(level = "trace", skip(self, data), fields(view = %data.name))]
    pub fn insert_view(&mut self, data: ViewData, parent: Option<Index>) -> Index {
        let name = data.name.clone();
        let node = ViewNode {
            data,
            parent,
            children: HashMap::new(),
            state: RenderState::Unrendered,
            rendered: None,
        };
        let node_idx = self.arena.insert(node);

        match parent {
            Some(parent_idx) if self.arena.contains(parent_idx) => {
                let displaced = self
                    .arena
                    .get_mut(parent_idx)
                    .and_then(|parent| parent.children.insert(name, node_idx));
                if let Some(displaced) = displaced {
                    self.detach(displaced);
                }
            }
            // Stale parent index: keep the view, but not a dangling back-reference.
            Some(_) => self.detach(node_idx),
            None => self.root = Some(node_idx),
        }

        node_idx
    }

    /// Registers `child` under `name` on `parent`, overwriting any previous
    /// entry with that name and setting the child's parent back-reference.
    #[instrument(level = "trace", skip(self, name), fields(name = %name.as_ref()))]
    pub fn attach_child(
        &mut self,
        parent: Index,
        name: impl AsRef<str>,
        child: Index,
    ) -> RenderResult<()> {
        let name = name.as_ref().to_string();
        if !self.arena.contains(parent) || !self.arena.contains(child) {
            return Err(RenderError::ViewNotFound);
        }

        // Detach the child from wherever it currently hangs.
        if let Some(old_parent) = self.arena[child].parent {
            if let Some(old_parent_node) = self.arena.get_mut(old_parent) {
                old_parent_node.children.retain(|_, idx| *idx != child);
            }
        }

        let displaced = self.arena[parent].children.insert(name.clone(), child);
        if let Some(displaced) = displaced.filter(|idx| *idx != child) {
            self.detach(displaced);
        }

        let child_node = &mut self.arena[child];
        child_node.parent = Some(parent);
        child_node.data.name = name;
        Ok(())
    }

    /// Looks up the child registered under `name`.
    ///
    /// A missing entry is reported as [`RenderError::ChildNotFound`] rather
    /// than an empty result, so callers decide whether the miss is fatal.
    #[instrument(level = "trace", skip(self))]
    pub fn child_of(&self, parent: Index, name: &str) -> RenderResult<Index> {
        let parent = self.arena.get(parent).ok_or(RenderError::ViewNotFound)?;
        parent
            .children
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::ChildNotFound {
                name: name.to_string(),
            })
    }

    pub fn has_child(&self, parent: Index, name: &str) -> bool {
        self.arena
            .get(parent)
            .map(|node| node.children.contains_key(name))
            .unwrap_or(false)
    }

    /// Removes the child registered under `name`; no-op if absent.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_child(&mut self, parent: Index, name: &str) -> Option<Index> {
        let removed = self.arena.get_mut(parent)?.children.remove(name)?;
        if let Some(node) = self.arena.get_mut(removed) {
            node.parent = None;
        }
        Some(removed)
    }

    pub fn node(&self, idx: Index) -> Option<&ViewNode> {
        self.arena.get(idx)
    }

    pub fn node_mut(&mut self, idx: Index) -> Option<&mut ViewNode> {
        self.arena.get_mut(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn iter(&self) -> ViewIterator {
        ViewIterator::new(self)
    }

    /// View names in depth-first pre-order, children visited alphabetically.
    pub fn view_names(&self) -> Vec<String> {
        self.iter()
            .map(|(_, node)| node.data.name.clone())
            .collect()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.node(node_idx) {
            1 + node
                .children
                .values()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Renders the hierarchy as a termtree for diagnostics.
    pub fn display_tree(&self) -> Option<Tree<String>> {
        self.root.map(|root| self.branch(root))
    }

    fn branch(&self, node_idx: Index) -> Tree<String> {
        let Some(node) = self.node(node_idx) else {
            return Tree::new("<missing>".to_string());
        };
        let mut tree = Tree::new(node.data.name.clone());
        for &child in sorted_children(node) {
            tree.push(self.branch(child));
        }
        tree
    }

    fn detach(&mut self, idx: Index) {
        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = None;
        }
    }
}

/// Children sorted by name so traversal order is stable.
fn sorted_children(node: &ViewNode) -> impl Iterator<Item = &Index> {
    let mut entries: Vec<_> = node.children.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries.into_iter().map(|(_, idx)| idx)
}

pub struct ViewIterator<'a> {
    arena: &'a ViewArena,
    stack: Vec<Index>,
}

impl<'a> ViewIterator<'a> {
    fn new(arena: &'a ViewArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for ViewIterator<'a> {
    type Item = (Index, &'a ViewNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.node(current_idx) {
                // Push in reverse name order for alphabetical traversal
                let children: Vec<_> = sorted_children(node).copied().collect();
                for child in children.into_iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(xml: &str) -> StructureTemplate {
        StructureTemplate::parse(xml).unwrap()
    }

    #[test]
    fn test_insert_view_without_parent_becomes_root() {
        let mut tree = ViewArena::new();
        let root = tree.insert_view(ViewData::new("root", template("<r/>")), None);
        assert_eq!(tree.root(), Some(root));
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_insert_view_registers_under_name() {
        let mut tree = ViewArena::new();
        let root = tree.insert_view(ViewData::new("root", template("<r/>")), None);
        let child = tree.insert_view(ViewData::new("a", template("<a/>")), Some(root));
        assert_eq!(tree.child_of(root, "a").unwrap(), child);
        assert_eq!(tree.node(child).unwrap().parent, Some(root));
    }

    #[test]
    fn test_attach_child_renames_view() {
        let mut tree = ViewArena::new();
        let root = tree.insert_view(ViewData::new("root", template("<r/>")), None);
        let child = tree.insert_view(ViewData::new("old", template("<a/>")), Some(root));
        tree.attach_child(root, "new", child).unwrap();
        assert_eq!(tree.node(child).unwrap().data.name, "new");
        assert!(tree.has_child(root, "new"));
        assert!(!tree.has_child(root, "old"));
    }

    #[test]
    fn test_view_names_preorder_alphabetical() {
        let mut tree = ViewArena::new();
        let root = tree.insert_view(ViewData::new("root", template("<r/>")), None);
        let b = tree.insert_view(ViewData::new("b", template("<b/>")), Some(root));
        tree.insert_view(ViewData::new("a", template("<a/>")), Some(root));
        tree.insert_view(ViewData::new("c", template("<c/>")), Some(b));
        assert_eq!(tree.view_names(), vec!["root", "a", "b", "c"]);
    }
}
