use std::{borrow::Cow, fmt::Display};

use twig_types::Code;

use crate::{NodeId, Tree};

/// Read-only view of one node in a [`Tree`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(tree: &'a Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    pub fn type_code(&self) -> Code {
        self.tree.slot(self.id).code
    }

    pub fn type_name(&self) -> Cow<'a, str> {
        self.tree.registry().display_name(self.type_code())
    }

    pub fn value(&self) -> &'a str {
        &self.tree.slot(self.id).value
    }

    /// The branch this node hangs from.
    pub fn branch(&self) -> Option<NodeRef<'a>> {
        self.link(self.tree.links(self.id).up)
    }

    pub fn left(&self) -> Option<NodeRef<'a>> {
        self.link(self.tree.links(self.id).left)
    }

    pub fn right(&self) -> Option<NodeRef<'a>> {
        self.link(self.tree.links(self.id).right)
    }

    pub fn first_under(&self) -> Option<NodeRef<'a>> {
        self.link(self.tree.links(self.id).first)
    }

    pub fn last_under(&self) -> Option<NodeRef<'a>> {
        self.link(self.tree.links(self.id).last)
    }

    /// Direct children, first to last.
    pub fn children(&self) -> Children<'a> {
        Children {
            tree: self.tree,
            next: self.tree.links(self.id).first,
        }
    }

    pub fn all_under(&self) -> Vec<NodeRef<'a>> {
        self.children().collect()
    }

    /// Not on any branch, though possibly still holding children.
    pub fn is_root(&self) -> bool {
        self.tree.links(self.id).up.is_none()
    }

    pub fn is_detached(&self) -> bool {
        let links = self.tree.links(self.id);
        links.up.is_none()
            && links.left.is_none()
            && links.right.is_none()
            && links.first.is_none()
            && links.last.is_none()
    }

    /// Childless with a non-empty value. An empty value never makes a leaf.
    pub fn is_leaf(&self) -> bool {
        !self.is_branch() && !self.value().is_empty()
    }

    pub fn is_branch(&self) -> bool {
        self.tree.links(self.id).first.is_some()
    }

    pub fn is_null(&self) -> bool {
        !self.is_branch() && self.value().is_empty()
    }

    /// Logs a summary of this node's properties, mostly for debugging.
    pub fn info(&self) {
        tracing::debug!(
            node = %self.id,
            type_code = self.type_code(),
            value = ?self.value(),
            is_root = self.is_root(),
            is_detached = self.is_detached(),
            is_leaf = self.is_leaf(),
            is_branch = self.is_branch(),
            is_null = self.is_null(),
            "node info"
        );
    }

    fn link(&self, id: Option<NodeId>) -> Option<NodeRef<'a>> {
        id.map(|id| NodeRef::new(self.tree, id))
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

/// Compact JSON form, the same as [`Tree::marshal_json`].
impl Display for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

/// Iterator over the direct children of a node, following right links.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.links(id).right;
        Some(NodeRef::new(self.tree, id))
    }
}
