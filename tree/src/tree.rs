use std::{collections::HashMap, fmt::Display};

use twig_types::{Code, TypeRef, TypeRegistry, UNKNOWN};

use crate::{NodeRef, TreeError};

/// Type code given to the root of every new tree.
pub const ROOT: Code = 1;

/// Index of a node within the [`Tree`] that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) code: Code,
    pub(crate) value: String,
    pub(crate) links: Links,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Links {
    pub(crate) up: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) first: Option<NodeId>,
    pub(crate) last: Option<NodeId>,
}

/// Initial type and value for a freshly seeded node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Seed {
    type_ref: Option<TypeRef>,
    value: Option<String>,
}

impl Seed {
    pub fn typed<T: Into<TypeRef>>(type_ref: T) -> Self {
        Self {
            type_ref: Some(type_ref.into()),
            value: None,
        }
    }

    pub fn value<S: Into<String>>(mut self, value: S) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Arena owning every node of a rooted tree along with the type registry
/// used to name node types.
///
/// Nodes detached by [`Tree::prune`] or [`Tree::graft`] stay in the arena
/// and can be grafted back in. They are freed when the tree is dropped.
#[derive(Debug, Clone)]
pub struct Tree {
    registry: TypeRegistry,
    slots: Vec<Slot>,
    root: NodeId,
}

impl Tree {
    pub fn new(registry: TypeRegistry) -> Self {
        let mut tree = Self {
            registry,
            slots: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.alloc();
        tree.slot_mut(tree.root).code = ROOT;
        tree
    }

    pub fn with_types<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(TypeRegistry::new(names))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Number of nodes ever allocated, attached or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.slots.len()
    }

    /// Borrowed view of a node.
    ///
    /// # Panics
    ///
    /// If `id` was issued by another tree with more nodes than this one.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(self.contains(id), "node {id} does not belong to this tree");
        NodeRef::new(self, id)
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.contains(id).then(|| NodeRef::new(self, id))
    }

    /// Creates a detached node with the seed's type and value.
    pub fn seed(&mut self, seed: Seed) -> Result<NodeId, TreeError> {
        let Seed { type_ref, value } = seed;
        let code = match type_ref {
            Some(type_ref) => self.registry.resolve(&type_ref)?,
            None => UNKNOWN,
        };
        let id = self.alloc();
        let slot = self.slot_mut(id);
        slot.code = code;
        if let Some(value) = value {
            slot.value = value;
        }
        Ok(id)
    }

    pub fn set_type<T: Into<TypeRef>>(&mut self, id: NodeId, type_ref: T) -> Result<(), TreeError> {
        let code = self.registry.resolve(&type_ref.into())?;
        self.slot_mut(id).code = code;
        Ok(())
    }

    /// Sets the value, which only shows while the node has no children.
    pub fn set_value<S: Into<String>>(&mut self, id: NodeId, value: S) {
        self.slot_mut(id).value = value.into();
    }

    /// Copies the subtree of `other` rooted at `from` into this arena and
    /// returns the copy's root, which is detached.
    pub fn import(&mut self, other: &Tree, from: NodeId) -> NodeId {
        let mut copies: HashMap<NodeId, NodeId> = HashMap::new();
        let mut top = None;
        for id in other.preorder(from) {
            let source = other.slot(id);
            let copy = self.alloc();
            {
                let slot = self.slot_mut(copy);
                slot.code = source.code;
                slot.value = source.value.clone();
            }
            match source.links.up.and_then(|up| copies.get(&up)) {
                Some(&parent) => {
                    self.graft_under(parent, copy);
                }
                _ => top = Some(copy),
            }
            copies.insert(id, copy);
        }
        tracing::trace!(from = %from, nodes = copies.len(), "imported subtree");
        top.unwrap_or(self.root)
    }

    fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot::default());
        id
    }

    pub(crate) fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.0]
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        &mut self.slots[id.0]
    }

    pub(crate) fn links(&self, id: NodeId) -> Links {
        self.slot(id).links
    }

    pub(crate) fn links_mut(&mut self, id: NodeId) -> &mut Links {
        &mut self.slot_mut(id).links
    }

    pub(crate) fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(TreeError::MissingNode(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tree_has_typed_root() {
        let tree = Tree::with_types(["root", "word"]);
        let root = tree.node(tree.root());
        assert_eq!(root.type_code(), ROOT);
        assert_eq!(root.type_name(), "root");
        assert!(root.is_detached());
        assert!(root.is_null());
    }

    #[test]
    fn seed_by_code_and_name() {
        let mut tree = Tree::with_types(["root", "word"]);
        let by_code = tree.seed(Seed::typed(2).value("A")).unwrap();
        let by_name = tree.seed(Seed::typed("word")).unwrap();
        let bare = tree.seed(Seed::default()).unwrap();
        assert_eq!(tree.node(by_code).type_code(), 2);
        assert_eq!(tree.node(by_code).value(), "A");
        assert_eq!(tree.node(by_name).type_code(), 2);
        assert_eq!(tree.node(bare).type_code(), UNKNOWN);
        assert!(tree.node(bare).is_detached());
    }

    #[test]
    fn seed_with_unknown_name_fails() {
        let mut tree = Tree::with_types(["root"]);
        let before = tree.len();
        let err = tree.seed(Seed::typed("nope")).unwrap_err();
        assert!(matches!(err, TreeError::Type(_)));
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn set_type_resolves_names() {
        let mut tree = Tree::with_types(["root", "word"]);
        let root = tree.root();
        tree.set_type(root, "word").unwrap();
        assert_eq!(tree.node(root).type_code(), 2);
        tree.set_type(root, 9).unwrap();
        assert_eq!(tree.node(root).type_code(), 9);
        assert!(tree.set_type(root, "missing").is_err());
        assert_eq!(tree.node(root).type_code(), 9);
    }

    #[test]
    fn import_copies_subtree() {
        let mut other = Tree::with_types(["root", "word"]);
        let root = other.root();
        other.new_under(root, Seed::typed(2).value("A")).unwrap();
        let b = other.new_under(root, Seed::typed(1)).unwrap();
        other.new_under(b, Seed::typed(2).value("C")).unwrap();

        let mut tree = Tree::with_types(["root", "word"]);
        let copy = tree.import(&other, root);
        assert!(tree.node(copy).is_root());
        assert_eq!(copy.index(), 1);
        assert_eq!(
            tree.node(copy).to_string(),
            other.node(root).to_string()
        );
    }
}
