//! Rooted trees of typed strings.
//!
//! A [`Tree`] owns every node in an arena and hands out [`NodeId`]s. Each
//! node carries an integer type code, a string value, and links to its
//! parent, its left and right siblings, and its first and last children.
//! A node with children is a branch and its value is void. A childless
//! node with a value is a leaf. A childless node without one is null.
//!
//! Trees serialize to a compact form where every node is an array of at
//! most two elements:
//!
//! ```text
//! []                  unknown type, nothing else
//! [5]                 type 5, null
//! [2,"A"]             type 2, leaf with value "A"
//! [1,[[2,"A"],[2,"B"]]]  type 1, branch with two leaves
//! ["A"]               unknown type, leaf with value "A"
//! ```

mod codec;
mod error;
mod graft;
mod node;
mod pretty;
mod tree;
mod visit;

pub use crate::error::TreeError;
pub use crate::node::{Children, NodeRef};
pub use crate::tree::{NodeId, Seed, Tree, ROOT};
pub use crate::visit::{NodeHandle, Preorder};
pub use twig_types::{Code, TypeError, TypeRef, TypeRegistry, UNKNOWN};
