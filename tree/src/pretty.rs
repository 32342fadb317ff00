use std::fmt::Write;

use serde_json::Value;

use crate::{NodeId, NodeRef, Tree};

impl Tree {
    /// Human-readable form using type names and two-space indentation. Not
    /// meant to be parsed back.
    pub fn pretty(&self, id: NodeId) -> String {
        let mut out = String::new();
        pretty_into(self.node(id), 0, &mut out);
        out
    }
}

fn pretty_into(node: NodeRef<'_>, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}[\"{}\", ", node.type_name());
    if node.is_branch() {
        out.push_str("[\n");
        let mut children = node.children().peekable();
        while let Some(child) = children.next() {
            pretty_into(child, depth + 1, out);
            if children.peek().is_some() {
                out.push_str(",\n");
            }
        }
        let _ = write!(out, "\n{indent}]]");
    } else {
        let _ = write!(out, "{}]", Value::from(node.value()));
    }
}
