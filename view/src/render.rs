use serde_json::Value;
use termtree::Tree as DisplayTree;
use twig_tree::NodeRef;

/// One label per node, printed with box-drawing guides.
pub type Outline = DisplayTree<String>;

pub trait Render {
    fn render(&self) -> Outline;
}

/// The type name, followed by the quoted value for leaves.
pub fn label(node: NodeRef<'_>) -> String {
    let name = node.type_name();
    if node.is_leaf() {
        format!("{name}: {}", Value::from(node.value()))
    } else {
        name.into_owned()
    }
}

impl Render for NodeRef<'_> {
    fn render(&self) -> Outline {
        DisplayTree::new(label(*self)).with_leaves(self.children().map(|child| child.render()))
    }
}
