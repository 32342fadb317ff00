use serde::{
    ser::{SerializeSeq, Serializer},
    Deserialize, Serialize,
};
use serde_json::Value;
use tracing::debug;
use twig_types::{TypeRegistry, UNKNOWN};

use crate::{NodeId, NodeRef, Seed, Tree, TreeError};

/// Every node is an array of at most two elements: `[]`, `[T]`,
/// `[T,"value"]` or `[T,[children...]]`. Type 0 is left out, so an
/// unknown leaf is `["value"]` and an unknown branch `[[children...]]`.
impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let code = self.type_code();
        let typed = code != UNKNOWN;
        let branch = self.is_branch();
        let leaf = self.is_leaf();
        let len = usize::from(typed) + usize::from(branch || leaf);

        let mut seq = serializer.serialize_seq(Some(len))?;
        if typed {
            seq.serialize_element(&code)?;
        }
        if branch {
            seq.serialize_element(&ChildrenOf(*self))?;
        } else if leaf {
            seq.serialize_element(self.value())?;
        }
        seq.end()
    }
}

struct ChildrenOf<'a>(NodeRef<'a>);

impl Serialize for ChildrenOf<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.children())
    }
}

impl Tree {
    /// Compact JSON for the subtree at `id`. Non-ASCII text is written as is.
    pub fn marshal_json(&self, id: NodeId) -> Result<Vec<u8>, TreeError> {
        Ok(serde_json::to_vec(&self.node(id))?)
    }

    /// Parses compact JSON into a new tree using `registry` for type names.
    ///
    /// Nesting depth is not limited, so anything [`Tree::marshal_json`]
    /// writes can be read back.
    pub fn parse(input: &[u8], registry: TypeRegistry) -> Result<Tree, TreeError> {
        let mut deserializer = serde_json::Deserializer::from_slice(input);
        deserializer.disable_recursion_limit();
        let value = Value::deserialize(&mut deserializer)?;
        deserializer.end()?;
        let mut tree = Tree::new(registry);
        let root = tree.root();
        tree.decode(root, &value, String::new())?;
        debug!(nodes = tree.len(), "parsed tree");
        Ok(tree)
    }

    /// Replaces the type, value and children of `n` with those parsed from
    /// `input`, keeping `n` where it is.
    pub fn unmarshal_json(&mut self, n: NodeId, input: &[u8]) -> Result<(), TreeError> {
        self.check(n)?;
        let parsed = Tree::parse(input, self.registry().clone())?;
        let copy = self.import(&parsed, parsed.root());
        let position = self.links(n);
        self.morph(n, copy)?;
        match (position.left, position.right, position.up) {
            (Some(left), _, _) => {
                self.graft_right(left, n);
            }
            (None, Some(right), _) => {
                self.graft_left(right, n);
            }
            (None, None, Some(up)) => {
                self.graft_under(up, n);
            }
            (None, None, None) => {}
        }
        Ok(())
    }

    fn decode(&mut self, id: NodeId, value: &Value, path: String) -> Result<(), TreeError> {
        let malformed = |reason: &'static str| TreeError::Malformed {
            path: path.clone(),
            reason,
        };
        let Value::Array(items) = value else {
            return Err(malformed("expected an array"));
        };
        let (code, rest) = match items.as_slice() {
            [Value::Number(code), rest @ ..] => {
                let code = code
                    .as_u64()
                    .and_then(|code| usize::try_from(code).ok())
                    .ok_or_else(|| malformed("type must be a non-negative integer"))?;
                (code, rest)
            }
            [Value::String(_) | Value::Array(_)] | [] => (UNKNOWN, items.as_slice()),
            [Value::String(_) | Value::Array(_), ..] => {
                return Err(malformed("expected one element after an omitted type"));
            }
            _ => return Err(malformed("type must be a non-negative integer")),
        };
        self.slot_mut(id).code = code;

        match rest {
            [] => Ok(()),
            [Value::String(text)] => {
                self.slot_mut(id).value = text.clone();
                Ok(())
            }
            [Value::Array(children)] => {
                for (index, child) in children.iter().enumerate() {
                    let c = self.seed(Seed::default())?;
                    self.graft_under(id, c);
                    self.decode(c, child, format!("{path}/1/{index}"))?;
                }
                Ok(())
            }
            [_] => Err(malformed("second element must be a string or an array")),
            _ => Err(malformed("expected at most two elements")),
        }
    }
}
