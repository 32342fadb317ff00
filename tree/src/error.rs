use thiserror::Error;
use twig_types::TypeError;

use crate::NodeId;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("node {0} does not belong to this tree")]
    MissingNode(NodeId),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed node at \"{path}\": {reason}")]
    Malformed { path: String, reason: &'static str },
}
