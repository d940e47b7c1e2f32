use mixture_core::TypeRef;
use thiserror::Error;

use crate::log::NodeId;

pub type Result<T> = std::result::Result<T, ValidationError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The definition graph mentions a handle its universe did not issue
    #[error("Definition node {node} references {ty:?}, which is not part of the type universe")]
    ForeignType { node: NodeId, ty: TypeRef },

    #[error("Validation failed with {failures} failure(s):\n{summary}")]
    Failed { failures: usize, summary: String },
}
