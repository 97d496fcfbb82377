use thiserror::Error;

/// Failures of the document model. All of these indicate that a caller passed
/// positions or content that do not fit the tree, so they are reported rather
/// than silently clamped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("position {pos} out of range (document content size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("invalid content for node {node_type}: {content}")]
    InvalidContent { node_type: String, content: String },

    #[error("no value given for required attribute {attr} of {node_type}")]
    MissingAttribute { node_type: String, attr: String },

    #[error("node {node_type} has no valid content match at index {index}")]
    NoContentMatch { node_type: String, index: usize },

    #[error(transparent)]
    Replace(#[from] ReplaceError),
}

/// Reasons a closed-slice replace cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplaceError {
    #[error("inserted content deeper than insertion position")]
    TooDeep,

    #[error("inconsistent open depths (from depth {from_depth} open {open_start}, to depth {to_depth} open {open_end})")]
    InconsistentOpenDepths {
        from_depth: usize,
        open_start: usize,
        to_depth: usize,
        open_end: usize,
    },

    #[error("cannot join {sub} onto {main}")]
    CannotJoin { sub: String, main: String },
}
