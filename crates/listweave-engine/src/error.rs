use listweave_model::{ModelError, NotationError};
use thiserror::Error;

/// Why a step could not be applied to a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("structural replace would overwrite content between {from} and {to}")]
    OverwritesContent { from: usize, to: usize },

    #[error("gap {gap_from}..{gap_to} is not a flat range")]
    GapNotFlat { gap_from: usize, gap_to: usize },

    #[error("gap content does not fit at offset {insert} of the inserted slice")]
    GapDoesNotFit { insert: usize },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Failures while building a transform. A command that hits one of these
/// computed a bad position or step; refusals are never reported this way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("step failed: {0}")]
    Step(#[from] StepError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Failures while loading a [`Document`](crate::editing::Document).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("cannot parse document: {0}")]
    Notation(#[from] NotationError),

    #[error("invalid selection: {0}")]
    Selection(#[from] ModelError),
}
