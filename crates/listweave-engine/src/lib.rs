//! # listweave-engine
//!
//! Structure-preserving list commands over [`listweave_model`] documents:
//! wrap a selection in a list, split a list item, lift items out one level
//! and sink them one level deeper.
//!
//! Commands live in [`lists`] and are usually reached through the
//! [`editing::ListCmd`] enum. They describe their edits with the step based
//! [`transform`] layer, and [`schema`] provides the list node types.

pub mod editing;
pub mod error;
pub mod lists;
pub mod schema;
pub mod transform;

pub use editing::{Document, EditorState, ListCmd, Patch, Selection, Transaction};
pub use error::{DocumentError, StepError, TransformError};
pub use schema::{add_list_nodes, default_schema, list_schema};
pub use transform::{Step, Transform};
