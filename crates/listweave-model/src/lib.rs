//! # listweave-model
//!
//! The document tree that list commands operate on.
//!
//! A [`Schema`] declares node types and what each may contain. Documents are
//! trees of immutable [`Node`]s; every location in a document is a flat
//! integer position, turned into a [`ResolvedPos`] when its ancestors are
//! needed. [`Node::replace`] is the one primitive that builds new documents:
//! it swaps a position range for a [`Slice`] and fails if the result would
//! violate the schema.
//!
//! The [`notation`] module parses and renders documents in a compact text
//! form used by tests and the command line.

pub mod attrs;
pub mod content;
pub mod error;
pub mod fragment;
pub mod node;
pub mod notation;
mod replace;
pub mod resolved;
pub mod schema;
pub mod slice;

pub use attrs::{AttrSpec, AttrValue, Attrs};
pub use content::ContentMatch;
pub use error::{ModelError, ReplaceError};
pub use fragment::Fragment;
pub use node::Node;
pub use notation::{NotationError, Tagged};
pub use resolved::{NodeRange, ResolvedPos};
pub use schema::{NodeSpec, NodeSpecs, NodeType, Schema, SchemaError, SchemaSpec};
pub use slice::Slice;
