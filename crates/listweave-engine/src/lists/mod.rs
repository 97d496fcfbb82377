//! # List commands
//!
//! The four structural list edits. Each one reads an [`EditorState`], decides
//! whether it applies, and, when given a dispatch callback, builds the whole
//! edit as one [`Transaction`] and hands it over exactly once.
//!
//! A command that does not apply returns `Ok(false)` and touches nothing.
//! `Err` is reserved for steps that fail to apply, which means a position was
//! computed wrongly.
//!
//! [`EditorState`]: crate::editing::EditorState

mod lift;
mod sink;
mod split;
mod wrap;

use crate::editing::Transaction;
use crate::error::TransformError;

pub use lift::lift_list_item;
pub use sink::sink_list_item;
pub use split::split_list_item;
pub use wrap::wrap_in_list;

/// Receives the finished transaction of a command that applies.
pub type Dispatch<'a> = &'a mut dyn FnMut(Transaction);

fn refuse<T: Default>(command: &str, reason: &str) -> Result<T, TransformError> {
    log::debug!("{command}: not applicable, {reason}");
    Ok(T::default())
}
