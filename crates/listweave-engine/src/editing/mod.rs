/*!
 * # Editing
 *
 * The layer commands are written against.
 *
 * ## Architecture Overview
 *
 * ### 1. Immutable state
 * - An **`EditorState`** is a document plus a **`Selection`**
 * - Neither is ever changed in place; every edit produces a new state
 *
 * ### 2. Transactions
 * - A command builds its whole edit as one **`Transaction`**, a transform
 *   that also tracks where the selection ends up
 * - The transaction is handed to a dispatch callback exactly once, or not at
 *   all when the command does not apply
 * - Running a command without a callback is a dry run
 *
 * ### 3. Document host
 * - **`Document`** owns a state for a single writer, applies **`ListCmd`**s
 *   and reports each change as a **`Patch`** with a version number
 *
 * ## Module Structure
 *
 * - **`selection`**: text, node and whole-document selections and how they map
 * - **`state`**: `EditorState` and `Transaction`
 * - **`commands`**: the `ListCmd` enum and its constructors
 * - **`document`**: the `Document` host
 * - **`patch`**: what an applied command changed
 *
 * ## Usage Pattern
 *
 * ```rust
 * use listweave_engine::editing::*;
 * use listweave_engine::schema::default_schema;
 *
 * let schema = default_schema();
 * let mut doc = Document::from_notation(&schema, r#"doc(p("<a>one"), p("two<b>"))"#).unwrap();
 *
 * let list = schema.node_type("bullet_list").unwrap();
 * let cmd = wrap_in_list(list, None);
 * assert!(doc.can_apply(&cmd).unwrap());
 *
 * let patch = doc.apply(&cmd).unwrap().unwrap();
 * assert_eq!(patch.version, 1);
 * ```
 */

pub mod commands;
pub mod document;
pub mod patch;
pub mod selection;
pub mod state;

pub use commands::{ListCmd, lift_list_item, sink_list_item, split_list_item, wrap_in_list};
pub use document::{Document, selection_from_tags};
pub use patch::Patch;
pub use selection::Selection;
pub use state::{EditorState, Transaction};
