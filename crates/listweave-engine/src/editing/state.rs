use std::ops::{Deref, DerefMut};

use listweave_model::{ModelError, Node};

use crate::editing::selection::Selection;
use crate::transform::Transform;

/// A document together with its selection. Commands read a state and describe
/// their edit as a [`Transaction`]; applying it yields the next state.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub doc: Node,
    pub selection: Selection,
}

impl EditorState {
    pub fn new(doc: Node, selection: Selection) -> Self {
        Self { doc, selection }
    }

    /// A state with the cursor at the start of `doc`.
    pub fn at_start(doc: Node) -> Self {
        let selection = Selection::at_start(&doc);
        Self { doc, selection }
    }

    /// Start a transaction on this state.
    pub fn tr(&self) -> Transaction {
        Transaction::new(self)
    }

    pub fn apply(&self, tr: &Transaction) -> Result<EditorState, ModelError> {
        Ok(EditorState {
            doc: tr.doc().clone(),
            selection: tr.selection()?,
        })
    }
}

/// A [`Transform`] that also tracks the selection.
///
/// Unless one is set explicitly, the selection is the starting state's
/// selection mapped through the steps. A selection set part way through is
/// mapped through the steps added after it.
#[derive(Debug, Clone)]
pub struct Transaction {
    transform: Transform,
    selection: Selection,
    /// Number of steps that had been applied when `selection` was recorded.
    selection_at: usize,
    scroll_into_view: bool,
}

impl Transaction {
    fn new(state: &EditorState) -> Self {
        Self {
            transform: Transform::new(state.doc.clone()),
            selection: state.selection,
            selection_at: 0,
            scroll_into_view: false,
        }
    }

    pub fn selection(&self) -> Result<Selection, ModelError> {
        let steps = self.transform.steps().len();
        if self.selection_at == steps {
            return Ok(self.selection);
        }
        let mapping = self.transform.mapping().slice(self.selection_at);
        self.selection.map(self.transform.doc(), &mapping)
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection;
        self.selection_at = self.transform.steps().len();
        self
    }

    /// Ask the host to bring the selection into view. Recorded only.
    pub fn scroll_into_view(&mut self) -> &mut Self {
        self.scroll_into_view = true;
        self
    }

    pub fn scrolled_into_view(&self) -> bool {
        self.scroll_into_view
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }
}

impl Deref for Transaction {
    type Target = Transform;

    fn deref(&self) -> &Transform {
        &self.transform
    }
}

impl DerefMut for Transaction {
    fn deref_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}
