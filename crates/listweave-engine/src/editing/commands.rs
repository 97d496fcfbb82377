use listweave_model::{Attrs, NodeType};

use crate::editing::{EditorState, Transaction};
use crate::error::TransformError;
use crate::lists;

/// List commands that can be run against an editor state
#[derive(Debug, Clone, PartialEq)]
pub enum ListCmd {
    WrapInList {
        list_type: NodeType,
        attrs: Option<Attrs>,
    },
    SplitListItem {
        item_type: NodeType,
        /// Attributes for the new item when the split is at the end of the item.
        item_attrs: Option<Attrs>,
    },
    LiftListItem {
        item_type: NodeType,
    },
    SinkListItem {
        item_type: NodeType,
    },
}

impl ListCmd {
    /// Run the command. Returns whether it applies; when it does and
    /// `dispatch` is given, `dispatch` receives the transaction once.
    pub fn run(
        &self,
        state: &EditorState,
        dispatch: Option<&mut dyn FnMut(Transaction)>,
    ) -> Result<bool, TransformError> {
        match self {
            ListCmd::WrapInList { list_type, attrs } => {
                lists::wrap_in_list(state, list_type, attrs.as_ref(), dispatch)
            }
            ListCmd::SplitListItem { item_type, item_attrs } => {
                lists::split_list_item(state, item_type, item_attrs.as_ref(), dispatch)
            }
            ListCmd::LiftListItem { item_type } => lists::lift_list_item(state, item_type, dispatch),
            ListCmd::SinkListItem { item_type } => lists::sink_list_item(state, item_type, dispatch),
        }
    }

    /// Whether the command applies, without building the edit.
    pub fn can_run(&self, state: &EditorState) -> Result<bool, TransformError> {
        self.run(state, None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ListCmd::WrapInList { .. } => "wrap",
            ListCmd::SplitListItem { .. } => "split",
            ListCmd::LiftListItem { .. } => "lift",
            ListCmd::SinkListItem { .. } => "sink",
        }
    }
}

pub fn wrap_in_list(list_type: NodeType, attrs: Option<Attrs>) -> ListCmd {
    ListCmd::WrapInList { list_type, attrs }
}

pub fn split_list_item(item_type: NodeType, item_attrs: Option<Attrs>) -> ListCmd {
    ListCmd::SplitListItem { item_type, item_attrs }
}

pub fn lift_list_item(item_type: NodeType) -> ListCmd {
    ListCmd::LiftListItem { item_type }
}

pub fn sink_list_item(item_type: NodeType) -> ListCmd {
    ListCmd::SinkListItem { item_type }
}
