use listweave_model::{Fragment, NodeType, Slice};

use crate::editing::EditorState;
use crate::error::TransformError;
use crate::transform::Step;

use super::{Dispatch, refuse};

/// Nest the list items around the selection one level deeper, as a list
/// inside the item before them.
pub fn sink_list_item(
    state: &EditorState,
    item_type: &NodeType,
    dispatch: Option<Dispatch<'_>>,
) -> Result<bool, TransformError> {
    let from = state.selection.resolve_from(&state.doc)?;
    let to = state.selection.resolve_to(&state.doc)?;
    let Some(range) = from.block_range_where(&to, |node| {
        node.first_child().is_some_and(|child| child.node_type() == item_type)
    }) else {
        return refuse("sink", "selection is not inside a list");
    };
    let start_index = range.start_index();
    if start_index == 0 {
        return refuse("sink", "no item before the selection to sink into");
    }
    let parent = range.parent();
    let node_before = parent.child(start_index - 1);
    if node_before.node_type() != item_type {
        return refuse("sink", "node before the selection is not a list item");
    }

    if let Some(dispatch) = dispatch {
        // An existing sub-list of the same kind at the end of the previous
        // item is extended rather than starting a second one.
        let nested_before = node_before
            .last_child()
            .is_some_and(|last| last.node_type() == parent.node_type());
        let inner = if nested_before {
            Fragment::from_node(item_type.create(None, Fragment::empty()))
        } else {
            Fragment::empty()
        };
        let open = if nested_before { 3 } else { 1 };
        let list = parent.copy(inner);
        let slice = Slice::new(
            Fragment::from_node(item_type.create(None, Fragment::from_node(list))),
            open,
            0,
        );
        let (before, after) = (range.start(), range.end());
        let mut tr = state.tr();
        tr.step(Step::ReplaceAround {
            from: before - open,
            to: after,
            gap_from: before,
            gap_to: after,
            slice,
            insert: 1,
            structure: true,
        })?;
        tr.scroll_into_view();
        dispatch(tr);
    }
    Ok(true)
}
