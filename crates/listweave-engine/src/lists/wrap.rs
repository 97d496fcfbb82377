use listweave_model::{Attrs, Fragment, NodeRange, NodeType, Slice};

use crate::editing::{EditorState, Transaction};
use crate::error::TransformError;
use crate::transform::{Step, Wrapper, can_split, find_wrapping};

use super::{Dispatch, refuse};

/// Wrap the blocks around the selection in a list of `list_type`.
pub fn wrap_in_list(
    state: &EditorState,
    list_type: &NodeType,
    attrs: Option<&Attrs>,
    dispatch: Option<Dispatch<'_>>,
) -> Result<bool, TransformError> {
    let from = state.selection.resolve_from(&state.doc)?;
    let to = state.selection.resolve_to(&state.doc)?;
    let Some(mut range) = from.block_range(&to) else {
        return refuse("wrap", "selection has no block range");
    };
    let mut join_before = false;
    let mut outer_range = range.clone();

    if range.depth() >= 2
        && from.node(range.depth() - 1).node_type().compatible_content(list_type)
        && range.start_index() == 0
    {
        if from.index(range.depth() - 1) == 0 {
            return refuse("wrap", "already at the top of a compatible list");
        }
        let insert = state.doc.resolve(range.start() - 2)?;
        outer_range = NodeRange::new(insert.clone(), insert, range.depth());
        if range.end_index() < range.parent().child_count() {
            let end = state.doc.resolve(to.end(range.depth()))?;
            range = NodeRange::new(from.clone(), end, range.depth());
        }
        join_before = true;
    }

    let Some(wrappers) = find_wrapping(&outer_range, list_type, attrs, &range) else {
        return refuse("wrap", "no valid wrapping for the range");
    };
    if let Some(dispatch) = dispatch {
        let mut tr = state.tr();
        wrap_range(&mut tr, &range, &wrappers, join_before, list_type)?;
        tr.scroll_into_view();
        dispatch(tr);
    }
    Ok(true)
}

/// Wrap `range` in `wrappers`, then split the innermost wrapper between the
/// wrapped blocks so each becomes its own item.
fn wrap_range(
    tr: &mut Transaction,
    range: &NodeRange,
    wrappers: &[Wrapper],
    join_before: bool,
    list_type: &NodeType,
) -> Result<(), TransformError> {
    let shell = wrappers
        .iter()
        .rev()
        .fold(Fragment::empty(), |content, wrapper| Fragment::from_node(wrapper.create(content)));
    let back = if join_before { 2 } else { 0 };

    tr.step(Step::ReplaceAround {
        from: range.start() - back,
        to: range.end(),
        gap_from: range.start(),
        gap_to: range.end(),
        slice: Slice::new(shell, 0, 0),
        insert: wrappers.len(),
        structure: true,
    })?;

    let found = wrappers
        .iter()
        .rposition(|w| &w.node_type == list_type)
        .map_or(0, |i| i + 1);
    let split_depth = wrappers.len() - found;

    let mut split_pos = range.start() + wrappers.len() - back;
    let parent = range.parent();
    for i in range.start_index()..range.end_index() {
        if i > range.start_index() && can_split(tr.doc(), split_pos, split_depth, &[]) {
            tr.split(split_pos, split_depth, &[])?;
            split_pos += 2 * split_depth;
        }
        split_pos += parent.child(i).node_size();
    }
    Ok(())
}
