use listweave_model::{Fragment, NodeRange, NodeType, Slice};

use crate::editing::{EditorState, Transaction};
use crate::error::TransformError;
use crate::transform::{Step, can_join, lift_target};

use super::{Dispatch, refuse};

/// Lift the list items around the selection out of their list: into the
/// enclosing list when the list is nested, otherwise out of lists entirely.
///
/// Without `dispatch` this answers `true` as soon as the selection spans list
/// items. Lifting out of an outermost list can still refuse when the
/// surrounding node cannot hold the items' content; that check only runs
/// when the edit is built.
pub fn lift_list_item(
    state: &EditorState,
    item_type: &NodeType,
    dispatch: Option<Dispatch<'_>>,
) -> Result<bool, TransformError> {
    let from = state.selection.resolve_from(&state.doc)?;
    let to = state.selection.resolve_to(&state.doc)?;
    let Some(range) = from.block_range_where(&to, |node| {
        node.first_child().is_some_and(|child| child.node_type() == item_type)
    }) else {
        return refuse("lift", "selection is not inside a list");
    };
    let Some(dispatch) = dispatch else {
        return Ok(true);
    };
    let nested = range.depth() >= 1 && from.node(range.depth() - 1).node_type() == item_type;
    let tr = if nested {
        lift_to_outer_list(state, item_type, range)?
    } else {
        lift_out_of_list(state, range)?
    };
    match tr {
        Some(mut tr) => {
            tr.scroll_into_view();
            dispatch(tr);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn lift_to_outer_list(
    state: &EditorState,
    item_type: &NodeType,
    range: NodeRange,
) -> Result<Option<Transaction>, TransformError> {
    let mut tr = state.tr();
    let mut range = range;
    let end = range.end();
    let end_of_list = range.to().end(range.depth());
    if end < end_of_list {
        // Items after the lifted ones become children of the last lifted item.
        let wrapper = item_type.create(None, Fragment::from_node(range.parent().copy(Fragment::empty())));
        tr.step(Step::ReplaceAround {
            from: end - 1,
            to: end_of_list,
            gap_from: end,
            gap_to: end_of_list,
            slice: Slice::new(Fragment::from_node(wrapper), 1, 0),
            insert: 1,
            structure: true,
        })?;
        range = NodeRange::new(
            tr.doc().resolve(range.from().pos())?,
            tr.doc().resolve(end_of_list)?,
            range.depth(),
        );
    }
    let Some(target) = lift_target(&range) else {
        return refuse("lift", "no ancestor can hold the lifted items");
    };
    tr.lift(&range, target)?;

    let after = tr.doc().resolve(tr.mapping().map(end, -1).saturating_sub(1))?;
    let same_type = matches!(
        (after.node_before(), after.node_after()),
        (Some(a), Some(b)) if a.node_type() == b.node_type()
    );
    if same_type && can_join(tr.doc(), after.pos()) {
        tr.join(after.pos(), 1)?;
    }
    Ok(Some(tr))
}

fn lift_out_of_list(state: &EditorState, range: NodeRange) -> Result<Option<Transaction>, TransformError> {
    if range.depth() == 0 {
        return refuse("lift", "the list is the document itself");
    }
    let mut tr = state.tr();
    let list = range.parent().clone();

    // Merge the items into one by removing the boundaries between them.
    let mut pos = range.end();
    for i in ((range.start_index() + 1)..range.end_index()).rev() {
        pos -= list.child(i).node_size();
        tr.delete(pos - 1, pos + 1)?;
    }

    let start = tr.doc().resolve(range.start())?;
    let Some(item) = start.node_after() else {
        return refuse("lift", "merged item is missing");
    };
    if tr.mapping().map(range.end(), 1) != range.start() + item.node_size() {
        return refuse("lift", "merged item does not span the range");
    }

    let at_start = range.start_index() == 0;
    let at_end = range.end_index() == list.child_count();
    let parent = start.node(start.depth() - 1);
    let index_before = start.index(start.depth() - 1);
    let replacement = if at_end {
        item.content().clone()
    } else {
        item.content().add_to_end(list.clone())
    };
    let replace_from = index_before + usize::from(!at_start);
    if !parent.can_replace(replace_from, index_before + 1, &replacement, 0, replacement.child_count()) {
        return refuse("lift", "the surrounding node cannot hold the items' content");
    }

    let start = start.pos();
    let end = start + item.node_size();
    // Keep the parts of the list outside the range as closed lists.
    let empty_list = || Fragment::from_node(list.copy(Fragment::empty()));
    let before = if at_start { Fragment::empty() } else { empty_list() };
    let after = if at_end { Fragment::empty() } else { empty_list() };
    tr.step(Step::ReplaceAround {
        from: start - usize::from(at_start),
        to: end + usize::from(at_end),
        gap_from: start + 1,
        gap_to: end - 1,
        slice: Slice::new(before.append(&after), usize::from(!at_start), usize::from(!at_end)),
        insert: usize::from(!at_start),
        structure: false,
    })?;
    Ok(Some(tr))
}
