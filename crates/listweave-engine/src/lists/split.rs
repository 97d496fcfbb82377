use listweave_model::{Attrs, Fragment, NodeType, ResolvedPos, Slice};

use crate::editing::{EditorState, Selection, Transaction};
use crate::error::TransformError;
use crate::transform::{Wrapper, can_split};

use super::{Dispatch, refuse};

/// Split the list item around the cursor in two, or move an empty last item
/// of a nested list out to the outer list.
pub fn split_list_item(
    state: &EditorState,
    item_type: &NodeType,
    item_attrs: Option<&Attrs>,
    dispatch: Option<Dispatch<'_>>,
) -> Result<bool, TransformError> {
    let doc = &state.doc;
    if state.selection.node(doc).is_some_and(|n| n.is_block()) {
        return refuse("split", "a block node is selected");
    }
    let from = state.selection.resolve_from(doc)?;
    let to = state.selection.resolve_to(doc)?;
    let depth = from.depth();
    if depth < 2 || !from.same_parent(&to) {
        return refuse("split", "selection is not inside a single textblock in a list");
    }
    let grandparent = from.node(depth - 1);
    if grandparent.node_type() != item_type {
        return refuse("split", "selection is not directly inside a list item");
    }

    if from.parent().content().size() == 0 && grandparent.child_count() == from.index_after(depth - 1) {
        return escape_nested_item(state, &from, item_type, dispatch);
    }

    let next_type = if to.pos() == from.end(depth) {
        grandparent.content_match_at(0)?.default_type()
    } else {
        None
    };
    let types: Vec<Option<Wrapper>> = match next_type {
        Some(next_type) => vec![
            item_attrs.map(|attrs| Wrapper::with_attrs(item_type.clone(), Some(attrs.clone()))),
            Some(Wrapper::new(next_type)),
        ],
        None => Vec::new(),
    };

    let mut tr = state.tr();
    tr.delete(from.pos(), to.pos())?;
    if !can_split(tr.doc(), from.pos(), 2, &types) {
        return refuse("split", "the item cannot be split here");
    }
    if let Some(dispatch) = dispatch {
        tr.split(from.pos(), 2, &types)?;
        tr.scroll_into_view();
        dispatch(tr);
    }
    Ok(true)
}

/// The cursor is in an empty textblock that ends its item. When that item is
/// the last one in a list nested in another item, the empty item moves out
/// to become the outer item's next sibling. Trailing content of the outer
/// item follows into a new item after it.
fn escape_nested_item(
    state: &EditorState,
    from: &ResolvedPos,
    item_type: &NodeType,
    dispatch: Option<Dispatch<'_>>,
) -> Result<bool, TransformError> {
    let depth = from.depth();
    if depth <= 3
        || from.node(depth - 3).node_type() != item_type
        || from.index(depth - 2) + 1 != from.node(depth - 2).child_count()
    {
        return refuse("split", "empty item is not the last item of a nested list");
    }

    let depth_before = if from.index(depth - 1) > 0 {
        1
    } else if from.index(depth - 2) > 0 {
        2
    } else {
        3
    };
    // Empty copies of the ancestors the replacement starts inside, from the
    // outer item down.
    let mut shell = Fragment::empty();
    for d in ((depth - 3)..=(depth - depth_before)).rev() {
        shell = Fragment::from_node(from.node(d).copy(shell));
    }
    let Some(new_item) = item_type.create_and_fill(None, Fragment::empty()) else {
        return refuse("split", "list items cannot be created empty");
    };
    shell = shell.add_to_end(new_item);

    let outer = from.node(depth - 3);
    let list_index = from.index(depth - 3);
    let (end, open_end) = if list_index + 1 == outer.child_count() {
        (from.after(depth - 3), 0)
    } else {
        // The outer item's remaining children move into a fresh item, which
        // may need a leading block to be valid.
        let trailing = outer.content().cut_by_index(list_index + 1, outer.child_count());
        let Some(fill) = outer.node_type().content_match().fill_before(&trailing, true) else {
            return refuse("split", "trailing content cannot start a new item");
        };
        shell = shell.add_to_end(outer.copy(fill));
        (from.after(depth - 2), 1)
    };

    if let Some(dispatch) = dispatch {
        let start = from.before(depth - depth_before + 1);
        let mut tr = state.tr();
        tr.replace(start, end, Slice::new(shell, 4 - depth_before, open_end))?;
        place_in_empty_textblock(&mut tr, start);
        tr.scroll_into_view();
        dispatch(tr);
    }
    Ok(true)
}

/// Put the cursor in the first empty textblock at or after `start`.
fn place_in_empty_textblock(tr: &mut Transaction, start: usize) {
    let doc = tr.doc().clone();
    let mut found = None;
    doc.nodes_between(start, doc.content().size(), &mut |node, pos, _, _| {
        if found.is_some() {
            return false;
        }
        if node.is_textblock() && node.content().size() == 0 {
            found = Some(pos + 1);
        }
        true
    });
    if let Some(rpos) = found.and_then(|pos| doc.resolve(pos).ok()) {
        tr.set_selection(Selection::near(&rpos, 1));
    }
}
