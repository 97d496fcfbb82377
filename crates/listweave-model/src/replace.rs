//! The closed-slice replace algorithm.
//!
//! Replacing `[from, to)` with a slice rebuilds every ancestor that the
//! positions or the slice's open sides cut through. Nodes cut on both sides
//! of the gap are joined, which requires compatible content; every rebuilt
//! node is checked against its content expression. Nothing is inserted or
//! wrapped to make the slice fit.

use crate::error::{ModelError, ReplaceError};
use crate::fragment::Fragment;
use crate::node::Node;
use crate::resolved::ResolvedPos;
use crate::slice::Slice;

pub(crate) fn replace(
    from: &ResolvedPos,
    to: &ResolvedPos,
    slice: &Slice,
) -> Result<Node, ModelError> {
    if slice.open_start() > from.depth() {
        return Err(ReplaceError::TooDeep.into());
    }
    if from.depth() - slice.open_start() + slice.open_end() != to.depth() {
        return Err(ReplaceError::InconsistentOpenDepths {
            from_depth: from.depth(),
            open_start: slice.open_start(),
            to_depth: to.depth(),
            open_end: slice.open_end(),
        }
        .into());
    }
    replace_outer(from, to, slice, 0)
}

fn replace_outer(
    from: &ResolvedPos,
    to: &ResolvedPos,
    slice: &Slice,
    depth: usize,
) -> Result<Node, ModelError> {
    let index = from.index(depth);
    let node = from.node(depth);
    if index == to.index(depth) && depth < from.depth() - slice.open_start() {
        let inner = replace_outer(from, to, slice, depth + 1)?;
        Ok(node.copy(node.content().replace_child(index, inner)))
    } else if slice.content().size() == 0 {
        close(node, replace_two_way(from, to, depth)?)
    } else if slice.open_start() == 0
        && slice.open_end() == 0
        && from.depth() == depth
        && to.depth() == depth
    {
        let parent = from.parent();
        let content = parent.content();
        let joined = content
            .cut(0, from.parent_offset())
            .append(slice.content())
            .append(&content.cut(to.parent_offset(), content.size()));
        close(parent, joined)
    } else {
        let (start, end) = prepare_slice_for_replace(slice, from)?;
        close(node, replace_three_way(from, &start, &end, to, depth)?)
    }
}

fn check_join(main: &Node, sub: &Node) -> Result<(), ReplaceError> {
    if sub.node_type().compatible_content(main.node_type()) {
        Ok(())
    } else {
        Err(ReplaceError::CannotJoin {
            sub: sub.node_type().name().to_string(),
            main: main.node_type().name().to_string(),
        })
    }
}

fn joinable(before: &ResolvedPos, after: &ResolvedPos, depth: usize) -> Result<Node, ReplaceError> {
    let node = before.node(depth);
    check_join(node, after.node(depth))?;
    Ok(node.clone())
}

/// Copy the children of the node at `depth` lying between `start` and `end`
/// (either may be absent, meaning the node's edge) into `target`.
fn add_range(start: Option<&ResolvedPos>, end: Option<&ResolvedPos>, depth: usize, target: &mut Vec<Node>) {
    let Some(node) = end.or(start).map(|r| r.node(depth)) else {
        return;
    };
    let mut start_index = 0;
    let end_index = end.map_or(node.child_count(), |e| e.index(depth));
    if let Some(start) = start {
        start_index = start.index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            if let Some(after) = start.node_after() {
                target.push(after);
            }
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        target.push(node.child(i).clone());
    }
    if let Some(end) = end
        && end.depth() == depth
        && end.text_offset() > 0
        && let Some(before) = end.node_before()
    {
        target.push(before);
    }
}

fn close(node: &Node, content: Fragment) -> Result<Node, ModelError> {
    node.node_type().check_content(&content)?;
    Ok(node.copy(content))
}

fn replace_three_way(
    from: &ResolvedPos,
    start: &ResolvedPos,
    end: &ResolvedPos,
    to: &ResolvedPos,
    depth: usize,
) -> Result<Fragment, ModelError> {
    let open_start = if from.depth() > depth {
        Some(joinable(from, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if to.depth() > depth {
        Some(joinable(end, to, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    match (&open_start, &open_end) {
        (Some(os), Some(oe)) if start.index(depth) == end.index(depth) => {
            check_join(os, oe)?;
            content.push(close(os, replace_three_way(from, start, end, to, depth + 1)?)?);
        }
        _ => {
            if let Some(os) = &open_start {
                content.push(close(os, replace_two_way(from, start, depth + 1)?)?);
            }
            add_range(Some(start), Some(end), depth, &mut content);
            if let Some(oe) = &open_end {
                content.push(close(oe, replace_two_way(end, to, depth + 1)?)?);
            }
        }
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

fn replace_two_way(from: &ResolvedPos, to: &ResolvedPos, depth: usize) -> Result<Fragment, ModelError> {
    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    if from.depth() > depth {
        let node = joinable(from, to, depth + 1)?;
        content.push(close(&node, replace_two_way(from, to, depth + 1)?)?);
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

/// Wrap the slice in copies of `along`'s ancestors so that it can be
/// resolved at the same depths as the replaced range.
fn prepare_slice_for_replace(
    slice: &Slice,
    along: &ResolvedPos,
) -> Result<(ResolvedPos, ResolvedPos), ModelError> {
    let extra = along.depth() - slice.open_start();
    let mut node = along.node(extra).copy(slice.content().clone());
    for i in (0..extra).rev() {
        node = along.node(i).copy(Fragment::from_node(node));
    }
    let start = node.resolve(slice.open_start() + extra)?;
    let end = node.resolve(node.content().size() - slice.open_end() - extra)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::tests::test_schema;

    fn para(text: &str) -> Node {
        let schema = test_schema();
        let content = if text.is_empty() {
            Fragment::empty()
        } else {
            Fragment::from_node(schema.text(text))
        };
        schema.node("paragraph", None, content).unwrap()
    }

    fn doc_of(nodes: Vec<Node>) -> Node {
        test_schema()
            .node("doc", None, Fragment::from_nodes(nodes))
            .unwrap()
    }

    #[test]
    fn deleting_across_paragraphs_joins_them() {
        let doc = doc_of(vec![para("one"), para("two")]);
        let result = doc.replace(3, 7, &Slice::empty()).unwrap();
        assert_eq!(result.to_string(), r#"doc(paragraph("onwo"))"#);
    }

    #[test]
    fn inserting_closed_nodes_between_blocks() {
        let doc = doc_of(vec![para("one")]);
        let slice = Slice::new(Fragment::from_node(para("two")), 0, 0);
        let result = doc.replace(5, 5, &slice).unwrap();
        assert_eq!(result.to_string(), r#"doc(paragraph("one"), paragraph("two"))"#);
    }

    #[test]
    fn open_slice_splits_a_paragraph() {
        let doc = doc_of(vec![para("onetwo")]);
        let slice = Slice::new(Fragment::from_nodes([para(""), para("")]), 1, 1);
        let result = doc.replace(4, 4, &slice).unwrap();
        assert_eq!(
            result.to_string(),
            r#"doc(paragraph("one"), paragraph("two"))"#
        );
    }

    #[test]
    fn mismatched_depths_are_rejected() {
        let doc = doc_of(vec![para("one")]);
        let slice = Slice::new(Fragment::from_node(para("x")), 1, 0);
        let err = doc.replace(2, 2, &slice).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Replace(ReplaceError::InconsistentOpenDepths { .. })
        ));
    }

    #[test]
    fn invalid_result_is_rejected() {
        let doc = doc_of(vec![para("one")]);
        let err = doc.replace(0, 5, &Slice::empty()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidContent { .. }));
    }
}
