//! Queries that decide whether a structural change is legal before any step
//! is built.

use listweave_model::{Attrs, Fragment, Node, NodeRange, NodeType};

/// One level of a wrapping chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrapper {
    pub node_type: NodeType,
    pub attrs: Option<Attrs>,
}

impl Wrapper {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            attrs: None,
        }
    }

    pub fn with_attrs(node_type: NodeType, attrs: Option<Attrs>) -> Self {
        Self { node_type, attrs }
    }

    pub(crate) fn create(&self, content: Fragment) -> Node {
        self.node_type.create(self.attrs.as_ref(), content)
    }
}

/// The chain of wrappers, outermost first, that puts the content of
/// `inner_range` inside a node of `target`, placed where `range` sits.
///
/// The chain is the wrappers `range`'s parent needs around `target`, then
/// `target` itself, then the wrappers `target` needs around the first
/// spanned child. The last of those must accept every spanned child.
pub fn find_wrapping(
    range: &NodeRange,
    target: &NodeType,
    attrs: Option<&Attrs>,
    inner_range: &NodeRange,
) -> Option<Vec<Wrapper>> {
    let around = find_wrapping_outside(range, target)?;
    let inner = find_wrapping_inside(inner_range, target)?;
    let mut chain: Vec<Wrapper> = around.into_iter().map(Wrapper::new).collect();
    chain.push(Wrapper::with_attrs(target.clone(), attrs.cloned()));
    chain.extend(inner.into_iter().map(Wrapper::new));
    Some(chain)
}

fn find_wrapping_outside(range: &NodeRange, target: &NodeType) -> Option<Vec<NodeType>> {
    let parent = range.parent();
    let around = parent
        .content_match_at(range.start_index())
        .ok()?
        .find_wrapping(target)?;
    let outer = around.first().unwrap_or(target);
    parent
        .can_replace_with(range.start_index(), range.end_index(), outer)
        .then_some(around)
}

fn find_wrapping_inside(range: &NodeRange, target: &NodeType) -> Option<Vec<NodeType>> {
    let parent = range.parent();
    let first = parent.maybe_child(range.start_index())?;
    let inside = target.content_match().find_wrapping(first.node_type())?;
    let last = inside.last().unwrap_or(target);
    let mut matched = Some(last.content_match());
    for i in range.start_index()..range.end_index() {
        matched = matched.and_then(|m| m.match_type(parent.child(i).node_type()));
    }
    matched.filter(|m| m.valid_end()).map(|_| inside)
}

/// Whether splitting at `pos`, `depth` levels deep, gives valid nodes.
///
/// `types_after` overrides the type of the right-hand node per level, outermost
/// first; `None` entries keep the original node's markup.
pub fn can_split(doc: &Node, pos: usize, depth: usize, types_after: &[Option<Wrapper>]) -> bool {
    let Ok(rpos) = doc.resolve(pos) else {
        return false;
    };
    let Some(base) = rpos.depth().checked_sub(depth).filter(|_| depth > 0) else {
        return false;
    };
    let parent = rpos.parent();
    let index = rpos.index(rpos.depth());
    let inner_type = types_after
        .last()
        .and_then(Option::as_ref)
        .map(|w| w.node_type.clone())
        .unwrap_or_else(|| parent.node_type().clone());
    if parent.node_type().isolating()
        || !parent.can_replace(index, parent.child_count(), &Fragment::empty(), 0, 0)
        || !inner_type.valid_content(&parent.content().cut_by_index(index, parent.child_count()))
    {
        return false;
    }

    let type_at = |i: usize| types_after.get(i).and_then(Option::as_ref);
    // Levels between the parent and the base, with `i` indexing `types_after`.
    for (d, i) in ((base + 1)..rpos.depth()).rev().zip((0..depth.saturating_sub(1)).rev()) {
        let node = rpos.node(d);
        let index = rpos.index(d);
        if node.node_type().isolating() {
            return false;
        }
        let mut rest = node.content().cut_by_index(index, node.child_count());
        if let Some(child) = type_at(i + 1) {
            rest = rest.replace_child(0, child.create(Fragment::empty()));
        }
        let after = type_at(i).map_or_else(|| node.node_type().clone(), |w| w.node_type.clone());
        if !node.can_replace(index + 1, node.child_count(), &Fragment::empty(), 0, 0)
            || !after.valid_content(&rest)
        {
            return false;
        }
    }

    let index = rpos.index_after(base);
    let base_type = type_at(0).map_or_else(|| rpos.node(base + 1).node_type().clone(), |w| w.node_type.clone());
    rpos.node(base).can_replace_with(index, index, &base_type)
}

/// The depth the content of `range` could be lifted to, by cutting it out of
/// every ancestor in between. `None` when no ancestor can take it.
pub fn lift_target(range: &NodeRange) -> Option<usize> {
    let parent = range.parent();
    let content = parent.content().cut_by_index(range.start_index(), range.end_index());
    let mut depth = range.depth();
    loop {
        let node = range.from().node(depth);
        let index = range.from().index(depth);
        let end_index = range.to().index_after(depth);
        if depth < range.depth() && node.can_replace(index, end_index, &content, 0, content.child_count()) {
            return Some(depth);
        }
        if depth == 0 || node.node_type().isolating() || !can_cut(node, index, end_index) {
            return None;
        }
        depth -= 1;
    }
}

/// Whether `node` stays valid with its children outside `start..end` split off.
fn can_cut(node: &Node, start: usize, end: usize) -> bool {
    let empty = Fragment::empty();
    (start == 0 || node.can_replace(start, node.child_count(), &empty, 0, 0))
        && (end == node.child_count() || node.can_replace(0, end, &empty, 0, 0))
}

/// Whether the nodes on both sides of `pos` can be joined into one.
pub fn can_join(doc: &Node, pos: usize) -> bool {
    let Ok(rpos) = doc.resolve(pos) else {
        return false;
    };
    let index = rpos.index(rpos.depth());
    match (rpos.node_before(), rpos.node_after()) {
        (Some(before), Some(after)) => {
            joinable(&before, &after)
                && rpos
                    .parent()
                    .can_replace(index, index + 1, &Fragment::empty(), 0, 0)
        }
        _ => false,
    }
}

/// Whether `b`'s content may be appended to `a`.
pub fn joinable(a: &Node, b: &Node) -> bool {
    !a.is_leaf() && a.can_append(b)
}

#[cfg(test)]
mod tests {
    use listweave_model::{Tagged, notation};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::schema::default_schema;

    fn parse(src: &str) -> Tagged {
        notation::parse(&default_schema(), src).unwrap()
    }

    fn range(t: &Tagged) -> NodeRange {
        let a = t.doc.resolve(t.tag("a").unwrap()).unwrap();
        let b = t.doc.resolve(t.tag("b").or(t.tag("a")).unwrap()).unwrap();
        a.block_range(&b).unwrap()
    }

    fn names(chain: &[Wrapper]) -> Vec<&str> {
        chain.iter().map(|w| w.node_type.name()).collect()
    }

    #[test]
    fn wrapping_a_paragraph_in_a_list_adds_an_item() {
        let t = parse(r#"doc(p("<a>foo"))"#);
        let r = range(&t);
        let list = default_schema().node_type("bullet_list").unwrap();
        let chain = find_wrapping(&r, &list, None, &r).unwrap();
        assert_eq!(names(&chain), vec!["bullet_list", "list_item"]);
    }

    #[test]
    fn no_wrapping_for_inline_targets() {
        let t = parse(r#"doc(p("<a>foo"))"#);
        let r = range(&t);
        let text = default_schema().text_type();
        assert_eq!(find_wrapping(&r, &text, None, &r), None);
    }

    #[rstest]
    #[case(r#"doc(ul(li(p("foo<a>bar"))))"#, 2, true)]
    #[case(r#"doc(ul(li(p("foo<a>bar"))))"#, 4, false)]
    #[case(r#"doc(p("foo<a>bar"))"#, 1, true)]
    #[case(r#"doc(p("foo<a>bar"))"#, 2, false)]
    fn split_legality(#[case] src: &str, #[case] depth: usize, #[case] expected: bool) {
        let t = parse(src);
        assert_eq!(can_split(&t.doc, t.tag("a").unwrap(), depth, &[]), expected);
    }

    #[test]
    fn split_with_a_type_override() {
        let schema = default_schema();
        let t = parse(r#"doc(ul(li(p("x"), h1("foo<a>"))))"#);
        assert!(!can_split(&t.doc, t.tag("a").unwrap(), 2, &[]));
        let para = Wrapper::new(schema.node_type("paragraph").unwrap());
        assert!(can_split(&t.doc, t.tag("a").unwrap(), 2, &[None, Some(para)]));
        let rule = Wrapper::new(schema.node_type("horizontal_rule").unwrap());
        assert!(!can_split(&t.doc, t.tag("a").unwrap(), 2, &[None, Some(rule)]));
    }

    #[test]
    fn lift_target_for_a_nested_item() {
        let t = parse(r#"doc(ul(li(p("a"), ul(li(p("<a>b"))))))"#);
        let from = t.doc.resolve(t.tag("a").unwrap()).unwrap();
        let r = from.block_range(&from).unwrap();
        assert_eq!(r.depth(), 4);
        // A paragraph cannot sit in a list, but fits in the outer item.
        assert_eq!(lift_target(&r), Some(2));
    }

    #[test]
    fn nothing_lifts_out_of_the_document() {
        let t = parse(r#"doc(p("<a>a"))"#);
        assert_eq!(lift_target(&range(&t)), None);
    }

    #[test]
    fn joins_adjacent_lists() {
        let t = parse(r#"doc(ul(li(p("a"))), "<a>", ul(li(p("b"))), "<b>", p("c"))"#);
        assert!(can_join(&t.doc, t.tag("a").unwrap()));
        assert!(!can_join(&t.doc, t.tag("b").unwrap()));
    }
}
