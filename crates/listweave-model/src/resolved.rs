//! Resolved positions and node ranges.
//!
//! A position is a plain `usize` counted in tokens from the start of the
//! document's content. [`ResolvedPos`] is the result of locating such a
//! position in a tree: the chain of ancestors from the document down to the
//! innermost node containing the position, with each ancestor's child index.
//! Resolution is an explicit query against one immutable document, so a
//! resolved position never outlives the version it was computed for.

use std::fmt;

use crate::error::ModelError;
use crate::node::Node;

#[derive(Clone)]
struct PathEntry {
    node: Node,
    index: usize,
    /// Absolute position of the child at `index`.
    offset: usize,
}

#[derive(Clone)]
pub struct ResolvedPos {
    pos: usize,
    path: Vec<PathEntry>,
    parent_offset: usize,
}

impl ResolvedPos {
    pub(crate) fn resolve(doc: &Node, pos: usize) -> Result<Self, ModelError> {
        let size = doc.content().size();
        if pos > size {
            return Err(ModelError::PositionOutOfRange { pos, size });
        }
        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc.clone();
        loop {
            let (index, offset) = node.content().find_index(parent_offset, -1)?;
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node: node.clone(),
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            let child = node.child(index).clone();
            if child.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
            node = child;
        }
        Ok(Self {
            pos,
            path,
            parent_offset,
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Number of ancestors between the document and the innermost parent.
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// Offset of the position inside its parent's content.
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    pub fn doc(&self) -> &Node {
        &self.path[0].node
    }

    /// The innermost node containing the position.
    pub fn parent(&self) -> &Node {
        self.node(self.depth())
    }

    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth].node
    }

    /// Index of the child at or after the position, in the ancestor at `depth`.
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Index pointing after the node at `depth + 1`.
    pub fn index_after(&self, depth: usize) -> usize {
        let at_boundary = depth == self.depth() && self.text_offset() == 0;
        self.index(depth) + usize::from(!at_boundary)
    }

    /// Start of the content of the ancestor at `depth`.
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content().size()
    }

    /// Position directly before the ancestor at `depth`.
    ///
    /// # Panics
    ///
    /// When `depth` is 0; the document has no position before it.
    pub fn before(&self, depth: usize) -> usize {
        assert!(depth > 0, "there is no position before the top-level node");
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset
        }
    }

    /// Position directly after the ancestor at `depth`.
    ///
    /// # Panics
    ///
    /// When `depth` is 0.
    pub fn after(&self, depth: usize) -> usize {
        assert!(depth > 0, "there is no position after the top-level node");
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset + self.path[depth].node.node_size()
        }
    }

    /// Distance into a text node, or 0 between nodes.
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth()].offset
    }

    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let child = parent.maybe_child(index)?;
        let offset = self.text_offset();
        Some(if offset > 0 {
            child.cut(offset, child.node_size())
        } else {
            child.clone()
        })
    }

    pub fn node_before(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let offset = self.text_offset();
        if offset > 0 {
            return Some(parent.child(index).cut(0, offset));
        }
        if index == 0 {
            None
        } else {
            Some(parent.child(index - 1).clone())
        }
    }

    /// Absolute position of the child at `index` of the ancestor at `depth`.
    pub fn pos_at_index(&self, index: usize, depth: usize) -> usize {
        let node = self.node(depth);
        let mut pos = self.start(depth);
        for i in 0..index.min(node.child_count()) {
            pos += node.child(i).node_size();
        }
        pos
    }

    /// Deepest depth whose node contains both this position and `pos`.
    pub fn shared_depth(&self, pos: usize) -> usize {
        (1..=self.depth())
            .rev()
            .find(|&d| self.start(d) <= pos && self.end(d) >= pos)
            .unwrap_or(0)
    }

    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.pos - self.parent_offset == other.pos - other.parent_offset
    }

    /// The range of sibling blocks spanned by this position and `other`.
    pub fn block_range(&self, other: &ResolvedPos) -> Option<NodeRange> {
        self.block_range_where(other, |_| true)
    }

    /// Like [`block_range`](Self::block_range), but only ranges whose parent
    /// satisfies `pred` are considered.
    pub fn block_range_where<P>(&self, other: &ResolvedPos, pred: P) -> Option<NodeRange>
    where
        P: Fn(&Node) -> bool,
    {
        if other.pos < self.pos {
            return other.block_range_where(self, pred);
        }
        let skip_inline = self.parent().inline_content() || self.pos == other.pos;
        let top = if skip_inline {
            self.depth().checked_sub(1)?
        } else {
            self.depth()
        };
        (0..=top)
            .rev()
            .find(|&d| other.pos <= self.end(d) && pred(self.node(d)))
            .map(|d| NodeRange::new(self.clone(), other.clone(), d))
    }
}

impl fmt::Debug for ResolvedPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = String::new();
        for d in 1..=self.depth() {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(&format!("{}_{}", self.node(d).node_type().name(), self.index(d - 1)));
        }
        write!(f, "{path}:{}", self.parent_offset)
    }
}

/// A flat range of sibling nodes: children `start_index..end_index` of the
/// node at `depth`.
#[derive(Clone, Debug)]
pub struct NodeRange {
    from: ResolvedPos,
    to: ResolvedPos,
    depth: usize,
}

impl NodeRange {
    pub fn new(from: ResolvedPos, to: ResolvedPos, depth: usize) -> Self {
        Self { from, to, depth }
    }

    pub fn from(&self) -> &ResolvedPos {
        &self.from
    }

    pub fn to(&self) -> &ResolvedPos {
        &self.to
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Position before the first spanned child.
    pub fn start(&self) -> usize {
        self.from.before(self.depth + 1)
    }

    /// Position after the last spanned child.
    pub fn end(&self) -> usize {
        self.to.after(self.depth + 1)
    }

    pub fn parent(&self) -> &Node {
        self.from.node(self.depth)
    }

    pub fn start_index(&self) -> usize {
        self.from.index(self.depth)
    }

    pub fn end_index(&self) -> usize {
        self.to.index_after(self.depth)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::schema::tests::test_schema;
    use crate::{Fragment, Node};

    // doc(bullet_list(list_item(paragraph("one")), list_item(paragraph("two"))))
    fn list_doc() -> Node {
        let schema = test_schema();
        let item = |text: &str| {
            let para = schema
                .node("paragraph", None, Fragment::from_node(schema.text(text)))
                .unwrap();
            schema.node("list_item", None, Fragment::from_node(para)).unwrap()
        };
        let list = schema
            .node("bullet_list", None, Fragment::from_nodes([item("one"), item("two")]))
            .unwrap();
        schema.node("doc", None, Fragment::from_node(list)).unwrap()
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 1, 0)]
    #[case(3, 3, 0)]
    #[case(4, 3, 1)]
    #[case(8, 1, 7)]
    #[case(9, 2, 0)]
    #[case(10, 3, 0)]
    #[case(12, 3, 2)]
    #[case(16, 0, 16)]
    fn resolves_depth_and_offset(
        #[case] pos: usize,
        #[case] depth: usize,
        #[case] parent_offset: usize,
    ) {
        let doc = list_doc();
        let rp = doc.resolve(pos).unwrap();
        assert_eq!(rp.depth(), depth);
        assert_eq!(rp.parent_offset(), parent_offset);
    }

    #[test]
    fn ancestor_boundaries() {
        let doc = list_doc();
        let rp = doc.resolve(11).unwrap();
        assert_eq!(rp.parent().node_type().name(), "paragraph");
        assert_eq!(rp.start(3), 10);
        assert_eq!(rp.end(3), 13);
        assert_eq!(rp.before(3), 9);
        assert_eq!(rp.after(3), 14);
        assert_eq!(rp.before(2), 8);
        assert_eq!(rp.after(2), 15);
        assert_eq!(rp.index(1), 1);
        assert_eq!(rp.text_offset(), 1);
        assert_eq!(rp.node_after().unwrap().text(), Some("wo"));
        assert_eq!(rp.node_before().unwrap().text(), Some("t"));
    }

    #[test]
    fn out_of_range_is_an_error() {
        let doc = list_doc();
        assert!(doc.resolve(17).is_err());
    }

    #[test]
    fn block_range_spans_items() {
        let doc = list_doc();
        let from = doc.resolve(4).unwrap();
        let to = doc.resolve(11).unwrap();
        let range = from.block_range(&to).unwrap();
        assert_eq!(range.depth(), 1);
        assert_eq!(range.start(), 1);
        assert_eq!(range.end(), 15);
        assert_eq!((range.start_index(), range.end_index()), (0, 2));
    }

    #[test]
    fn block_range_with_predicate_climbs() {
        let doc = list_doc();
        let from = doc.resolve(4).unwrap();
        let range = from
            .block_range_where(&from, |n| n.node_type().name() == "doc")
            .unwrap();
        assert_eq!(range.depth(), 0);
        assert_eq!(range.start(), 0);
        assert_eq!(range.end(), 16);
    }

    #[test]
    fn shared_depth_of_sibling_items() {
        let doc = list_doc();
        let from = doc.resolve(4).unwrap();
        assert_eq!(from.shared_depth(11), 1);
        assert_eq!(from.shared_depth(5), 3);
    }
}
