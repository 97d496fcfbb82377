use std::fmt::{self, Write as _};
use std::sync::Arc;

use crate::attrs::{AttrValue, Attrs};
use crate::content::ContentMatch;
use crate::error::ModelError;
use crate::fragment::Fragment;
use crate::replace;
use crate::resolved::ResolvedPos;
use crate::schema::NodeType;
use crate::slice::Slice;

#[derive(PartialEq)]
struct NodeInner {
    node_type: NodeType,
    attrs: Attrs,
    content: Fragment,
    text: Option<String>,
    /// Character count for text nodes.
    text_len: usize,
}

/// An immutable document node. Cloning is cheap; edits build new nodes that
/// share unchanged subtrees with the old ones.
///
/// Positions inside a node count one token per character of text, one for a
/// leaf, and one each for the start and end of every other node.
#[derive(Clone, PartialEq)]
pub struct Node(Arc<NodeInner>);

impl Node {
    pub(crate) fn new(node_type: NodeType, attrs: Attrs, content: Fragment) -> Self {
        Node(Arc::new(NodeInner {
            node_type,
            attrs,
            content,
            text: None,
            text_len: 0,
        }))
    }

    pub(crate) fn new_text(node_type: NodeType, text: String) -> Self {
        let text_len = text.chars().count();
        Node(Arc::new(NodeInner {
            node_type,
            attrs: Attrs::new(),
            content: Fragment::empty(),
            text: Some(text),
            text_len,
        }))
    }

    pub fn node_type(&self) -> &NodeType {
        &self.0.node_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.0.attrs.get(name)
    }

    pub fn content(&self) -> &Fragment {
        &self.0.content
    }

    pub fn text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    pub fn node_size(&self) -> usize {
        if self.is_text() {
            self.0.text_len
        } else if self.is_leaf() {
            1
        } else {
            self.0.content.size() + 2
        }
    }

    pub fn child_count(&self) -> usize {
        self.0.content.child_count()
    }

    pub fn child(&self, index: usize) -> &Node {
        self.0.content.child(index)
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.0.content.maybe_child(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.0.content.first_child()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.0.content.last_child()
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.node_type.is_leaf()
    }

    pub fn is_atom(&self) -> bool {
        self.0.node_type.is_atom()
    }

    pub fn is_inline(&self) -> bool {
        self.0.node_type.is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.0.node_type.is_block()
    }

    pub fn is_textblock(&self) -> bool {
        self.0.node_type.is_textblock()
    }

    pub fn inline_content(&self) -> bool {
        self.0.node_type.inline_content()
    }

    pub fn text_content(&self) -> String {
        match self.text() {
            Some(text) => text.to_string(),
            None => self.0.content.text_between(0, self.0.content.size(), ""),
        }
    }

    /// Whether `other` has the same type and attributes.
    pub fn same_markup(&self, other: &Node) -> bool {
        self.has_markup(other.node_type(), other.attrs())
    }

    pub fn has_markup(&self, node_type: &NodeType, attrs: &Attrs) -> bool {
        self.node_type() == node_type && self.attrs() == attrs
    }

    /// A node with the same markup and different content.
    pub fn copy(&self, content: Fragment) -> Node {
        Node::new(self.0.node_type.clone(), self.0.attrs.clone(), content)
    }

    pub(crate) fn with_text(&self, text: String) -> Node {
        Node::new_text(self.0.node_type.clone(), text)
    }

    /// Merge two adjacent text nodes.
    pub(crate) fn join_text(&self, other: &Node) -> Option<Node> {
        let (a, b) = (self.text()?, other.text()?);
        (self.node_type() == other.node_type()).then(|| self.with_text(format!("{a}{b}")))
    }

    /// This node with its content cut to `[from, to)`. For text nodes the
    /// offsets are character offsets.
    pub fn cut(&self, from: usize, to: usize) -> Node {
        if let Some(text) = self.text() {
            if from == 0 && to == self.0.text_len {
                return self.clone();
            }
            return self.with_text(text.chars().skip(from).take(to - from).collect());
        }
        if from == 0 && to == self.0.content.size() {
            return self.clone();
        }
        self.copy(self.0.content.cut(from, to))
    }

    /// The content between two positions, with open depths set where the
    /// positions lie inside nodes.
    pub fn slice(&self, from: usize, to: usize) -> Result<Slice, ModelError> {
        if from == to {
            return Ok(Slice::empty());
        }
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        let depth = rfrom.shared_depth(to);
        let start = rfrom.start(depth);
        let content = rfrom.node(depth).content().cut(from - start, to - start);
        Ok(Slice::new(content, rfrom.depth() - depth, rto.depth() - depth))
    }

    /// Replace `[from, to)` with `slice`. The slice must fit: its open sides
    /// have to line up with the depths of the two positions.
    pub fn replace(&self, from: usize, to: usize, slice: &Slice) -> Result<Node, ModelError> {
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        replace::replace(&rfrom, &rto, slice)
    }

    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, ModelError> {
        ResolvedPos::resolve(self, pos)
    }

    /// The node directly after `pos`, if any.
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut node = self;
        let mut pos = pos;
        loop {
            let (index, offset) = node.content().find_index(pos, -1).ok()?;
            let child = node.maybe_child(index)?;
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos -= offset + 1;
            node = child;
        }
    }

    pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.0.content.nodes_between_inner(from, to, f, 0, Some(self));
    }

    pub fn descendants<F>(&self, f: &mut F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.nodes_between(0, self.0.content.size(), f);
    }

    pub fn content_match_at(&self, index: usize) -> Result<ContentMatch, ModelError> {
        self.0
            .node_type
            .content_match()
            .match_fragment_range(&self.0.content, 0, index)
            .ok_or_else(|| ModelError::NoContentMatch {
                node_type: self.0.node_type.name().to_string(),
                index,
            })
    }

    /// Whether replacing children `from..to` with children `start..end` of
    /// `replacement` leaves this node's content valid.
    pub fn can_replace(&self, from: usize, to: usize, replacement: &Fragment, start: usize, end: usize) -> bool {
        let Ok(before) = self.content_match_at(from) else {
            return false;
        };
        before
            .match_fragment_range(replacement, start, end)
            .and_then(|m| m.match_fragment_range(&self.0.content, to, self.child_count()))
            .is_some_and(|m| m.valid_end())
    }

    /// Whether children `from..to` can be replaced by a single node of `node_type`.
    pub fn can_replace_with(&self, from: usize, to: usize, node_type: &NodeType) -> bool {
        let Ok(before) = self.content_match_at(from) else {
            return false;
        };
        before
            .match_type(node_type)
            .and_then(|m| m.match_fragment_range(&self.0.content, to, self.child_count()))
            .is_some_and(|m| m.valid_end())
    }

    /// Whether `other`'s content could be appended to this node.
    pub fn can_append(&self, other: &Node) -> bool {
        if other.content().size() > 0 {
            let n = self.child_count();
            self.can_replace(n, n, other.content(), 0, other.child_count())
        } else {
            self.node_type().compatible_content(other.node_type())
        }
    }

    /// Validate this node's content, and that of all descendants, against
    /// the schema.
    pub fn check(&self) -> Result<(), ModelError> {
        self.0.node_type.check_content(&self.0.content)?;
        self.0.node_type.compute_attrs(Some(&self.0.attrs))?;
        for child in &self.0.content {
            child.check()?;
        }
        Ok(())
    }
}

pub(crate) fn write_escaped_char(f: &mut impl fmt::Write, c: char) -> fmt::Result {
    match c {
        '"' | '\\' | '<' => {
            f.write_char('\\')?;
            f.write_char(c)
        }
        '\n' => f.write_str("\\n"),
        _ => f.write_char(c),
    }
}

impl Node {
    /// Type name and non-default attributes, as written in notation.
    pub(crate) fn write_head(&self, f: &mut impl fmt::Write) -> fmt::Result {
        f.write_str(self.node_type().name())?;
        let specs = self.node_type().attr_specs();
        let shown: Vec<_> = self
            .attrs()
            .iter()
            .filter(|(name, value)| specs.get(*name).and_then(|s| s.default.as_ref()) != Some(*value))
            .collect();
        if shown.is_empty() {
            return Ok(());
        }
        f.write_char('[')?;
        for (i, (name, value)) in shown.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_char(']')
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.text() {
            f.write_char('"')?;
            for c in text.chars() {
                write_escaped_char(f, c)?;
            }
            return f.write_char('"');
        }
        self.write_head(f)?;
        if !self.is_leaf() {
            write!(f, "({})", self.content())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::attrs::AttrValue;
    use crate::schema::tests::test_schema;

    fn para(text: &str) -> Node {
        let schema = test_schema();
        schema
            .node("paragraph", None, Fragment::from_node(schema.text(text)))
            .unwrap()
    }

    fn doc_of(nodes: Vec<Node>) -> Node {
        test_schema()
            .node("doc", None, Fragment::from_nodes(nodes))
            .unwrap()
    }

    #[test]
    fn sizes_follow_token_counting() {
        let p = para("héllo");
        assert_eq!(p.node_size(), 7);
        let doc = doc_of(vec![p.clone(), p]);
        assert_eq!(doc.content().size(), 14);
        assert_eq!(doc.node_size(), 16);
    }

    #[test]
    fn display_shows_non_default_attrs() {
        let schema = test_schema();
        let item = schema
            .node("list_item", None, Fragment::from_node(para("x")))
            .unwrap();
        let mut attrs = Attrs::new();
        attrs.insert("order".to_string(), AttrValue::Int(3));
        let list = schema
            .node("ordered_list", Some(&attrs), Fragment::from_node(item.clone()))
            .unwrap();
        assert_eq!(list.to_string(), r#"ordered_list[order=3](list_item(paragraph("x")))"#);

        let plain = schema
            .node("ordered_list", None, Fragment::from_node(item))
            .unwrap();
        assert_eq!(plain.to_string(), r#"ordered_list(list_item(paragraph("x")))"#);
    }

    #[test]
    fn text_literals_escape_tags() {
        assert_eq!(para(r#"a<b>"c""#).to_string(), r#"paragraph("a\<b>\"c\"")"#);
    }

    #[test]
    fn slice_between_paragraphs_is_open() {
        let doc = doc_of(vec![para("one"), para("two")]);
        let slice = doc.slice(2, 8).unwrap();
        assert_eq!(slice.open_start(), 1);
        assert_eq!(slice.open_end(), 1);
        assert_eq!(slice.content().to_string(), r#"paragraph("ne"), paragraph("tw")"#);
    }

    #[test]
    fn can_replace_checks_the_whole_content() {
        let schema = test_schema();
        let item = schema
            .node("list_item", None, Fragment::from_node(para("x")))
            .unwrap();
        let list = schema
            .node("bullet_list", None, Fragment::from_node(item.clone()))
            .unwrap();

        assert!(!list.can_replace(0, 1, &Fragment::empty(), 0, 0));
        assert!(list.can_replace(1, 1, &Fragment::from_node(item), 0, 1));
        assert!(!list.can_replace(1, 1, &Fragment::from_node(para("y")), 0, 1));
    }

    #[test]
    fn check_finds_invalid_descendants() {
        let schema = test_schema();
        let bad_item = schema
            .node_type("list_item")
            .unwrap()
            .create(None, Fragment::empty());
        let list = schema
            .node_type("bullet_list")
            .unwrap()
            .create(None, Fragment::from_node(bad_item));
        assert!(matches!(list.check(), Err(ModelError::InvalidContent { .. })));
    }

    #[test]
    fn node_at_finds_nested_nodes() {
        let doc = doc_of(vec![para("one"), para("two")]);
        assert_eq!(doc.node_at(0).unwrap().node_type().name(), "paragraph");
        assert_eq!(doc.node_at(6).unwrap().text(), Some("two"));
        assert!(doc.node_at(10).is_none());
    }
}
