//! Schema: the table of node types a document may use.
//!
//! Node types are interned: a [`NodeType`] is a handle (shared schema plus a
//! numeric id) and all of its capabilities are looked up in the schema table.
//! Two handles are equal when they name the same type of the same schema.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::attrs::{AttrSpec, AttrValue, Attrs};
use crate::content::{ContentExpr, ContentMatch};
use crate::error::ModelError;
use crate::fragment::Fragment;
use crate::node::Node;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown node type or group {name:?} in content expression {expr:?}")]
    UnknownName { name: String, expr: String },

    #[error("invalid content expression {expr:?}: {reason}")]
    InvalidContentExpr { expr: String, reason: String },

    #[error("content expression of {node_type} mixes inline and block content")]
    MixedContent { node_type: String },

    #[error("schema is missing the {0:?} node type")]
    MissingType(String),

    #[error("too many node types ({0})")]
    TooManyTypes(usize),
}

/// Declaration of a node type, before compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSpec {
    /// Content expression. `None` makes the type a leaf.
    pub content: Option<String>,
    /// Space separated group names.
    pub group: Option<String>,
    pub attrs: BTreeMap<String, AttrSpec>,
    pub inline: bool,
    /// Leaf-like even when it has content; selections never enter it.
    pub atom: bool,
    /// Content of this node is preserved as a unit when its surroundings are
    /// replaced (list items, headings).
    pub defining: bool,
    /// Structural edits never cross this node's boundary.
    pub isolating: bool,
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content = Some(expr.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, spec: AttrSpec) -> Self {
        self.attrs.insert(name.into(), spec);
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn defining(mut self) -> Self {
        self.defining = true;
        self
    }

    pub fn isolating(mut self) -> Self {
        self.isolating = true;
        self
    }
}

/// Ordered collection of named node specs. Order decides group member order
/// and therefore which type is picked as a default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSpecs(Vec<(String, NodeSpec)>);

impl NodeSpecs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace in place) a spec.
    pub fn with(mut self, name: impl Into<String>, spec: NodeSpec) -> Self {
        self.update(name, spec);
        self
    }

    pub fn update(&mut self, name: impl Into<String>, spec: NodeSpec) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = spec,
            None => self.0.push((name, spec)),
        }
    }

    /// Append `other`, moving any names it redefines to the end.
    pub fn append(mut self, other: NodeSpecs) -> Self {
        self.0.retain(|(name, _)| other.get(name).is_none());
        self.0.extend(other.0);
        self
    }

    /// Insert `name` directly before `place` (or at the end if `place` is absent).
    pub fn add_before(mut self, place: &str, name: impl Into<String>, spec: NodeSpec) -> Self {
        let name = name.into();
        self.0.retain(|(n, _)| *n != name);
        let at = self
            .0
            .iter()
            .position(|(n, _)| n == place)
            .unwrap_or(self.0.len());
        self.0.insert(at, (name, spec));
        self
    }

    pub fn get(&self, name: &str) -> Option<&NodeSpec> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeSpec)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaSpec {
    pub nodes: NodeSpecs,
    /// Name of the document node type. Defaults to `"doc"`.
    pub top_node: Option<String>,
}

#[derive(Debug)]
pub(crate) struct TypeData {
    name: String,
    groups: Vec<String>,
    attrs: BTreeMap<String, AttrSpec>,
    content: ContentExpr,
    inline: bool,
    atom: bool,
    defining: bool,
    isolating: bool,
    inline_content: bool,
}

#[derive(Debug)]
struct SchemaInner {
    types: Vec<TypeData>,
    top: u16,
    text: u16,
}

/// A compiled schema. Cheap to clone.
#[derive(Clone)]
pub struct Schema(Arc<SchemaInner>);

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.types.iter().map(|t| &t.name))
            .finish()
    }
}

impl Schema {
    pub fn new(spec: SchemaSpec) -> Result<Self, SchemaError> {
        let names: Vec<&str> = spec.nodes.iter().map(|(n, _)| n).collect();
        if names.len() > u16::MAX as usize {
            return Err(SchemaError::TooManyTypes(names.len()));
        }
        let group_lists: Vec<Vec<String>> = spec
            .nodes
            .iter()
            .map(|(_, s)| {
                s.group
                    .as_deref()
                    .unwrap_or("")
                    .split_whitespace()
                    .map(str::to_string)
                    .collect()
            })
            .collect();

        let lookup = |name: &str| -> Option<Vec<u16>> {
            if let Some(i) = names.iter().position(|n| *n == name) {
                return Some(vec![i as u16]);
            }
            let members: Vec<u16> = group_lists
                .iter()
                .enumerate()
                .filter(|(_, groups)| groups.iter().any(|g| g == name))
                .map(|(i, _)| i as u16)
                .collect();
            (!members.is_empty()).then_some(members)
        };

        let top_name = spec.top_node.as_deref().unwrap_or("doc");
        let top = names
            .iter()
            .position(|n| *n == top_name)
            .ok_or_else(|| SchemaError::MissingType(top_name.to_string()))? as u16;
        let text = names
            .iter()
            .position(|n| *n == "text")
            .ok_or_else(|| SchemaError::MissingType("text".to_string()))? as u16;

        let mut types = Vec::with_capacity(names.len());
        for (i, (name, node_spec)) in spec.nodes.iter().enumerate() {
            let content = match &node_spec.content {
                Some(expr) => ContentExpr::parse(expr, &lookup)?,
                None => ContentExpr::default(),
            };
            types.push(TypeData {
                name: name.to_string(),
                groups: group_lists[i].clone(),
                attrs: node_spec.attrs.clone(),
                content,
                inline: node_spec.inline || i as u16 == text,
                atom: node_spec.atom,
                defining: node_spec.defining,
                isolating: node_spec.isolating,
                inline_content: false,
            });
        }

        for i in 0..types.len() {
            let (mut inline, mut block) = (false, false);
            for id in types[i].content.mentioned() {
                if types[id as usize].inline {
                    inline = true;
                } else {
                    block = true;
                }
            }
            if inline && block {
                return Err(SchemaError::MixedContent {
                    node_type: types[i].name.clone(),
                });
            }
            types[i].inline_content = inline;
        }

        Ok(Schema(Arc::new(SchemaInner { types, top, text })))
    }

    pub(crate) fn ptr_eq(a: &Schema, b: &Schema) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn type_name(&self, id: u16) -> &str {
        &self.0.types[id as usize].name
    }

    pub(crate) fn content_expr(&self, id: u16) -> &ContentExpr {
        &self.0.types[id as usize].content
    }

    pub(crate) fn type_by_id(&self, id: u16) -> NodeType {
        NodeType {
            schema: self.clone(),
            id,
        }
    }

    pub fn node_type(&self, name: &str) -> Option<NodeType> {
        self.0
            .types
            .iter()
            .position(|t| t.name == name)
            .map(|i| self.type_by_id(i as u16))
    }

    pub fn node_types(&self) -> impl Iterator<Item = NodeType> + '_ {
        (0..self.0.types.len()).map(|i| self.type_by_id(i as u16))
    }

    pub fn top_node_type(&self) -> NodeType {
        self.type_by_id(self.0.top)
    }

    pub fn text_type(&self) -> NodeType {
        self.type_by_id(self.0.text)
    }

    /// A text node. Empty text is not a valid node; callers should skip it.
    pub fn text(&self, text: &str) -> Node {
        Node::new_text(self.text_type(), text.to_string())
    }

    /// Create a node by type name, checking attributes and content.
    pub fn node(
        &self,
        name: &str,
        attrs: Option<&Attrs>,
        content: Fragment,
    ) -> Result<Node, ModelError> {
        let node_type = self.node_type(name).ok_or_else(|| ModelError::InvalidContent {
            node_type: name.to_string(),
            content: "unknown node type".to_string(),
        })?;
        node_type.create_checked(attrs, content)
    }
}

/// Handle to a node type of a schema.
#[derive(Clone)]
pub struct NodeType {
    schema: Schema,
    id: u16,
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Schema::ptr_eq(&self.schema, &other.schema)
    }
}

impl Eq for NodeType {}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({})", self.name())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl NodeType {
    fn data(&self) -> &TypeData {
        &self.schema.0.types[self.id as usize]
    }

    pub(crate) fn id(&self) -> u16 {
        self.id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn groups(&self) -> &[String] {
        &self.data().groups
    }

    pub fn is_in_group(&self, group: &str) -> bool {
        self.data().groups.iter().any(|g| g == group)
    }

    pub fn is_text(&self) -> bool {
        self.id == self.schema.0.text
    }

    pub fn is_inline(&self) -> bool {
        self.data().inline
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }

    pub fn inline_content(&self) -> bool {
        self.data().inline_content
    }

    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.inline_content()
    }

    pub fn is_leaf(&self) -> bool {
        self.data().content.is_empty()
    }

    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.data().atom
    }

    pub fn defining(&self) -> bool {
        self.data().defining
    }

    pub fn isolating(&self) -> bool {
        self.data().isolating
    }

    pub fn attr_specs(&self) -> &BTreeMap<String, AttrSpec> {
        &self.data().attrs
    }

    pub fn has_required_attrs(&self) -> bool {
        self.data().attrs.values().any(|a| a.default.is_none())
    }

    /// Start state of this type's content expression.
    pub fn content_match(&self) -> ContentMatch {
        ContentMatch::start(self.schema.clone(), self.id)
    }

    /// Whether nodes of this type and `other` can take the same kind of content.
    pub fn compatible_content(&self, other: &NodeType) -> bool {
        self == other || self.content_match().compatible(&other.content_match())
    }

    pub fn valid_content(&self, content: &Fragment) -> bool {
        self.content_match()
            .match_fragment(content)
            .is_some_and(|m| m.valid_end())
    }

    pub fn check_content(&self, content: &Fragment) -> Result<(), ModelError> {
        if self.valid_content(content) {
            Ok(())
        } else {
            Err(ModelError::InvalidContent {
                node_type: self.name().to_string(),
                content: content.to_string(),
            })
        }
    }

    /// Complete `given` with defaults, failing on a missing required attribute.
    pub fn compute_attrs(&self, given: Option<&Attrs>) -> Result<Attrs, ModelError> {
        let mut attrs = Attrs::new();
        for (name, spec) in &self.data().attrs {
            let value = given
                .and_then(|g| g.get(name).cloned())
                .or_else(|| spec.default.clone())
                .ok_or_else(|| ModelError::MissingAttribute {
                    node_type: self.name().to_string(),
                    attr: name.clone(),
                })?;
            attrs.insert(name.clone(), value);
        }
        Ok(attrs)
    }

    /// Like [`compute_attrs`](Self::compute_attrs), but a missing required
    /// attribute becomes [`AttrValue::Null`].
    fn lenient_attrs(&self, given: Option<&Attrs>) -> Attrs {
        self.data()
            .attrs
            .iter()
            .map(|(name, spec)| {
                let value = given
                    .and_then(|g| g.get(name).cloned())
                    .or_else(|| spec.default.clone())
                    .unwrap_or(AttrValue::Null);
                (name.clone(), value)
            })
            .collect()
    }

    /// Create a node without checking its content. Used for open slice shells,
    /// whose content is completed by the surrounding document.
    pub fn create(&self, attrs: Option<&Attrs>, content: Fragment) -> Node {
        Node::new(self.clone(), self.lenient_attrs(attrs), content)
    }

    pub fn create_checked(&self, attrs: Option<&Attrs>, content: Fragment) -> Result<Node, ModelError> {
        let attrs = self.compute_attrs(attrs)?;
        self.check_content(&content)?;
        Ok(Node::new(self.clone(), attrs, content))
    }

    /// Create a node, adding whatever required content is missing around
    /// `content`. `None` when no valid filling exists.
    pub fn create_and_fill(&self, attrs: Option<&Attrs>, content: Fragment) -> Option<Node> {
        let attrs = self.compute_attrs(attrs).ok()?;
        let mut content = content;
        if content.size() > 0 {
            let before = self.content_match().fill_before(&content, false)?;
            content = before.append(&content);
        }
        let matched = self.content_match().match_fragment(&content)?;
        let after = matched.fill_before(&Fragment::empty(), true)?;
        Some(Node::new(self.clone(), attrs, content.append(&after)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::OnceLock;

    use super::*;

    /// Small schema with paragraphs, blockquotes and lists used across the
    /// crate's unit tests. Shared, so nodes built in different helpers agree
    /// on their types.
    pub(crate) fn test_schema() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(build_test_schema).clone()
    }

    fn build_test_schema() -> Schema {
        let nodes = NodeSpecs::new()
            .with("doc", NodeSpec::new().content("block+"))
            .with("paragraph", NodeSpec::new().content("inline*").group("block"))
            .with("blockquote", NodeSpec::new().content("block+").group("block"))
            .with(
                "heading",
                NodeSpec::new()
                    .content("inline*")
                    .group("block")
                    .attr("level", AttrSpec::with_default(1))
                    .defining(),
            )
            .with("horizontal_rule", NodeSpec::new().group("block"))
            .with("para_tail", NodeSpec::new().content("block* paragraph"))
            .with("text", NodeSpec::new().group("inline"))
            .with(
                "ordered_list",
                NodeSpec::new()
                    .content("list_item+")
                    .group("block")
                    .attr("order", AttrSpec::with_default(1)),
            )
            .with("bullet_list", NodeSpec::new().content("list_item+").group("block"))
            .with(
                "list_item",
                NodeSpec::new().content("paragraph block*").defining(),
            );
        Schema::new(SchemaSpec {
            nodes,
            top_node: None,
        })
        .unwrap()
    }

    #[test]
    fn compiles_type_flags() {
        let schema = test_schema();
        let paragraph = schema.node_type("paragraph").unwrap();
        let item = schema.node_type("list_item").unwrap();
        let rule = schema.node_type("horizontal_rule").unwrap();

        assert!(paragraph.is_textblock());
        assert!(!item.is_textblock());
        assert!(item.defining());
        assert!(rule.is_leaf());
        assert!(schema.text_type().is_inline());
        assert!(schema.text_type().is_text());
    }

    #[test]
    fn unknown_names_are_rejected() {
        let nodes = NodeSpecs::new()
            .with("doc", NodeSpec::new().content("missing+"))
            .with("text", NodeSpec::new());
        let err = Schema::new(SchemaSpec {
            nodes,
            top_node: None,
        })
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownName { .. }));
    }

    #[test]
    fn mixed_content_is_rejected() {
        let nodes = NodeSpecs::new()
            .with("doc", NodeSpec::new().content("(paragraph | text)*"))
            .with("paragraph", NodeSpec::new().content("text*"))
            .with("text", NodeSpec::new());
        let err = Schema::new(SchemaSpec {
            nodes,
            top_node: None,
        })
        .unwrap_err();
        assert!(matches!(err, SchemaError::MixedContent { .. }));
    }

    #[test]
    fn append_moves_redefined_names_to_the_end() {
        let specs = NodeSpecs::new()
            .with("doc", NodeSpec::new())
            .with("text", NodeSpec::new())
            .append(NodeSpecs::new().with("doc", NodeSpec::new().content("text*")));
        let names: Vec<_> = specs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["text", "doc"]);
    }

    #[test]
    fn compute_attrs_fills_defaults() {
        let schema = test_schema();
        let ordered = schema.node_type("ordered_list").unwrap();
        let attrs = ordered.compute_attrs(None).unwrap();
        assert_eq!(attrs.get("order"), Some(&AttrValue::Int(1)));
    }

    #[test]
    fn create_and_fill_adds_required_children() {
        let schema = test_schema();
        let item = schema.node_type("list_item").unwrap();
        let filled = item.create_and_fill(None, Fragment::empty()).unwrap();
        assert_eq!(filled.to_string(), "list_item(paragraph())");
    }
}
