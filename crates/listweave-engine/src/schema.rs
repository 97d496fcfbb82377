//! Node specs for list nodes, and a ready-made schema that uses them.
//!
//! The list commands do not hard-code type names. They take the list and
//! item types as arguments, so any schema that registers list nodes through
//! [`add_list_nodes`] (or declares equivalent ones) works with them.

use std::sync::OnceLock;

use listweave_model::{AttrSpec, NodeSpec, NodeSpecs, Schema, SchemaError, SchemaSpec};

/// An ordered list. Its `order` attribute is the number of the first item.
pub fn ordered_list_spec() -> NodeSpec {
    NodeSpec::new().attr("order", AttrSpec::with_default(1))
}

pub fn bullet_list_spec() -> NodeSpec {
    NodeSpec::new()
}

/// A list item. Defining, so its content is kept together when the
/// surrounding structure is replaced.
pub fn list_item_spec() -> NodeSpec {
    NodeSpec::new().defining()
}

/// Add `ordered_list`, `bullet_list` and `list_item` to `nodes`.
///
/// Lists hold one or more items and join `list_group` when given. Items hold
/// `item_content`, e.g. `"paragraph block*"`.
pub fn add_list_nodes(nodes: NodeSpecs, item_content: &str, list_group: Option<&str>) -> NodeSpecs {
    let list = |spec: NodeSpec| {
        let spec = spec.content("list_item+");
        match list_group {
            Some(group) => spec.group(group),
            None => spec,
        }
    };
    nodes.append(
        NodeSpecs::new()
            .with("ordered_list", list(ordered_list_spec()))
            .with("bullet_list", list(bullet_list_spec()))
            .with("list_item", list_item_spec().content(item_content)),
    )
}

/// Documents of paragraphs, blockquotes, headings, code blocks and rules.
pub fn basic_nodes() -> NodeSpecs {
    NodeSpecs::new()
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
        .with("code_block", NodeSpec::new().content("text*").group("block"))
        .with("horizontal_rule", NodeSpec::new().group("block"))
        .with("text", NodeSpec::new().group("inline"))
        .with("hard_break", NodeSpec::new().inline().group("inline"))
}

/// The basic nodes plus list nodes with the given item content and group.
pub fn list_schema(item_content: &str, list_group: Option<&str>) -> Result<Schema, SchemaError> {
    Schema::new(SchemaSpec {
        nodes: add_list_nodes(basic_nodes(), item_content, list_group),
        top_node: None,
    })
}

/// The schema most callers want: items start with a paragraph and lists are
/// blocks. Built once and shared, so node types from separate calls compare
/// equal.
pub fn default_schema() -> Schema {
    static DEFAULT: OnceLock<Schema> = OnceLock::new();
    DEFAULT
        .get_or_init(|| list_schema("paragraph block*", Some("block")).expect("Invalid default schema"))
        .clone()
}

#[cfg(test)]
mod tests {
    use listweave_model::{AttrValue, notation};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn list_nodes_are_appended_in_order() {
        let names: Vec<String> = add_list_nodes(basic_nodes(), "paragraph block*", Some("block"))
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        assert_eq!(
            names[names.len() - 3..].to_vec(),
            vec!["ordered_list", "bullet_list", "list_item"]
        );
    }

    #[test]
    fn lists_join_the_given_group() {
        let schema = default_schema();
        let ordered = schema.node_type("ordered_list").unwrap();
        let bullet = schema.node_type("bullet_list").unwrap();
        assert!(ordered.is_in_group("block"));
        assert!(bullet.is_in_group("block"));
        assert!(schema.node_type("list_item").unwrap().defining());
    }

    #[test]
    fn lists_without_a_group_stay_out_of_blocks() {
        let schema = list_schema("paragraph block*", None).unwrap();
        assert!(schema.node_type("bullet_list").unwrap().groups().is_empty());
        assert!(notation::parse(&schema, r#"doc(ul(li(p("x"))))"#).is_err());
    }

    #[test]
    fn ordered_lists_start_at_one() {
        let schema = default_schema();
        let ordered = schema.node_type("ordered_list").unwrap();
        let attrs = ordered.compute_attrs(None).unwrap();
        assert_eq!(attrs.get("order"), Some(&AttrValue::Int(1)));
    }

    #[test]
    fn default_schema_is_shared() {
        assert_eq!(
            default_schema().node_type("list_item"),
            default_schema().node_type("list_item")
        );
    }

    #[test]
    fn unknown_item_content_is_an_error() {
        let err = list_schema("nonsense+", Some("block")).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownName { .. }));
    }
}
