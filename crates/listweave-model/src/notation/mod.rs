//! # Document notation
//!
//! A compact text form for documents, convenient in tests and on the command
//! line:
//!
//! ```text
//! doc(ul(li(p("one<a>")), li(p("two"))), p("after"))
//! ```
//!
//! A node is written as its type name (or an alias such as `p`, `ul`, `ol`,
//! `li`, `h1`..`h6`), optional attributes in brackets, and its children in
//! parentheses. Strings are text. A `<name>` marker inside a string records
//! the document position at that point under `name`; a string holding only
//! markers records a position between nodes. Text written directly inside a
//! block container is wrapped in the container's default textblock.
//!
//! ```
//! use listweave_model::notation;
//! # use listweave_model::{NodeSpec, NodeSpecs, Schema, SchemaSpec};
//! # let schema = Schema::new(SchemaSpec {
//! #     nodes: NodeSpecs::new()
//! #         .with("doc", NodeSpec::new().content("block+"))
//! #         .with("paragraph", NodeSpec::new().content("text*").group("block"))
//! #         .with("text", NodeSpec::new()),
//! #     top_node: None,
//! # }).unwrap();
//! let parsed = notation::parse(&schema, r#"doc(p("ab<a>c"))"#).unwrap();
//! assert_eq!(parsed.tag("a"), Some(3));
//! assert_eq!(parsed.doc.to_string(), r#"doc(paragraph("abc"))"#);
//! ```

mod lexer;
mod parser;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

use crate::error::ModelError;
use crate::node::{Node, write_escaped_char};
use crate::schema::Schema;

pub use lexer::{Token, TokenKind, lex};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("unexpected character at byte {offset}")]
    UnexpectedChar { offset: usize },

    #[error("expected {expected} at byte {offset}, found {found:?}")]
    Unexpected {
        offset: usize,
        expected: &'static str,
        found: String,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unknown node type {name:?} at byte {offset}")]
    UnknownType { name: String, offset: usize },

    #[error("malformed tag or escape at byte {offset}")]
    BadTag { offset: usize },

    #[error("tag <{name}> appears more than once")]
    DuplicateTag { name: String },

    #[error("invalid node at byte {offset}: {source}")]
    Invalid { offset: usize, source: ModelError },

    #[error("unexpected input after the document at byte {offset}")]
    Trailing { offset: usize },
}

/// A parsed document together with the positions of its tags.
#[derive(Debug, Clone)]
pub struct Tagged {
    pub doc: Node,
    pub tags: BTreeMap<String, usize>,
}

impl Tagged {
    pub fn tag(&self, name: &str) -> Option<usize> {
        self.tags.get(name).copied()
    }
}

/// Parse a document written in notation. Node content is checked against the
/// schema as it is built.
pub fn parse(schema: &Schema, source: &str) -> Result<Tagged, NotationError> {
    parser::parse(schema, source)
}

/// Render `doc` in notation with `tags` inserted at their positions. Tags
/// beyond the document's content are dropped.
pub fn render(doc: &Node, tags: &BTreeMap<String, usize>) -> String {
    let mut pending: Vec<(usize, &str)> = tags.iter().map(|(name, &pos)| (pos, name.as_str())).collect();
    pending.sort();
    let mut out = String::new();
    let mut renderer = Renderer {
        out: &mut out,
        pending: &pending,
        next: 0,
    };
    renderer.node_body(doc, 0);
    out
}

struct Renderer<'o, 't> {
    out: &'o mut String,
    /// Tags sorted by position; `next` is the first one not yet written.
    pending: &'t [(usize, &'t str)],
    next: usize,
}

impl<'t> Renderer<'_, 't> {
    fn take_at(&mut self, pos: usize) -> Vec<&'t str> {
        let pending = self.pending;
        let mut names = Vec::new();
        while let Some(&(at, name)) = pending.get(self.next)
            && at <= pos
        {
            names.push(name);
            self.next += 1;
        }
        names
    }

    /// Write a node whose content starts at `start`.
    fn node_body(&mut self, node: &Node, start: usize) {
        let _ = node.write_head(self.out);
        if node.is_leaf() {
            return;
        }
        self.out.push('(');
        let mut pos = start;
        let mut first = true;
        for child in node.content() {
            if !child.is_text() {
                self.tags_item(pos, &mut first);
            }
            self.separator(&mut first);
            if let Some(text) = child.text() {
                self.text(text, pos);
            } else {
                self.node_body(child, pos + 1);
            }
            pos += child.node_size();
        }
        self.tags_item(pos, &mut first);
        self.out.push(')');
    }

    fn separator(&mut self, first: &mut bool) {
        if !*first {
            self.out.push_str(", ");
        }
        *first = false;
    }

    /// Tags at `pos` as a marker-only string item.
    fn tags_item(&mut self, pos: usize, first: &mut bool) {
        let names = self.take_at(pos);
        if names.is_empty() {
            return;
        }
        self.separator(first);
        self.out.push('"');
        for name in names {
            let _ = write!(self.out, "<{name}>");
        }
        self.out.push('"');
    }

    fn text(&mut self, text: &str, start: usize) {
        let mut literal = String::new();
        let mut pos = start;
        for c in text.chars() {
            self.marker_into(&mut literal, pos);
            let _ = write_escaped_char(&mut literal, c);
            pos += 1;
        }
        self.marker_into(&mut literal, pos);
        self.out.push('"');
        self.out.push_str(&literal);
        self.out.push('"');
    }

    fn marker_into(&mut self, literal: &mut String, pos: usize) {
        for name in self.take_at(pos) {
            let _ = write!(literal, "<{name}>");
        }
    }
}
