use std::collections::BTreeMap;

use crate::attrs::{AttrValue, Attrs};
use crate::fragment::Fragment;
use crate::node::Node;
use crate::schema::{NodeType, Schema};

use super::lexer::{Token, TokenKind, lex};
use super::{NotationError, Tagged};

/// Tags found inside a parsed item, relative to the item's start.
type Tags = Vec<(String, usize)>;

enum Piece {
    Node(Node, Tags),
    Text(String, Tags),
}

pub(super) fn parse(schema: &Schema, source: &str) -> Result<Tagged, NotationError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        schema,
        tokens,
        cursor: 0,
    };
    let (doc, tags) = parser.node()?;
    if let Some(token) = parser.peek() {
        return Err(NotationError::Trailing {
            offset: token.span.start,
        });
    }

    let mut map = BTreeMap::new();
    for (name, pos) in tags {
        if map.insert(name.clone(), pos).is_some() {
            return Err(NotationError::DuplicateTag { name });
        }
    }
    Ok(Tagged { doc, tags: map })
}

struct Parser<'s, 'a> {
    schema: &'s Schema,
    tokens: Vec<Token<'a>>,
    cursor: usize,
}

impl<'a> Parser<'_, 'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token<'a>, NotationError> {
        match self.tokens.get(self.cursor) {
            Some(token) if token.kind == kind => {
                self.cursor += 1;
                Ok(token.clone())
            }
            Some(token) => Err(NotationError::Unexpected {
                offset: token.span.start,
                expected,
                found: token.text.to_string(),
            }),
            None => Err(NotationError::UnexpectedEnd { expected }),
        }
    }

    /// `name [attrs] (items)`. Returned tags are relative to the start of
    /// the node's content.
    fn node(&mut self) -> Result<(Node, Tags), NotationError> {
        let name = self.expect(TokenKind::Ident, "node name")?;
        let offset = name.span.start;
        let (node_type, mut attrs) = self.resolve_name(name.text, offset)?;

        if self.peek_kind() == Some(TokenKind::LBracket) {
            self.cursor += 1;
            loop {
                let key = self.expect(TokenKind::Ident, "attribute name")?;
                self.expect(TokenKind::Eq, "'='")?;
                let value = self.attr_value()?;
                attrs.insert(key.text.to_string(), value);
                match self.peek_kind() {
                    Some(TokenKind::Comma) => self.cursor += 1,
                    _ => break,
                }
            }
            self.expect(TokenKind::RBracket, "']'")?;
        }

        let mut pieces = Vec::new();
        if self.peek_kind() == Some(TokenKind::LParen) {
            self.cursor += 1;
            while self.peek_kind() != Some(TokenKind::RParen) {
                pieces.push(self.item()?);
                match self.peek_kind() {
                    Some(TokenKind::Comma) => self.cursor += 1,
                    _ => break,
                }
            }
            self.expect(TokenKind::RParen, "')'")?;
        }

        let mut nodes = Vec::new();
        let mut tags = Tags::new();
        let mut size = 0;
        for piece in pieces {
            let (node, inner, shift) = match piece {
                Piece::Node(node, inner) => (Some(node), inner, 1),
                Piece::Text(text, inner) if text.is_empty() => (None, inner, 0),
                Piece::Text(text, inner) if node_type.inline_content() => {
                    (Some(self.schema.text(&text)), inner, 0)
                }
                Piece::Text(text, inner) => {
                    let (node, depth) = self.wrap_text(&node_type, &text, offset)?;
                    (Some(node), inner, depth)
                }
            };
            tags.extend(inner.into_iter().map(|(name, pos)| (name, pos + size + shift)));
            if let Some(node) = node {
                size += node.node_size();
                nodes.push(node);
            }
        }

        let node = node_type
            .create_checked(Some(&attrs), Fragment::from_nodes(nodes))
            .map_err(|source| NotationError::Invalid { offset, source })?;
        Ok((node, tags))
    }

    fn item(&mut self) -> Result<Piece, NotationError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Str => {
                let token = token.clone();
                self.cursor += 1;
                let (text, tags) = unquote(token.text, token.span.start)?;
                Ok(Piece::Text(text, tags))
            }
            Some(_) => {
                let (node, tags) = self.node()?;
                Ok(Piece::Node(node, tags))
            }
            None => Err(NotationError::UnexpectedEnd {
                expected: "node or string",
            }),
        }
    }

    fn attr_value(&mut self) -> Result<AttrValue, NotationError> {
        let Some(token) = self.peek().cloned() else {
            return Err(NotationError::UnexpectedEnd {
                expected: "attribute value",
            });
        };
        self.cursor += 1;
        match (token.kind, token.text) {
            (TokenKind::Int, text) => text.parse::<i64>().map(AttrValue::Int).map_err(|_| {
                NotationError::Unexpected {
                    offset: token.span.start,
                    expected: "integer",
                    found: text.to_string(),
                }
            }),
            (TokenKind::Ident, "true") => Ok(AttrValue::Bool(true)),
            (TokenKind::Ident, "false") => Ok(AttrValue::Bool(false)),
            (TokenKind::Ident, "null") => Ok(AttrValue::Null),
            (TokenKind::Str, text) => {
                let (value, tags) = unquote(text, token.span.start)?;
                if !tags.is_empty() {
                    return Err(NotationError::BadTag {
                        offset: token.span.start,
                    });
                }
                Ok(AttrValue::String(value))
            }
            (_, text) => Err(NotationError::Unexpected {
                offset: token.span.start,
                expected: "attribute value",
                found: text.to_string(),
            }),
        }
    }

    /// Map a name or alias to a node type and the attributes it implies.
    fn resolve_name(&self, name: &str, offset: usize) -> Result<(NodeType, Attrs), NotationError> {
        if let Some(node_type) = self.schema.node_type(name) {
            return Ok((node_type, Attrs::new()));
        }
        let mut attrs = Attrs::new();
        let full = match name {
            "p" => "paragraph",
            "ul" => "bullet_list",
            "ol" => "ordered_list",
            "li" => "list_item",
            "pre" => "code_block",
            "br" => "hard_break",
            "hr" => "horizontal_rule",
            _ => match heading_level(name) {
                Some(level) => {
                    attrs.insert("level".to_string(), AttrValue::Int(level));
                    "heading"
                }
                None => name,
            },
        };
        self.schema
            .node_type(full)
            .map(|node_type| (node_type, attrs))
            .ok_or_else(|| NotationError::UnknownType {
                name: name.to_string(),
                offset,
            })
    }

    /// Wrap loose text placed in a block container in the wrappers the
    /// container needs, e.g. a paragraph in a document. Returns the wrapped
    /// node and the number of wrapper levels.
    fn wrap_text(
        &self,
        container: &NodeType,
        text: &str,
        offset: usize,
    ) -> Result<(Node, usize), NotationError> {
        let wrappers = container
            .content_match()
            .find_wrapping(&self.schema.text_type())
            .filter(|w| !w.is_empty())
            .ok_or_else(|| NotationError::Invalid {
                offset,
                source: crate::error::ModelError::InvalidContent {
                    node_type: container.name().to_string(),
                    content: "text".to_string(),
                },
            })?;
        let mut node = self.schema.text(text);
        for wrapper in wrappers.iter().rev() {
            node = wrapper
                .create_checked(None, Fragment::from_node(node))
                .map_err(|source| NotationError::Invalid { offset, source })?;
        }
        Ok((node, wrappers.len()))
    }
}

fn heading_level(name: &str) -> Option<i64> {
    let level = name.strip_prefix('h')?.parse::<i64>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Strip quotes, resolve escapes and pull out `<tag>` markers. Tag positions
/// are character offsets into the resulting text.
fn unquote(literal: &str, offset: usize) -> Result<(String, Tags), NotationError> {
    let inner = &literal[1..literal.len() - 1];
    let mut text = String::new();
    let mut len = 0;
    let mut tags = Tags::new();
    let mut chars = inner.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                let escaped = match chars.next() {
                    Some((_, 'n')) => '\n',
                    Some((_, other)) => other,
                    None => return Err(NotationError::BadTag { offset: offset + 1 + i }),
                };
                text.push(escaped);
                len += 1;
            }
            '<' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '>')) if !name.is_empty() => break,
                        Some((_, ch)) if ch.is_alphanumeric() || ch == '_' => name.push(ch),
                        _ => return Err(NotationError::BadTag { offset: offset + 1 + i }),
                    }
                }
                tags.push((name, len));
            }
            _ => {
                text.push(c);
                len += 1;
            }
        }
    }
    Ok((text, tags))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn unquote_collects_tags_in_characters() {
        let (text, tags) = unquote(r#""hé<a>llo\"<b>""#, 0).unwrap();
        assert_eq!(text, "héllo\"");
        assert_eq!(tags, vec![("a".to_string(), 2), ("b".to_string(), 6)]);
    }

    #[test]
    fn unquote_rejects_open_tags() {
        assert!(matches!(unquote(r#""a<b""#, 0), Err(NotationError::BadTag { .. })));
    }

    #[test]
    fn heading_aliases() {
        assert_eq!(heading_level("h3"), Some(3));
        assert_eq!(heading_level("h7"), None);
        assert_eq!(heading_level("hr"), None);
    }
}
