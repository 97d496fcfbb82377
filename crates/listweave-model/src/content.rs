//! # Content Expressions
//!
//! Every node type declares what it may contain with a small expression
//! language, for example `"paragraph block*"` or `"list_item+"`:
//!
//! ```text
//! expr   := term (WHITESPACE term)*
//! term   := atom ('*' | '+' | '?')?
//! atom   := NAME | '(' NAME ('|' NAME)* ')'
//! ```
//!
//! `NAME` is either a node type name or a group name; a group stands for every
//! type that lists it, in schema order.
//!
//! Expressions compile to a flat list of [`Term`]s. A [`ContentMatch`] is a
//! set of NFA states over that list, so matching never needs backtracking and
//! ambiguous expressions such as `"block* paragraph"` still match correctly.

use std::fmt;

use crate::fragment::Fragment;
use crate::schema::{NodeType, Schema, SchemaError};

/// One compiled term of a content expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Term {
    /// Type ids accepted by this term, in schema order.
    pub types: Vec<u16>,
    /// Whether at least one occurrence is required.
    pub required: bool,
    /// Whether more than one occurrence is allowed.
    pub repeat: bool,
}

/// A compiled content expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ContentExpr {
    pub terms: Vec<Term>,
}

impl ContentExpr {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Compile `source`, resolving names through `lookup`, which maps a type or
    /// group name to the ids it stands for.
    pub fn parse<F>(source: &str, lookup: F) -> Result<Self, SchemaError>
    where
        F: Fn(&str) -> Option<Vec<u16>>,
    {
        let mut terms = Vec::new();
        let mut chars = source.char_indices().peekable();

        let invalid = |reason: &str| SchemaError::InvalidContentExpr {
            expr: source.to_string(),
            reason: reason.to_string(),
        };

        let resolve = |name: &str| -> Result<Vec<u16>, SchemaError> {
            lookup(name).ok_or_else(|| SchemaError::UnknownName {
                name: name.to_string(),
                expr: source.to_string(),
            })
        };

        loop {
            while chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
                chars.next();
            }
            let Some(&(start, c)) = chars.peek() else {
                break;
            };

            let mut types: Vec<u16> = Vec::new();
            if c == '(' {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, ')')) => {
                            if name.trim().is_empty() {
                                return Err(invalid("empty choice"));
                            }
                            extend_unique(&mut types, resolve(name.trim())?);
                            break;
                        }
                        Some((_, '|')) => {
                            if name.trim().is_empty() {
                                return Err(invalid("empty choice"));
                            }
                            extend_unique(&mut types, resolve(name.trim())?);
                            name.clear();
                        }
                        Some((_, ch)) if is_name_char(ch) || ch.is_whitespace() => name.push(ch),
                        Some((_, ch)) => {
                            return Err(invalid(&format!("unexpected character {ch:?} in choice")));
                        }
                        None => return Err(invalid("unclosed '('")),
                    }
                }
            } else if is_name_char(c) {
                let mut end = start;
                while let Some(&(i, ch)) = chars.peek() {
                    if !is_name_char(ch) {
                        break;
                    }
                    end = i + ch.len_utf8();
                    chars.next();
                }
                types = resolve(&source[start..end])?;
            } else {
                return Err(invalid(&format!("unexpected character {c:?}")));
            }

            let (required, repeat) = match chars.peek().map(|&(_, ch)| ch) {
                Some('*') => {
                    chars.next();
                    (false, true)
                }
                Some('+') => {
                    chars.next();
                    (true, true)
                }
                Some('?') => {
                    chars.next();
                    (false, false)
                }
                _ => (true, false),
            };

            terms.push(Term {
                types,
                required,
                repeat,
            });
        }

        Ok(Self { terms })
    }

    /// Every type id mentioned anywhere in the expression.
    pub fn mentioned(&self) -> impl Iterator<Item = u16> + '_ {
        self.terms.iter().flat_map(|t| t.types.iter().copied())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn extend_unique(into: &mut Vec<u16>, from: Vec<u16>) {
    for id in from {
        if !into.contains(&id) {
            into.push(id);
        }
    }
}

/// NFA state: position in the term list plus whether the current term has
/// matched at least once.
type State = (u16, bool);

/// A position inside a node type's content expression.
///
/// Obtained from [`NodeType::content_match`] and advanced with
/// [`ContentMatch::match_type`]; `None` from a match call means the content is
/// not allowed.
#[derive(Clone)]
pub struct ContentMatch {
    schema: Schema,
    owner: u16,
    states: Vec<State>,
}

impl PartialEq for ContentMatch {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
            && self.states == other.states
            && Schema::ptr_eq(&self.schema, &other.schema)
    }
}

impl fmt::Debug for ContentMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentMatch")
            .field("owner", &self.schema.type_name(self.owner))
            .field("states", &self.states)
            .finish()
    }
}

impl ContentMatch {
    pub(crate) fn start(schema: Schema, owner: u16) -> Self {
        let mut m = Self {
            schema,
            owner,
            states: vec![(0, false)],
        };
        m.close();
        m
    }

    fn expr(&self) -> &ContentExpr {
        self.schema.content_expr(self.owner)
    }

    /// Add every state reachable by skipping satisfied terms, then normalise.
    fn close(&mut self) {
        let len = self.expr().terms.len() as u16;
        let mut i = 0;
        while i < self.states.len() {
            let (term, taken) = self.states[i];
            if term < len {
                let satisfied = taken || !self.expr().terms[term as usize].required;
                if satisfied && !self.states.contains(&(term + 1, false)) {
                    self.states.push((term + 1, false));
                }
            }
            i += 1;
        }
        self.states.sort_unstable();
        self.states.dedup();
    }

    /// The match after adding a node of type `node_type`, if allowed.
    pub fn match_type(&self, node_type: &NodeType) -> Option<ContentMatch> {
        if !Schema::ptr_eq(&self.schema, node_type.schema()) {
            return None;
        }
        let id = node_type.id();
        let terms = &self.expr().terms;
        let mut next = Vec::new();
        for &(term, taken) in &self.states {
            let Some(t) = terms.get(term as usize) else {
                continue;
            };
            if t.types.contains(&id) && (!taken || t.repeat) && !next.contains(&(term, true)) {
                next.push((term, true));
            }
        }
        if next.is_empty() {
            return None;
        }
        let mut m = Self {
            schema: self.schema.clone(),
            owner: self.owner,
            states: next,
        };
        m.close();
        Some(m)
    }

    /// Match the children of `fragment` from `start` to `end` (child indices).
    pub fn match_fragment_range(
        &self,
        fragment: &Fragment,
        start: usize,
        end: usize,
    ) -> Option<ContentMatch> {
        let mut cur = self.clone();
        for i in start..end.min(fragment.child_count()) {
            cur = cur.match_type(fragment.child(i).node_type())?;
        }
        Some(cur)
    }

    pub fn match_fragment(&self, fragment: &Fragment) -> Option<ContentMatch> {
        self.match_fragment_range(fragment, 0, fragment.child_count())
    }

    /// Whether the content matched so far is complete.
    pub fn valid_end(&self) -> bool {
        let len = self.expr().terms.len() as u16;
        self.states.iter().any(|&(term, _)| term == len)
    }

    /// Types that may come next, in expression order, with the resulting match.
    pub fn next_edges(&self) -> Vec<(NodeType, ContentMatch)> {
        let terms = &self.expr().terms;
        let mut seen: Vec<u16> = Vec::new();
        for &(term, taken) in &self.states {
            let Some(t) = terms.get(term as usize) else {
                continue;
            };
            if taken && !t.repeat {
                continue;
            }
            for &id in &t.types {
                if !seen.contains(&id) {
                    seen.push(id);
                }
            }
        }
        seen.into_iter()
            .filter_map(|id| {
                let node_type = self.schema.type_by_id(id);
                self.match_type(&node_type).map(|next| (node_type, next))
            })
            .collect()
    }

    /// The first type that could be created here without user input: not text,
    /// and with no required attributes.
    pub fn default_type(&self) -> Option<NodeType> {
        self.next_edges()
            .into_iter()
            .map(|(node_type, _)| node_type)
            .find(|t| !t.is_text() && !t.has_required_attrs())
    }

    /// Whether this match and `other` accept at least one common type next.
    pub fn compatible(&self, other: &ContentMatch) -> bool {
        let mine = self.next_edges();
        let theirs = other.next_edges();
        mine.iter()
            .any(|(a, _)| theirs.iter().any(|(b, _)| a == b))
    }

    /// Shortest chain of wrapper types that lets a node of `target` be placed
    /// here. An empty chain means `target` fits directly.
    pub fn find_wrapping(&self, target: &NodeType) -> Option<Vec<NodeType>> {
        struct Active {
            matched: ContentMatch,
            node_type: Option<NodeType>,
            via: Option<usize>,
        }

        let mut seen: Vec<u16> = Vec::new();
        let mut active = vec![Active {
            matched: self.clone(),
            node_type: None,
            via: None,
        }];
        let mut cursor = 0;

        while cursor < active.len() {
            let current = &active[cursor];
            if current.matched.match_type(target).is_some() {
                let mut chain = Vec::new();
                let mut at = Some(cursor);
                while let Some(i) = at {
                    if let Some(node_type) = &active[i].node_type {
                        chain.push(node_type.clone());
                    }
                    at = active[i].via;
                }
                chain.reverse();
                return Some(chain);
            }

            let has_wrapper = current.node_type.is_some();
            let mut queued = Vec::new();
            for (node_type, next) in current.matched.next_edges() {
                if !node_type.is_leaf()
                    && !node_type.has_required_attrs()
                    && !seen.contains(&node_type.id())
                    && (!has_wrapper || next.valid_end())
                {
                    seen.push(node_type.id());
                    queued.push(Active {
                        matched: node_type.content_match(),
                        node_type: Some(node_type),
                        via: Some(cursor),
                    });
                }
            }
            active.extend(queued);
            cursor += 1;
        }

        None
    }

    /// Nodes that must be inserted before `after` so that it matches here,
    /// and, when `to_end` is set, so that the result is complete.
    pub fn fill_before(&self, after: &Fragment, to_end: bool) -> Option<Fragment> {
        fn search(
            matched: &ContentMatch,
            after: &Fragment,
            to_end: bool,
            types: &mut Vec<NodeType>,
            seen: &mut Vec<ContentMatch>,
        ) -> Option<Fragment> {
            if let Some(finished) = matched.match_fragment(after)
                && (!to_end || finished.valid_end())
            {
                let mut nodes = Vec::with_capacity(types.len());
                for node_type in types.iter() {
                    nodes.push(node_type.create_and_fill(None, Fragment::empty())?);
                }
                return Some(Fragment::from_nodes(nodes));
            }
            for (node_type, next) in matched.next_edges() {
                if !(node_type.is_text() || node_type.has_required_attrs()) && !seen.contains(&next)
                {
                    seen.push(next.clone());
                    types.push(node_type);
                    if let Some(found) = search(&next, after, to_end, types, seen) {
                        return Some(found);
                    }
                    types.pop();
                }
            }
            None
        }

        let mut seen = vec![self.clone()];
        search(self, after, to_end, &mut Vec::new(), &mut seen)
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::tests::test_schema;

    #[test]
    fn matches_required_then_repeated_terms() {
        let schema = test_schema();
        let item = schema.node_type("list_item").unwrap();
        let paragraph = schema.node_type("paragraph").unwrap();
        let bullet = schema.node_type("bullet_list").unwrap();

        let start = item.content_match();
        assert!(!start.valid_end());

        let after_para = start.match_type(&paragraph).unwrap();
        assert!(after_para.valid_end());

        let after_list = after_para.match_type(&bullet).unwrap();
        assert!(after_list.valid_end());
        assert!(after_list.match_type(&paragraph).is_some());

        assert!(start.match_type(&bullet).is_none());
    }

    #[test]
    fn ambiguous_expression_matches_without_backtracking() {
        let schema = test_schema();
        let tail = schema.node_type("para_tail").unwrap();
        let paragraph = schema.node_type("paragraph").unwrap();

        let m = tail
            .content_match()
            .match_type(&paragraph)
            .and_then(|m| m.match_type(&paragraph))
            .unwrap();
        assert!(m.valid_end());
    }

    #[test]
    fn default_type_skips_text() {
        let schema = test_schema();
        let item = schema.node_type("list_item").unwrap();
        let default = item.content_match().default_type().unwrap();
        assert_eq!(default.name(), "paragraph");
    }

    #[test]
    fn find_wrapping_for_paragraph_in_list() {
        let schema = test_schema();
        let bullet = schema.node_type("bullet_list").unwrap();
        let paragraph = schema.node_type("paragraph").unwrap();

        let chain = bullet.content_match().find_wrapping(&paragraph).unwrap();
        let names: Vec<_> = chain.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["list_item"]);
    }

    #[test]
    fn find_wrapping_for_list_in_doc_is_direct() {
        let schema = test_schema();
        let doc = schema.top_node_type();
        let bullet = schema.node_type("bullet_list").unwrap();
        assert_eq!(doc.content_match().find_wrapping(&bullet), Some(vec![]));
    }

    #[test]
    fn fill_before_creates_required_paragraph() {
        let schema = test_schema();
        let item = schema.node_type("list_item").unwrap();
        let fill = item
            .content_match()
            .fill_before(&crate::Fragment::empty(), true)
            .unwrap();
        assert_eq!(fill.child_count(), 1);
        assert_eq!(fill.child(0).node_type().name(), "paragraph");
    }

    #[test]
    fn lists_are_compatible_with_each_other() {
        let schema = test_schema();
        let bullet = schema.node_type("bullet_list").unwrap();
        let ordered = schema.node_type("ordered_list").unwrap();
        let paragraph = schema.node_type("paragraph").unwrap();

        assert!(bullet.compatible_content(&ordered));
        assert!(!bullet.compatible_content(&paragraph));
    }
}
