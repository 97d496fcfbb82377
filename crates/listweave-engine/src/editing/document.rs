use std::collections::BTreeMap;
use std::ops::Range;

use listweave_model::{ModelError, Node, Schema, notation};

use crate::editing::{EditorState, ListCmd, Patch, Selection, Transaction};
use crate::error::{DocumentError, TransformError};

/// A document being edited by a single writer.
///
/// `Document` owns the current [`EditorState`] and applies list commands to
/// it one at a time, reporting each change as a [`Patch`].
///
/// ```
/// # use listweave_engine::editing::{Document, split_list_item};
/// # use listweave_engine::schema::default_schema;
/// let schema = default_schema();
/// let mut doc = Document::from_notation(&schema, r#"doc(ul(li(p("foo<a>bar"))))"#).unwrap();
///
/// let item = schema.node_type("list_item").unwrap();
/// let patch = doc.apply(&split_list_item(item, None)).unwrap().unwrap();
///
/// assert_eq!(patch.version, doc.version());
/// assert_eq!(
///     doc.to_notation(),
///     r#"doc(bullet_list(list_item(paragraph("foo")), list_item(paragraph("<a>bar"))))"#
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    state: EditorState,
    /// Incremented on each applied command
    version: u64,
}

impl Document {
    pub fn new(doc: Node, selection: Selection) -> Self {
        Self {
            state: EditorState::new(doc, selection),
            version: 0,
        }
    }

    /// Parse a document in notation. Tags `a` and `b` mark the selection; a
    /// tag `a` outside inline content selects the node after it. Without
    /// tags the cursor starts at the beginning of the document.
    pub fn from_notation(schema: &Schema, source: &str) -> Result<Self, DocumentError> {
        let tagged = notation::parse(schema, source)?;
        let selection = selection_from_tags(&tagged.doc, tagged.tag("a"), tagged.tag("b"))?;
        Ok(Self::new(tagged.doc, selection))
    }

    /// Run `cmd`. `None` when the command does not apply, in which case
    /// nothing changes.
    pub fn apply(&mut self, cmd: &ListCmd) -> Result<Option<Patch>, TransformError> {
        let mut built: Option<Transaction> = None;
        let applies = cmd.run(&self.state, Some(&mut |tr: Transaction| built = Some(tr)))?;
        let Some(tr) = built.filter(|_| applies) else {
            return Ok(None);
        };

        let state = self.state.apply(&tr)?;
        let changed = changed_ranges(&tr);
        let new_selection = state.selection.from()..state.selection.to(&state.doc);
        self.state = state;
        self.version += 1;
        log::debug!("{} applied in {} steps, version {}", cmd.name(), tr.steps().len(), self.version);

        Ok(Some(Patch {
            changed,
            new_selection,
            version: self.version,
        }))
    }

    /// Whether `cmd` would apply, without changing anything.
    pub fn can_apply(&self, cmd: &ListCmd) -> Result<bool, TransformError> {
        cmd.can_run(&self.state)
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Get the current document tree
    pub fn doc(&self) -> &Node {
        &self.state.doc
    }

    pub fn selection(&self) -> Selection {
        self.state.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.state.selection = selection;
    }

    /// Get the current version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The document in notation, with the selection as tags `a` and `b`.
    pub fn to_notation(&self) -> String {
        let doc = &self.state.doc;
        let mut tags = BTreeMap::new();
        match self.state.selection {
            Selection::All => {}
            selection => {
                tags.insert("a".to_string(), selection.from());
                if !selection.empty(doc) {
                    tags.insert("b".to_string(), selection.to(doc));
                }
            }
        }
        notation::render(doc, &tags)
    }
}

/// The selection marked by tags `a` and `b` in a parsed document.
pub fn selection_from_tags(doc: &Node, a: Option<usize>, b: Option<usize>) -> Result<Selection, ModelError> {
    let Some(a) = a else {
        return Ok(Selection::at_start(doc));
    };
    if doc.resolve(a)?.parent().inline_content() {
        Ok(Selection::text(a, b.unwrap_or(a)))
    } else {
        Ok(Selection::Node { anchor: a })
    }
}

/// Every range the transaction replaced, mapped to the final document,
/// sorted and merged.
fn changed_ranges(tr: &Transaction) -> Vec<Range<usize>> {
    let maps = tr.mapping().maps();
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for (i, map) in maps.iter().enumerate() {
        let later = tr.mapping().slice(i + 1);
        map.for_each(|_, _, new_start, new_end| {
            let start = later.map(new_start, -1);
            let end = later.map(new_end, 1).max(start);
            ranges.push(start..end);
        });
    }
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::editing::{lift_list_item, sink_list_item, wrap_in_list};
    use crate::schema::default_schema;

    #[test]
    fn new_document_starts_at_version_zero() {
        let doc = Document::from_notation(&default_schema(), r#"doc(p("foo"))"#).unwrap();
        assert_eq!(doc.version(), 0);
        assert_eq!(doc.selection(), Selection::cursor(1));
    }

    #[test]
    fn apply_reports_changes_and_bumps_version() {
        let schema = default_schema();
        let mut doc = Document::from_notation(&schema, r#"doc(p("<a>foo"))"#).unwrap();
        let list = schema.node_type("bullet_list").unwrap();
        let patch = doc.apply(&wrap_in_list(list, None)).unwrap().unwrap();
        assert_eq!(patch.version, 1);
        assert_eq!(patch.changed, vec![0..2, 7..9]);
        assert_eq!(patch.new_selection, 3..3);
        assert_snapshot!(doc.to_notation(), @r#"doc(bullet_list(list_item(paragraph("<a>foo"))))"#);
    }

    #[test]
    fn refused_commands_change_nothing() {
        let schema = default_schema();
        let mut doc = Document::from_notation(&schema, r#"doc(ul(li(p("o<a>ne")), li(p("two"))))"#).unwrap();
        let before = doc.doc().clone();
        let item = schema.node_type("list_item").unwrap();
        assert_eq!(doc.apply(&sink_list_item(item)).unwrap(), None);
        assert_eq!(doc.doc(), &before);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn can_apply_does_not_edit() {
        let schema = default_schema();
        let doc = Document::from_notation(&schema, r#"doc(ul(li(p("o<a>ne"))))"#).unwrap();
        let item = schema.node_type("list_item").unwrap();
        assert!(doc.can_apply(&lift_list_item(item)).unwrap());
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn node_tags_select_nodes() {
        let doc = Document::from_notation(&default_schema(), r#"doc(p("x"), "<a>", hr)"#).unwrap();
        assert_eq!(doc.selection(), Selection::Node { anchor: 3 });
        assert_eq!(doc.to_notation(), r#"doc(paragraph("x"), "<a>", horizontal_rule, "<b>")"#);
    }
}
