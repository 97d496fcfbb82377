//! The two atomic document changes every list command is built from.

use std::fmt;

use listweave_model::{Node, Slice};

use crate::error::StepError;
use crate::transform::map::StepMap;

/// An atomic change to a document.
#[derive(Clone, PartialEq)]
pub enum Step {
    /// Replace `[from, to)` with `slice`. With `structure` set the step
    /// refuses to apply when the replaced range holds content, so it can only
    /// move node boundaries around.
    Replace {
        from: usize,
        to: usize,
        slice: Slice,
        structure: bool,
    },
    /// Replace `[from, to)` with `slice`, after inserting the document's flat
    /// range `[gap_from, gap_to)` into the slice at offset `insert`. This is
    /// how content is re-parented without being copied through a slice.
    ReplaceAround {
        from: usize,
        to: usize,
        gap_from: usize,
        gap_to: usize,
        slice: Slice,
        insert: usize,
        structure: bool,
    },
}

impl Step {
    pub fn apply(&self, doc: &Node) -> Result<Node, StepError> {
        match self {
            Step::Replace {
                from,
                to,
                slice,
                structure,
            } => {
                if *structure && content_between(doc, *from, *to)? {
                    return Err(StepError::OverwritesContent { from: *from, to: *to });
                }
                Ok(doc.replace(*from, *to, slice)?)
            }
            Step::ReplaceAround {
                from,
                to,
                gap_from,
                gap_to,
                slice,
                insert,
                structure,
            } => {
                if *structure {
                    if content_between(doc, *from, *gap_from)? {
                        return Err(StepError::OverwritesContent {
                            from: *from,
                            to: *gap_from,
                        });
                    }
                    if content_between(doc, *gap_to, *to)? {
                        return Err(StepError::OverwritesContent {
                            from: *gap_to,
                            to: *to,
                        });
                    }
                }
                let gap = doc.slice(*gap_from, *gap_to)?;
                if gap.open_start() != 0 || gap.open_end() != 0 {
                    return Err(StepError::GapNotFlat {
                        gap_from: *gap_from,
                        gap_to: *gap_to,
                    });
                }
                let inserted = slice
                    .insert_at(*insert, gap.content())
                    .ok_or(StepError::GapDoesNotFit { insert: *insert })?;
                Ok(doc.replace(*from, *to, &inserted)?)
            }
        }
    }

    /// How positions move when this step is applied.
    pub fn map(&self) -> StepMap {
        match self {
            Step::Replace { from, to, slice, .. } => StepMap::new(vec![(*from, to - from, slice.size())]),
            Step::ReplaceAround {
                from,
                to,
                gap_from,
                gap_to,
                slice,
                insert,
                ..
            } => StepMap::new(vec![
                (*from, gap_from - from, *insert),
                (*gap_to, to - gap_to, slice.size().saturating_sub(*insert)),
            ]),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Replace { from, to, slice, structure } => {
                write!(f, "replace {from}..{to} with {slice}")?;
                if *structure {
                    f.write_str(" (structure)")?;
                }
                Ok(())
            }
            Step::ReplaceAround {
                from,
                to,
                gap_from,
                gap_to,
                slice,
                insert,
                structure,
            } => {
                write!(
                    f,
                    "replace {from}..{to} around {gap_from}..{gap_to} with {slice} at {insert}"
                )?;
                if *structure {
                    f.write_str(" (structure)")?;
                }
                Ok(())
            }
        }
    }
}

/// Whether `[from, to)` holds anything besides node boundaries that could be
/// removed by joining or closing nodes.
fn content_between(doc: &Node, from: usize, to: usize) -> Result<bool, StepError> {
    let rfrom = doc.resolve(from)?;
    let mut dist = to.saturating_sub(from);
    let mut depth = rfrom.depth();
    while dist > 0 && depth > 0 && rfrom.index_after(depth) == rfrom.node(depth).child_count() {
        depth -= 1;
        dist -= 1;
    }
    if dist > 0 {
        let mut next = rfrom.node(depth).maybe_child(rfrom.index_after(depth));
        while dist > 0 {
            match next {
                Some(node) if !node.is_leaf() => next = node.first_child(),
                _ => return Ok(true),
            }
            dist -= 1;
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use listweave_model::{Fragment, notation};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::default_schema;

    fn doc(src: &str) -> Node {
        notation::parse(&default_schema(), src).unwrap().doc
    }

    #[test]
    fn structure_replace_refuses_to_drop_text() {
        let d = doc(r#"doc(p("ab"), p("cd"))"#);
        let step = Step::Replace {
            from: 2,
            to: 6,
            slice: Slice::empty(),
            structure: true,
        };
        assert_eq!(step.apply(&d), Err(StepError::OverwritesContent { from: 2, to: 6 }));
    }

    #[test]
    fn structure_replace_may_join_blocks() {
        let d = doc(r#"doc(p("ab"), p("cd"))"#);
        let step = Step::Replace {
            from: 3,
            to: 5,
            slice: Slice::empty(),
            structure: true,
        };
        assert_eq!(step.apply(&d).unwrap().to_string(), r#"doc(paragraph("abcd"))"#);
    }

    #[test]
    fn replace_around_wraps_the_gap() {
        let schema = default_schema();
        let d = doc(r#"doc(p("ab"))"#);
        let list = schema.node_type("bullet_list").unwrap();
        let item = schema.node_type("list_item").unwrap();
        let shell = list.create(None, Fragment::from_node(item.create(None, Fragment::empty())));
        let step = Step::ReplaceAround {
            from: 0,
            to: 4,
            gap_from: 0,
            gap_to: 4,
            slice: Slice::new(Fragment::from_node(shell), 0, 0),
            insert: 2,
            structure: true,
        };
        assert_eq!(
            step.apply(&d).unwrap().to_string(),
            r#"doc(bullet_list(list_item(paragraph("ab"))))"#
        );
        assert_eq!(step.map().map(1, 1), 3);
        assert_eq!(step.map().map(4, 1), 8);
    }

    #[test]
    fn replace_around_rejects_open_gaps() {
        let d = doc(r#"doc(p("ab"), p("cd"))"#);
        let step = Step::ReplaceAround {
            from: 0,
            to: 8,
            gap_from: 1,
            gap_to: 8,
            slice: Slice::empty(),
            insert: 0,
            structure: false,
        };
        assert_eq!(step.apply(&d), Err(StepError::GapNotFlat { gap_from: 1, gap_to: 8 }));
    }
}
