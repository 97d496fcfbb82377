//! # Transforms
//!
//! A [`Transform`] is the accumulator a command builds its edit in. It starts
//! from one document, applies [`Step`]s one at a time, and keeps every
//! intermediate document along with a [`Mapping`] of how positions moved.
//! The builder is owned by the call that created it; nothing about an edit
//! in progress is shared.
//!
//! The [`structure`] queries answer whether an edit is legal before any step
//! is built, which is how commands refuse without side effects.

pub mod map;
pub mod step;
pub mod structure;

use listweave_model::{Fragment, Node, NodeRange, Slice};

use crate::error::TransformError;

pub use map::{MapResult, Mapping, StepMap};
pub use step::Step;
pub use structure::{Wrapper, can_join, can_split, find_wrapping, joinable, lift_target};

#[derive(Debug, Clone)]
pub struct Transform {
    docs: Vec<Node>,
    steps: Vec<Step>,
    mapping: Mapping,
    doc: Node,
}

impl Transform {
    pub fn new(doc: Node) -> Self {
        Self {
            docs: Vec::new(),
            steps: Vec::new(),
            mapping: Mapping::new(),
            doc,
        }
    }

    /// The current document.
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    /// The document the transform started from.
    pub fn before(&self) -> &Node {
        self.docs.first().unwrap_or(&self.doc)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The documents before each step.
    pub fn docs(&self) -> &[Node] {
        &self.docs
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Apply `step`, failing without changing anything if it does not apply.
    pub fn step(&mut self, step: Step) -> Result<&mut Self, TransformError> {
        let doc = step.apply(&self.doc)?;
        log::trace!("step {step:?}");
        self.mapping.append_map(step.map());
        self.docs.push(std::mem::replace(&mut self.doc, doc));
        self.steps.push(step);
        Ok(self)
    }

    /// Replace `[from, to)` with `slice`, which must fit as given.
    pub fn replace(&mut self, from: usize, to: usize, slice: Slice) -> Result<&mut Self, TransformError> {
        if from == to && slice.size() == 0 {
            return Ok(self);
        }
        self.step(Step::Replace {
            from,
            to,
            slice,
            structure: false,
        })
    }

    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, TransformError> {
        self.replace(from, to, Slice::empty())
    }

    /// Split the node at `pos` and its ancestors, `depth` levels up.
    /// `types_after` gives the markup of the new right-hand nodes, outermost
    /// first; missing or `None` entries copy the original node.
    pub fn split(
        &mut self,
        pos: usize,
        depth: usize,
        types_after: &[Option<Wrapper>],
    ) -> Result<&mut Self, TransformError> {
        let rpos = self.doc.resolve(pos)?;
        let mut before = Fragment::empty();
        let mut after = Fragment::empty();
        for (i, d) in (0..depth).rev().zip(((rpos.depth() + 1).saturating_sub(depth)..=rpos.depth()).rev()) {
            let node = rpos.node(d);
            before = Fragment::from_node(node.copy(before));
            after = Fragment::from_node(match types_after.get(i).and_then(Option::as_ref) {
                Some(wrapper) => wrapper.create(after),
                None => node.copy(after),
            });
        }
        self.step(Step::Replace {
            from: pos,
            to: pos,
            slice: Slice::new(before.append(&after), depth, depth),
            structure: true,
        })
    }

    /// Move the content of `range` up to the ancestor at `target`, splitting
    /// the nodes in between where content remains on either side.
    pub fn lift(&mut self, range: &NodeRange, target: usize) -> Result<&mut Self, TransformError> {
        let (from, to, depth) = (range.from(), range.to(), range.depth());
        let gap_start = from.before(depth + 1);
        let gap_end = to.after(depth + 1);
        let mut start = gap_start;
        let mut end = gap_end;

        let mut before = Fragment::empty();
        let mut open_start = 0;
        let mut splitting = false;
        for d in ((target + 1)..=depth).rev() {
            if splitting || from.index(d) > 0 {
                splitting = true;
                before = Fragment::from_node(from.node(d).copy(before));
                open_start += 1;
            } else {
                start -= 1;
            }
        }

        let mut after = Fragment::empty();
        let mut open_end = 0;
        splitting = false;
        for d in ((target + 1)..=depth).rev() {
            if splitting || to.after(d + 1) < to.end(d) {
                splitting = true;
                after = Fragment::from_node(to.node(d).copy(after));
                open_end += 1;
            } else {
                end += 1;
            }
        }

        let insert = before.size() - open_start;
        self.step(Step::ReplaceAround {
            from: start,
            to: end,
            gap_from: gap_start,
            gap_to: gap_end,
            slice: Slice::new(before.append(&after), open_start, open_end),
            insert,
            structure: true,
        })
    }

    /// Join the blocks around `pos`, `depth` levels deep.
    pub fn join(&mut self, pos: usize, depth: usize) -> Result<&mut Self, TransformError> {
        self.step(Step::Replace {
            from: pos.saturating_sub(depth),
            to: pos + depth,
            slice: Slice::empty(),
            structure: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use listweave_model::notation;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::default_schema;

    fn doc(src: &str) -> Node {
        notation::parse(&default_schema(), src).unwrap().doc
    }

    #[test]
    fn split_copies_ancestors() {
        let mut tr = Transform::new(doc(r#"doc(ul(li(p("foobar"))))"#));
        tr.split(6, 2, &[]).unwrap();
        assert_eq!(
            tr.doc().to_string(),
            r#"doc(bullet_list(list_item(paragraph("foo")), list_item(paragraph("bar"))))"#
        );
        assert_eq!(tr.mapping().map(7, 1), 11);
    }

    #[test]
    fn split_applies_type_overrides() {
        let schema = default_schema();
        let mut tr = Transform::new(doc(r#"doc(h2("foo"))"#));
        let para = Wrapper::new(schema.node_type("paragraph").unwrap());
        tr.split(4, 1, &[Some(para)]).unwrap();
        assert_eq!(tr.doc().to_string(), r#"doc(heading[level=2]("foo"), paragraph())"#);
    }

    #[test]
    fn lift_out_of_a_blockquote() {
        let d = doc(r#"doc(blockquote(p("a"), p("b"), p("c")))"#);
        let from = d.resolve(5).unwrap();
        let range = from.block_range(&from).unwrap();
        let mut tr = Transform::new(d);
        tr.lift(&range, 0).unwrap();
        assert_eq!(
            tr.doc().to_string(),
            r#"doc(blockquote(paragraph("a")), paragraph("b"), blockquote(paragraph("c")))"#
        );
    }

    #[test]
    fn join_merges_lists() {
        let mut tr = Transform::new(doc(r#"doc(ul(li(p("a"))), ul(li(p("b"))))"#));
        tr.join(7, 1).unwrap();
        assert_eq!(
            tr.doc().to_string(),
            r#"doc(bullet_list(list_item(paragraph("a")), list_item(paragraph("b"))))"#
        );
    }

    #[test]
    fn failed_steps_leave_the_transform_alone() {
        let mut tr = Transform::new(doc(r#"doc(p("ab"), p("cd"))"#));
        assert!(tr.join(2, 1).is_err());
        assert!(!tr.doc_changed());
        assert_eq!(tr.before(), tr.doc());
    }

    #[test]
    fn empty_replace_adds_no_step() {
        let mut tr = Transform::new(doc(r#"doc(p("ab"))"#));
        tr.delete(2, 2).unwrap();
        assert!(tr.steps().is_empty());
    }
}
