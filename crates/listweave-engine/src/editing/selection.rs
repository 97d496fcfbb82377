use listweave_model::{ModelError, Node, ResolvedPos};

use crate::transform::Mapping;

/// Where the cursor is. Positions are stored bare and resolved against the
/// document they belong to when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A caret (`anchor == head`) or a range of inline content.
    Text { anchor: usize, head: usize },
    /// The single node starting at `anchor`.
    Node { anchor: usize },
    /// The whole document.
    All,
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Selection::Text { anchor: pos, head: pos }
    }

    pub fn text(anchor: usize, head: usize) -> Self {
        Selection::Text { anchor, head }
    }

    pub fn from(&self) -> usize {
        match *self {
            Selection::Text { anchor, head } => anchor.min(head),
            Selection::Node { anchor } => anchor,
            Selection::All => 0,
        }
    }

    pub fn to(&self, doc: &Node) -> usize {
        match *self {
            Selection::Text { anchor, head } => anchor.max(head),
            Selection::Node { anchor } => anchor + doc.node_at(anchor).map_or(0, Node::node_size),
            Selection::All => doc.content().size(),
        }
    }

    pub fn empty(&self, doc: &Node) -> bool {
        self.from() == self.to(doc)
    }

    pub fn resolve_from(&self, doc: &Node) -> Result<ResolvedPos, ModelError> {
        doc.resolve(self.from())
    }

    pub fn resolve_to(&self, doc: &Node) -> Result<ResolvedPos, ModelError> {
        doc.resolve(self.to(doc))
    }

    /// The selected node of a node selection.
    pub fn node<'d>(&self, doc: &'d Node) -> Option<&'d Node> {
        match *self {
            Selection::Node { anchor } => doc.node_at(anchor),
            _ => None,
        }
    }

    /// This selection moved through `mapping` into `doc`, the document the
    /// mapping ends in.
    pub fn map(&self, doc: &Node, mapping: &Mapping) -> Result<Selection, ModelError> {
        match *self {
            Selection::Text { anchor, head } => {
                let rhead = doc.resolve(mapping.map(head, 1))?;
                if !rhead.parent().inline_content() {
                    return Ok(Selection::near(&rhead, 1));
                }
                let ranchor = doc.resolve(mapping.map(anchor, 1))?;
                let anchor = if ranchor.parent().inline_content() {
                    ranchor.pos()
                } else {
                    rhead.pos()
                };
                Ok(Selection::text(anchor, rhead.pos()))
            }
            Selection::Node { anchor } => {
                let result = mapping.map_result(anchor, 1);
                let rpos = doc.resolve(result.pos)?;
                if result.deleted || rpos.node_after().is_none() {
                    return Ok(Selection::near(&rpos, 1));
                }
                Ok(Selection::Node { anchor: result.pos })
            }
            Selection::All => Ok(Selection::All),
        }
    }

    /// A valid selection at or near `rpos`, looking in direction `bias`
    /// first. Falls back to selecting everything.
    pub fn near(rpos: &ResolvedPos, bias: i8) -> Selection {
        let bias = if bias < 0 { -1 } else { 1 };
        Self::find_from(rpos, bias, false)
            .or_else(|| Self::find_from(rpos, -bias, false))
            .unwrap_or(Selection::All)
    }

    pub fn at_start(doc: &Node) -> Selection {
        find_selection_in(doc, 0, 0, 1, false).unwrap_or(Selection::All)
    }

    pub fn at_end(doc: &Node) -> Selection {
        let size = doc.content().size();
        find_selection_in(doc, size as isize, doc.child_count(), -1, false).unwrap_or(Selection::All)
    }

    /// The first valid cursor position or selectable node from `rpos` in
    /// direction `dir`. With `text_only`, node selections are skipped.
    pub fn find_from(rpos: &ResolvedPos, dir: i8, text_only: bool) -> Option<Selection> {
        if rpos.parent().inline_content() {
            return Some(Selection::cursor(rpos.pos()));
        }
        let depth = rpos.depth();
        if let Some(found) = find_selection_in(
            rpos.parent(),
            rpos.pos() as isize,
            rpos.index(depth),
            dir,
            text_only,
        ) {
            return Some(found);
        }
        for d in (0..depth).rev() {
            let found = if dir < 0 {
                find_selection_in(rpos.node(d), rpos.before(d + 1) as isize, rpos.index(d), dir, text_only)
            } else {
                find_selection_in(rpos.node(d), rpos.after(d + 1) as isize, rpos.index(d) + 1, dir, text_only)
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }
}

/// Search the children of `node`, whose child `index` is at `pos`, for a
/// selection in direction `dir`.
fn find_selection_in(node: &Node, pos: isize, index: usize, dir: i8, text_only: bool) -> Option<Selection> {
    if node.inline_content() {
        return usize::try_from(pos).ok().map(Selection::cursor);
    }
    let step = isize::from(dir);
    let mut pos = pos;
    let indices: Box<dyn Iterator<Item = usize>> = if dir > 0 {
        Box::new(index..node.child_count())
    } else {
        Box::new((0..index).rev())
    };
    for i in indices {
        let child = node.child(i);
        let size = child.node_size() as isize;
        if !child.is_atom() {
            let inner_index = if dir < 0 { child.child_count() } else { 0 };
            if let Some(inner) = find_selection_in(child, pos + step, inner_index, dir, text_only) {
                return Some(inner);
            }
        } else if !text_only && !child.is_text() {
            let anchor = if dir < 0 { pos - size } else { pos };
            return usize::try_from(anchor).ok().map(|anchor| Selection::Node { anchor });
        }
        pos += size * step;
    }
    None
}
