use std::fmt;

use crate::error::ModelError;
use crate::node::Node;

/// An ordered sequence of sibling nodes with its size cached.
///
/// Adjacent text nodes are always merged, so a fragment never holds two text
/// nodes next to each other.
#[derive(Clone, Default, PartialEq)]
pub struct Fragment {
    content: Vec<Node>,
    size: usize,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_node(node: Node) -> Self {
        Self {
            size: node.node_size(),
            content: vec![node],
        }
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut content: Vec<Node> = Vec::new();
        let mut size = 0;
        for node in nodes {
            size += node.node_size();
            if let Some(last) = content.last_mut()
                && let Some(joined) = last.join_text(&node)
            {
                *last = joined;
                continue;
            }
            content.push(node);
        }
        Self { content, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    /// Child at `index`. Panics when out of range, like slice indexing.
    pub fn child(&self, index: usize) -> &Node {
        &self.content[index]
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.content.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.content.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.content.iter()
    }

    pub fn append(&self, other: &Fragment) -> Fragment {
        if other.size == 0 {
            return self.clone();
        }
        if self.size == 0 {
            return other.clone();
        }
        Fragment::from_nodes(self.content.iter().chain(other.content.iter()).cloned())
    }

    pub fn add_to_start(&self, node: Node) -> Fragment {
        Fragment::from_nodes(std::iter::once(node).chain(self.content.iter().cloned()))
    }

    pub fn add_to_end(&self, node: Node) -> Fragment {
        Fragment::from_nodes(self.content.iter().cloned().chain(std::iter::once(node)))
    }

    /// Copy of this fragment with the child at `index` replaced.
    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut content = self.content.clone();
        content[index] = node;
        Fragment::from_nodes(content)
    }

    /// The part of this fragment between two positions, cutting into
    /// children where a boundary falls inside one.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to == self.size {
            return self.clone();
        }
        let mut result = Vec::new();
        if to > from {
            let mut pos = 0;
            for child in &self.content {
                if pos >= to {
                    break;
                }
                let end = pos + child.node_size();
                if end > from {
                    let piece = if pos < from || end > to {
                        if child.is_text() {
                            child.cut(from.saturating_sub(pos), (to - pos).min(child.node_size()))
                        } else {
                            child.cut(
                                from.saturating_sub(pos + 1),
                                (to - pos - 1).min(child.content().size()),
                            )
                        }
                    } else {
                        child.clone()
                    };
                    result.push(piece);
                }
                pos = end;
            }
        }
        Fragment::from_nodes(result)
    }

    pub fn cut_by_index(&self, from: usize, to: usize) -> Fragment {
        if from == to {
            return Fragment::empty();
        }
        if from == 0 && to == self.content.len() {
            return self.clone();
        }
        Fragment::from_nodes(self.content[from..to].iter().cloned())
    }

    /// Index of the child at `pos` and that child's start offset.
    ///
    /// A position on a child boundary yields the child after it, unless
    /// `round` is positive and the position is inside a child, in which case
    /// the child after that one is returned.
    pub fn find_index(&self, pos: usize, round: i8) -> Result<(usize, usize), ModelError> {
        if pos == 0 {
            return Ok((0, 0));
        }
        if pos == self.size {
            return Ok((self.content.len(), pos));
        }
        if pos > self.size {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: self.size,
            });
        }
        let mut cur = 0;
        for (i, child) in self.content.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos || round > 0 {
                    return Ok((i + 1, end));
                }
                return Ok((i, cur));
            }
            cur = end;
        }
        Err(ModelError::PositionOutOfRange {
            pos,
            size: self.size,
        })
    }

    /// Call `f` for every node overlapping `[from, to)`, descending into
    /// children while `f` returns `true`. `f` receives the node, its absolute
    /// start position, its parent, and its index in the parent.
    pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.nodes_between_inner(from, to, f, 0, None);
    }

    pub(crate) fn nodes_between_inner<F>(
        &self,
        from: usize,
        to: usize,
        f: &mut F,
        node_start: usize,
        parent: Option<&Node>,
    ) where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        let mut pos = 0;
        for (i, child) in self.content.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, node_start + pos, parent, i) && child.content().size() > 0 {
                let start = pos + 1;
                child.content().nodes_between_inner(
                    from.saturating_sub(start),
                    (to - start).min(child.content().size()),
                    f,
                    node_start + start,
                    Some(child),
                );
            }
            pos = end;
        }
    }

    /// Every descendant, in document order.
    pub fn descendants<F>(&self, f: &mut F)
    where
        F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
    {
        self.nodes_between(0, self.size, f);
    }

    pub fn text_between(&self, from: usize, to: usize, block_separator: &str) -> String {
        let mut text = String::new();
        let mut first = true;
        self.nodes_between(from, to, &mut |node, pos, _, _| {
            if let Some(t) = node.text() {
                let start = from.saturating_sub(pos);
                let end = (to - pos).min(node.node_size());
                text.extend(t.chars().skip(start).take(end - start));
            } else if node.is_block() {
                if !first {
                    text.push_str(block_separator);
                }
                first = false;
            }
            true
        });
        text
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}

impl From<Node> for Fragment {
    fn from(node: Node) -> Self {
        Fragment::from_node(node)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, child) in self.content.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{child}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{self}>")
    }
}
