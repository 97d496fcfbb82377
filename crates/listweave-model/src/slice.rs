use std::fmt;

use crate::fragment::Fragment;
use crate::node::Node;

/// A piece of a document: a fragment plus the number of ancestor levels that
/// are open (cut through) on each side.
#[derive(Clone, Default, PartialEq)]
pub struct Slice {
    content: Fragment,
    open_start: usize,
    open_end: usize,
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Self {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A closed slice holding a single node.
    pub fn from_node(node: Node) -> Self {
        Self::new(Fragment::from_node(node), 0, 0)
    }

    pub fn content(&self) -> &Fragment {
        &self.content
    }

    pub fn open_start(&self) -> usize {
        self.open_start
    }

    pub fn open_end(&self) -> usize {
        self.open_end
    }

    /// Size the slice adds when inserted.
    pub fn size(&self) -> usize {
        self.content.size() - self.open_start - self.open_end
    }

    /// Insert `fragment` at `pos`, counted from the slice's start as it
    /// would appear inside a document. `None` if `pos` is not inside the slice.
    pub fn insert_at(&self, pos: usize, fragment: &Fragment) -> Option<Slice> {
        let content = insert_into(&self.content, pos + self.open_start, fragment)?;
        Some(Slice::new(content, self.open_start, self.open_end))
    }
}

fn insert_into(content: &Fragment, dist: usize, insert: &Fragment) -> Option<Fragment> {
    let (index, offset) = content.find_index(dist, -1).ok()?;
    let child = content.maybe_child(index);
    if offset == dist || child.is_some_and(Node::is_text) {
        return Some(
            content
                .cut(0, dist)
                .append(insert)
                .append(&content.cut(dist, content.size())),
        );
    }
    let child = child?;
    let inner = insert_into(child.content(), dist - offset - 1, insert)?;
    Some(content.replace_child(index, child.copy(inner)))
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>({},{})", self.content, self.open_start, self.open_end)
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
