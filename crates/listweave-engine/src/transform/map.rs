//! Position mapping through document changes.

/// Result of mapping a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The content on the side the position was associated with was removed.
    pub deleted: bool,
    /// The position was strictly inside a replaced range.
    pub deleted_across: bool,
}

/// The position changes made by one step: a sorted list of replaced ranges,
/// each given as `(start, old_size, new_size)` in the document before the
/// step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<(usize, usize, usize)>,
}

impl StepMap {
    pub fn new(ranges: Vec<(usize, usize, usize)>) -> Self {
        Self { ranges }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[(usize, usize, usize)] {
        &self.ranges
    }

    /// Map `pos`. With `assoc < 0` a position at an insertion point stays
    /// before the inserted content, otherwise it moves after it.
    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        let mut diff: isize = 0;
        for &(start, old_size, new_size) in &self.ranges {
            if start > pos {
                break;
            }
            let end = start + old_size;
            if pos <= end {
                let side = if old_size == 0 {
                    assoc
                } else if pos == start {
                    -1
                } else if pos == end {
                    1
                } else {
                    assoc
                };
                let base = start.saturating_add_signed(diff);
                let result = if side < 0 { base } else { base + new_size };
                let edge = if assoc < 0 { start } else { end };
                return MapResult {
                    pos: result,
                    deleted: pos != edge,
                    deleted_across: pos != start && pos != end,
                };
            }
            diff += new_size as isize - old_size as isize;
        }
        MapResult {
            pos: pos.saturating_add_signed(diff),
            deleted: false,
            deleted_across: false,
        }
    }

    /// Call `f(old_start, old_end, new_start, new_end)` for every replaced range.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(usize, usize, usize, usize),
    {
        let mut diff: isize = 0;
        for &(start, old_size, new_size) in &self.ranges {
            let new_start = start.saturating_add_signed(diff);
            f(start, start + old_size, new_start, new_start + new_size);
            diff += new_size as isize - old_size as isize;
        }
    }
}

/// The maps of a sequence of steps, applied in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn append_map(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    /// The maps from index `from` on.
    pub fn slice(&self, from: usize) -> Mapping {
        Mapping {
            maps: self.maps.get(from..).unwrap_or_default().to_vec(),
        }
    }

    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        self.map_result_from(0, pos, assoc)
    }

    /// Map through the maps starting at index `from` only.
    pub fn map_result_from(&self, from: usize, pos: usize, assoc: i8) -> MapResult {
        let mut result = MapResult {
            pos,
            deleted: false,
            deleted_across: false,
        };
        for map in self.maps.iter().skip(from) {
            let step = map.map_result(result.pos, assoc);
            result = MapResult {
                pos: step.pos,
                deleted: result.deleted || step.deleted,
                deleted_across: result.deleted_across || step.deleted_across,
            };
        }
        result
    }
}
