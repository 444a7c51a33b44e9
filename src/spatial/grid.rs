//! Sparse grid index.
//!
//! The grid maps integer cell coordinates to the actors whose bounds intersect
//! that cell. Cells are created lazily and dropped when they become empty, so
//! the memory cost follows the number of occupied cells rather than the world
//! size.
//!
//! Invariant: an indexed actor is present in every cell of its current
//! [`CellRange`] and in no other cell.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{Aabb, ActorId};

/// Default cell size in world units.
pub const DEFAULT_CELL_SIZE: f32 = 400.0;

/// `(column, row)` coordinates of a grid cell.
pub type CellKey = (i32, i32);

/// Inclusive rectangle of cells covered by a bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl CellRange {
    /// Iterate the covered cells row by row (`y` outer, `x` inner), the order
    /// in which searches scan candidates.
    pub fn cells(self) -> impl Iterator<Item = CellKey> {
        let CellRange { x1, y1, x2, y2 } = self;
        (y1..=y2).flat_map(move |y| (x1..=x2).map(move |x| (x, y)))
    }

    pub fn cell_count(&self) -> usize {
        let w = (self.x2 - self.x1 + 1).max(0) as usize;
        let h = (self.y2 - self.y1 + 1).max(0) as usize;
        w * h
    }
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_width: f32,
    cell_height: f32,
    cells: FxHashMap<CellKey, SmallVec<[ActorId; 4]>>,
    ranges: FxHashMap<ActorId, CellRange>,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE, DEFAULT_CELL_SIZE)
    }
}

impl SpatialGrid {
    /// Create an empty grid. Non-positive or non-finite sizes fall back to
    /// [`DEFAULT_CELL_SIZE`].
    pub fn new(cell_width: f32, cell_height: f32) -> Self {
        let sane = |v: f32| {
            if v.is_finite() && v > 0.0 {
                v
            } else {
                DEFAULT_CELL_SIZE
            }
        };
        Self {
            cell_width: sane(cell_width),
            cell_height: sane(cell_height),
            cells: FxHashMap::default(),
            ranges: FxHashMap::default(),
        }
    }

    pub fn cell_size(&self) -> (f32, f32) {
        (self.cell_width, self.cell_height)
    }

    /// Cells covered by `bounds`, without touching the index.
    pub fn range_for(&self, bounds: &Aabb) -> CellRange {
        CellRange {
            x1: (bounds.min.x / self.cell_width).floor() as i32,
            y1: (bounds.min.y / self.cell_height).floor() as i32,
            x2: (bounds.max.x / self.cell_width).floor() as i32,
            y2: (bounds.max.y / self.cell_height).floor() as i32,
        }
    }

    /// Insert or move `id` so that it occupies exactly the cells covered by
    /// `bounds`. Returns the new range.
    pub fn insert(&mut self, id: ActorId, bounds: &Aabb) -> CellRange {
        let range = self.range_for(bounds);
        match self.ranges.get(&id).copied() {
            Some(old) if old == range => return range,
            Some(old) => self.unlink(id, old),
            None => {}
        }
        for key in range.cells() {
            self.cells.entry(key).or_default().push(id);
        }
        self.ranges.insert(id, range);
        range
    }

    /// Remove `id` from every cell. Returns `false` if it was not indexed.
    pub fn remove(&mut self, id: ActorId) -> bool {
        match self.ranges.remove(&id) {
            Some(range) => {
                self.unlink(id, range);
                true
            }
            None => false,
        }
    }

    fn unlink(&mut self, id: ActorId, range: CellRange) {
        for key in range.cells() {
            if let Some(cell) = self.cells.get_mut(&key) {
                cell.retain(|other| *other != id);
                if cell.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    /// Range currently occupied by `id`, if indexed.
    pub fn range_of(&self, id: ActorId) -> Option<CellRange> {
        self.ranges.get(&id).copied()
    }

    /// Actors in a cell, in insertion order.
    pub fn cell(&self, key: CellKey) -> &[ActorId] {
        self.cells.get(&key).map(|c| c.as_slice()).unwrap_or(&[])
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.ranges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn boxed(x: f32, y: f32, w: f32, h: f32) -> Aabb {
        Aabb::from_min_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_range_for_spans_cells() {
        let grid = SpatialGrid::new(100.0, 100.0);
        let r = grid.range_for(&boxed(50.0, 150.0, 100.0, 10.0));
        assert_eq!(r, CellRange { x1: 0, y1: 1, x2: 1, y2: 1 });
        assert_eq!(r.cell_count(), 2);
    }

    #[test]
    fn test_negative_coordinates_floor() {
        let grid = SpatialGrid::new(100.0, 100.0);
        let r = grid.range_for(&boxed(-10.0, -10.0, 5.0, 5.0));
        assert_eq!(r, CellRange { x1: -1, y1: -1, x2: -1, y2: -1 });
    }

    #[test]
    fn test_insert_occupies_every_covered_cell() {
        let mut grid = SpatialGrid::new(100.0, 100.0);
        let id = ActorId(1);
        let range = grid.insert(id, &boxed(90.0, 90.0, 20.0, 20.0));
        assert_eq!(range.cell_count(), 4);
        for key in range.cells() {
            assert_eq!(grid.cell(key), &[id]);
        }
    }

    #[test]
    fn test_moving_actor_leaves_old_cells() {
        let mut grid = SpatialGrid::new(100.0, 100.0);
        let id = ActorId(3);
        grid.insert(id, &boxed(10.0, 10.0, 5.0, 5.0));
        grid.insert(id, &boxed(510.0, 10.0, 5.0, 5.0));
        assert!(grid.cell((0, 0)).is_empty());
        assert_eq!(grid.cell((5, 0)), &[id]);
        assert_eq!(grid.occupied_cells(), 1);
    }

    #[test]
    fn test_remove_clears_all_cells() {
        let mut grid = SpatialGrid::new(100.0, 100.0);
        grid.insert(ActorId(1), &boxed(0.0, 0.0, 250.0, 250.0));
        assert!(grid.remove(ActorId(1)));
        assert!(!grid.remove(ActorId(1)));
        assert_eq!(grid.occupied_cells(), 0);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_scan_order_is_row_major() {
        let r = CellRange { x1: 0, y1: 0, x2: 1, y2: 1 };
        let order: Vec<CellKey> = r.cells().collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_invalid_cell_size_falls_back() {
        let grid = SpatialGrid::new(0.0, f32::NAN);
        assert_eq!(grid.cell_size(), (DEFAULT_CELL_SIZE, DEFAULT_CELL_SIZE));
    }
}
