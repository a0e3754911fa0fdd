//! Uniform grid broad phase
//!
//! The grid covers a fixed rectangle split into `rows * cols` cells. Every
//! frame the owner clears it and re-inserts each collider by its bounding
//! box; a collider spanning several cells sits in each of their buckets, so
//! callers walking more than one bucket must deduplicate candidates.
//!
//! Boxes that stick out of the grid are clamped onto the border cells.
//! Boxes entirely outside the grid land in no bucket at all.

use std::collections::HashMap;
use std::hash::Hash;

use crate::debug::DebugDrawSystem;
use crate::foundation::math::{Vec2, Vec4};
use crate::geometry::{Rect, Shape};
use crate::physics::CollisionError;

/// Inclusive cell range covered by a bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    row_min: usize,
    row_max: usize,
    col_min: usize,
    col_max: usize,
}

/// Spatial hash over keys of type `K` (collider handles in practice)
#[derive(Debug, Clone)]
pub struct SpatialHash<K> {
    bounds: Rect,
    rows: usize,
    cols: usize,
    cell_size: Vec2,
    buckets: Vec<Vec<K>>,
    registered: HashMap<K, Vec<usize>>,
}

impl<K: Copy + Eq + Hash> SpatialHash<K> {
    /// Create an empty grid over `bounds`
    pub fn new(bounds: Rect, rows: usize, cols: usize) -> Result<Self, CollisionError> {
        let cells = validate_grid::<K>(&bounds, rows, cols)?;
        Ok(Self {
            bounds,
            rows,
            cols,
            cell_size: cell_size(&bounds, rows, cols),
            buckets: vec![Vec::new(); cells],
            registered: HashMap::new(),
        })
    }

    /// Region covered by the grid
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Grid rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Width and height of one cell
    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    /// Number of buckets (`rows * cols`)
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Contents of one bucket; out-of-range indices yield an empty slice
    pub fn bucket(&self, index: usize) -> &[K] {
        self.buckets.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of keys inserted since the last clear
    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    /// World rectangle of a cell
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_rect(&self, index: usize) -> Rect {
        let row = index / self.cols;
        let col = index % self.cols;
        Rect::new(
            self.bounds.x + col as f32 * self.cell_size.x,
            self.bounds.y + row as f32 * self.cell_size.y,
            self.cell_size.x,
            self.cell_size.y,
        )
    }

    /// Empty every bucket, keeping allocations
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.registered.clear();
    }

    /// Empty every bucket and release their memory
    pub fn close(&mut self) {
        for bucket in &mut self.buckets {
            *bucket = Vec::new();
        }
        self.registered = HashMap::new();
    }

    /// Move the grid to new bounds with the same row and column count
    ///
    /// The grid is emptied; the next fill repopulates it.
    pub fn resize_bounds(&mut self, bounds: Rect) -> Result<(), CollisionError> {
        validate_grid::<K>(&bounds, self.rows, self.cols)?;
        self.bounds = bounds;
        self.cell_size = cell_size(&bounds, self.rows, self.cols);
        self.clear();
        Ok(())
    }

    /// Insert `key` into every bucket its bounding box touches
    pub fn add(&mut self, key: K, bounding_box: &Rect) {
        let Some(range) = self.cell_range(bounding_box) else {
            return;
        };
        let registered = self.registered.entry(key).or_default();
        for row in range.row_min..=range.row_max {
            for col in range.col_min..=range.col_max {
                let index = row * self.cols + col;
                self.buckets[index].push(key);
                registered.push(index);
            }
        }
    }

    /// Clear the grid, then insert every `(key, bounding box)` pair
    pub fn fill<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Rect)>,
    {
        self.clear();
        for (key, bounding_box) in entries {
            self.add(key, &bounding_box);
        }
    }

    /// Non-empty buckets whose cells overlap `bounding_box`
    ///
    /// `out` is cleared first so a single scratch buffer can be reused.
    pub fn candidate_buckets(&self, bounding_box: &Rect, out: &mut Vec<usize>) {
        out.clear();
        let Some(range) = self.cell_range(bounding_box) else {
            return;
        };
        for row in range.row_min..=range.row_max {
            for col in range.col_min..=range.col_max {
                let index = row * self.cols + col;
                if !self.buckets[index].is_empty() {
                    out.push(index);
                }
            }
        }
    }

    /// Non-empty buckets overlapping the bounding box of `shape`
    pub fn shape_candidate_buckets(&self, shape: &Shape, out: &mut Vec<usize>) {
        self.candidate_buckets(&shape.bounding_box(), out);
    }

    /// Buckets `key` was inserted into by the last fill
    pub fn registered_candidate_buckets(&self, key: K, out: &mut Vec<usize>) {
        out.clear();
        if let Some(indices) = self.registered.get(&key) {
            out.extend(indices.iter().copied().filter(|i| !self.buckets[*i].is_empty()));
        }
    }

    /// Push the grid into a debug draw buffer
    ///
    /// Every cell is outlined with `border`; occupied cells are also filled
    /// with `fill`.
    pub fn debug_draw(&self, draw: &mut DebugDrawSystem, border: Vec4, fill: Vec4) {
        for (index, bucket) in self.buckets.iter().enumerate() {
            let rect = self.cell_rect(index);
            if !bucket.is_empty() {
                draw.draw_rect(rect, fill, true, 0.0);
            }
            draw.draw_rect(rect, border, false, 0.0);
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn cell_range(&self, bounding_box: &Rect) -> Option<CellRange> {
        let min = bounding_box.min();
        let max = bounding_box.max();
        let grid_min = self.bounds.min();
        let grid_max = self.bounds.max();
        if max.x < grid_min.x || max.y < grid_min.y || min.x > grid_max.x || min.y > grid_max.y {
            return None;
        }

        let col_of = |x: f32| ((x - grid_min.x) / self.cell_size.x).floor().clamp(0.0, (self.cols - 1) as f32) as usize;
        let row_of = |y: f32| ((y - grid_min.y) / self.cell_size.y).floor().clamp(0.0, (self.rows - 1) as f32) as usize;
        Some(CellRange {
            row_min: row_of(min.y),
            row_max: row_of(max.y),
            col_min: col_of(min.x),
            col_max: col_of(max.x),
        })
    }
}

/// Checks the grid shape and returns its bucket count
///
/// The bucket array must fit in a single allocation.
fn validate_grid<K>(bounds: &Rect, rows: usize, cols: usize) -> Result<usize, CollisionError> {
    let max_cells = isize::MAX as usize / std::mem::size_of::<Vec<K>>();
    let cells = rows
        .checked_mul(cols)
        .filter(|&cells| cells > 0 && cells <= max_cells)
        .ok_or(CollisionError::InvalidGrid { rows, cols })?;
    let finite = [bounds.x, bounds.y, bounds.width, bounds.height].iter().all(|v| v.is_finite());
    if !finite || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Err(CollisionError::InvalidBounds(*bounds));
    }
    Ok(cells)
}

#[allow(clippy::cast_precision_loss)]
fn cell_size(bounds: &Rect, rows: usize, cols: usize) -> Vec2 {
    Vec2::new(bounds.width / cols as f32, bounds.height / rows as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::DebugShape;
    use crate::geometry::Circle;

    fn grid() -> SpatialHash<u32> {
        SpatialHash::new(Rect::new(0.0, 0.0, 100.0, 100.0), 10, 10).unwrap()
    }

    #[test]
    fn test_invalid_grid_is_rejected() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(matches!(
            SpatialHash::<u32>::new(bounds, 0, 4),
            Err(CollisionError::InvalidGrid { rows: 0, cols: 4 })
        ));
        assert!(matches!(
            SpatialHash::<u32>::new(Rect::new(0.0, 0.0, -1.0, 10.0), 4, 4),
            Err(CollisionError::InvalidBounds(_))
        ));
        assert!(SpatialHash::<u32>::new(Rect::new(0.0, 0.0, f32::NAN, 10.0), 4, 4).is_err());
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(matches!(
            SpatialHash::<u32>::new(bounds, usize::MAX, 2),
            Err(CollisionError::InvalidGrid { rows: usize::MAX, cols: 2 })
        ));
        assert!(matches!(
            SpatialHash::<u32>::new(bounds, usize::MAX / 8, 1),
            Err(CollisionError::InvalidGrid { .. })
        ));
    }

    #[test]
    fn test_add_spans_every_touched_cell() {
        let mut hash = grid();
        hash.add(1, &Rect::new(5.0, 5.0, 10.0, 10.0));
        let mut buckets = Vec::new();
        hash.registered_candidate_buckets(1, &mut buckets);
        assert_eq!(buckets, vec![0, 1, 10, 11]);
        assert_eq!(hash.bucket(11), &[1]);
    }

    #[test]
    fn test_candidate_buckets_skip_empty_cells() {
        let mut hash = grid();
        hash.fill([(1, Rect::new(1.0, 1.0, 2.0, 2.0)), (2, Rect::new(95.0, 95.0, 2.0, 2.0))]);

        let mut buckets = Vec::new();
        hash.candidate_buckets(&Rect::new(0.0, 0.0, 30.0, 30.0), &mut buckets);
        assert_eq!(buckets, vec![0]);

        hash.shape_candidate_buckets(&Shape::Circle(Circle::new(Vec2::new(50.0, 50.0), 5.0)), &mut buckets);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_out_of_bounds_boxes_clamp_or_vanish() {
        let mut hash = grid();
        hash.add(1, &Rect::new(-50.0, -50.0, 55.0, 55.0));
        hash.add(2, &Rect::new(500.0, 500.0, 1.0, 1.0));
        assert_eq!(hash.bucket(0), &[1]);
        assert_eq!(hash.registered_count(), 1);

        let mut buckets = Vec::new();
        hash.registered_candidate_buckets(2, &mut buckets);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_fill_clears_previous_frame() {
        let mut hash = grid();
        hash.fill([(1, Rect::new(1.0, 1.0, 2.0, 2.0))]);
        hash.fill([(2, Rect::new(1.0, 1.0, 2.0, 2.0))]);
        assert_eq!(hash.bucket(0), &[2]);
        assert_eq!(hash.registered_count(), 1);
    }

    #[test]
    fn test_resize_bounds_keeps_grid_shape() {
        let mut hash = grid();
        hash.add(1, &Rect::new(1.0, 1.0, 2.0, 2.0));
        hash.resize_bounds(Rect::new(-100.0, -100.0, 400.0, 200.0)).unwrap();
        assert_eq!(hash.rows(), 10);
        assert_eq!(hash.cols(), 10);
        assert_eq!(hash.cell_size(), Vec2::new(40.0, 20.0));
        assert_eq!(hash.registered_count(), 0);
        assert!(hash.resize_bounds(Rect::new(0.0, 0.0, 0.0, 10.0)).is_err());
    }

    #[test]
    fn test_cell_rect() {
        let hash = grid();
        assert_eq!(hash.cell_rect(12), Rect::new(20.0, 10.0, 10.0, 10.0));
    }

    #[test]
    fn test_debug_draw_fills_occupied_cells() {
        let mut hash = SpatialHash::new(Rect::new(0.0, 0.0, 20.0, 20.0), 2, 2).unwrap();
        hash.add(7_u32, &Rect::new(1.0, 1.0, 1.0, 1.0));
        let mut draw = DebugDrawSystem::new();
        hash.debug_draw(&mut draw, Vec4::new(1.0, 1.0, 1.0, 1.0), Vec4::new(0.0, 1.0, 0.0, 0.5));

        let shapes = draw.get_shapes();
        assert_eq!(shapes.len(), 5);
        let filled = shapes.iter().filter(|s| matches!(s, DebugShape::Rect { filled: true, .. })).count();
        assert_eq!(filled, 1);
    }
}
