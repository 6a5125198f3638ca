
use crate::{
    block_grid::BlockGrid,
    error::{MoshError, Result},
};

/// Displacement of one block, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionVector {
    /// horizontal displacement
    pub x: isize,
    /// vertical displacement
    pub y: isize,
    /// block difference at this displacement, if it was measured
    pub sad: Option<u64>,
}

impl MotionVector {
    #[must_use]
    pub fn zero() -> Self {
        MotionVector {
            x: 0,
            y: 0,
            sad: None,
        }
    }

    #[must_use]
    pub fn new(x: isize, y: isize) -> Self {
        MotionVector { x, y, sad: None }
    }
}

impl Default for MotionVector {
    fn default() -> Self {
        Self::zero()
    }
}

/// One motion vector per block of a [`BlockGrid`], stored in raster order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionVectorField {
    grid: BlockGrid,
    vectors: Box<[MotionVector]>,
}

impl MotionVectorField {
    /// A field where no block moves.
    #[must_use]
    pub fn zero(grid: BlockGrid) -> Self {
        Self {
            grid,
            vectors: vec![MotionVector::zero(); grid.blk_count().get()].into_boxed_slice(),
        }
    }

    pub(crate) fn from_vectors(grid: BlockGrid, vectors: Vec<MotionVector>) -> Self {
        debug_assert_eq!(vectors.len(), grid.blk_count().get());
        Self {
            grid,
            vectors: vectors.into_boxed_slice(),
        }
    }

    /// Reads a field from the flat `(blk_y, blk_x, 2)` layout, where
    /// `[.., 0]` is the horizontal and `[.., 1]` the vertical displacement.
    pub fn from_array(grid: BlockGrid, data: &[i32]) -> Result<Self> {
        let expected = grid.blk_count().get() * 2;
        if data.len() != expected {
            return Err(MoshError::invalid(format!(
                "motion field has {} values, expected {expected} for a {}x{} block grid",
                data.len(),
                grid.blk_y(),
                grid.blk_x()
            )));
        }

        let vectors = data
            .chunks_exact(2)
            .map(|mv| MotionVector::new(mv[0] as isize, mv[1] as isize))
            .collect();
        Ok(Self::from_vectors(grid, vectors))
    }

    /// Flat `(blk_y, blk_x, 2)` layout, `[.., 0] = dx`, `[.., 1] = dy`.
    #[must_use]
    pub fn to_array(&self) -> Vec<i32> {
        self.vectors
            .iter()
            .flat_map(|mv| [mv.x as i32, mv.y as i32])
            .collect()
    }

    #[must_use]
    pub fn grid(&self) -> &BlockGrid {
        &self.grid
    }

    /// `(blk_y, blk_x, 2)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.grid.blk_y().get(), self.grid.blk_x().get(), 2)
    }

    #[must_use]
    pub fn get(&self, blk_row: usize, blk_col: usize) -> MotionVector {
        self.vectors[blk_row * self.grid.blk_x().get() + blk_col]
    }

    #[must_use]
    pub fn vectors(&self) -> &[MotionVector] {
        &self.vectors
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.vectors.iter().all(|mv| mv.x == 0 && mv.y == 0)
    }
}
