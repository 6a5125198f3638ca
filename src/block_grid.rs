
use std::num::NonZeroUsize;

use crate::error::{MoshError, Result};

/// Square blocks laid over a frame, starting at the top-left corner.
///
/// Only whole blocks are part of the grid. Rows and columns left over at the
/// bottom and right edges when the frame size is not a multiple of the block
/// size are never searched or moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    width: NonZeroUsize,
    height: NonZeroUsize,
    blk_size: NonZeroUsize,
    /// number of blocks along X
    blk_x: NonZeroUsize,
    /// number of blocks along Y
    blk_y: NonZeroUsize,
}

impl BlockGrid {
    pub fn new(width: NonZeroUsize, height: NonZeroUsize, blk_size: NonZeroUsize) -> Result<Self> {
        let blk_x = NonZeroUsize::new(width.get() / blk_size.get());
        let blk_y = NonZeroUsize::new(height.get() / blk_size.get());
        let (Some(blk_x), Some(blk_y)) = (blk_x, blk_y) else {
            return Err(MoshError::invalid(format!(
                "block size {blk_size} does not fit in a {width}x{height} frame"
            )));
        };

        Ok(Self {
            width,
            height,
            blk_size,
            blk_x,
            blk_y,
        })
    }

    #[must_use]
    pub fn width(&self) -> NonZeroUsize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> NonZeroUsize {
        self.height
    }

    #[must_use]
    pub fn blk_x(&self) -> NonZeroUsize {
        self.blk_x
    }

    #[must_use]
    pub fn blk_y(&self) -> NonZeroUsize {
        self.blk_y
    }

    #[must_use]
    pub fn blk_count(&self) -> NonZeroUsize {
        self.blk_x.saturating_mul(self.blk_y)
    }

    /// Pixel coordinates `(y, x)` of the top-left corner of a block.
    #[must_use]
    pub fn origin(&self, blk_row: usize, blk_col: usize) -> (usize, usize) {
        (blk_row * self.blk_size.get(), blk_col * self.blk_size.get())
    }

    /// Size `(height, width)` of a block, clamped to the frame edges.
    #[must_use]
    pub fn extent(&self, blk_row: usize, blk_col: usize) -> (NonZeroUsize, NonZeroUsize) {
        let (y, x) = self.origin(blk_row, blk_col);
        debug_assert!(y < self.height.get() && x < self.width.get());
        // SAFETY: the origin of a block in the grid is always inside the frame
        unsafe {
            (
                NonZeroUsize::new_unchecked(self.blk_size.get().min(self.height.get() - y)),
                NonZeroUsize::new_unchecked(self.blk_size.get().min(self.width.get() - x)),
            )
        }
    }

    /// All `(row, col)` block positions in raster order.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let blk_x = self.blk_x.get();
        (0..self.blk_y.get()).flat_map(move |row| (0..blk_x).map(move |col| (row, col)))
    }
}
