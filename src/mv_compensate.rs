
use std::num::NonZeroUsize;

use crate::{
    block_grid::BlockGrid,
    error::{MoshError, Result},
    frame::Frame,
    mv::MotionVectorField,
    util::{vs_bitblt, wrap_coord},
};

/// Builds a new frame by moving every block of `frame` along its vector.
///
/// The output starts as a copy of `frame`. Each block is then replaced by the
/// region of `frame` its vector points to, found with wraparound. The copied
/// region never wraps a second time: when it would run past the bottom or
/// right edge only the part inside the frame is copied, and the rest of the
/// block keeps its original pixels. Pixels outside the block grid are never
/// touched.
pub fn apply(frame: &Frame, field: &MotionVectorField, block_size: NonZeroUsize) -> Result<Frame> {
    let grid = BlockGrid::new(frame.width(), frame.height(), block_size)?;
    if field.grid().blk_x() != grid.blk_x() || field.grid().blk_y() != grid.blk_y() {
        return Err(MoshError::invalid(format!(
            "motion field has shape {:?}, expected ({}, {}, 2) for block size {block_size}",
            field.shape(),
            grid.blk_y(),
            grid.blk_x()
        )));
    }

    let width = frame.width();
    let height = frame.height();
    let channels = frame.channels().get();
    let pitch = frame.pitch();
    let src = frame.data();

    let mut out = frame.clone();
    for (blk_row, blk_col) in grid.blocks() {
        let mv = field.get(blk_row, blk_col);
        if mv.x == 0 && mv.y == 0 {
            continue;
        }

        let (y, x) = grid.origin(blk_row, blk_col);
        let (blk_h, blk_w) = grid.extent(blk_row, blk_col);
        let src_y = wrap_coord(y, mv.y, height);
        let src_x = wrap_coord(x, mv.x, width);

        // SAFETY: wrapped coordinates are always inside the frame
        let (copy_h, copy_w) = unsafe {
            (
                NonZeroUsize::new_unchecked(blk_h.get().min(height.get() - src_y)),
                NonZeroUsize::new_unchecked(blk_w.get().min(width.get() - src_x)),
            )
        };

        vs_bitblt(
            &mut out.data_mut()[y * pitch.get() + x * channels..],
            pitch,
            &src[src_y * pitch.get() + src_x * channels..],
            pitch,
            copy_w.saturating_mul(frame.channels()),
            copy_h,
        );
    }

    Ok(out)
}
