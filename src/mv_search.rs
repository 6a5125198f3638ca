
use std::num::NonZeroUsize;

use rayon::prelude::*;
use smallvec::SmallVec;

use crate::{
    block_grid::BlockGrid,
    error::{MoshError, Result},
    frame::Frame,
    mv::{MotionVector, MotionVectorField},
    params::SearchParams,
    util::{get_sad, wrap_coord},
};

/// Displacements tried along one axis. A shift of 32 with a step of 1 needs
/// 65 slots, so the inline capacity is the next size smallvec supports.
pub type CandidateOffsets = SmallVec<[isize; 96]>;

/// Offsets from `-max_shift` up to `max_shift`, advancing by `shift_range`.
///
/// The list always starts exactly at `-max_shift`, so it only contains `0`
/// when `max_shift` is a multiple of `shift_range`.
#[must_use]
pub fn candidate_offsets(max_shift: NonZeroUsize, shift_range: NonZeroUsize) -> CandidateOffsets {
    let max_shift = max_shift.get() as isize;
    (-max_shift..=max_shift).step_by(shift_range.get()).collect()
}

/// Finds, for every block of `cur`, the displacement into `prev` with the
/// smallest sum of absolute differences.
///
/// Both frames are quantized to bytes before matching. Candidate regions are
/// addressed with wraparound, but a region that would run past the bottom or
/// right edge is skipped instead of wrapping a second time. Blocks where every
/// candidate was skipped keep a zero vector.
///
/// Ties keep the first candidate found. The zero displacement is tried first
/// when it is one of the candidates, then `dy` and `dx` in ascending order.
pub fn estimate(prev: &Frame, cur: &Frame, params: &SearchParams) -> Result<MotionVectorField> {
    if !prev.same_shape(cur) {
        return Err(MoshError::invalid(format!(
            "cannot estimate motion between frames of shape {:?} and {:?}",
            prev.shape(),
            cur.shape()
        )));
    }

    let grid = BlockGrid::new(cur.width(), cur.height(), params.block_size)?;
    let candidates = candidate_offsets(params.max_shift, params.shift_range);
    tracing::trace!(
        "Searching {}x{} blocks over {} offsets per axis",
        grid.blk_x(),
        grid.blk_y(),
        candidates.len()
    );

    let search = BlockSearch {
        grid,
        prev: prev.quantize(),
        cur: cur.quantize(),
        pitch: cur.pitch(),
        channels: cur.channels(),
        has_zero: candidates.contains(&0),
        candidates,
    };

    let mut vectors = vec![MotionVector::zero(); grid.blk_count().get()];
    vectors
        .par_chunks_mut(grid.blk_x().get())
        .enumerate()
        .for_each(|(blk_row, row)| {
            for (blk_col, mv) in row.iter_mut().enumerate() {
                *mv = search.search_block(blk_row, blk_col);
            }
        });

    Ok(MotionVectorField::from_vectors(grid, vectors))
}

struct BlockSearch {
    grid: BlockGrid,
    prev: Vec<u8>,
    cur: Vec<u8>,
    /// samples per row, shared by both frames
    pitch: NonZeroUsize,
    channels: NonZeroUsize,
    has_zero: bool,
    candidates: CandidateOffsets,
}

impl BlockSearch {
    fn search_block(&self, blk_row: usize, blk_col: usize) -> MotionVector {
        let (y, x) = self.grid.origin(blk_row, blk_col);
        let (blk_h, blk_w) = self.grid.extent(blk_row, blk_col);
        let row_samples = blk_w.saturating_mul(self.channels);
        let pitch = self.pitch.get();
        let src = &self.cur[y * pitch + x * self.channels.get()..];

        let mut best: Option<MotionVector> = None;
        let mut check = |dx: isize, dy: isize| {
            let src_y = wrap_coord(y, dy, self.grid.height());
            let src_x = wrap_coord(x, dx, self.grid.width());
            if src_y + blk_h.get() > self.grid.height().get()
                || src_x + blk_w.get() > self.grid.width().get()
            {
                return;
            }

            let ref_ = &self.prev[src_y * pitch + src_x * self.channels.get()..];
            let sad = get_sad(row_samples, blk_h, src, self.pitch, ref_, self.pitch);
            if best.is_none_or(|best| best.sad.is_some_and(|best_sad| sad < best_sad)) {
                best = Some(MotionVector {
                    x: dx,
                    y: dy,
                    sad: Some(sad),
                });
            }
        };

        if self.has_zero {
            check(0, 0);
        }
        for &dy in &self.candidates {
            for &dx in &self.candidates {
                if self.has_zero && dx == 0 && dy == 0 {
                    continue;
                }
                check(dx, dy);
            }
        }

        best.unwrap_or_default()
    }
}
