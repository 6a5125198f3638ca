
use crate::{
    block_grid::BlockGrid,
    error::{MoshError, Result},
    frame::{Frame, FrameSequence},
    mv_compensate::apply,
    mv_search::estimate,
    params::{DatamoshMode, DatamoshParams, SearchParams},
};

/// Runs the selected datamosh mode over a sequence.
///
/// - `Copy` returns the input unchanged once the parameters are checked.
/// - `Movement` keeps a running frame, starting at the first input frame.
///   For every following input frame, motion is estimated from the running
///   frame to it and applied to the running frame, which is then emitted and
///   replaces the running frame. The output has as many frames as the input.
/// - `Glide` estimates motion once between the first two frames and applies
///   that field over and over, starting from the first frame, until
///   `sequence_length` frames have been emitted.
///
/// `Movement` and `Glide` need at least two frames. Shorter sequences are
/// returned unchanged, or rejected with [`MoshError::InsufficientFrames`] when
/// `strict` is set. Parameters are checked against the frame size before any
/// work starts.
pub fn run(frames: &FrameSequence, params: &DatamoshParams) -> Result<FrameSequence> {
    let (batch, height, width, channels) = frames.batch_shape();
    tracing::debug!(
        "Datamosh {} over {} frames of {}x{}x{} (block {}, shift {}, step {})",
        params.mode,
        batch,
        width,
        height,
        channels,
        params.search.block_size,
        params.search.max_shift,
        params.search.shift_range
    );

    let first = frames.first();
    BlockGrid::new(first.width(), first.height(), params.search.block_size)?;

    if params.mode == DatamoshMode::Copy {
        return Ok(frames.clone());
    }

    if frames.len() < 2 {
        if params.strict {
            return Err(MoshError::InsufficientFrames {
                mode: params.mode,
                frames: frames.len(),
            });
        }
        tracing::warn!(
            "{} mode needs at least 2 frames, passing {} frame(s) through unchanged",
            params.mode,
            frames.len()
        );
        return Ok(frames.clone());
    }

    let output = if params.mode == DatamoshMode::Movement {
        movement(frames, params)?
    } else {
        glide(frames, params)?
    };

    tracing::debug!("Datamosh {} produced {} frames", params.mode, output.len());
    FrameSequence::new(output)
}

/// One step of movement mode: moves the blocks of `current` along the motion
/// found from `current` to `next`.
pub fn movement_step(current: &Frame, next: &Frame, search: &SearchParams) -> Result<Frame> {
    let field = estimate(current, next, search)?;
    apply(current, &field, search.block_size)
}

fn movement(frames: &FrameSequence, params: &DatamoshParams) -> Result<Vec<Frame>> {
    let mut current = frames.first().clone();
    let mut output = Vec::with_capacity(frames.len());
    output.push(current.clone());

    for (n, next) in frames.iter().enumerate().skip(1) {
        current = movement_step(&current, next, &params.search)?;
        tracing::trace!("movement frame {} done", n);
        output.push(current.clone());
    }

    Ok(output)
}

fn glide(frames: &FrameSequence, params: &DatamoshParams) -> Result<Vec<Frame>> {
    let field = estimate(&frames[0], &frames[1], &params.search)?;
    tracing::trace!(
        "glide field estimated, {} of {} blocks move",
        field.vectors().iter().filter(|mv| mv.x != 0 || mv.y != 0).count(),
        field.vectors().len()
    );

    let length = params.sequence_length.get();
    let mut current = frames.first().clone();
    let mut output = Vec::with_capacity(length);
    output.push(current.clone());

    for n in 1..length {
        current = apply(&current, &field, params.search.block_size)?;
        tracing::trace!("glide frame {} done", n);
        output.push(current.clone());
    }

    Ok(output)
}
