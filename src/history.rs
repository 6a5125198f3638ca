
use std::num::NonZeroUsize;

use crate::{error::MoshError, frame::Frame};

/// Bounded store for a frame sequence that can only be produced front to
/// back, where frame `n` is a function of frame `n - 1`.
///
/// Holds the most recently produced frame and at most `max_checkpoints`
/// evenly spaced earlier frames. When the checkpoints overflow, every other
/// one is dropped and the spacing doubles. Any frame can then be rebuilt by
/// replaying forward from the nearest stored frame before it.
#[derive(Debug, Clone)]
pub struct FrameHistory {
    /// `checkpoints[i]` is frame `i * interval`
    checkpoints: Vec<Frame>,
    interval: NonZeroUsize,
    max_checkpoints: NonZeroUsize,
    /// most recently produced frame and its index
    latest: Option<(usize, Frame)>,
}

impl FrameHistory {
    #[must_use]
    pub fn new(max_checkpoints: NonZeroUsize) -> Self {
        Self {
            checkpoints: Vec::with_capacity(max_checkpoints.get() + 1),
            interval: NonZeroUsize::MIN,
            max_checkpoints,
            latest: None,
        }
    }

    /// Distance between two checkpoints.
    #[must_use]
    pub fn interval(&self) -> NonZeroUsize {
        self.interval
    }

    /// Number of frames currently held.
    #[must_use]
    pub fn stored_frames(&self) -> usize {
        self.checkpoints.len() + usize::from(self.latest.is_some())
    }

    /// The stored frame closest to `n` without going past it, with its index.
    #[must_use]
    pub fn nearest(&self, n: usize) -> Option<(usize, &Frame)> {
        let interval = self.interval.get();
        let checkpoint = self.checkpoints.len().checked_sub(1).map(|last| {
            let i = (n / interval).min(last);
            (i * interval, &self.checkpoints[i])
        });
        let latest = self
            .latest
            .as_ref()
            .filter(|(index, _)| *index <= n)
            .map(|(index, frame)| (*index, frame));

        checkpoint.into_iter().chain(latest).max_by_key(|(index, _)| *index)
    }

    /// Produces frame `n` by applying `step` forward from `start`, a known
    /// frame and its index.
    ///
    /// `step` receives the index of the frame to produce and the frame before
    /// it. Frames that fall on the checkpoint spacing are kept on the way, and
    /// frame `n` becomes the latest frame.
    pub fn advance<S, E>(
        &mut self,
        start: (usize, Frame),
        n: usize,
        mut step: S,
    ) -> Result<Frame, E>
    where
        S: FnMut(usize, &Frame) -> Result<Frame, E>,
        E: From<MoshError>,
    {
        let (mut index, mut current) = start;
        if index > n {
            return Err(MoshError::invalid(format!(
                "cannot replay frame {n} from the later frame {index}"
            ))
            .into());
        }

        self.record(index, &current);
        while index < n {
            index += 1;
            current = step(index, &current)?;
            self.record(index, &current);
        }

        self.latest = Some((n, current.clone()));
        Ok(current)
    }

    fn record(&mut self, index: usize, frame: &Frame) {
        let interval = self.interval.get();
        if index % interval != 0 || index / interval != self.checkpoints.len() {
            return;
        }

        self.checkpoints.push(frame.clone());
        if self.checkpoints.len() > self.max_checkpoints.get() {
            let mut i = 0;
            self.checkpoints.retain(|_| {
                i += 1;
                i % 2 == 1
            });
            // SAFETY: doubling a non-zero interval keeps it non-zero
            self.interval = unsafe { NonZeroUsize::new_unchecked(interval * 2) };
        }
    }
}
