
use std::{num::NonZeroUsize, ops::Index, slice};

use crate::{
    error::{MoshError, Result},
    util::quantize_unit,
};

/// A single image of `height` rows of `width` pixels with `channels`
/// interleaved samples each, conventionally in `[0, 1]`.
///
/// Frames are never modified once built: every operation that changes
/// pixels produces a new frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: NonZeroUsize,
    height: NonZeroUsize,
    channels: NonZeroUsize,
    data: Box<[f32]>,
}

impl Frame {
    /// Wraps row-major `(height, width, channels)` sample data.
    pub fn new(
        width: NonZeroUsize,
        height: NonZeroUsize,
        channels: NonZeroUsize,
        data: Vec<f32>,
    ) -> Result<Self> {
        let expected = width.get() * height.get() * channels.get();
        if data.len() != expected {
            return Err(MoshError::invalid(format!(
                "frame data has {} samples, expected {expected} for {}x{}x{}",
                data.len(),
                height,
                width,
                channels
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            data: data.into_boxed_slice(),
        })
    }

    /// A frame with every sample set to `value`.
    #[must_use]
    pub fn filled(
        width: NonZeroUsize,
        height: NonZeroUsize,
        channels: NonZeroUsize,
        value: f32,
    ) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![value; width.get() * height.get() * channels.get()].into_boxed_slice(),
        }
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
    pub fn channels(&self) -> NonZeroUsize {
        self.channels
    }

    /// Number of samples per row.
    #[must_use]
    pub fn pitch(&self) -> NonZeroUsize {
        self.width.saturating_mul(self.channels)
    }

    /// `(height, width, channels)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height.get(), self.width.get(), self.channels.get())
    }

    #[must_use]
    pub fn same_shape(&self, other: &Frame) -> bool {
        self.shape() == other.shape()
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The samples of the pixel at column `x`, row `y`.
    ///
    /// # Panics
    /// Panics if the coordinates are outside of the frame.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        assert!(x < self.width.get() && y < self.height.get());
        let offset = y * self.pitch().get() + x * self.channels.get();
        &self.data[offset..offset + self.channels.get()]
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Byte representation used for block matching.
    #[must_use]
    pub fn quantize(&self) -> Vec<u8> {
        self.data.iter().copied().map(quantize_unit).collect()
    }
}

/// An ordered, non-empty run of frames that all share one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        let Some(first) = frames.first() else {
            return Err(MoshError::invalid("a frame sequence needs at least one frame"));
        };
        if let Some((i, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, frame)| !frame.same_shape(first))
        {
            return Err(MoshError::invalid(format!(
                "frame {i} has shape {:?}, but frame 0 has shape {:?}",
                frame.shape(),
                first.shape()
            )));
        }

        Ok(Self { frames })
    }

    /// Splits a dense `(batch, height, width, channels)` array into frames.
    pub fn from_batch(
        data: &[f32],
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
    ) -> Result<Self> {
        let nonzero = |value: usize, name: &str| {
            NonZeroUsize::new(value)
                .ok_or_else(|| MoshError::invalid(format!("batch {name} must be greater than 0")))
        };
        let batch = nonzero(batch, "size")?;
        let height = nonzero(height, "height")?;
        let width = nonzero(width, "width")?;
        let channels = nonzero(channels, "channels")?;

        let frame_len = height.get() * width.get() * channels.get();
        if data.len() != batch.get() * frame_len {
            return Err(MoshError::invalid(format!(
                "batch data has {} samples, expected {} for {}x{}x{}x{}",
                data.len(),
                batch.get() * frame_len,
                batch,
                height,
                width,
                channels
            )));
        }

        let frames = data
            .chunks_exact(frame_len)
            .map(|chunk| Frame::new(width, height, channels, chunk.to_vec()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { frames })
    }

    /// Flattens the sequence back into a dense `(batch, height, width, channels)` array.
    #[must_use]
    pub fn to_batch(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.frames.len() * self.first().data().len());
        for frame in &self.frames {
            out.extend_from_slice(frame.data());
        }
        out
    }

    /// `(batch, height, width, channels)`
    #[must_use]
    pub fn batch_shape(&self) -> (usize, usize, usize, usize) {
        let (h, w, c) = self.first().shape();
        (self.frames.len(), h, w, c)
    }

    #[must_use]
    #[allow(clippy::len_without_is_empty, reason = "sequences are never empty")]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn first(&self) -> &Frame {
        &self.frames[0]
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn iter(&self) -> slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl Index<usize> for FrameSequence {
    type Output = Frame;

    fn index(&self, index: usize) -> &Frame {
        &self.frames[index]
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
