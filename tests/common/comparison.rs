use std::{fmt::Debug, num::NonZeroUsize};

use anyhow::{Result, bail, ensure};
use vapoursynth::{
    format::SampleType,
    frame::FrameRef,
    node::Node,
    prelude::{Component, Property},
};
use vapoursynth_datamosh::{Frame, FrameSequence, denormalize_sample, normalize_sample};

/// Conversion between clip samples and `[0, 1]` frame samples, the same way
/// the plugin converts them.
pub trait TestSample: Component + Copy + PartialEq + Debug {
    fn to_unit(self, bits: u8) -> f32;
    fn from_unit(value: f32, bits: u8) -> Self;
}

impl TestSample for u8 {
    fn to_unit(self, bits: u8) -> f32 {
        normalize_sample(u32::from(self), bits)
    }

    fn from_unit(value: f32, bits: u8) -> Self {
        denormalize_sample(value, bits) as u8
    }
}

impl TestSample for u16 {
    fn to_unit(self, bits: u8) -> f32 {
        normalize_sample(u32::from(self), bits)
    }

    fn from_unit(value: f32, bits: u8) -> Self {
        denormalize_sample(value, bits) as u16
    }
}

impl TestSample for f32 {
    fn to_unit(self, _bits: u8) -> f32 {
        self
    }

    fn from_unit(value: f32, _bits: u8) -> Self {
        value
    }
}

fn bits_per_sample(node: &Node) -> Result<u8> {
    let Property::Constant(format) = node.info().format else {
        bail!("clip must have a constant format");
    };
    ensure!(
        format.sample_type() == SampleType::Integer || format.bits_per_sample() == 32,
        "unsupported sample type"
    );
    Ok(format.bits_per_sample())
}

fn to_frame<T: TestSample>(src: &FrameRef, bits: u8) -> Result<Frame> {
    let planes = src.format().plane_count();
    let (width, height) = (src.width(0), src.height(0));
    let mut data = vec![0.0f32; width * height * planes];
    for plane in 0..planes {
        for (y, row) in data.chunks_exact_mut(width * planes).enumerate() {
            let src_row = src.plane_row::<T>(plane, y);
            for (dest, &sample) in row.iter_mut().skip(plane).step_by(planes).zip(src_row) {
                *dest = sample.to_unit(bits);
            }
        }
    }

    let nz = |value: usize| NonZeroUsize::new(value).ok_or_else(|| anyhow::anyhow!("empty frame"));
    Ok(Frame::new(nz(width)?, nz(height)?, nz(planes)?, data)?)
}

/// Reads every frame of a clip into a sequence for the core
pub fn read_sequence<T: TestSample>(node: &Node) -> Result<FrameSequence> {
    let bits = bits_per_sample(node)?;
    let frames = (0..node.info().num_frames)
        .map(|n| to_frame::<T>(&node.get_frame(n)?, bits))
        .collect::<Result<Vec<_>>>()?;
    Ok(FrameSequence::new(frames)?)
}

/// Asserts that every frame of `node` holds exactly the samples of `expected`
pub fn assert_matches_core<T: TestSample>(
    node: &Node,
    expected: &FrameSequence,
    label: &str,
) -> Result<()> {
    let bits = bits_per_sample(node)?;
    ensure!(
        node.info().num_frames == expected.len(),
        "{label}: clip has {} frames, expected {}",
        node.info().num_frames,
        expected.len()
    );

    for (n, frame) in expected.iter().enumerate() {
        let actual = node.get_frame(n)?;
        let planes = frame.channels().get();
        for plane in 0..planes {
            for (y, row) in frame.data().chunks_exact(frame.pitch().get()).enumerate() {
                let actual_row = actual.plane_row::<T>(plane, y);
                for (x, (&sample, &value)) in actual_row
                    .iter()
                    .zip(row.iter().skip(plane).step_by(planes))
                    .enumerate()
                {
                    let expected = T::from_unit(value, bits);
                    if sample != expected {
                        bail!(
                            "{label}: frame {n} plane {plane} differs at ({x}, {y}): expected \
                             {expected:?}, got {sample:?}"
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
