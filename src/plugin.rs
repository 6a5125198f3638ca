use std::{
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard, OnceLock},
};

use anyhow::{Result, anyhow, bail};
use vapoursynth::{
    core::CoreRef,
    format::{ColorFamily, Format, SampleType},
    frame::{FrameRef, FrameRefMut},
    node::Node,
    plugins::{Filter, FrameContext},
    prelude::{API, Component, Property},
    video_info::VideoInfo,
};

use crate::{
    block_grid::BlockGrid,
    datamosh::movement_step,
    error::MoshError,
    frame::Frame,
    history::FrameHistory,
    mv::MotionVectorField,
    mv_compensate::apply,
    mv_search::estimate,
    params::{DatamoshMode, DatamoshParams},
    util::{denormalize_sample, normalize_sample},
};

/// Synthesized frames kept for replay, at most this many plus the latest one.
const MAX_CHECKPOINTS: usize = 16;

/// Datamosh filter over a whole clip.
///
/// Every output frame of `movement` and `glide` depends on all of the frames
/// synthesized before it. A bounded [`FrameHistory`] holds a few of them, and
/// each request replays forward from the nearest one.
pub struct Datamosh<'core> {
    /// Input clip
    clip: Node<'core>,
    params: DatamoshParams,

    // Internal fields
    format: Format<'core>,
    width: NonZeroUsize,
    height: NonZeroUsize,
    planes: NonZeroUsize,
    /// number of frames in the input clip
    src_frames: usize,
    state: Mutex<State>,
    /// the single field reused by glide mode
    field: OnceLock<MotionVectorField>,
}

struct State {
    history: FrameHistory,
    /// replay starts chosen in `get_frame_initial`, waiting for `get_frame`
    pending: Vec<Pending>,
}

/// Where a requested movement frame is replayed from.
///
/// Only the source frames after `start` were requested, so `get_frame` must
/// use this start even if the history has moved on since.
struct Pending {
    n: usize,
    /// `None` starts from source frame 0
    start: Option<(usize, Frame)>,
    /// requests for `n` still to be served
    waiting: usize,
}

/// Conversion between clip samples and `[0, 1]` frame samples.
trait Sample: Component + Copy {
    fn to_unit(self, bits: u8) -> f32;
    fn from_unit(value: f32, bits: u8) -> Self;
}

impl Sample for u8 {
    fn to_unit(self, bits: u8) -> f32 {
        normalize_sample(u32::from(self), bits)
    }

    fn from_unit(value: f32, bits: u8) -> Self {
        denormalize_sample(value, bits) as u8
    }
}

impl Sample for u16 {
    fn to_unit(self, bits: u8) -> f32 {
        normalize_sample(u32::from(self), bits)
    }

    fn from_unit(value: f32, bits: u8) -> Self {
        denormalize_sample(value, bits) as u16
    }
}

impl Sample for f32 {
    fn to_unit(self, _bits: u8) -> f32 {
        self
    }

    fn from_unit(value: f32, _bits: u8) -> Self {
        value
    }
}

impl<'core> Datamosh<'core> {
    pub fn new(
        clip: Node<'core>,
        mode: Option<i64>,
        blksize: Option<i64>,
        maxshift: Option<i64>,
        shiftrange: Option<i64>,
        length: Option<i64>,
        strict: Option<i64>,
    ) -> Result<Self> {
        let params = DatamoshParams::new(mode, blksize, maxshift, shiftrange, length, strict)
            .map_err(|e| anyhow!("Datamosh: {e}"))?;

        // Validate video info
        let video_info = clip.info();
        let (width, height) = match video_info.resolution {
            Property::Variable => {
                bail!("Datamosh: variable resolution input clips are not supported")
            }
            // SAFETY: width and height must be positive
            Property::Constant(resolution) => unsafe {
                (
                    NonZeroUsize::new_unchecked(resolution.width),
                    NonZeroUsize::new_unchecked(resolution.height),
                )
            },
        };
        let format = match video_info.format {
            Property::Variable => {
                bail!("Datamosh: variable format input clips are not supported")
            }
            Property::Constant(format) => format,
        };
        match format.sample_type() {
            SampleType::Integer if format.bits_per_sample() <= 16 => (),
            SampleType::Float if format.bits_per_sample() == 32 => (),
            _ => bail!("Datamosh: input clip must be 8-16 bit integer or 32 bit float"),
        }
        if ![ColorFamily::Gray, ColorFamily::RGB, ColorFamily::YUV].contains(&format.color_family())
            || format.sub_sampling_w() > 0
            || format.sub_sampling_h() > 0
        {
            bail!("Datamosh: input clip must be GRAY, RGB, or YUV444");
        }
        let planes = NonZeroUsize::new(format.plane_count())
            .ok_or_else(|| anyhow!("Datamosh: input clip has no planes"))?;

        let src_frames = video_info.num_frames;
        BlockGrid::new(width, height, params.search.block_size)
            .map_err(|e| anyhow!("Datamosh: {e}"))?;
        if params.mode != DatamoshMode::Copy {
            if params.strict && src_frames < 2 {
                bail!(
                    "Datamosh: {}",
                    MoshError::InsufficientFrames {
                        mode: params.mode,
                        frames: src_frames,
                    }
                );
            }
        }

        // SAFETY: constant is non-zero
        let history = FrameHistory::new(unsafe { NonZeroUsize::new_unchecked(MAX_CHECKPOINTS) });

        Ok(Self {
            clip,
            params,
            format,
            width,
            height,
            planes,
            src_frames,
            state: Mutex::new(State {
                history,
                pending: Vec::new(),
            }),
            field: OnceLock::new(),
        })
    }

    fn is_passthrough(&self) -> bool {
        self.params.mode == DatamoshMode::Copy || self.src_frames < 2
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("Datamosh: frame history is poisoned"))
    }

    fn get_src(&self, context: FrameContext, n: usize) -> Result<FrameRef<'core>> {
        self.clip
            .get_frame_filter(context, n)
            .ok_or_else(|| anyhow!("Datamosh: called get_frame_filter before request_frame_filter"))
    }

    /// Offset added to samples of `plane` so they sit in `[0, 1]`.
    fn plane_offset(&self, plane: usize) -> f32 {
        if plane > 0
            && self.format.sample_type() == SampleType::Float
            && self.format.color_family() == ColorFamily::YUV
        {
            0.5
        } else {
            0.0
        }
    }

    fn read_frame(&self, src: &FrameRef<'core>) -> Result<Frame> {
        match (self.format.sample_type(), self.format.bytes_per_sample()) {
            (SampleType::Integer, 1) => self.read_planes::<u8>(src),
            (SampleType::Integer, 2) => self.read_planes::<u16>(src),
            (SampleType::Float, 4) => self.read_planes::<f32>(src),
            _ => bail!("Datamosh: unsupported sample format"),
        }
    }

    fn read_planes<T: Sample>(&self, src: &FrameRef<'core>) -> Result<Frame> {
        let (width, height, planes) = (self.width.get(), self.height.get(), self.planes.get());
        let bits = self.format.bits_per_sample();
        let mut data = vec![0.0f32; width * height * planes];

        for plane in 0..planes {
            let offset = self.plane_offset(plane);
            for (y, dest_row) in data.chunks_exact_mut(width * planes).enumerate() {
                let src_row = src.plane_row::<T>(plane, y);
                for (dest, &sample) in dest_row
                    .iter_mut()
                    .skip(plane)
                    .step_by(planes)
                    .zip(src_row)
                {
                    *dest = sample.to_unit(bits) + offset;
                }
            }
        }

        Ok(Frame::new(self.width, self.height, self.planes, data)?)
    }

    fn write_frame(&self, dest: &mut FrameRefMut<'core>, frame: &Frame) -> Result<()> {
        match (self.format.sample_type(), self.format.bytes_per_sample()) {
            (SampleType::Integer, 1) => self.write_planes::<u8>(dest, frame),
            (SampleType::Integer, 2) => self.write_planes::<u16>(dest, frame),
            (SampleType::Float, 4) => self.write_planes::<f32>(dest, frame),
            _ => bail!("Datamosh: unsupported sample format"),
        }
        Ok(())
    }

    fn write_planes<T: Sample>(&self, dest: &mut FrameRefMut<'core>, frame: &Frame) {
        let planes = self.planes.get();
        let bits = self.format.bits_per_sample();

        for plane in 0..planes {
            let offset = self.plane_offset(plane);
            for (y, src_row) in frame.data().chunks_exact(frame.pitch().get()).enumerate() {
                let dest_row = dest.plane_row_mut::<T>(plane, y);
                for (dest, &sample) in dest_row
                    .iter_mut()
                    .zip(src_row.iter().skip(plane).step_by(planes))
                {
                    *dest = T::from_unit(sample - offset, bits);
                }
            }
        }
    }

    /// Picks the replay start for movement frame `n` and returns the first
    /// source frame that has to be requested for it.
    fn prepare_movement(&self, n: usize) -> Result<usize> {
        let mut state = self.lock_state()?;
        if let Some(pending) = state.pending.iter_mut().find(|pending| pending.n == n) {
            pending.waiting += 1;
            return Ok(pending.start.as_ref().map_or(0, |(index, _)| index + 1));
        }

        let start = state
            .history
            .nearest(n)
            .map(|(index, frame)| (index, frame.clone()));
        let first = start.as_ref().map_or(0, |(index, _)| index + 1);
        state.pending.push(Pending {
            n,
            start,
            waiting: 1,
        });
        Ok(first)
    }

    fn movement_frame(&self, context: FrameContext, n: usize) -> Result<Frame> {
        let mut state = self.lock_state()?;
        let Some(pos) = state.pending.iter().position(|pending| pending.n == n) else {
            bail!("Datamosh: frame {n} was not prepared by get_frame_initial");
        };
        state.pending[pos].waiting -= 1;
        let start = if state.pending[pos].waiting == 0 {
            state.pending.swap_remove(pos).start
        } else {
            state.pending[pos].start.clone()
        };

        let start = match start {
            Some(start) => start,
            None => (0, self.read_frame(&self.get_src(context, 0)?)?),
        };
        state.history.advance(start, n, |index, current| -> Result<Frame> {
            let input = self.read_frame(&self.get_src(context, index)?)?;
            Ok(movement_step(current, &input, &self.params.search)?)
        })
    }

    fn glide_frame(&self, context: FrameContext, n: usize) -> Result<Frame> {
        let field = match self.field.get() {
            Some(field) => field,
            None => {
                let first = self.read_frame(&self.get_src(context, 0)?)?;
                let second = self.read_frame(&self.get_src(context, 1)?)?;
                let field = estimate(&first, &second, &self.params.search)?;
                self.field.get_or_init(|| field)
            }
        };

        let mut state = self.lock_state()?;
        let start = match state.history.nearest(n) {
            Some((index, frame)) => (index, frame.clone()),
            None => (0, self.read_frame(&self.get_src(context, 0)?)?),
        };
        state.history.advance(start, n, |_, current| -> Result<Frame> {
            Ok(apply(current, field, self.params.search.block_size)?)
        })
    }
}

impl<'core> Filter<'core> for Datamosh<'core> {
    fn video_info(&self, _api: API, _core: CoreRef<'core>) -> Vec<VideoInfo<'core>> {
        let mut info = self.clip.info();
        if self.params.mode == DatamoshMode::Glide && !self.is_passthrough() {
            info.num_frames = self.params.sequence_length.get();
        }
        vec![info]
    }

    fn get_frame_initial(
        &self,
        _api: API,
        _core: CoreRef<'core>,
        context: FrameContext,
        n: usize,
    ) -> std::result::Result<Option<FrameRef<'core>>, anyhow::Error> {
        if self.is_passthrough() {
            self.clip.request_frame_filter(context, n);
            return Ok(None);
        }

        match self.params.mode {
            DatamoshMode::Movement => {
                // Frame `n` is also the property template.
                let first = self.prepare_movement(n)?;
                for i in first.min(n)..=n {
                    self.clip.request_frame_filter(context, i);
                }
            }
            _ => {
                self.clip.request_frame_filter(context, 0);
                self.clip.request_frame_filter(context, 1);
            }
        }
        Ok(None)
    }

    fn get_frame(
        &self,
        _api: API,
        core: CoreRef<'core>,
        context: FrameContext,
        n: usize,
    ) -> std::result::Result<FrameRef<'core>, anyhow::Error> {
        if self.is_passthrough() {
            return self.get_src(context, n);
        }

        let (template, frame) = if self.params.mode == DatamoshMode::Movement {
            (self.get_src(context, n)?, self.movement_frame(context, n)?)
        } else {
            (self.get_src(context, 0)?, self.glide_frame(context, n)?)
        };

        let mut dest = FrameRefMut::copy_of(core, &template);
        self.write_frame(&mut dest, &frame)?;
        Ok(dest.into())
    }
}
