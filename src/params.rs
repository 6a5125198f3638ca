use std::{fmt, num::NonZeroUsize, ops::RangeInclusive, str::FromStr};

use crate::error::{MoshError, Result};

pub const DEFAULT_BLOCK_SIZE: usize = 16;
pub const DEFAULT_MAX_SHIFT: usize = 8;
pub const DEFAULT_SHIFT_RANGE: usize = 2;
pub const DEFAULT_SEQUENCE_LENGTH: usize = 30;

pub const BLOCK_SIZE_RANGE: RangeInclusive<usize> = 4..=64;
pub const MAX_SHIFT_RANGE: RangeInclusive<usize> = 1..=32;
pub const SHIFT_RANGE_RANGE: RangeInclusive<usize> = 1..=4;
pub const SEQUENCE_LENGTH_RANGE: RangeInclusive<usize> = 1..=300;

/// How motion is carried through the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatamoshMode {
    /// Return the input unchanged.
    Copy = 0,
    /// Re-estimate motion between the last synthesized frame and every following input frame.
    Movement = 1,
    /// Estimate motion once between the first two frames and keep applying it.
    #[default]
    Glide = 2,
}

impl TryFrom<i64> for DatamoshMode {
    type Error = MoshError;

    fn try_from(val: i64) -> Result<Self> {
        Ok(match val {
            0 => Self::Copy,
            1 => Self::Movement,
            2 => Self::Glide,
            _ => {
                return Err(MoshError::invalid(format!(
                    "Invalid value for 'mode', must be 0-2, got {val}."
                )));
            }
        })
    }
}

impl FromStr for DatamoshMode {
    type Err = MoshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "movement" => Ok(Self::Movement),
            "glide" => Ok(Self::Glide),
            _ => Err(MoshError::invalid(format!(
                "Invalid value for 'mode', must be one of copy, movement, glide, got {s:?}."
            ))),
        }
    }
}

impl fmt::Display for DatamoshMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Copy => "copy",
            Self::Movement => "movement",
            Self::Glide => "glide",
        })
    }
}

/// Block matching settings shared by estimation and compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Side length of the square blocks in pixels.
    pub block_size: NonZeroUsize,
    /// Largest displacement searched along each axis, in pixels.
    pub max_shift: NonZeroUsize,
    /// Step between two searched displacements.
    pub shift_range: NonZeroUsize,
}

impl SearchParams {
    /// Builds search settings from raw values, only checking that they are positive.
    ///
    /// The host-facing ranges are enforced by [`DatamoshParams::new`] instead.
    pub fn new(block_size: usize, max_shift: usize, shift_range: usize) -> Result<Self> {
        let positive = |value: usize, name: &str| {
            NonZeroUsize::new(value)
                .ok_or_else(|| MoshError::invalid(format!("'{name}' must be greater than 0")))
        };
        Ok(Self {
            block_size: positive(block_size, "blksize")?,
            max_shift: positive(max_shift, "maxshift")?,
            shift_range: positive(shift_range, "shiftrange")?,
        })
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        // SAFETY: constants are non-zero
        unsafe {
            Self {
                block_size: NonZeroUsize::new_unchecked(DEFAULT_BLOCK_SIZE),
                max_shift: NonZeroUsize::new_unchecked(DEFAULT_MAX_SHIFT),
                shift_range: NonZeroUsize::new_unchecked(DEFAULT_SHIFT_RANGE),
            }
        }
    }
}

/// Everything a single `run` invocation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatamoshParams {
    pub mode: DatamoshMode,
    pub search: SearchParams,
    /// Number of frames produced by glide mode. Ignored by the other modes.
    pub sequence_length: NonZeroUsize,
    /// Fail with `InsufficientFrames` instead of passing short sequences through.
    pub strict: bool,
}

impl Default for DatamoshParams {
    fn default() -> Self {
        Self {
            mode: DatamoshMode::default(),
            search: SearchParams::default(),
            // SAFETY: constant is non-zero
            sequence_length: unsafe { NonZeroUsize::new_unchecked(DEFAULT_SEQUENCE_LENGTH) },
            strict: false,
        }
    }
}

impl DatamoshParams {
    /// Builds parameters from the optional integer arguments a host passes in,
    /// filling in defaults for anything missing.
    pub fn new(
        mode: Option<i64>,
        blksize: Option<i64>,
        maxshift: Option<i64>,
        shiftrange: Option<i64>,
        length: Option<i64>,
        strict: Option<i64>,
    ) -> Result<Self> {
        let mode = mode.map_or(Ok(DatamoshMode::default()), DatamoshMode::try_from)?;
        let block_size = parse_ranged("blksize", blksize, DEFAULT_BLOCK_SIZE, BLOCK_SIZE_RANGE)?;
        let max_shift = parse_ranged("maxshift", maxshift, DEFAULT_MAX_SHIFT, MAX_SHIFT_RANGE)?;
        let shift_range = parse_ranged(
            "shiftrange",
            shiftrange,
            DEFAULT_SHIFT_RANGE,
            SHIFT_RANGE_RANGE,
        )?;
        let sequence_length = parse_ranged(
            "length",
            length,
            DEFAULT_SEQUENCE_LENGTH,
            SEQUENCE_LENGTH_RANGE,
        )?;

        Ok(Self {
            mode,
            search: SearchParams {
                block_size,
                max_shift,
                shift_range,
            },
            sequence_length,
            strict: strict.is_some_and(|strict| strict > 0),
        })
    }
}

fn parse_ranged(
    name: &str,
    value: Option<i64>,
    default: usize,
    range: RangeInclusive<usize>,
) -> Result<NonZeroUsize> {
    let value = match value {
        None => default,
        Some(value) => usize::try_from(value)
            .ok()
            .filter(|value| range.contains(value))
            .ok_or_else(|| {
                MoshError::invalid(format!(
                    "Invalid value for '{name}', must be {}-{}, got {value}.",
                    range.start(),
                    range.end()
                ))
            })?,
    };
    NonZeroUsize::new(value)
        .ok_or_else(|| MoshError::invalid(format!("'{name}' must be greater than 0")))
}
