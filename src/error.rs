use thiserror::Error;

use crate::params::DatamoshMode;

pub type Result<T, E = MoshError> = std::result::Result<T, E>;

/// Errors raised by the datamosh core.
///
/// All validation happens before any search or compensation work starts,
/// so an error never comes with a partially processed sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoshError {
    /// A parameter or frame shape the core cannot work with.
    ///
    /// Examples:
    /// - frames of different dimensions compared against each other
    /// - a zero block size or shift step
    /// - a block size larger than the frame, which would leave an empty block grid
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `movement` or `glide` was requested on a sequence too short to estimate motion from.
    ///
    /// Only returned in strict mode. Otherwise the sequence is passed through unchanged.
    #[error("{mode} mode needs at least 2 frames, got {frames}")]
    InsufficientFrames { mode: DatamoshMode, frames: usize },
}

impl MoshError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
