// THEORY:
// Every operation in the engine validates its inputs up front and fails before
// touching any data. The error kinds mirror the three ways a run can go wrong:
// a caller handed us a bad number, the samples disagree about their shape, or
// the reference image could not be obtained in the first place. The remaining
// variants only wrap failures from the I/O collaborators.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AveragingError {
    /// A numeric argument or an input image was outside the accepted domain.
    #[error("invalid parameter `{parameter}`: {reason}")]
    InvalidParameter { parameter: &'static str, reason: String },

    /// Two images that must share a shape did not.
    #[error(
        "dimension mismatch at sample {index}: expected {expected:?} (h, w, c), found {found:?}"
    )]
    DimensionMismatch {
        index: usize,
        expected: (u32, u32, u8),
        found: (u32, u32, u8),
    },

    /// The reference image (or a persisted sample) is missing or undecodable.
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// A sample worker went away before returning its result.
    #[error("sample worker failed: {0}")]
    Worker(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl AveragingError {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AveragingError>;
