use std::io;

use thiserror::Error;

/// Result alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Every recoverable failure the engine reports to its caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Non-positive dimensions, unsupported bit depth, bad percentiles, or a
    /// frame larger than the file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Frame index beyond the frames available under the current config.
    #[error("frame index {index} out of range (total frames: {total})")]
    IndexOutOfRange { index: usize, total: usize },
    /// Fewer raw bytes than the frame payload requires.
    #[error("insufficient data: need {needed} bytes, have {available}")]
    InsufficientData { needed: usize, available: usize },
    /// Byte-source read past the end, or a pixel coordinate outside the grid.
    #[error("out of range: {0}")]
    OutOfRange(String),
    /// Search query that is empty, has non-hex characters or odd length.
    #[error("invalid search query: {0}")]
    InvalidQuery(String),
    /// File opened successfully but holds no bytes.
    #[error("file is empty")]
    EmptyFile,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
