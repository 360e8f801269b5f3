//! Frame addressing arithmetic. No I/O.

use serde::Serialize;

use crate::config::ImageConfig;
use crate::error::{CoreError, Result};

/// Bytes occupied by one frame: pixel payload plus the per-frame offset.
pub fn compute_frame_size(config: &ImageConfig) -> usize {
    config.payload_size().saturating_add(config.row_offset)
}

/// Whole frames that fit in `file_size` bytes.
pub fn compute_total_frames(file_size: usize, frame_size: usize) -> usize {
    if frame_size == 0 {
        0
    } else {
        file_size / frame_size
    }
}

/// Check `config` against a file of `file_size` bytes.
///
/// Advisory: callers decide whether to reject or clamp.
pub fn validate(config: &ImageConfig, file_size: usize) -> Result<()> {
    if config.width == 0 {
        return Err(CoreError::InvalidConfig("width must be positive".into()));
    }
    if config.height == 0 {
        return Err(CoreError::InvalidConfig("height must be positive".into()));
    }
    if compute_frame_size(config) > file_size {
        return Err(CoreError::InvalidConfig(
            "frame size exceeds file size".into(),
        ));
    }
    Ok(())
}

/// Derived layout of a file under one configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FrameGeometry {
    pub file_size: usize,
    pub frame_size: usize,
    pub total_frames: usize,
}

impl FrameGeometry {
    pub fn compute(config: &ImageConfig, file_size: usize) -> Self {
        let frame_size = compute_frame_size(config);
        Self {
            file_size,
            frame_size,
            total_frames: compute_total_frames(file_size, frame_size),
        }
    }

    /// `(offset, length)` of frame `index` within the file.
    pub fn frame_byte_range(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.total_frames {
            return Err(CoreError::IndexOutOfRange {
                index,
                total: self.total_frames,
            });
        }
        Ok((index * self.frame_size, self.frame_size))
    }
}

/// `(offset, length)` of frame `index` for `config` over a file of `file_size` bytes.
pub fn frame_byte_range(
    index: usize,
    config: &ImageConfig,
    file_size: usize,
) -> Result<(usize, usize)> {
    FrameGeometry::compute(config, file_size).frame_byte_range(index)
}
