//! Frame navigation state and the playback scheduling contract.
//!
//! The engine owns no timer. A caller builds a [`PlaybackSchedule`], waits
//! `interval()` between ticks with whatever clock it has, and on each tick
//! calls [`FrameNavigator::next`] followed by `Session::get_frame`.

use std::time::Duration;

use crate::error::{CoreError, Result};

pub const DEFAULT_FPS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameNavigator {
    total: usize,
    current: usize,
}

impl FrameNavigator {
    pub fn new(total: usize) -> Result<Self> {
        if total == 0 {
            return Err(CoreError::InvalidConfig("no frames to navigate".into()));
        }
        Ok(Self { total, current: 0 })
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn set_current(&mut self, index: usize) -> Result<()> {
        if index >= self.total {
            return Err(CoreError::IndexOutOfRange {
                index,
                total: self.total,
            });
        }
        self.current = index;
        Ok(())
    }

    /// Advance one frame, wrapping to the first after the last.
    pub fn next(&mut self) -> usize {
        self.current = (self.current + 1) % self.total;
        self.current
    }

    /// Step back one frame, wrapping to the last before the first.
    pub fn previous(&mut self) -> usize {
        self.current = (self.current + self.total - 1) % self.total;
        self.current
    }

    /// Change the frame count, clamping the current frame into range.
    pub fn set_total(&mut self, total: usize) -> Result<()> {
        if total == 0 {
            return Err(CoreError::InvalidConfig("no frames to navigate".into()));
        }
        self.total = total;
        self.current = self.current.min(total - 1);
        Ok(())
    }
}

/// Tick rate for automatic frame advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackSchedule {
    fps: u32,
}

impl PlaybackSchedule {
    pub fn from_fps(fps: u32) -> Result<Self> {
        if fps == 0 {
            return Err(CoreError::InvalidConfig(
                "frame rate must be positive".into(),
            ));
        }
        Ok(Self { fps })
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(1000 / self.fps as u64)
    }
}

impl Default for PlaybackSchedule {
    fn default() -> Self {
        Self { fps: DEFAULT_FPS }
    }
}
