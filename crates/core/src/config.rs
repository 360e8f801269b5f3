//! Image configuration supplied by the caller.

use std::fmt;
use std::str::FromStr;

use crc32fast::Hasher;
use serde::Serialize;

use crate::error::{CoreError, Result};

/// Bits per pixel sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    /// Parse a raw bit count; only 8 and 16 are supported.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            other => Err(CoreError::InvalidConfig(format!(
                "bit depth must be 8 or 16, got {other}"
            ))),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        self.bits() as usize / 8
    }
}

/// Byte order used to assemble multi-byte samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl FromStr for Endianness {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "little" | "le" => Ok(Endianness::Little),
            "big" | "be" => Ok(Endianness::Big),
            other => Err(CoreError::InvalidConfig(format!(
                "endianness must be 'little' or 'big', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => write!(f, "little"),
            Endianness::Big => write!(f, "big"),
        }
    }
}

/// Layout of one frame inside the raw file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
    pub bit_depth: BitDepth,
    pub endianness: Endianness,
    /// Header/padding bytes skipped at the start of every frame.
    pub row_offset: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 512,
            bit_depth: BitDepth::Eight,
            endianness: Endianness::Little,
            row_offset: 0,
        }
    }
}

impl ImageConfig {
    pub fn new(width: u32, height: u32, bit_depth: BitDepth) -> Self {
        Self {
            width,
            height,
            bit_depth,
            ..Self::default()
        }
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn with_row_offset(mut self, row_offset: usize) -> Self {
        self.row_offset = row_offset;
        self
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bit_depth.bytes_per_pixel()
    }

    /// Number of samples in one frame.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Bytes of pixel payload in one frame, excluding the row offset.
    pub fn payload_size(&self) -> usize {
        self.pixel_count().saturating_mul(self.bytes_per_pixel())
    }

    /// Value identifying this configuration; any field change yields a new one.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(&self.width.to_be_bytes());
        hasher.update(&self.height.to_be_bytes());
        hasher.update(&[self.bit_depth.bits() as u8]);
        hasher.update(&[match self.endianness {
            Endianness::Little => 0,
            Endianness::Big => 1,
        }]);
        hasher.update(&(self.row_offset as u64).to_be_bytes());
        hasher.finalize()
    }
}
