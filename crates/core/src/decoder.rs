//! Raw frame bytes to pixel grids.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::config::{BitDepth, Endianness, ImageConfig};
use crate::error::{CoreError, Result};

/// Sample storage, one variant per supported bit depth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::U16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bit_depth(&self) -> BitDepth {
        match self {
            Samples::U8(_) => BitDepth::Eight,
            Samples::U16(_) => BitDepth::Sixteen,
        }
    }

    /// Sample at flat index `i`, widened to `u16`.
    pub fn get(&self, i: usize) -> Option<u16> {
        match self {
            Samples::U8(v) => v.get(i).map(|&s| s as u16),
            Samples::U16(v) => v.get(i).copied(),
        }
    }
}

/// Anything addressable as a row-major `width x height` grid of samples.
pub trait Grid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Sample at flat row-major index; only called with in-bounds indices.
    fn sample_at(&self, index: usize) -> u16;
}

/// Value stored at column `x`, row `y`.
pub fn get_pixel<G: Grid + ?Sized>(grid: &G, x: usize, y: usize) -> Result<u16> {
    if x >= grid.width() || y >= grid.height() {
        return Err(CoreError::OutOfRange(format!(
            "pixel ({x}, {y}) outside {}x{} grid",
            grid.width(),
            grid.height()
        )));
    }
    Ok(grid.sample_at(y * grid.width() + x))
}

/// Decoded frame: `height` rows of `width` samples, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    samples: Samples,
}

impl PixelGrid {
    /// Build a grid from samples; `samples.len()` must equal `width * height`.
    pub fn new(width: usize, height: usize, samples: Samples) -> Result<Self> {
        let needed = width.saturating_mul(height);
        if samples.len() != needed {
            return Err(CoreError::InsufficientData {
                needed,
                available: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.samples.bit_depth()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, x: usize, y: usize) -> Result<u16> {
        get_pixel(self, x, y)
    }
}

impl Grid for PixelGrid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn sample_at(&self, index: usize) -> u16 {
        self.samples.get(index).unwrap_or_default()
    }
}

/// Assemble one 16-bit sample from its two raw bytes.
pub fn decode_u16(pair: [u8; 2], endianness: Endianness) -> u16 {
    match endianness {
        Endianness::Little => LittleEndian::read_u16(&pair),
        Endianness::Big => BigEndian::read_u16(&pair),
    }
}

/// Decode one frame's raw bytes (`frame_size` long, header included).
///
/// Skips `row_offset` header bytes, then reads `width * height` samples
/// row-major. Any bytes past the payload are ignored.
pub fn decode_frame(raw: &[u8], config: &ImageConfig) -> Result<PixelGrid> {
    let width = config.width as usize;
    let height = config.height as usize;
    let needed = config.payload_size();
    let payload = raw.get(config.row_offset..).unwrap_or_default();
    if payload.len() < needed {
        return Err(CoreError::InsufficientData {
            needed,
            available: payload.len(),
        });
    }
    let payload = &payload[..needed];

    let samples = match config.bit_depth {
        BitDepth::Eight => Samples::U8(payload.to_vec()),
        BitDepth::Sixteen => {
            let mut out = vec![0u16; config.pixel_count()];
            match config.endianness {
                Endianness::Little => LittleEndian::read_u16_into(payload, &mut out),
                Endianness::Big => BigEndian::read_u16_into(payload, &mut out),
            }
            Samples::U16(out)
        }
    };
    PixelGrid::new(width, height, samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_bit_is_used_directly() {
        let cfg = ImageConfig::new(3, 2, BitDepth::Eight);
        let grid = decode_frame(&[0, 1, 2, 3, 4, 255], &cfg).unwrap();
        assert_eq!(grid.samples(), &Samples::U8(vec![0, 1, 2, 3, 4, 255]));
        assert_eq!(grid.get(2, 1).unwrap(), 255);
        assert_eq!(grid.get(0, 1).unwrap(), 3);
    }

    #[test]
    fn sixteen_bit_respects_endianness() {
        let raw = [0x01, 0x02];
        let big = ImageConfig::new(1, 1, BitDepth::Sixteen).with_endianness(Endianness::Big);
        let little = big.with_endianness(Endianness::Little);
        assert_eq!(decode_frame(&raw, &big).unwrap().get(0, 0).unwrap(), 258);
        assert_eq!(decode_frame(&raw, &little).unwrap().get(0, 0).unwrap(), 513);
    }

    #[test]
    fn endianness_roundtrip_over_all_pairs() {
        for hi in 0..=255u8 {
            for lo in 0..=255u8 {
                let value = decode_u16([lo, hi], Endianness::Little);
                let reencoded = value.to_le_bytes();
                let swapped = [reencoded[1], reencoded[0]];
                assert_eq!(decode_u16(swapped, Endianness::Big), value);
            }
        }
    }

    #[test]
    fn row_offset_is_skipped() {
        let cfg = ImageConfig::new(2, 1, BitDepth::Sixteen).with_row_offset(3);
        let raw = [0xEE, 0xEE, 0xEE, 0x10, 0x00, 0x20, 0x00];
        let grid = decode_frame(&raw, &cfg).unwrap();
        assert_eq!(grid.samples(), &Samples::U16(vec![0x10, 0x20]));
    }

    #[test]
    fn short_payload_is_insufficient() {
        let cfg = ImageConfig::new(2, 2, BitDepth::Sixteen).with_row_offset(2);
        let err = decode_frame(&[0u8; 9], &cfg).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientData {
                needed: 8,
                available: 7
            }
        ));
        let err = decode_frame(&[0u8; 1], &cfg).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData { available: 0, .. }));
    }

    #[test]
    fn decoding_is_deterministic() {
        let cfg = ImageConfig::new(4, 4, BitDepth::Sixteen).with_endianness(Endianness::Big);
        let raw: Vec<u8> = (0..32u8).map(|b| b.wrapping_mul(37)).collect();
        assert_eq!(decode_frame(&raw, &cfg).unwrap(), decode_frame(&raw, &cfg).unwrap());
    }

    #[test]
    fn get_pixel_bounds() {
        let cfg = ImageConfig::new(3, 2, BitDepth::Eight);
        let raw: Vec<u8> = (10..16).collect();
        let grid = decode_frame(&raw, &cfg).unwrap();
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(get_pixel(&grid, x, y).unwrap(), raw[y * 3 + x] as u16);
            }
        }
        assert!(matches!(get_pixel(&grid, 3, 0), Err(CoreError::OutOfRange(_))));
        assert!(matches!(get_pixel(&grid, 0, 2), Err(CoreError::OutOfRange(_))));
    }
}
