//! Contrast stretching of decoded frames into 8-bit display grids.
//!
//! Raw infrared samples tend to occupy a narrow band of the 16-bit range, so
//! 16-bit grids are stretched between two percentiles of their own
//! distribution. Percentiles (rather than min/max) keep hot or dead pixels
//! from flattening the usable range.

use serde::Serialize;

use crate::decoder::{Grid, PixelGrid, Samples, get_pixel};
use crate::error::{CoreError, Result};

/// Below this spread a grid is treated as constant.
pub const EPSILON: f64 = 1e-10;

/// Output value for grids with no usable contrast.
pub const MID_GRAY: u8 = 128;

/// How 16-bit samples are compressed into 8 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub enum Mapping {
    /// Stretch between the `low` and `high` percentiles.
    #[default]
    Percentile,
    /// Scale the full 0..=65535 domain onto 0..=255.
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NormalizeParams {
    pub low: f64,
    pub high: f64,
    pub mapping: Mapping,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            low: 0.1,
            high: 99.9,
            mapping: Mapping::Percentile,
        }
    }
}

impl NormalizeParams {
    /// Percentile stretch between `low` and `high` (both in `0..=100`).
    pub fn percentiles(low: f64, high: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) {
            return Err(CoreError::InvalidConfig(format!(
                "percentiles must lie in [0, 100], got {low} and {high}"
            )));
        }
        if low > high {
            return Err(CoreError::InvalidConfig(format!(
                "low percentile {low} exceeds high percentile {high}"
            )));
        }
        Ok(Self {
            low,
            high,
            mapping: Mapping::Percentile,
        })
    }

    pub fn linear() -> Self {
        Self {
            mapping: Mapping::Linear,
            ..Self::default()
        }
    }
}

/// Display-ready 8-bit grid, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayGrid {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl DisplayGrid {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Result<u8> {
        get_pixel(self, x, y).map(|v| v as u8)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Grid for DisplayGrid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn sample_at(&self, index: usize) -> u16 {
        self.data.get(index).copied().unwrap_or_default() as u16
    }
}

/// Convert a decoded grid into its display form.
///
/// 8-bit grids pass through unchanged; 16-bit grids go through `params.mapping`.
pub fn normalize(grid: &PixelGrid, params: &NormalizeParams) -> DisplayGrid {
    let data = match grid.samples() {
        Samples::U8(v) => v.clone(),
        Samples::U16(v) => match params.mapping {
            Mapping::Percentile => stretch(v, params.low, params.high),
            Mapping::Linear => v.iter().map(|&s| (s as u32 * 255 / 65535) as u8).collect(),
        },
    };
    DisplayGrid {
        width: grid.width(),
        height: grid.height(),
        data,
    }
}

fn stretch(samples: &[u16], low: f64, high: f64) -> Vec<u8> {
    let Some((vmin, vmax)) = percentile_bounds(samples, low, high) else {
        return Vec::new();
    };
    let span = vmax - vmin;
    if span < EPSILON {
        return vec![MID_GRAY; samples.len()];
    }
    samples
        .iter()
        .map(|&s| ((s as f64 - vmin) / span * 255.0).clamp(0.0, 255.0).round() as u8)
        .collect()
}

/// Values at the `low` and `high` percentiles, or `None` for no samples.
///
/// Interpolates linearly between the two closest ranks
/// (`rank = p / 100 * (n - 1)`), so a single sample yields itself for both.
pub fn percentile_bounds(samples: &[u16], low: f64, high: f64) -> Option<(f64, f64)> {
    if samples.is_empty() {
        return None;
    }
    let mut counts = vec![0u64; u16::MAX as usize + 1];
    for &s in samples {
        counts[s as usize] += 1;
    }
    let n = samples.len() as u64;
    Some((percentile(&counts, n, low), percentile(&counts, n, high)))
}

fn percentile(counts: &[u64], n: u64, p: f64) -> f64 {
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as u64;
    let hi = rank.ceil() as u64;
    let a = kth_smallest(counts, lo) as f64;
    let b = kth_smallest(counts, hi) as f64;
    a + (b - a) * (rank - lo as f64)
}

/// Zero-based order statistic from a counting histogram.
fn kth_smallest(counts: &[u64], k: u64) -> u16 {
    let mut seen = 0u64;
    for (value, &count) in counts.iter().enumerate() {
        seen += count;
        if seen > k {
            return value as u16;
        }
    }
    (counts.len() - 1) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BitDepth, ImageConfig};
    use crate::decoder::decode_frame;

    fn grid16(width: usize, height: usize, values: Vec<u16>) -> PixelGrid {
        PixelGrid::new(width, height, Samples::U16(values)).unwrap()
    }

    #[test]
    fn eight_bit_passes_through() {
        let cfg = ImageConfig::new(4, 1, BitDepth::Eight);
        let grid = decode_frame(&[3, 9, 200, 1], &cfg).unwrap();
        let out = normalize(&grid, &NormalizeParams::default());
        assert_eq!(out.data(), &[3, 9, 200, 1]);
    }

    #[test]
    fn narrow_band_is_stretched_to_full_range() {
        let values: Vec<u16> = (0..1000).map(|i| 1000 + i * 4).collect();
        let out = normalize(&grid16(100, 10, values), &NormalizeParams::default());
        assert_eq!(out.data().iter().min(), Some(&0));
        assert_eq!(out.data().iter().max(), Some(&255));
    }

    #[test]
    fn outliers_are_clipped() {
        let mut values = vec![2000u16; 10_000];
        for (i, v) in values.iter_mut().enumerate() {
            *v += (i % 100) as u16;
        }
        values[0] = 0;
        values[1] = 65535;
        let out = normalize(&grid16(100, 100, values), &NormalizeParams::default());
        // Mid-band sample lands near the middle instead of being crushed
        // into a few gray levels by the two outliers.
        let mid = out.get(50, 0).unwrap();
        assert!((100..=160).contains(&mid), "mid = {mid}");
        assert_eq!(out.get(0, 0).unwrap(), 0);
        assert_eq!(out.get(1, 0).unwrap(), 255);
    }

    #[test]
    fn constant_grid_is_mid_gray() {
        let out = normalize(&grid16(3, 3, vec![4242; 9]), &NormalizeParams::default());
        assert!(out.data().iter().all(|&v| v == MID_GRAY));
    }

    #[test]
    fn single_pixel_degenerates_to_mid_gray() {
        let out = normalize(&grid16(1, 1, vec![7]), &NormalizeParams::default());
        assert_eq!(out.data(), &[MID_GRAY]);
    }

    #[test]
    fn empty_grid_stays_empty() {
        let out = normalize(&grid16(0, 0, Vec::new()), &NormalizeParams::default());
        assert!(out.is_empty());
    }

    #[test]
    fn two_values_map_to_extremes() {
        let out = normalize(&grid16(2, 1, vec![10, 20]), &NormalizeParams::default());
        assert_eq!(out.data(), &[0, 255]);
    }

    #[test]
    fn percentiles_interpolate() {
        let samples: Vec<u16> = (0..=100).collect();
        let (lo, hi) = percentile_bounds(&samples, 10.0, 90.0).unwrap();
        assert!((lo - 10.0).abs() < 1e-9);
        assert!((hi - 90.0).abs() < 1e-9);
        let (lo, hi) = percentile_bounds(&[0, 10], 25.0, 75.0).unwrap();
        assert!((lo - 2.5).abs() < 1e-9);
        assert!((hi - 7.5).abs() < 1e-9);
    }

    #[test]
    fn linear_mapping_uses_full_domain() {
        let out = normalize(&grid16(3, 1, vec![0, 32768, 65535]), &NormalizeParams::linear());
        assert_eq!(out.data(), &[0, 127, 255]);
    }

    #[test]
    fn invalid_percentiles_rejected() {
        assert!(NormalizeParams::percentiles(-1.0, 50.0).is_err());
        assert!(NormalizeParams::percentiles(60.0, 40.0).is_err());
        assert!(NormalizeParams::percentiles(0.0, 100.0).is_ok());
    }
}
