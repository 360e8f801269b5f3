//! Summary statistics and histogram of a decoded frame.

use serde::Serialize;

use crate::decoder::{PixelGrid, Samples};

pub const HISTOGRAM_BINS: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameStats {
    pub min: u16,
    pub max: u16,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// `HISTOGRAM_BINS` equal-width bins spanning `[min, max]`.
    pub histogram: Vec<u64>,
}

impl FrameStats {
    pub fn compute(grid: &PixelGrid) -> Self {
        let values: Vec<u16> = match grid.samples() {
            Samples::U8(v) => v.iter().map(|&s| s as u16).collect(),
            Samples::U16(v) => v.clone(),
        };
        Self::from_values(&values)
    }

    fn from_values(values: &[u16]) -> Self {
        let mut histogram = vec![0u64; HISTOGRAM_BINS];
        let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
            return Self {
                min: 0,
                max: 0,
                mean: 0.0,
                std_dev: 0.0,
                histogram,
            };
        };

        let n = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        if min == max {
            histogram[HISTOGRAM_BINS / 2] = values.len() as u64;
        } else {
            let span = (max - min) as f64;
            for &v in values {
                let bin = ((v - min) as f64 / span * HISTOGRAM_BINS as f64) as usize;
                histogram[bin.min(HISTOGRAM_BINS - 1)] += 1;
            }
        }

        Self {
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
            histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_statistics() {
        let grid = PixelGrid::new(4, 1, Samples::U16(vec![2, 4, 4, 6])).unwrap();
        let stats = FrameStats::compute(&grid);
        assert_eq!((stats.min, stats.max), (2, 6));
        assert!((stats.mean - 4.0).abs() < 1e-12);
        assert!((stats.std_dev - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.histogram.iter().sum::<u64>(), 4);
        assert_eq!(stats.histogram[0], 1);
        assert_eq!(stats.histogram[128], 2);
        assert_eq!(stats.histogram[255], 1);
    }

    #[test]
    fn constant_grid_fills_middle_bin() {
        let grid = PixelGrid::new(2, 2, Samples::U8(vec![9; 4])).unwrap();
        let stats = FrameStats::compute(&grid);
        assert_eq!(stats.histogram[128], 4);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn empty_grid_is_all_zero() {
        let grid = PixelGrid::new(0, 0, Samples::U8(Vec::new())).unwrap();
        let stats = FrameStats::compute(&grid);
        assert_eq!(stats.min, 0);
        assert!(stats.histogram.iter().all(|&c| c == 0));
    }
}
