// Adapts display grids to image files for the CLI.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use image::{GrayImage, ImageFormat};
use irview_core::{DisplayGrid, Grid};

/// Convert a display grid into an 8-bit grayscale image buffer.
pub fn to_gray_image(grid: &DisplayGrid) -> Result<GrayImage> {
    let (width, height) = (grid.width() as u32, grid.height() as u32);
    GrayImage::from_raw(width, height, grid.data().to_vec())
        .ok_or_else(|| anyhow!("display grid does not match {width}x{height}"))
}

/// Write `grid` as a grayscale PNG.
pub fn save_png(grid: &DisplayGrid, path: &Path) -> Result<()> {
    to_gray_image(grid)?
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use irview_core::{BitDepth, ImageConfig, NormalizeParams, decode_frame, normalize};
    use tempfile::tempdir;

    fn grid() -> DisplayGrid {
        let cfg = ImageConfig::new(3, 2, BitDepth::Eight);
        let pixels = decode_frame(&[0, 50, 100, 150, 200, 250], &cfg).unwrap();
        normalize(&pixels, &NormalizeParams::default())
    }

    #[test]
    fn image_keeps_layout() {
        let img = to_gray_image(&grid()).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 1).0, [250]);
        assert_eq!(img.get_pixel(0, 1).0, [150]);
    }

    #[test]
    fn png_is_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.png");
        save_png(&grid(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
