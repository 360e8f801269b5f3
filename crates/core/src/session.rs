//! The engine's surface towards a presentation layer.

use std::path::Path;
use std::sync::Arc;

use crate::cache::{DEFAULT_CAPACITY, DecodedFrame, FrameCache};
use crate::config::ImageConfig;
use crate::decoder::{Grid, get_pixel};
use crate::error::Result;
use crate::geometry::{self, FrameGeometry};
use crate::hex::{self, HexLine};
use crate::normalize::NormalizeParams;
use crate::search::{self, validate_query};
use crate::source::{ByteSource, FileInfo};
use crate::stats::FrameStats;

/// One opened file together with its current configuration and frame cache.
///
/// Reads (`get_frame`, `hex_lines`, `search`) take `&self` and may run on
/// worker threads; configuration changes take `&mut self`.
pub struct Session {
    source: ByteSource,
    config: ImageConfig,
    geometry: FrameGeometry,
    params: NormalizeParams,
    cache: FrameCache,
}

impl Session {
    /// Start a session over `source`.
    ///
    /// `config` is accepted even if it does not fit the file; the problem is
    /// logged and the session simply has no frames until it is fixed.
    pub fn new(source: ByteSource, config: ImageConfig) -> Self {
        Self::with_cache_capacity(source, config, DEFAULT_CAPACITY)
    }

    pub fn with_cache_capacity(source: ByteSource, config: ImageConfig, capacity: usize) -> Self {
        if let Err(e) = geometry::validate(&config, source.len()) {
            tracing::debug!("initial configuration does not fit file: {e}");
        }
        let geometry = FrameGeometry::compute(&config, source.len());
        Self {
            source,
            config,
            geometry,
            params: NormalizeParams::default(),
            cache: FrameCache::new(capacity),
        }
    }

    /// Open `path` and start a session with `config`.
    pub fn open(path: &Path, config: ImageConfig) -> Result<Self> {
        Ok(Self::new(ByteSource::open(path)?, config))
    }

    /// Validate and apply `config`, invalidating every cached frame.
    ///
    /// On failure the previous configuration stays in effect.
    pub fn set_config(&mut self, config: ImageConfig) -> Result<()> {
        geometry::validate(&config, self.source.len())?;
        self.config = config;
        self.geometry = FrameGeometry::compute(&config, self.source.len());
        self.cache.clear();
        tracing::info!(
            width = config.width,
            height = config.height,
            bits = config.bit_depth.bits(),
            frames = self.geometry.total_frames,
            "configuration applied"
        );
        Ok(())
    }

    /// Replace the normalization parameters, invalidating every cached frame.
    pub fn set_normalization(&mut self, params: NormalizeParams) {
        self.params = params;
        self.cache.clear();
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn normalization(&self) -> &NormalizeParams {
        &self.params
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn source(&self) -> &ByteSource {
        &self.source
    }

    pub fn file_info(&self) -> FileInfo {
        self.source.file_info()
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    pub fn frame_count(&self) -> usize {
        self.geometry.total_frames
    }

    pub fn frame_size(&self) -> usize {
        self.geometry.frame_size
    }

    /// Decoded and display-normalized frame `index`.
    pub fn get_frame(&self, index: usize) -> Result<Arc<DecodedFrame>> {
        self.cache
            .get_or_decode(index, &self.config, &self.params, &self.source)
    }

    /// Sample at `(x, y)` of any grid returned by this session.
    pub fn get_pixel<G: Grid + ?Sized>(&self, grid: &G, x: usize, y: usize) -> Result<u16> {
        get_pixel(grid, x, y)
    }

    pub fn frame_stats(&self, index: usize) -> Result<FrameStats> {
        Ok(FrameStats::compute(&self.get_frame(index)?.pixels))
    }

    pub fn hex_lines(&self, start_address: usize, count: usize) -> Result<Vec<HexLine>> {
        hex::hex_lines(&self.source, start_address, count)
    }

    /// Offsets of every match of the hex query `query_text`.
    pub fn search(&self, query_text: &str) -> Result<Vec<usize>> {
        let pattern = validate_query(query_text)?;
        Ok(search::search(&self.source, &pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BitDepth, Endianness};
    use crate::error::CoreError;

    fn session(bytes: Vec<u8>, config: ImageConfig) -> Session {
        Session::new(ByteSource::from_bytes(bytes), config)
    }

    #[test]
    fn set_config_clears_cache_and_recomputes() {
        let mut s = session((0..32).collect(), ImageConfig::new(4, 2, BitDepth::Eight));
        assert_eq!(s.frame_count(), 4);
        s.get_frame(0).unwrap();
        assert_eq!(s.cache().len(), 1);

        s.set_config(ImageConfig::new(4, 2, BitDepth::Sixteen)).unwrap();
        assert!(s.cache().is_empty());
        assert_eq!(s.frame_size(), 16);
        assert_eq!(s.frame_count(), 2);
    }

    #[test]
    fn rejected_config_keeps_previous() {
        let mut s = session(vec![0; 16], ImageConfig::new(4, 4, BitDepth::Eight));
        let err = s
            .set_config(ImageConfig::new(4, 4, BitDepth::Sixteen))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
        assert_eq!(s.config().bit_depth, BitDepth::Eight);
        assert_eq!(s.frame_count(), 1);
    }

    #[test]
    fn oversized_initial_config_has_no_frames() {
        let s = session(vec![0; 10], ImageConfig::default());
        assert_eq!(s.frame_count(), 0);
        assert!(matches!(
            s.get_frame(0),
            Err(CoreError::IndexOutOfRange { index: 0, total: 0 })
        ));
    }

    #[test]
    fn frames_are_decoded_with_offset_and_endianness() {
        let cfg = ImageConfig::new(2, 1, BitDepth::Sixteen)
            .with_endianness(Endianness::Big)
            .with_row_offset(2);
        // two frames: [hdr hdr | 0x0001 0x0100]
        let bytes = vec![9, 9, 0x00, 0x01, 0x01, 0x00, 9, 9, 0x00, 0x02, 0x00, 0x03];
        let s = session(bytes, cfg);
        assert_eq!(s.frame_count(), 2);
        let f0 = s.get_frame(0).unwrap();
        assert_eq!(s.get_pixel(&f0.pixels, 0, 0).unwrap(), 1);
        assert_eq!(s.get_pixel(&f0.pixels, 1, 0).unwrap(), 256);
        assert_eq!(f0.display.data(), &[0, 255]);
        let f1 = s.get_frame(1).unwrap();
        assert_eq!(f1.pixels.get(1, 0).unwrap(), 3);
        assert!(matches!(
            s.get_pixel(&f1.display, 2, 0),
            Err(CoreError::OutOfRange(_))
        ));
    }

    #[test]
    fn normalization_change_invalidates() {
        let cfg = ImageConfig::new(3, 1, BitDepth::Sixteen);
        let bytes = vec![0x00, 0x00, 0x00, 0x80, 0xFF, 0xFF];
        let mut s = session(bytes, cfg);
        assert_eq!(s.get_frame(0).unwrap().display.data(), &[0, 128, 255]);
        s.set_normalization(NormalizeParams::linear());
        assert_eq!(s.get_frame(0).unwrap().display.data(), &[0, 127, 255]);
    }

    #[test]
    fn search_and_hex_share_the_source() {
        let s = session(vec![0xAA, 0xBB, 0xCC, 0xAA, 0xBB], ImageConfig::new(5, 1, BitDepth::Eight));
        assert_eq!(s.search("AABB").unwrap(), vec![0, 3]);
        assert!(matches!(s.search("AAB"), Err(CoreError::InvalidQuery(_))));
        let lines = s.hex_lines(0, 4).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].hex.starts_with("AA BB CC AA BB"));
    }

    #[test]
    fn session_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Session>();
    }
}
