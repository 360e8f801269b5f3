//! Headless engine for raw infrared frame files: frame addressing, decoding,
//! contrast normalization, frame caching, hex dumps and byte search.

pub mod cache;
pub mod config;
pub mod decoder;
pub mod error;
pub mod geometry;
pub mod hex;
pub mod normalize;
pub mod playback;
pub mod search;
pub mod session;
pub mod source;
pub mod stats;

pub use cache::{CacheKey, DecodedFrame, FrameCache};
pub use config::{BitDepth, Endianness, ImageConfig};
pub use decoder::{Grid, PixelGrid, Samples, decode_frame, get_pixel};
pub use error::{CoreError, Result};
pub use geometry::FrameGeometry;
pub use self::hex::{HexLine, format_line};
pub use normalize::{DisplayGrid, Mapping, NormalizeParams, normalize};
pub use playback::{FrameNavigator, PlaybackSchedule};
pub use search::{Pattern, validate_query};
pub use session::Session;
pub use source::{ByteSource, FileInfo};
pub use stats::FrameStats;
