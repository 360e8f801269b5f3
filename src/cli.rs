use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use irview_core::{
    BitDepth, Endianness, FrameNavigator, ImageConfig, NormalizeParams, PlaybackSchedule, Session,
    geometry,
};
use serde_json::json;

use crate::export;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show file size and frame layout under the given configuration
    Info(FileArgs),
    /// Decode one frame, print its statistics and optionally export it as PNG
    Frame {
        #[command(flatten)]
        file: FileArgs,
        #[command(flatten)]
        display: DisplayArgs,
        /// Frame index (zero-based)
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Write the normalized frame to this PNG file
        #[arg(long, value_name = "PNG")]
        out: Option<PathBuf>,
    },
    /// Print one pixel's raw and display value
    Pixel {
        #[command(flatten)]
        file: FileArgs,
        #[arg(long, default_value_t = 0)]
        index: usize,
        #[arg(short)]
        x: usize,
        #[arg(short)]
        y: usize,
    },
    /// Hex dump of a window of the file
    Hex {
        #[command(flatten)]
        file: FileArgs,
        /// Start address, decimal or 0x-prefixed hex
        #[arg(long, default_value = "0", value_parser = parse_address)]
        start: usize,
        /// Number of 16-byte lines
        #[arg(long, default_value_t = 16)]
        lines: usize,
    },
    /// Find every offset of a hex byte pattern, e.g. `AABB`
    Search {
        #[command(flatten)]
        file: FileArgs,
        query: String,
        /// Show at most this many offsets in text output
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Step through frames at a fixed rate, printing statistics per frame
    Play {
        #[command(flatten)]
        file: FileArgs,
        #[command(flatten)]
        display: DisplayArgs,
        #[arg(long, default_value_t = irview_core::playback::DEFAULT_FPS)]
        fps: u32,
        /// Number of frames to show (defaults to one pass over the file)
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EndianArg {
    Little,
    Big,
}

impl From<EndianArg> for Endianness {
    fn from(e: EndianArg) -> Self {
        match e {
            EndianArg::Little => Endianness::Little,
            EndianArg::Big => Endianness::Big,
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct FileArgs {
    /// Raw frame file
    pub path: PathBuf,
    #[arg(long, env = "IRVIEW_WIDTH", default_value_t = 640)]
    pub width: u32,
    #[arg(long, env = "IRVIEW_HEIGHT", default_value_t = 512)]
    pub height: u32,
    /// Bits per sample: 8 or 16
    #[arg(long, env = "IRVIEW_BIT_DEPTH", default_value_t = 8)]
    pub bit_depth: u32,
    #[arg(long, env = "IRVIEW_ENDIAN", value_enum, default_value_t = EndianArg::Little)]
    pub endian: EndianArg,
    /// Header bytes skipped at the start of each frame
    #[arg(long, env = "IRVIEW_OFFSET", default_value_t = 0)]
    pub offset: usize,
    /// Frame cache capacity
    #[arg(long, env = "IRVIEW_CACHE", default_value_t = irview_core::cache::DEFAULT_CAPACITY)]
    pub cache: usize,
}

impl FileArgs {
    pub fn config(&self) -> Result<ImageConfig> {
        Ok(ImageConfig {
            width: self.width,
            height: self.height,
            bit_depth: BitDepth::from_bits(self.bit_depth)?,
            endianness: self.endian.into(),
            row_offset: self.offset,
        })
    }

    pub fn open(&self) -> Result<Session> {
        let config = self.config()?;
        let source = irview_core::ByteSource::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        Ok(Session::with_cache_capacity(source, config, self.cache))
    }
}

#[derive(Debug, clap::Args)]
pub struct DisplayArgs {
    /// Low percentile for contrast stretching
    #[arg(long, default_value_t = 0.1)]
    pub low: f64,
    /// High percentile for contrast stretching
    #[arg(long, default_value_t = 99.9)]
    pub high: f64,
    /// Scale 16-bit samples over the full domain instead of stretching
    #[arg(long)]
    pub linear: bool,
}

impl DisplayArgs {
    pub fn params(&self) -> Result<NormalizeParams> {
        if self.linear {
            Ok(NormalizeParams::linear())
        } else {
            Ok(NormalizeParams::percentiles(self.low, self.high)?)
        }
    }
}

fn parse_address(s: &str) -> std::result::Result<usize, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}

pub fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub async fn run() -> Result<()> {
    init_logging();
    let output = dispatch(Args::parse()).await?;
    println!("{output}");
    Ok(())
}

pub async fn dispatch(args: Args) -> Result<String> {
    let json = args.json;
    match args.command {
        Command::Info(file) => info(&file, json),
        Command::Frame {
            file,
            display,
            index,
            out,
        } => frame(&file, &display, index, out, json),
        Command::Pixel { file, index, x, y } => pixel(&file, index, x, y),
        Command::Hex { file, start, lines } => hex(&file, start, lines, json),
        Command::Search { file, query, limit } => search(&file, query, limit, json).await,
        Command::Play {
            file,
            display,
            fps,
            count,
        } => play(&file, &display, fps, count).await,
    }
}

fn info(file: &FileArgs, json: bool) -> Result<String> {
    let session = file.open()?;
    let info = session.file_info();
    let geo = *session.geometry();
    let config = *session.config();
    let problem = geometry::validate(&config, info.file_size)
        .err()
        .map(|e| e.to_string());
    tracing::info!(frames = geo.total_frames, "mode = info");

    if json {
        return Ok(json!({
            "file": info,
            "config": config,
            "geometry": geo,
            "problem": problem,
        })
        .to_string());
    }

    let mut out = String::new();
    writeln!(out, "file:       {}", file.path.display())?;
    writeln!(
        out,
        "size:       {} bytes{}",
        info.file_size,
        if info.memory_mapped { " (memory-mapped)" } else { "" }
    )?;
    writeln!(
        out,
        "config:     {}x{} {}-bit {}-endian, offset {}",
        config.width,
        config.height,
        config.bit_depth.bits(),
        config.endianness,
        config.row_offset
    )?;
    writeln!(out, "frame size: {} bytes", geo.frame_size)?;
    write!(out, "frames:     {}", geo.total_frames)?;
    if let Some(problem) = problem {
        write!(out, "\nwarning:    {problem}")?;
    }
    Ok(out)
}

fn frame(
    file: &FileArgs,
    display: &DisplayArgs,
    index: usize,
    out: Option<PathBuf>,
    json: bool,
) -> Result<String> {
    let mut session = file.open()?;
    session.set_normalization(display.params()?);
    let frame = session
        .get_frame(index)
        .with_context(|| format!("failed to decode frame {index}"))?;
    let stats = session.frame_stats(index)?;
    if let Some(path) = &out {
        export::save_png(&frame.display, path)?;
        tracing::info!(path = %path.display(), "exported frame");
    }

    if json {
        return Ok(json!({ "index": index, "stats": stats, "exported": out }).to_string());
    }
    let mut text = format!(
        "frame {index}/{}: min {} max {} mean {:.1} std {:.1}",
        session.frame_count(),
        stats.min,
        stats.max,
        stats.mean,
        stats.std_dev
    );
    if let Some(path) = out {
        write!(text, "\nwrote {}", path.display())?;
    }
    Ok(text)
}

fn pixel(file: &FileArgs, index: usize, x: usize, y: usize) -> Result<String> {
    let session = file.open()?;
    let frame = session.get_frame(index)?;
    let raw = session.get_pixel(&frame.pixels, x, y)?;
    let shown = session.get_pixel(&frame.display, x, y)?;
    Ok(format!("frame {index} ({x}, {y}): raw {raw} display {shown}"))
}

fn hex(file: &FileArgs, start: usize, lines: usize, json: bool) -> Result<String> {
    let session = file.open()?;
    let lines = session.hex_lines(start, lines)?;
    if json {
        return Ok(serde_json::to_string(&lines)?);
    }
    Ok(lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n"))
}

async fn search(file: &FileArgs, query: String, limit: usize, json: bool) -> Result<String> {
    let session = Arc::new(file.open()?);
    let worker = Arc::clone(&session);
    let q = query.clone();
    let matches = tokio::task::spawn_blocking(move || worker.search(&q)).await??;
    tracing::info!(matches = matches.len(), "mode = search");

    if json {
        return Ok(json!({ "query": query, "count": matches.len(), "matches": matches }).to_string());
    }
    if matches.is_empty() {
        return Ok(format!("no matches for {query}"));
    }
    let mut out = format!("{} match(es) for {query}", matches.len());
    for offset in matches.iter().take(limit) {
        write!(out, "\n0x{offset:08X}")?;
    }
    if matches.len() > limit {
        write!(out, "\n... {} more", matches.len() - limit)?;
    }
    Ok(out)
}

async fn play(file: &FileArgs, display: &DisplayArgs, fps: u32, count: Option<usize>) -> Result<String> {
    let mut session = file.open()?;
    session.set_normalization(display.params()?);
    let session = Arc::new(session);
    let schedule = PlaybackSchedule::from_fps(fps)?;
    let mut nav = FrameNavigator::new(session.frame_count())
        .map_err(|_| anyhow!("no complete frames under this configuration"))?;
    let count = count.unwrap_or(nav.total());

    let mut ticker = tokio::time::interval(schedule.interval());
    let mut out = Vec::with_capacity(count);
    for step in 0..count {
        ticker.tick().await;
        let index = if step == 0 { nav.current() } else { nav.next() };
        let worker = Arc::clone(&session);
        let stats = tokio::task::spawn_blocking(move || worker.frame_stats(index)).await??;
        out.push(format!(
            "frame {index}: min {} max {} mean {:.1}",
            stats.min, stats.max, stats.mean
        ));
    }
    Ok(out.join("\n"))
}
