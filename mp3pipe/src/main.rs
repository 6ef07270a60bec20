//! mp3pipe - transcode one MP3 file into another
//!
//! Decodes `INPUT` with symphonia and re-encodes it into `OUTPUT` with LAME,
//! using bitrate, channel mode and quality from the command line, the
//! environment or the TOML config file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use mp3pipe::config::{Config, ConfigOverrides};
use mp3pipe::transcode_file;

/// Command-line arguments for mp3pipe
#[derive(Parser, Debug)]
#[command(name = "mp3pipe")]
#[command(about = "Streaming MP3 transcoder")]
#[command(version)]
struct Args {
    /// MP3 file to decode
    input: PathBuf,

    /// MP3 file to write (created or truncated)
    output: PathBuf,

    /// Configuration file (default: <config dir>/mp3pipe/config.toml)
    #[arg(short, long, env = "MP3PIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Bitrate mode: cbr-<kbps>, abr-<kbps> or vbr-<0..9>
    #[arg(short, long, env = "MP3PIPE_BIT_RATE")]
    bit_rate: Option<String>,

    /// Channel mode: mono, stereo or joint-stereo
    #[arg(long, env = "MP3PIPE_CHANNEL_MODE")]
    channel_mode: Option<String>,

    /// Encoder quality 0 (best) ..= 9 (fastest)
    #[arg(short, long, env = "MP3PIPE_QUALITY", allow_negative_numbers = true)]
    quality: Option<i64>,

    /// Frames per buffer moved from decoder to encoder
    #[arg(long, env = "MP3PIPE_BUFFER_SIZE")]
    buffer_size: Option<usize>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bit_rate: self.bit_rate.clone(),
            channel_mode: self.channel_mode.clone(),
            quality: self.quality,
            buffer_size: self.buffer_size,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (file_config, origin) = mp3pipe_common::config::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    mp3pipe_common::logging::init_tracing(env!("CARGO_PKG_NAME"), &file_config.logging.level)
        .context("Failed to initialize logging")?;
    origin.log();

    info!(
        "mp3pipe {} ({}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = Config::resolve(&file_config, &args.overrides())
        .context("Invalid encoder configuration")?;

    info!(
        "Transcoding {} -> {} ({})",
        args.input.display(),
        args.output.display(),
        config.settings
    );

    let report = transcode_file(&args.input, &args.output, config.settings, config.buffer_size)
        .with_context(|| {
            format!(
                "Failed to transcode {} into {}",
                args.input.display(),
                args.output.display()
            )
        })?;

    info!(
        "Done: {} frames @ {} Hz ({:.2}s)",
        report.frames,
        report.format.sample_rate,
        report.duration().as_secs_f64()
    );
    Ok(())
}
