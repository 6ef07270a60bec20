//! mp3pipe run configuration
//!
//! Merges, in priority order:
//! 1. Command-line arguments / environment variables (`ConfigOverrides`)
//! 2. TOML configuration file (`mp3pipe_common::TomlConfig`)
//! 3. Built-in defaults (`cbr-320`, joint stereo, codec-default quality)
//!
//! Every textual or numeric value is parsed and range-checked here, so a bad
//! config file fails before any file is opened.

use crate::codec::settings::{
    validate_channel_mode, BitRateMode, ChannelMode, EncoderSettings, EncodingQuality,
};
use crate::error::ConfigError;
use mp3pipe_common::config::DEFAULT_BUFFER_SIZE;
use mp3pipe_common::TomlConfig;
use tracing::debug;

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bit_rate: Option<String>,
    pub channel_mode: Option<String>,
    pub quality: Option<i64>,
    pub buffer_size: Option<usize>,
}

/// Fully resolved and validated run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Encoder settings for the output stream
    pub settings: EncoderSettings,

    /// Frames per produce/consume call
    pub buffer_size: usize,

    /// Log level from the config file
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: EncoderSettings::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Resolve configuration from the file contents and CLI overrides.
    ///
    /// # Errors
    /// `ConfigError` naming the first field that fails to parse or is out of
    /// range.
    pub fn resolve(file: &TomlConfig, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let bit_rate_mode = match overrides.bit_rate.as_deref().or(file.encoder.bit_rate.as_deref()) {
            Some(raw) => raw.parse::<BitRateMode>()?,
            None => BitRateMode::default(),
        };

        let channel_mode = match overrides
            .channel_mode
            .as_deref()
            .or(file.encoder.channel_mode.as_deref())
        {
            Some(raw) => validate_channel_mode(raw)?,
            None => ChannelMode::default(),
        };

        let quality = EncodingQuality::from(overrides.quality.or(file.encoder.quality));

        let settings =
            EncoderSettings::new(bit_rate_mode, channel_mode).with_quality(quality)?;
        settings.validate()?;

        let buffer_size = overrides.buffer_size.unwrap_or(file.buffer_size);
        if buffer_size == 0 {
            return Err(ConfigError::BufferSize { value: 0, min: 1 });
        }

        debug!("Resolved configuration: {} buffer_size={}", settings, buffer_size);

        Ok(Self {
            settings,
            buffer_size,
            log_level: file.logging.level.clone(),
        })
    }
}
