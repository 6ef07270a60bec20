//! Configuration file model and discovery
//!
//! The TOML file only carries raw values. Parsing them into encoder settings
//! (and rejecting out-of-range values) is the job of the `mp3pipe` crate, so
//! this module stays free of codec types.
//!
//! File resolution priority:
//! 1. Explicit path (command-line argument or environment variable)
//! 2. Platform config directory (`<config_dir>/mp3pipe/config.toml`)
//! 3. Built-in defaults (no file)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MP3PIPE_CONFIG";

/// Default number of frames moved per produce/consume call
pub const DEFAULT_BUFFER_SIZE: usize = 512;

/// Top-level configuration file contents
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Frames per buffer handed between decoder and encoder
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Encoder profile (all fields optional)
    #[serde(default)]
    pub encoder: EncoderProfile,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            encoder: EncoderProfile::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Raw encoder values as written in the config file
///
/// Values are kept as text/integers here; unknown modes and out-of-range
/// numbers are reported when the profile is turned into encoder settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EncoderProfile {
    /// Bit rate mode, e.g. `cbr-320`, `abr-128`, `vbr-2`
    #[serde(default)]
    pub bit_rate: Option<String>,

    /// Channel mode, e.g. `mono`, `stereo`, `joint-stereo`
    #[serde(default)]
    pub channel_mode: Option<String>,

    /// Encoder algorithm quality 0 (best) ..= 9 (fastest); absent means codec default
    #[serde(default)]
    pub quality: Option<i64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform default config file location, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mp3pipe").join("config.toml"))
}

/// Pick the config file to load.
///
/// Returns the path and whether it was named explicitly. An explicit path
/// that does not exist is still returned so the caller gets a read error.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<(PathBuf, bool)> {
    if let Some(path) = cli_arg {
        return Some((path.to_path_buf(), true));
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some((PathBuf::from(path), true));
        }
    }

    default_config_path().map(|path| (path, false))
}

/// Parse configuration from TOML text
pub fn parse_config(toml_str: &str, origin: &Path) -> Result<TomlConfig> {
    let config: TomlConfig = toml::from_str(toml_str).map_err(|source| Error::ConfigParse {
        path: origin.to_path_buf(),
        source,
    })?;

    if config.buffer_size == 0 {
        return Err(Error::Config(format!(
            "buffer_size in {:?} must be at least 1 frame",
            origin
        )));
    }

    Ok(config)
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from this file
    File(PathBuf),
    /// The platform default file does not exist; built-in defaults apply
    DefaultMissing(PathBuf),
    /// The platform has no config directory; built-in defaults apply
    BuiltIn,
}

impl ConfigOrigin {
    /// Report the origin through `tracing`.
    ///
    /// Loading happens before the subscriber exists (the file carries the
    /// log level), so callers log the origin once logging is up.
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!("Loaded configuration from {:?}", path),
            ConfigOrigin::DefaultMissing(path) => warn!(
                "Config file not found at {:?}, using built-in defaults",
                path
            ),
            ConfigOrigin::BuiltIn => {
                debug!("No config directory on this platform, using built-in defaults")
            }
        }
    }
}

/// Load configuration following the resolution priority.
///
/// A missing default file is not an error: built-in defaults are returned
/// with `ConfigOrigin::DefaultMissing`. A missing or broken explicit file is
/// an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigOrigin)> {
    let Some((path, explicit)) = resolve_config_path(cli_arg) else {
        return Ok((TomlConfig::default(), ConfigOrigin::BuiltIn));
    };

    if !explicit && !path.exists() {
        return Ok((TomlConfig::default(), ConfigOrigin::DefaultMissing(path)));
    }

    let toml_str = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
        path: path.clone(),
        source,
    })?;

    let config = parse_config(&toml_str, &path)?;
    Ok((config, ConfigOrigin::File(path)))
}
