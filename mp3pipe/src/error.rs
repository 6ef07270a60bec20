//! Error types for mp3pipe
//!
//! Configuration problems are raised before any codec resource exists and
//! carry the offending field and its valid range. Stream failures are fatal
//! for the session that raised them and are never retried here.

use std::fmt;
use thiserror::Error;

/// Which side of the adapter an I/O failure happened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    /// Compressed input read by the decoder
    Source,
    /// Compressed output written by the encoder
    Sink,
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamRole::Source => f.write_str("source"),
            StreamRole::Sink => f.write_str("sink"),
        }
    }
}

/// Rejected encoder configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// CBR/ABR rate outside the supported kbps range
    #[error("bit_rate: {mode} rate {value} kbps out of range, expected {min}..={max}")]
    BitRate {
        mode: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// VBR quality outside 0..=9
    #[error("bit_rate: VBR quality {value} out of range, expected {min}..={max}")]
    VbrQuality { value: u32, min: u32, max: u32 },

    /// Encoder algorithm quality outside 0..=9
    #[error("quality: {value} out of range, expected {min}..={max} or unset")]
    Quality { value: i64, min: i64, max: i64 },

    /// Channel mode name or index not in {Mono, Stereo, JointStereo}
    #[error("channel_mode: unknown value '{value}', expected one of mono, stereo, joint-stereo")]
    ChannelMode { value: String },

    /// Bit rate mode text not of the form `cbr-N`, `abr-N` or `vbr-N`
    #[error("bit_rate: unrecognized mode '{value}', expected cbr-<kbps>, abr-<kbps> or vbr-<quality>")]
    BitRateMode { value: String },

    /// Frames per buffer below the minimum
    #[error("buffer_size: {value} frames is too small, expected at least {min}")]
    BufferSize { value: usize, min: usize },

    /// Negotiated stream properties the encoder cannot be configured with
    #[error("{field}: {value} is not a valid stream property")]
    StreamFormat { field: &'static str, value: u32 },
}

impl ConfigError {
    /// Name of the configuration field that was rejected
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::BitRate { .. }
            | ConfigError::VbrQuality { .. }
            | ConfigError::BitRateMode { .. } => "bit_rate",
            ConfigError::Quality { .. } => "quality",
            ConfigError::ChannelMode { .. } => "channel_mode",
            ConfigError::BufferSize { .. } => "buffer_size",
            ConfigError::StreamFormat { field, .. } => *field,
        }
    }
}

/// Main error type for mp3pipe
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid encoder configuration (raised before allocation)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fatal decoder failure
    #[error("Audio decode error while {context}: {message}")]
    Decode { context: String, message: String },

    /// Fatal encoder failure
    #[error("Audio encode error while {context}: {message}")]
    Encode { context: String, message: String },

    /// I/O failure on the compressed stream
    #[error("I/O error while {context} ({role}): {source}")]
    Io {
        context: String,
        role: StreamRole,
        #[source]
        source: std::io::Error,
    },

    /// Operation attempted after the stream was finalized
    #[error("Stream already closed")]
    ClosedStream,

    /// Operation not valid in the session's current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed call arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a decode error
    pub fn decode(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an encode error
    pub fn encode(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Encode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Wrap an I/O error with operation and stream role
    pub fn io(context: impl Into<String>, role: StreamRole, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            role,
            source,
        }
    }

    /// True for errors that describe caller misuse rather than a stream failure
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::ClosedStream | Error::InvalidState(_) | Error::InvalidInput(_)
        )
    }
}

/// Convenience Result type using mp3pipe Error
pub type Result<T> = std::result::Result<T, Error>;
