//! # mp3pipe
//!
//! Streaming MP3 transcoding between compressed streams and planar float
//! buffers.
//!
//! **Purpose:** Decode an MP3 source into fixed-size [`FloatBuffer`]s, and
//! encode such buffers back into an MP3 sink with caller-chosen bitrate mode,
//! channel mode and encoder quality.
//!
//! **Architecture:** symphonia for decoding, LAME (feature `lame`) for
//! encoding, both wrapped in single-owner sessions with explicit lifecycles.

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod transcode;

pub use audio::{FloatBuffer, StreamFormat};
pub use codec::{
    BitRateMode, ChannelMode, DecodeSession, EncodeSession, EncoderSettings, EncodingQuality,
    Mp3Pump,
};
#[cfg(feature = "lame")]
pub use codec::Mp3Sink;
pub use error::{ConfigError, Error, Result, StreamRole};
pub use transcode::{transcode, TranscodeReport};
#[cfg(feature = "lame")]
pub use transcode::transcode_file;
