//! Codec adapters
//!
//! The decode and encode sessions own the lifecycle and sample conversion;
//! the bitstream work is delegated to collaborators behind [`PcmDecoder`]
//! and [`PcmEncoder`]:
//! - symphonia for MP3 decoding
//! - LAME for MP3 encoding (feature `lame`)

pub mod decode;
pub mod encode;
#[cfg(feature = "lame")]
pub mod lame_encoder;
pub mod settings;
pub mod symphonia_decoder;

pub use decode::{DecodeSession, DecodeState, PcmDecoder};
pub use encode::{EncodeSession, EncodeState, PcmEncoder};
#[cfg(feature = "lame")]
pub use lame_encoder::{LameEncoder, Mp3Sink};
pub use settings::{BitRateMode, ChannelMode, EncoderSettings, EncodingQuality};
pub use symphonia_decoder::{Mp3Pump, SymphoniaDecoder};
