//! Encode adapter: floating buffers to a compressed stream
//!
//! An [`EncodeSession`] validates its settings, configures one encoder,
//! accepts buffers in order and must be finalized exactly once. Finalizing
//! is the caller's job on every exit path, failures included; a session
//! dropped without it leaves the destination unflushed and logs a warning.

use crate::audio::convert::{interleave, write_le, BYTES_PER_SAMPLE};
use crate::audio::types::{FloatBuffer, StreamFormat};
use crate::codec::settings::EncoderSettings;
use crate::error::{ConfigError, Error, Result};
use tracing::{debug, info, warn};

/// Encoder collaborator: consumes interleaved little-endian i16 PCM.
pub trait PcmEncoder: Sized {
    /// Byte sink the encoded stream is written to
    type Sink;

    /// Allocate and configure the encoder. Called at most once per session,
    /// only with validated settings.
    fn configure(sink: Self::Sink, settings: &EncoderSettings, format: StreamFormat) -> Result<Self>;

    /// Encode a block of interleaved little-endian i16 samples
    fn write(&mut self, pcm: &[u8]) -> Result<()>;

    /// Flush buffered frames and close the sink
    fn finish(self) -> Result<()>;
}

/// Lifecycle state of an encode session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeState {
    /// Accepting buffers
    Open,
    /// A write failed; only `finalize` is still allowed
    Failed,
    /// Finalized; every further call is `ClosedStream`
    Closed,
}

/// Check the stream properties an encoder will be configured with
pub fn validate_format(format: StreamFormat) -> std::result::Result<(), ConfigError> {
    if format.sample_rate == 0 {
        return Err(ConfigError::StreamFormat {
            field: "sample_rate",
            value: 0,
        });
    }
    if format.channels == 0 {
        return Err(ConfigError::StreamFormat {
            field: "channels",
            value: 0,
        });
    }
    Ok(())
}

/// Encode session owning one encoder instance
pub struct EncodeSession<E: PcmEncoder> {
    encoder: Option<E>,
    state: EncodeState,
    settings: EncoderSettings,
    format: StreamFormat,

    /// Frame count the scratch buffers are currently sized for
    cached_frames: usize,
    ints: Vec<i16>,
    bytes: Vec<u8>,

    frames_consumed: u64,
}

impl<E: PcmEncoder> EncodeSession<E> {
    /// Validate `settings` and `format`, then configure the encoder.
    ///
    /// # Errors
    /// - `Config` if any field is out of range; no encoder is allocated
    /// - whatever the encoder's `configure` returns
    pub fn open(sink: E::Sink, settings: EncoderSettings, format: StreamFormat) -> Result<Self> {
        settings.validate()?;
        validate_format(format)?;

        let encoder = E::configure(sink, &settings, format)?;
        info!(
            "Encode session opened: {} ({} channels @ {} Hz)",
            settings, format.channels, format.sample_rate
        );

        Ok(Self {
            encoder: Some(encoder),
            state: EncodeState::Open,
            settings,
            format,
            cached_frames: 0,
            ints: Vec::new(),
            bytes: Vec::new(),
            frames_consumed: 0,
        })
    }

    /// Convert `buffer` to PCM and feed it to the encoder.
    ///
    /// # Errors
    /// - `ClosedStream` after `finalize`
    /// - `InvalidState` after an earlier fatal error
    /// - `Encode` if the buffer's channel count differs from the session's
    /// - encoder write failures (the session becomes `Failed`)
    pub fn consume(&mut self, buffer: &FloatBuffer) -> Result<()> {
        match self.state {
            EncodeState::Closed => return Err(Error::ClosedStream),
            EncodeState::Failed => {
                return Err(Error::InvalidState(
                    "encode session failed; only finalize is allowed".to_string(),
                ))
            }
            EncodeState::Open => {}
        }

        let channels = self.format.channels as usize;
        if buffer.channel_count() != channels {
            self.state = EncodeState::Failed;
            return Err(Error::encode(
                "converting buffer",
                format!(
                    "buffer has {} channels, session expects {}",
                    buffer.channel_count(),
                    channels
                ),
            ));
        }

        if buffer.is_empty() {
            return Ok(());
        }
        let frames = buffer.frames();

        if frames != self.cached_frames {
            debug!(
                "Resizing encode scratch: {} -> {} frames",
                self.cached_frames, frames
            );
            self.ints.resize(frames * channels, 0);
            self.bytes.resize(frames * channels * BYTES_PER_SAMPLE, 0);
            self.cached_frames = frames;
        }

        match self.encode_scratch(buffer) {
            Ok(()) => {
                self.frames_consumed += frames as u64;
                Ok(())
            }
            Err(e) => {
                self.state = EncodeState::Failed;
                Err(e)
            }
        }
    }

    fn encode_scratch(&mut self, buffer: &FloatBuffer) -> Result<()> {
        interleave(buffer, &mut self.ints)?;
        write_le(&self.ints, &mut self.bytes)?;
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| Error::InvalidState("encoder already released".to_string()))?;
        encoder.write(&self.bytes)
    }

    /// Flush and close the encoder. Valid exactly once.
    ///
    /// # Errors
    /// - `ClosedStream` on a second call (nothing else happens)
    /// - encoder flush/close failures; the session is closed regardless
    pub fn finalize(&mut self) -> Result<()> {
        if self.state == EncodeState::Closed {
            return Err(Error::ClosedStream);
        }

        self.state = EncodeState::Closed;
        self.ints = Vec::new();
        self.bytes = Vec::new();
        self.cached_frames = 0;

        let Some(encoder) = self.encoder.take() else {
            return Err(Error::ClosedStream);
        };

        encoder.finish()?;
        info!(
            "Encode session finalized after {} frames",
            self.frames_consumed
        );
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> EncodeState {
        self.state
    }

    /// Settings the encoder was configured with
    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Stream format the encoder was configured with
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Total frames accepted so far
    pub fn frames_consumed(&self) -> u64 {
        self.frames_consumed
    }

    /// Frame count the scratch buffers are currently sized for
    pub fn scratch_frames(&self) -> usize {
        self.cached_frames
    }
}

impl<E: PcmEncoder> Drop for EncodeSession<E> {
    fn drop(&mut self) {
        if self.encoder.is_some() {
            warn!(
                "Encode session dropped without finalize after {} frames; output is unflushed",
                self.frames_consumed
            );
        }
    }
}
