//! Decode adapter: compressed stream to floating buffers
//!
//! A [`DecodeSession`] wraps one decoder for one stream. It is negotiated
//! once, drained buffer by buffer, and never rewound.
//!
//! # Lifecycle
//!
//! ```text
//! Unopened --open--> Opened --produce(full)--> Draining --produce(short/empty)--> Exhausted
//!                       \________________________\______ decoder error ______--> Failed
//! ```
//!
//! Once `Exhausted`, `produce` keeps returning `Ok(None)` without calling
//! the decoder again (the decoder is dropped on exhaustion).

use crate::audio::convert::deinterleave;
use crate::audio::types::{FloatBuffer, StreamFormat};
use crate::error::{Error, Result};
use tracing::{debug, info};

/// The decoder always yields stereo; mono sources are duplicated.
pub const DECODED_CHANNELS: u16 = 2;

/// Decoder collaborator: turns a byte stream into interleaved stereo i16.
pub trait PcmDecoder: Sized {
    /// Byte stream the decoder is opened on
    type Source;

    /// Open the decoder on `source`. Called exactly once per session.
    fn negotiate(source: Self::Source) -> Result<Self>;

    /// Sample rate of the stream, known after negotiation
    fn sample_rate(&self) -> u32;

    /// Fill `out` with interleaved stereo samples.
    ///
    /// Returns the number of samples written. May return fewer than
    /// `out.len()` at packet boundaries; returns 0 only at clean end of
    /// input. Any other failure is an error.
    fn read_interleaved(&mut self, out: &mut [i16]) -> Result<usize>;
}

/// Lifecycle state of a decode session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Created, decoder not yet negotiated
    Unopened,
    /// Negotiated, nothing produced yet
    Opened,
    /// At least one full buffer produced
    Draining,
    /// Source ran dry; only `Ok(None)` from here on
    Exhausted,
    /// A fatal decoder error was returned; the session is unusable
    Failed,
}

enum Stage<D: PcmDecoder> {
    Unopened(D::Source),
    Active(D),
    Done,
}

/// One-shot decode session.
///
/// # Examples
///
/// ```ignore
/// let mut pump = Mp3Pump::from_path("in.mp3")?;
/// let format = pump.open()?;
/// while let Some(buffer) = pump.produce(512)? {
///     // hand buffer to the pipeline
/// }
/// ```
pub struct DecodeSession<D: PcmDecoder> {
    stage: Stage<D>,
    state: DecodeState,
    format: Option<StreamFormat>,

    /// Interleaved scratch, resized only when the requested frame count changes
    scratch: Vec<i16>,

    frames_produced: u64,
}

impl<D: PcmDecoder> DecodeSession<D> {
    /// Create an unopened session over `source`
    pub fn new(source: D::Source) -> Self {
        Self {
            stage: Stage::Unopened(source),
            state: DecodeState::Unopened,
            format: None,
            scratch: Vec::new(),
            frames_produced: 0,
        }
    }

    /// Negotiate with the decoder and report the stream format.
    ///
    /// Channel count is always 2.
    ///
    /// # Errors
    /// - `InvalidState` if the session was already opened
    /// - `Decode`/`Io` if the decoder cannot be created; the session is then
    ///   `Failed`
    pub fn open(&mut self) -> Result<StreamFormat> {
        let source = match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Unopened(source) => source,
            other => {
                self.stage = other;
                return Err(Error::InvalidState(format!(
                    "decode session already opened (state {:?})",
                    self.state
                )));
            }
        };

        let decoder = match D::negotiate(source) {
            Ok(decoder) => decoder,
            Err(e) => {
                self.state = DecodeState::Failed;
                return Err(e);
            }
        };

        let format = StreamFormat::new(DECODED_CHANNELS, decoder.sample_rate());
        info!(
            "Decode session opened: {} channels @ {} Hz",
            format.channels, format.sample_rate
        );

        self.stage = Stage::Active(decoder);
        self.state = DecodeState::Opened;
        self.format = Some(format);
        Ok(format)
    }

    /// Produce the next buffer of up to `target_frames` frames.
    ///
    /// Returns `Ok(None)` at end of stream. A short final buffer holds only
    /// the frames actually decoded.
    ///
    /// # Errors
    /// - `InvalidInput` for `target_frames == 0` or a sample count that
    ///   overflows `usize`
    /// - `InvalidState` before `open` or after a fatal error
    /// - `Decode`/`Io` for decoder failures (the session becomes `Failed`)
    pub fn produce(&mut self, target_frames: usize) -> Result<Option<FloatBuffer>> {
        if self.state == DecodeState::Exhausted {
            return Ok(None);
        }

        let channels = DECODED_CHANNELS as usize;
        let wanted = match target_frames.checked_mul(channels) {
            Some(0) => {
                return Err(Error::InvalidInput(
                    "requested buffer size must be at least 1 frame".to_string(),
                ))
            }
            Some(wanted) => wanted,
            None => {
                return Err(Error::InvalidInput(format!(
                    "requested buffer size of {} frames is too large",
                    target_frames
                )))
            }
        };

        let decoder = match (&mut self.stage, self.state) {
            (_, DecodeState::Failed) => {
                return Err(Error::InvalidState(
                    "decode session failed and cannot be reused".to_string(),
                ))
            }
            (Stage::Active(decoder), _) => decoder,
            _ => {
                return Err(Error::InvalidState(
                    "produce called before open".to_string(),
                ))
            }
        };

        if self.scratch.len() != wanted {
            debug!(
                "Resizing decode scratch: {} -> {} samples",
                self.scratch.len(),
                wanted
            );
            self.scratch.resize(wanted, 0);
        }

        let mut read = 0;
        while read < wanted {
            match decoder.read_interleaved(&mut self.scratch[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) => {
                    self.state = DecodeState::Failed;
                    self.stage = Stage::Done;
                    return Err(e);
                }
            }
        }

        let frames = read / channels;
        if read < wanted {
            self.state = DecodeState::Exhausted;
            self.stage = Stage::Done;
            debug!(
                "Decode source exhausted after {} frames",
                self.frames_produced + frames as u64
            );
        } else {
            self.state = DecodeState::Draining;
        }

        if frames == 0 {
            return Ok(None);
        }

        let mut buffer = FloatBuffer::new(channels, frames);
        deinterleave(&self.scratch[..frames * channels], channels, &mut buffer);
        self.frames_produced += frames as u64;
        Ok(Some(buffer))
    }

    /// Current lifecycle state
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Stream format reported by `open`
    pub fn format(&self) -> Option<StreamFormat> {
        self.format
    }

    /// Total frames handed out so far
    pub fn frames_produced(&self) -> u64 {
        self.frames_produced
    }

    /// Capacity of the interleaved scratch buffer in samples
    pub fn scratch_len(&self) -> usize {
        self.scratch.len()
    }
}
