//! Core audio data types
//!
//! Defines the floating-point buffer exchanged with the pipeline and the
//! stream properties negotiated once per session.

use crate::error::{Error, Result};

/// Channel count and sample rate reported by a decode session and handed
/// to an encode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Number of channels per frame
    pub channels: u16,

    /// Frames per second
    pub sample_rate: u32,
}

impl StreamFormat {
    /// Create a new stream format
    pub fn new(channels: u16, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }
}

/// FloatBuffer holds planar floating-point audio.
///
/// **Format:**
/// - Samples are f32, nominally -1.0 to 1.0 (out-of-range values are kept
///   as-is and clamped only when converted to integer PCM)
/// - One `Vec<f32>` per channel, all of the same length
/// - Frame count varies from call to call
#[derive(Debug, Clone, PartialEq)]
pub struct FloatBuffer {
    channels: Vec<Vec<f32>>,
}

impl FloatBuffer {
    /// Create a silent buffer with `channels` channels of `frames` frames
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; channels],
        }
    }

    /// Build a buffer from per-channel sample vectors.
    ///
    /// # Errors
    /// Returns `InvalidInput` if there are no channels or the channels have
    /// different lengths.
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Result<Self> {
        let Some(first) = channels.first() else {
            return Err(Error::InvalidInput(
                "buffer must have at least one channel".to_string(),
            ));
        };
        let frames = first.len();
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != frames) {
            return Err(Error::InvalidInput(format!(
                "channel {} has {} frames, expected {}",
                idx,
                ch.len(),
                frames
            )));
        }
        Ok(Self { channels })
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// True if the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Samples of one channel
    ///
    /// # Panics
    /// Panics if `index >= channel_count()`
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Mutable samples of one channel
    ///
    /// # Panics
    /// Panics if `index >= channel_count()`
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    /// Iterate over channels
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Resize every channel to `frames` frames, zero-filling new space
    pub fn resize(&mut self, frames: usize) {
        for ch in &mut self.channels {
            ch.resize(frames, 0.0);
        }
    }
}
