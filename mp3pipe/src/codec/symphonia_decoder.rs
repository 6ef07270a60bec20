//! MP3 decoder collaborator backed by symphonia
//!
//! Decodes MP3 packets and hands them out as interleaved stereo i16.
//!
//! # Sample Format
//!
//! - Output: stereo i16, interleaved `[L, R, L, R, ...]`
//! - Mono streams: duplicated to both channels
//! - Sample rate: taken from the first decoded packet and fixed afterwards

use crate::audio::convert::append_as_stereo;
use crate::codec::decode::{DecodeSession, PcmDecoder};
use crate::error::{Error, Result, StreamRole};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Decode session over an MP3 byte stream
pub type Mp3Pump = DecodeSession<SymphoniaDecoder>;

impl Mp3Pump {
    /// Session over any readable byte stream (no seeking required)
    pub fn from_reader<R: Read + Send + Sync + 'static>(reader: R) -> Self {
        Self::new(Box::new(ReadOnlySource::new(reader)))
    }

    /// Session over an MP3 file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::io(
                format!("opening {}", path.display()),
                StreamRole::Source,
                e,
            )
        })?;
        Ok(Self::new(Box::new(file)))
    }
}

/// Symphonia format reader plus MP3 decoder for a single track
pub struct SymphoniaDecoder {
    /// Symphonia format reader
    format: Box<dyn FormatReader>,

    /// Symphonia decoder
    decoder: Box<dyn Decoder>,

    /// Track being decoded
    track_id: u32,

    /// Sample rate fixed at negotiation
    sample_rate: u32,

    /// Reusable conversion target for decoded packets
    sample_buf: Option<SampleBuffer<i16>>,

    /// Decoded stereo samples not yet handed out
    pending: Vec<i16>,

    /// Read position in `pending`
    cursor: usize,

    /// Set once the format reader reported end of input
    finished: bool,
}

impl SymphoniaDecoder {
    /// Decode packets until one yields audio.
    ///
    /// Returns the packet's sample rate, or `None` at clean end of input.
    fn decode_next(&mut self) -> Result<Option<u32>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of MP3 stream");
                    self.finished = true;
                    return Ok(None);
                }
                Err(SymphoniaError::IoError(e)) => {
                    return Err(Error::io("reading MP3 packet", StreamRole::Source, e));
                }
                Err(e) => return Err(Error::decode("reading MP3 packet", e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = self
                .decoder
                .decode(&packet)
                .map_err(|e| Error::decode("decoding MP3 frame", e))?;

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let needs_new_buf = self
                .sample_buf
                .as_ref()
                .map_or(true, |buf| buf.capacity() < decoded.capacity() * spec.channels.count());
            if needs_new_buf {
                self.sample_buf = Some(SampleBuffer::<i16>::new(decoded.capacity() as u64, spec));
            }

            let Some(sample_buf) = self.sample_buf.as_mut() else {
                continue;
            };
            sample_buf.copy_interleaved_ref(decoded);

            self.pending.clear();
            self.cursor = 0;
            append_as_stereo(sample_buf.samples(), spec.channels.count(), &mut self.pending);
            return Ok(Some(spec.rate));
        }
    }
}

impl PcmDecoder for SymphoniaDecoder {
    type Source = Box<dyn MediaSource>;

    fn negotiate(source: Self::Source) -> Result<Self> {
        let mss = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        hint.with_extension("mp3");

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| match e {
                SymphoniaError::IoError(io) => {
                    Error::io("probing MP3 stream", StreamRole::Source, io)
                }
                other => Error::decode("probing MP3 stream", other),
            })?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::decode("selecting track", "no audio track found"))?;

        let track_id = track.id;
        let declared_rate = track.codec_params.sample_rate;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::decode("creating MP3 decoder", e))?;

        let mut this = Self {
            format,
            decoder,
            track_id,
            sample_rate: declared_rate.unwrap_or(0),
            sample_buf: None,
            pending: Vec::new(),
            cursor: 0,
            finished: false,
        };

        // Prime the first packet so the sample rate comes from real audio.
        match this.decode_next()? {
            Some(rate) => this.sample_rate = rate,
            None => {
                return Err(Error::decode(
                    "negotiating MP3 stream",
                    "stream contains no audio frames",
                ))
            }
        }

        debug!(
            "MP3 decoder negotiated: track={}, sample_rate={}",
            this.track_id, this.sample_rate
        );
        Ok(this)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_interleaved(&mut self, out: &mut [i16]) -> Result<usize> {
        let mut written = 0;
        while written < out.len() {
            if self.cursor == self.pending.len() {
                if self.finished || self.decode_next()?.is_none() {
                    break;
                }
                continue;
            }

            let n = (out.len() - written).min(self.pending.len() - self.cursor);
            out[written..written + n]
                .copy_from_slice(&self.pending[self.cursor..self.cursor + n]);
            written += n;
            self.cursor += n;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_garbage_input_fails_to_open() {
        let mut pump = Mp3Pump::from_reader(Cursor::new(vec![0x42u8; 64]));
        assert!(pump.open().is_err());
        assert_eq!(pump.state(), crate::codec::decode::DecodeState::Failed);
    }

    #[test]
    fn test_missing_file_is_source_io_error() {
        let err = Mp3Pump::from_path("/nonexistent/definitely_missing.mp3")
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Io {
                role: StreamRole::Source,
                ..
            }
        ));
    }
}
