//! MP3 encoder collaborator backed by LAME
//!
//! Consumes interleaved little-endian i16 PCM and writes MP3 frames to any
//! `std::io::Write` sink.
//!
//! # Settings mapping
//!
//! - `Cbr(rate)`: VBR off, bitrate `rate`
//! - `Abr(rate)`: ABR mode, mean bitrate `rate` as given
//! - `Vbr(q)`: MTRH mode, VBR quality `q`
//! - CBR rates snap down to the nearest bitrate LAME accepts (minimum 8 kbps)
//! - Unset encoding quality leaves LAME's own default in place
//! - No VBR/Info tag frame: the output is written front to back and never
//!   patched afterwards

use crate::audio::convert::read_le;
use crate::audio::types::StreamFormat;
use crate::codec::encode::{EncodeSession, PcmEncoder};
use crate::codec::settings::{BitRateMode, ChannelMode, EncoderSettings, EncodingQuality};
use crate::error::{Error, Result, StreamRole};
use mp3lame_encoder::{
    Bitrate, Builder, Encoder, FlushNoGap, InterleavedPcm, Mode, MonoPcm, Quality, VbrMode,
};
use mp3lame_sys::lame_set_VBR_mean_bitrate_kbps;
use std::os::raw::c_int;
use std::io::Write;
use std::mem::MaybeUninit;
use tracing::debug;

/// Encode session writing MP3 to `W`
pub type Mp3Sink<W> = EncodeSession<LameEncoder<W>>;

/// LAME's worst case output for `samples` samples per channel
fn max_output_size(samples: usize) -> usize {
    samples * 5 / 4 + 7200
}

/// Largest LAME bitrate not above `kbps` (8 kbps floor)
pub fn lame_bitrate(kbps: u32) -> Bitrate {
    match kbps {
        0..=15 => Bitrate::Kbps8,
        16..=23 => Bitrate::Kbps16,
        24..=31 => Bitrate::Kbps24,
        32..=39 => Bitrate::Kbps32,
        40..=47 => Bitrate::Kbps40,
        48..=63 => Bitrate::Kbps48,
        64..=79 => Bitrate::Kbps64,
        80..=95 => Bitrate::Kbps80,
        96..=111 => Bitrate::Kbps96,
        112..=127 => Bitrate::Kbps112,
        128..=159 => Bitrate::Kbps128,
        160..=191 => Bitrate::Kbps160,
        192..=223 => Bitrate::Kbps192,
        224..=255 => Bitrate::Kbps224,
        256..=319 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

/// LAME quality preset for a 0..=9 level (values above 9 map to the fastest)
pub fn lame_quality(level: u32) -> Quality {
    match level {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        _ => Quality::Worst,
    }
}

fn lame_mode(mode: ChannelMode) -> Mode {
    match mode {
        ChannelMode::Mono => Mode::Mono,
        ChannelMode::Stereo => Mode::Stereo,
        ChannelMode::JointStereo => Mode::JointStereo,
    }
}

/// ABR target in kbps. LAME reads the ABR mean from its own field, not from
/// the CBR bitrate, and accepts any value in 8..=320 without snapping.
fn set_abr_mean_bitrate(builder: &mut Builder, kbps: u32) -> Result<()> {
    let kbps = c_int::try_from(kbps).map_err(|_| build_error("abr bitrate", kbps))?;
    // SAFETY: the pointer comes from a live builder and is only used for
    // this setter; ownership stays with the builder.
    let status = unsafe { lame_set_VBR_mean_bitrate_kbps(builder.as_ptr(), kbps) };
    if status != 0 {
        return Err(build_error("abr bitrate", status));
    }
    Ok(())
}

fn build_error(stage: &str, e: impl std::fmt::Debug) -> Error {
    Error::encode(format!("configuring LAME ({})", stage), format!("{:?}", e))
}

/// LAME encoder writing into `W`
pub struct LameEncoder<W: Write> {
    encoder: Encoder,
    sink: W,
    channels: u16,

    /// Decoded PCM samples of the current write
    pcm: Vec<i16>,

    /// LAME output scratch
    mp3: Vec<MaybeUninit<u8>>,
}

impl<W: Write> LameEncoder<W> {
    fn write_encoded(&mut self, len: usize, context: &str) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        // SAFETY: LAME initialized the first `len` bytes it reported writing.
        let bytes: &[u8] =
            unsafe { std::slice::from_raw_parts(self.mp3.as_ptr().cast::<u8>(), len) };
        self.sink
            .write_all(bytes)
            .map_err(|e| Error::io(context.to_string(), StreamRole::Sink, e))
    }

    fn ensure_output_capacity(&mut self, samples_per_channel: usize) {
        let needed = max_output_size(samples_per_channel);
        if self.mp3.len() < needed {
            self.mp3.resize(needed, MaybeUninit::uninit());
        }
    }
}

impl<W: Write> PcmEncoder for LameEncoder<W> {
    type Sink = W;

    fn configure(sink: W, settings: &EncoderSettings, format: StreamFormat) -> Result<Self> {
        let mut builder = Builder::new()
            .ok_or_else(|| Error::encode("configuring LAME", "failed to allocate encoder"))?;

        builder
            .set_sample_rate(format.sample_rate)
            .map_err(|e| build_error("sample rate", e))?;
        let channels = u8::try_from(format.channels)
            .map_err(|_| build_error("channels", format.channels))?;
        builder
            .set_num_channels(channels)
            .map_err(|e| build_error("channels", e))?;

        match settings.bit_rate_mode() {
            BitRateMode::Cbr(rate) => {
                builder
                    .set_vbr_mode(VbrMode::Off)
                    .map_err(|e| build_error("vbr mode", e))?;
                builder
                    .set_brate(lame_bitrate(rate))
                    .map_err(|e| build_error("bitrate", e))?;
            }
            BitRateMode::Abr(rate) => {
                builder
                    .set_vbr_mode(VbrMode::Abr)
                    .map_err(|e| build_error("vbr mode", e))?;
                set_abr_mean_bitrate(&mut builder, rate)?;
            }
            BitRateMode::Vbr(quality) => {
                builder
                    .set_vbr_mode(VbrMode::Mtrh)
                    .map_err(|e| build_error("vbr mode", e))?;
                builder
                    .set_vbr_quality(lame_quality(quality))
                    .map_err(|e| build_error("vbr quality", e))?;
            }
        }

        if let EncodingQuality::Level(level) = settings.quality() {
            let level = u32::try_from(level).map_err(|_| build_error("quality", level))?;
            builder
                .set_quality(lame_quality(level))
                .map_err(|e| build_error("quality", e))?;
        }

        builder
            .set_mode(lame_mode(settings.channel_mode()))
            .map_err(|e| build_error("channel mode", e))?;
        builder
            .set_to_write_vbr_tag(false)
            .map_err(|e| build_error("vbr tag", e))?;

        let encoder = builder.build().map_err(|e| build_error("init params", e))?;
        debug!(
            "LAME configured: {} @ {} Hz, {} -> {} channels",
            settings,
            format.sample_rate,
            format.channels,
            settings.channel_mode().output_channels()
        );

        Ok(Self {
            encoder,
            sink,
            channels: format.channels,
            pcm: Vec::new(),
            mp3: Vec::new(),
        })
    }

    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        read_le(pcm, &mut self.pcm)?;
        if self.pcm.is_empty() {
            return Ok(());
        }

        let samples_per_channel = self.pcm.len() / self.channels as usize;
        self.ensure_output_capacity(samples_per_channel);

        let encoded = if self.channels == 1 {
            self.encoder.encode(MonoPcm(&self.pcm), &mut self.mp3)
        } else {
            self.encoder.encode(InterleavedPcm(&self.pcm), &mut self.mp3)
        }
        .map_err(|e| Error::encode("encoding PCM block", format!("{:?}", e)))?;

        self.write_encoded(encoded, "writing MP3 frames")
    }

    fn finish(mut self) -> Result<()> {
        self.ensure_output_capacity(0);
        let flushed = self
            .encoder
            .flush::<FlushNoGap>(&mut self.mp3)
            .map_err(|e| Error::encode("flushing LAME", format!("{:?}", e)))?;

        self.write_encoded(flushed, "writing final MP3 frames")?;
        self.sink
            .flush()
            .map_err(|e| Error::io("flushing MP3 sink", StreamRole::Sink, e))
    }
}
