//! Sample format conversion between pipeline floats and codec PCM
//!
//! # Sample Format
//!
//! - Pipeline side: planar f32, full scale ±1.0
//! - Codec side: interleaved signed 16-bit, little-endian on the wire,
//!   full scale +32767 / -32768
//!
//! Integer to float divides by 32768. Float to integer multiplies by 32768
//! and clamps, so +1.0 lands on 32767 and -1.0 on -32768 without wrapping.

use crate::audio::types::FloatBuffer;
use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Scale factor between 16-bit integer and floating amplitude
pub const FULL_SCALE: f32 = 32768.0;

/// Bytes per serialized 16-bit sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Convert one 16-bit sample to floating amplitude
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / FULL_SCALE
}

/// Convert one floating sample to 16-bit, clamping out-of-range input.
///
/// NaN maps to silence.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample * FULL_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// De-interleave `interleaved` into `out`, one frame per `channels` samples.
///
/// `out` is reshaped to exactly the number of whole frames present; a
/// trailing partial frame is ignored.
pub fn deinterleave(interleaved: &[i16], channels: usize, out: &mut FloatBuffer) {
    debug_assert_eq!(out.channel_count(), channels);
    let frames = interleaved.len() / channels;
    if out.frames() != frames {
        out.resize(frames);
    }

    for ch in 0..channels {
        let dest = out.channel_mut(ch);
        for (frame_idx, sample) in dest.iter_mut().enumerate() {
            *sample = i16_to_f32(interleaved[frame_idx * channels + ch]);
        }
    }
}

/// Interleave `buffer` into `out`, clamping each sample.
///
/// # Errors
/// Returns `InvalidInput` if `out` does not hold exactly
/// `frames * channels` samples.
pub fn interleave(buffer: &FloatBuffer, out: &mut [i16]) -> Result<usize> {
    let channels = buffer.channel_count();
    let expected = buffer.frames() * channels;
    if out.len() != expected {
        return Err(Error::InvalidInput(format!(
            "interleave target holds {} samples, buffer needs {}",
            out.len(),
            expected
        )));
    }

    for (ch, samples) in buffer.channels().enumerate() {
        for (frame_idx, &sample) in samples.iter().enumerate() {
            out[frame_idx * channels + ch] = f32_to_i16(sample);
        }
    }

    Ok(expected)
}

/// Serialize samples as little-endian bytes into `out`.
///
/// # Errors
/// Returns `InvalidInput` if `out` is not exactly twice as long as `samples`.
pub fn write_le(samples: &[i16], out: &mut [u8]) -> Result<()> {
    if out.len() != samples.len() * BYTES_PER_SAMPLE {
        return Err(Error::InvalidInput(format!(
            "byte buffer holds {} bytes, {} samples need {}",
            out.len(),
            samples.len(),
            samples.len() * BYTES_PER_SAMPLE
        )));
    }
    LittleEndian::write_i16_into(samples, out);
    Ok(())
}

/// Parse little-endian bytes into samples, resizing `out` to fit.
///
/// # Errors
/// Returns `InvalidInput` on an odd byte count.
pub fn read_le(bytes: &[u8], out: &mut Vec<i16>) -> Result<()> {
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(Error::InvalidInput(format!(
            "PCM byte stream of {} bytes is not a whole number of samples",
            bytes.len()
        )));
    }
    out.resize(bytes.len() / BYTES_PER_SAMPLE, 0);
    LittleEndian::read_i16_into(bytes, out);
    Ok(())
}

/// Append interleaved samples with `channels` channels to `out` as stereo.
///
/// Mono is duplicated onto both channels; channels beyond the second are
/// dropped.
pub fn append_as_stereo(interleaved: &[i16], channels: usize, out: &mut Vec<i16>) {
    match channels {
        0 => {}
        1 => {
            out.reserve(interleaved.len() * 2);
            for &sample in interleaved {
                out.push(sample);
                out.push(sample);
            }
        }
        2 => out.extend_from_slice(interleaved),
        n => {
            out.reserve(interleaved.len() / n * 2);
            for frame in interleaved.chunks_exact(n) {
                out.push(frame[0]);
                out.push(frame[1]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_scale_endpoints() {
        assert_eq!(f32_to_i16(1.0), 32767);
        assert_eq!(f32_to_i16(-1.0), -32768);
        assert_eq!(f32_to_i16(0.0), 0);
    }

    #[test]
    fn test_out_of_range_clamps_instead_of_wrapping() {
        assert_eq!(f32_to_i16(1.5), 32767);
        assert_eq!(f32_to_i16(-7.0), -32768);
        assert_eq!(f32_to_i16(f32::INFINITY), 32767);
        assert_eq!(f32_to_i16(f32::NEG_INFINITY), -32768);
        assert_eq!(f32_to_i16(f32::NAN), 0);
    }

    #[test]
    fn test_integer_to_float_divides_by_32768() {
        assert_eq!(i16_to_f32(-32768), -1.0);
        assert_eq!(i16_to_f32(16384), 0.5);
        assert!(i16_to_f32(32767) < 1.0);
    }

    #[test]
    fn test_every_i16_survives_float_round_trip() {
        for s in i16::MIN..=i16::MAX {
            assert_eq!(f32_to_i16(i16_to_f32(s)), s);
        }
    }

    #[test]
    fn test_deinterleave_stereo() {
        let mut out = FloatBuffer::new(2, 0);
        deinterleave(&[16384, -16384, 8192, -8192], 2, &mut out);
        assert_eq!(out.frames(), 2);
        assert_eq!(out.channel(0), &[0.5f32, 0.25][..]);
        assert_eq!(out.channel(1), &[-0.5f32, -0.25][..]);
    }

    #[test]
    fn test_deinterleave_ignores_partial_frame() {
        let mut out = FloatBuffer::new(2, 8);
        deinterleave(&[1, 2, 3], 2, &mut out);
        assert_eq!(out.frames(), 1);
    }

    #[test]
    fn test_interleave_layout_and_size_check() {
        let buffer =
            FloatBuffer::from_channels(vec![vec![0.5, 1.0], vec![-0.5, -1.0]]).unwrap();
        let mut out = vec![0i16; 4];
        assert_eq!(interleave(&buffer, &mut out).unwrap(), 4);
        assert_eq!(out, vec![16384, -16384, 32767, -32768]);

        let mut short = vec![0i16; 3];
        assert!(interleave(&buffer, &mut short).is_err());
    }

    #[test]
    fn test_little_endian_serialization() {
        let mut bytes = vec![0u8; 4];
        write_le(&[0x0102, -2], &mut bytes).unwrap();
        assert_eq!(bytes, vec![0x02, 0x01, 0xFE, 0xFF]);

        let mut samples = Vec::new();
        read_le(&bytes, &mut samples).unwrap();
        assert_eq!(samples, vec![0x0102, -2]);

        assert!(read_le(&[1, 2, 3], &mut samples).is_err());
        assert!(write_le(&[1], &mut [0u8; 3]).is_err());
    }

    #[test]
    fn test_append_as_stereo() {
        let mut out = Vec::new();
        append_as_stereo(&[1, 2, 3], 1, &mut out);
        assert_eq!(out, vec![1, 1, 2, 2, 3, 3]);

        out.clear();
        append_as_stereo(&[1, 2, 3, 4, 5, 6], 3, &mut out);
        assert_eq!(out, vec![1, 2, 4, 5]);

        out.clear();
        append_as_stereo(&[7, 8], 2, &mut out);
        assert_eq!(out, vec![7, 8]);
    }
}
