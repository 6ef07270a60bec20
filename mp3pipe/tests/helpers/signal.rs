//! Deterministic test signals

use mp3pipe::FloatBuffer;
use std::f32::consts::PI;

/// Standard test sample rate (44.1 kHz)
pub const TEST_SAMPLE_RATE: u32 = 44100;

/// Stereo sine split into buffers of `buffer_frames` frames.
///
/// Left and right are a quarter period apart; amplitude stays well below
/// full scale to keep the encoder out of clipping.
pub fn sine_buffers(
    total_frames: usize,
    buffer_frames: usize,
    frequency_hz: f32,
    amplitude: f32,
) -> Vec<FloatBuffer> {
    let step = 2.0 * PI * frequency_hz / TEST_SAMPLE_RATE as f32;
    let mut buffers = Vec::new();
    let mut start = 0;
    while start < total_frames {
        let frames = buffer_frames.min(total_frames - start);
        let left: Vec<f32> = (start..start + frames)
            .map(|i| amplitude * (step * i as f32).sin())
            .collect();
        let right: Vec<f32> = (start..start + frames)
            .map(|i| amplitude * (step * i as f32).cos())
            .collect();
        buffers.push(FloatBuffer::from_channels(vec![left, right]).expect("equal channel lengths"));
        start += frames;
    }
    buffers
}

/// Stereo white noise split into buffers of `buffer_frames` frames.
///
/// Deterministic (fixed-seed LCG) and hard to compress, so an encoder has
/// to spend whatever bitrate it is allowed.
pub fn noise_buffers(total_frames: usize, buffer_frames: usize, amplitude: f32) -> Vec<FloatBuffer> {
    let mut state: u32 = 0x1234_5678;
    let mut next = move || {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        ((state >> 8) as f32 / (1u32 << 24) as f32) * 2.0 - 1.0
    };

    let mut buffers = Vec::new();
    let mut start = 0;
    while start < total_frames {
        let frames = buffer_frames.min(total_frames - start);
        let left: Vec<f32> = (0..frames).map(|_| amplitude * next()).collect();
        let right: Vec<f32> = (0..frames).map(|_| amplitude * next()).collect();
        buffers.push(FloatBuffer::from_channels(vec![left, right]).expect("equal channel lengths"));
        start += frames;
    }
    buffers
}
