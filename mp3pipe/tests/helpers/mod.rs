//! Test helpers for mp3pipe integration tests
//!
//! - `scripted`: in-memory decoder/encoder collaborators with observable
//!   call counts and injectable failures
//! - `signal`: deterministic test signals

#![allow(dead_code)]

pub mod scripted;
pub mod signal;

pub use scripted::{Recording, RecordingEncoder, ScriptedDecoder, ScriptedSource};
pub use signal::{noise_buffers, sine_buffers, TEST_SAMPLE_RATE};
