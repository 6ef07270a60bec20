//! Encode session tests
//!
//! Covers settings validation at open, PCM conversion and serialization,
//! scratch reuse and the finalize-once contract, using an encoder that
//! records what it receives.

mod helpers;

use helpers::{Recording, RecordingEncoder};
use mp3pipe::codec::{EncodeSession, EncodeState};
use mp3pipe::{
    BitRateMode, ChannelMode, ConfigError, EncoderSettings, EncodingQuality, Error, FloatBuffer,
    StreamFormat,
};

type Sink = EncodeSession<RecordingEncoder>;

fn stereo() -> StreamFormat {
    StreamFormat::new(2, 44100)
}

fn settings(mode: BitRateMode) -> EncoderSettings {
    EncoderSettings::new(mode, ChannelMode::JointStereo)
}

fn buffer(left: &[f32], right: &[f32]) -> FloatBuffer {
    FloatBuffer::from_channels(vec![left.to_vec(), right.to_vec()]).unwrap()
}

#[test]
fn test_valid_settings_open_for_every_mode() {
    let modes = [
        BitRateMode::Cbr(8),
        BitRateMode::Cbr(320),
        BitRateMode::Abr(128),
        BitRateMode::Vbr(0),
        BitRateMode::Vbr(9),
    ];

    for mode in modes {
        for channel_mode in ChannelMode::ALL {
            let recording = Recording::shared();
            let mut sink = Sink::open(
                recording.clone(),
                EncoderSettings::new(mode, channel_mode),
                stereo(),
            )
            .unwrap();
            assert_eq!(sink.state(), EncodeState::Open);
            assert_eq!(recording.borrow().configured, 1);
            assert_eq!(recording.borrow().format, Some(stereo()));
            sink.finalize().unwrap();
        }
    }
}

#[test]
fn test_invalid_settings_never_configure_encoder() {
    let invalid = [
        settings(BitRateMode::Cbr(7)),
        settings(BitRateMode::Cbr(321)),
        settings(BitRateMode::Abr(0)),
        settings(BitRateMode::Abr(500)),
        settings(BitRateMode::Vbr(10)),
        EncoderSettings::from_parts(
            BitRateMode::Cbr(320),
            ChannelMode::Stereo,
            EncodingQuality::Level(-1),
        ),
        EncoderSettings::from_parts(
            BitRateMode::Cbr(320),
            ChannelMode::Stereo,
            EncodingQuality::Level(10),
        ),
    ];

    for bad in invalid {
        let recording = Recording::shared();
        let result = Sink::open(recording.clone(), bad, stereo());
        assert!(
            matches!(result, Err(Error::Config(_))),
            "{} should be rejected",
            bad
        );
        assert_eq!(recording.borrow().configured, 0);
    }
}

#[test]
fn test_quality_bounds_at_open_and_configuration() {
    for level in [0, 9] {
        let mut s = settings(BitRateMode::Cbr(192));
        s.set_quality(EncodingQuality::Level(level)).unwrap();
        let mut sink = Sink::open(Recording::shared(), s, stereo()).unwrap();
        assert_eq!(sink.settings().quality(), EncodingQuality::Level(level));
        sink.finalize().unwrap();
    }

    for level in [-1, 10] {
        let mut s = settings(BitRateMode::Cbr(192)).with_quality(EncodingQuality::Level(5)).unwrap();
        let err = s.set_quality(EncodingQuality::Level(level)).unwrap_err();
        assert!(matches!(err, ConfigError::Quality { .. }));
        assert_eq!(s.quality(), EncodingQuality::Level(5));
    }
}

#[test]
fn test_invalid_format_rejected() {
    let recording = Recording::shared();
    let result = Sink::open(
        recording.clone(),
        settings(BitRateMode::Cbr(320)),
        StreamFormat::new(2, 0),
    );
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::StreamFormat {
            field: "sample_rate",
            ..
        }))
    ));
    assert_eq!(recording.borrow().configured, 0);
}

#[test]
fn test_full_scale_and_clamping() {
    let recording = Recording::shared();
    let mut sink = Sink::open(recording.clone(), settings(BitRateMode::Cbr(320)), stereo()).unwrap();

    sink.consume(&buffer(&[1.0, 0.5, 1.5, f32::NAN], &[-1.0, -0.5, -2.0, 0.0]))
        .unwrap();
    sink.finalize().unwrap();

    assert_eq!(
        recording.borrow().samples(),
        vec![32767, -32768, 16384, -16384, 32767, -32768, 0, 0]
    );
}

#[test]
fn test_bytes_are_little_endian_interleaved() {
    let recording = Recording::shared();
    let mut sink = Sink::open(recording.clone(), settings(BitRateMode::Cbr(320)), stereo()).unwrap();

    // 0x0100 / 32768 and -1 / 32768
    sink.consume(&buffer(&[256.0 / 32768.0], &[-1.0 / 32768.0])).unwrap();
    sink.finalize().unwrap();

    assert_eq!(recording.borrow().bytes, vec![0x00, 0x01, 0xFF, 0xFF]);
}

#[test]
fn test_short_final_buffer_writes_only_its_frames() {
    let recording = Recording::shared();
    let mut sink = Sink::open(recording.clone(), settings(BitRateMode::Abr(160)), stereo()).unwrap();

    sink.consume(&FloatBuffer::new(2, 512)).unwrap();
    assert_eq!(sink.scratch_frames(), 512);
    sink.consume(&FloatBuffer::new(2, 512)).unwrap();
    assert_eq!(sink.scratch_frames(), 512);
    sink.consume(&FloatBuffer::new(2, 100)).unwrap();
    assert_eq!(sink.scratch_frames(), 100);
    assert_eq!(sink.frames_consumed(), 1124);
    sink.finalize().unwrap();

    assert_eq!(recording.borrow().writes, vec![2048, 2048, 400]);
}

#[test]
fn test_empty_buffer_is_accepted_without_write() {
    let recording = Recording::shared();
    let mut sink = Sink::open(recording.clone(), settings(BitRateMode::Cbr(320)), stereo()).unwrap();

    sink.consume(&FloatBuffer::new(2, 0)).unwrap();
    sink.finalize().unwrap();
    assert!(recording.borrow().writes.is_empty());
}

#[test]
fn test_channel_mismatch_is_encode_error() {
    let recording = Recording::shared();
    let mut sink = Sink::open(recording.clone(), settings(BitRateMode::Cbr(320)), stereo()).unwrap();

    let mono = FloatBuffer::new(1, 16);
    assert!(matches!(sink.consume(&mono), Err(Error::Encode { .. })));
    assert_eq!(sink.state(), EncodeState::Failed);
    sink.finalize().unwrap();
}

#[test]
fn test_finalize_exactly_once() {
    let recording = Recording::shared();
    let mut sink = Sink::open(recording.clone(), settings(BitRateMode::Vbr(4)), stereo()).unwrap();
    sink.consume(&FloatBuffer::new(2, 32)).unwrap();

    sink.finalize().unwrap();
    assert_eq!(sink.state(), EncodeState::Closed);
    assert_eq!(recording.borrow().finished, 1);

    assert!(matches!(sink.finalize(), Err(Error::ClosedStream)));
    assert_eq!(recording.borrow().finished, 1);

    assert!(matches!(
        sink.consume(&FloatBuffer::new(2, 32)),
        Err(Error::ClosedStream)
    ));
    assert_eq!(recording.borrow().writes.len(), 1);
}

#[test]
fn test_finalize_after_failed_write() {
    let recording = Recording::shared();
    recording.borrow_mut().fail_on_write = Some(1);
    let mut sink = Sink::open(recording.clone(), settings(BitRateMode::Cbr(128)), stereo()).unwrap();

    sink.consume(&FloatBuffer::new(2, 64)).unwrap();
    assert!(matches!(
        sink.consume(&FloatBuffer::new(2, 64)),
        Err(Error::Encode { .. })
    ));
    assert_eq!(sink.state(), EncodeState::Failed);
    assert!(matches!(
        sink.consume(&FloatBuffer::new(2, 64)),
        Err(Error::InvalidState(_))
    ));

    sink.finalize().unwrap();
    assert_eq!(recording.borrow().finished, 1);
    assert_eq!(sink.frames_consumed(), 64);
}
