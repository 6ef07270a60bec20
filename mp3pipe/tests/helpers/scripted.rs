//! Scripted codec collaborators
//!
//! `ScriptedDecoder` yields a known ramp of stereo samples and counts every
//! read. `RecordingEncoder` keeps everything it is handed in a shared
//! `Recording` the test can inspect after the session is gone.

use mp3pipe::codec::{EncoderSettings, PcmDecoder, PcmEncoder};
use mp3pipe::{Error, Result, StreamFormat};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Ramp value for `frame` on `channel`: left counts up, right counts down.
pub fn ramp_sample(frame: usize, channel: usize) -> i16 {
    let v = (frame % 1000) as i16;
    if channel == 0 {
        v
    } else {
        -v
    }
}

/// Decoder script
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    /// Total stereo frames the stream holds
    pub frames: usize,

    /// Most samples handed out per read (models packet boundaries)
    pub chunk_samples: usize,

    pub sample_rate: u32,

    /// Fail with a decode error once this many frames were read
    pub fail_at_frame: Option<usize>,

    /// Fail negotiation outright
    pub fail_negotiate: bool,

    /// Number of `read_interleaved` calls so far
    pub reads: Rc<Cell<usize>>,
}

impl ScriptedSource {
    pub fn new(frames: usize) -> Self {
        Self {
            frames,
            chunk_samples: 2304,
            sample_rate: 44100,
            fail_at_frame: None,
            fail_negotiate: false,
            reads: Rc::new(Cell::new(0)),
        }
    }

    pub fn chunked(mut self, chunk_samples: usize) -> Self {
        self.chunk_samples = chunk_samples;
        self
    }

    pub fn failing_at(mut self, frame: usize) -> Self {
        self.fail_at_frame = Some(frame);
        self
    }
}

pub struct ScriptedDecoder {
    script: ScriptedSource,

    /// Next interleaved sample index
    position: usize,
}

impl PcmDecoder for ScriptedDecoder {
    type Source = ScriptedSource;

    fn negotiate(source: ScriptedSource) -> Result<Self> {
        if source.fail_negotiate {
            return Err(Error::decode("negotiating scripted stream", "not an MP3 stream"));
        }
        Ok(Self {
            script: source,
            position: 0,
        })
    }

    fn sample_rate(&self) -> u32 {
        self.script.sample_rate
    }

    fn read_interleaved(&mut self, out: &mut [i16]) -> Result<usize> {
        self.script.reads.set(self.script.reads.get() + 1);

        if let Some(fail_at) = self.script.fail_at_frame {
            if self.position >= fail_at * 2 {
                return Err(Error::decode("decoding scripted frame", "corrupt frame"));
            }
        }

        let remaining = self.script.frames * 2 - self.position;
        let n = out.len().min(self.script.chunk_samples).min(remaining);
        for (i, slot) in out[..n].iter_mut().enumerate() {
            let index = self.position + i;
            *slot = ramp_sample(index / 2, index % 2);
        }
        self.position += n;
        Ok(n)
    }
}

/// Everything a `RecordingEncoder` was asked to do
#[derive(Debug, Default)]
pub struct Recording {
    pub configured: usize,
    pub settings: Option<EncoderSettings>,
    pub format: Option<StreamFormat>,

    /// Concatenated PCM bytes written
    pub bytes: Vec<u8>,

    /// Byte length of each write
    pub writes: Vec<usize>,

    pub finished: usize,

    /// Fail the write with this index (0-based)
    pub fail_on_write: Option<usize>,
}

impl Recording {
    pub fn shared() -> Rc<RefCell<Recording>> {
        Rc::new(RefCell::new(Recording::default()))
    }

    /// Written bytes decoded back to i16 samples
    pub fn samples(&self) -> Vec<i16> {
        self.bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }
}

pub struct RecordingEncoder {
    recording: Rc<RefCell<Recording>>,
}

impl PcmEncoder for RecordingEncoder {
    type Sink = Rc<RefCell<Recording>>;

    fn configure(
        sink: Self::Sink,
        settings: &EncoderSettings,
        format: StreamFormat,
    ) -> Result<Self> {
        {
            let mut recording = sink.borrow_mut();
            recording.configured += 1;
            recording.settings = Some(*settings);
            recording.format = Some(format);
        }
        Ok(Self { recording: sink })
    }

    fn write(&mut self, pcm: &[u8]) -> Result<()> {
        let mut recording = self.recording.borrow_mut();
        if recording.fail_on_write == Some(recording.writes.len()) {
            recording.writes.push(0);
            return Err(Error::encode("encoding block", "encoder rejected input"));
        }
        recording.writes.push(pcm.len());
        recording.bytes.extend_from_slice(pcm);
        Ok(())
    }

    fn finish(self) -> Result<()> {
        self.recording.borrow_mut().finished += 1;
        Ok(())
    }
}
