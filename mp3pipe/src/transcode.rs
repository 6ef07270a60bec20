//! Decode → encode driver
//!
//! Runs one decode session into one encode session, one buffer at a time,
//! on the calling thread. The encode session is finalized on every path
//! once it has been opened.

use crate::audio::types::StreamFormat;
use crate::codec::decode::{DecodeSession, PcmDecoder};
use crate::codec::encode::{EncodeSession, PcmEncoder};
use crate::codec::settings::EncoderSettings;
use crate::error::{Error, Result};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of a completed transcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeReport {
    /// Format reported by the decoder
    pub format: StreamFormat,

    /// Frames moved from decoder to encoder
    pub frames: u64,

    /// Buffers moved from decoder to encoder
    pub buffers: u64,
}

impl TranscodeReport {
    /// Audio duration moved
    pub fn duration(&self) -> Duration {
        if self.format.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames as f64 / self.format.sample_rate as f64)
    }
}

/// Move every buffer from `pump` into a new encode session on `sink`.
///
/// # Errors
/// The first error from opening, producing, consuming or finalizing. If a
/// produce/consume error occurs, `finalize` still runs; its own failure is
/// logged and the original error returned.
pub fn transcode<D, E>(
    pump: &mut DecodeSession<D>,
    sink: E::Sink,
    settings: EncoderSettings,
    buffer_size: usize,
) -> Result<TranscodeReport>
where
    D: PcmDecoder,
    E: PcmEncoder,
{
    if buffer_size == 0 {
        return Err(Error::InvalidInput(
            "buffer size must be at least 1 frame".to_string(),
        ));
    }

    let format = pump.open()?;
    let mut session = EncodeSession::<E>::open(sink, settings, format)?;
    let started = Instant::now();

    let mut report = TranscodeReport {
        format,
        frames: 0,
        buffers: 0,
    };

    let pumped = loop {
        let buffer = match pump.produce(buffer_size) {
            Ok(Some(buffer)) => buffer,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };

        if let Err(e) = session.consume(&buffer) {
            break Err(e);
        }
        report.frames += buffer.frames() as u64;
        report.buffers += 1;
    };

    if let Err(e) = pumped {
        if let Err(finalize_err) = session.finalize() {
            warn!("Finalize after failed transcode also failed: {}", finalize_err);
        }
        return Err(e);
    }

    session.finalize()?;
    info!(
        "Transcoded {} frames in {} buffers ({:.2}s of audio in {:?})",
        report.frames,
        report.buffers,
        report.duration().as_secs_f64(),
        started.elapsed()
    );
    Ok(report)
}

/// Transcode an MP3 file into a new MP3 file.
///
/// On failure the output file is left as written; removing or truncating
/// it is up to the caller.
#[cfg(feature = "lame")]
pub fn transcode_file<P, Q>(
    input: P,
    output: Q,
    settings: EncoderSettings,
    buffer_size: usize,
) -> Result<TranscodeReport>
where
    P: AsRef<std::path::Path>,
    Q: AsRef<std::path::Path>,
{
    use crate::codec::lame_encoder::LameEncoder;
    use crate::codec::symphonia_decoder::Mp3Pump;
    use crate::error::StreamRole;
    use std::io::BufWriter;

    let output = output.as_ref();
    settings.validate()?;

    let mut pump = Mp3Pump::from_path(input)?;
    let file = std::fs::File::create(output).map_err(|e| {
        Error::io(
            format!("creating {}", output.display()),
            StreamRole::Sink,
            e,
        )
    })?;

    transcode::<_, LameEncoder<BufWriter<std::fs::File>>>(
        &mut pump,
        BufWriter::new(file),
        settings,
        buffer_size,
    )
}
