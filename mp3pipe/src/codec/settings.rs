//! Encoder configuration and validation
//!
//! Everything here is plain data plus pure predicates: no registry, no shared
//! state. Validation always runs before an encoder is allocated.
//!
//! Out-of-range encoding quality is rejected, never clamped: by `set_quality`,
//! by `validate` (which every session open runs) and by config file parsing.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Lowest accepted CBR/ABR rate in kbps
pub const MIN_BIT_RATE_KBPS: u32 = 8;

/// Highest accepted CBR/ABR rate in kbps
pub const MAX_BIT_RATE_KBPS: u32 = 320;

/// Best VBR quality / encoding quality
pub const MIN_QUALITY: u32 = 0;

/// Smallest/fastest VBR quality / encoding quality
pub const MAX_QUALITY: u32 = 9;

/// How stereo input is combined when encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelMode {
    /// Downmix to a single channel
    Mono,
    /// Independent left/right coding
    Stereo,
    /// Mid/side coding where it helps
    #[default]
    JointStereo,
}

impl ChannelMode {
    /// All channel modes, in index order
    pub const ALL: [ChannelMode; 3] = [ChannelMode::Mono, ChannelMode::Stereo, ChannelMode::JointStereo];

    /// Look up a channel mode by its numeric index (0 = Mono, 1 = Stereo,
    /// 2 = JointStereo)
    pub fn from_index(index: i64) -> Result<Self, ConfigError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| ConfigError::ChannelMode {
                value: index.to_string(),
            })
    }

    /// Number of output channels this mode encodes
    pub fn output_channels(self) -> u16 {
        match self {
            ChannelMode::Mono => 1,
            ChannelMode::Stereo | ChannelMode::JointStereo => 2,
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelMode::Mono => f.write_str("Mono"),
            ChannelMode::Stereo => f.write_str("Stereo"),
            ChannelMode::JointStereo => f.write_str("Joint Stereo"),
        }
    }
}

impl FromStr for ChannelMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "mono" => Ok(ChannelMode::Mono),
            "stereo" => Ok(ChannelMode::Stereo),
            "joint-stereo" | "jointstereo" => Ok(ChannelMode::JointStereo),
            _ => Err(ConfigError::ChannelMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Bit rate strategy, fixed for the lifetime of an encode session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitRateMode {
    /// Constant bit rate in kbps
    Cbr(u32),
    /// Average bit rate in kbps
    Abr(u32),
    /// Variable bit rate quality, 0 (best) ..= 9 (smallest)
    Vbr(u32),
}

impl Default for BitRateMode {
    fn default() -> Self {
        BitRateMode::Cbr(MAX_BIT_RATE_KBPS)
    }
}

impl BitRateMode {
    /// Check the mode's parameter against its valid range
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_bit_rate_mode(self)
    }
}

impl fmt::Display for BitRateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitRateMode::Cbr(rate) => write!(f, "cbr-{}", rate),
            BitRateMode::Abr(rate) => write!(f, "abr-{}", rate),
            BitRateMode::Vbr(quality) => write!(f, "vbr-{}", quality),
        }
    }
}

impl FromStr for BitRateMode {
    type Err = ConfigError;

    /// Parse `cbr-320`, `abr-128` or `vbr-2` (`:` also accepted as separator).
    ///
    /// Only the shape is checked here; ranges are checked by `validate`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unrecognized = || ConfigError::BitRateMode {
            value: s.to_string(),
        };

        let lower = s.trim().to_ascii_lowercase();
        let (kind, value) = lower
            .split_once(|c: char| c == '-' || c == ':')
            .ok_or_else(unrecognized)?;
        let value: u32 = value.trim().parse().map_err(|_| unrecognized())?;

        match kind.trim() {
            "cbr" => Ok(BitRateMode::Cbr(value)),
            "abr" => Ok(BitRateMode::Abr(value)),
            "vbr" => Ok(BitRateMode::Vbr(value)),
            _ => Err(unrecognized()),
        }
    }
}

/// Encoder algorithm quality, independent of output size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncodingQuality {
    /// Let the codec pick its own default
    #[default]
    Default,
    /// Explicit level, valid in 0 (best) ..= 9 (fastest)
    Level(i64),
}

impl EncodingQuality {
    /// Explicit level if set
    pub fn level(self) -> Option<i64> {
        match self {
            EncodingQuality::Default => None,
            EncodingQuality::Level(q) => Some(q),
        }
    }
}

impl From<Option<i64>> for EncodingQuality {
    fn from(value: Option<i64>) -> Self {
        value.map_or(EncodingQuality::Default, EncodingQuality::Level)
    }
}

impl fmt::Display for EncodingQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingQuality::Default => f.write_str("default"),
            EncodingQuality::Level(q) => write!(f, "{}", q),
        }
    }
}

/// Channel mode from text; succeeds iff it names Mono, Stereo or JointStereo
pub fn validate_channel_mode(raw: &str) -> Result<ChannelMode, ConfigError> {
    raw.parse()
}

/// CBR/ABR rate must be in 8..=320 kbps, VBR quality in 0..=9
pub fn validate_bit_rate_mode(mode: &BitRateMode) -> Result<(), ConfigError> {
    match *mode {
        BitRateMode::Cbr(rate) | BitRateMode::Abr(rate) => {
            if (MIN_BIT_RATE_KBPS..=MAX_BIT_RATE_KBPS).contains(&rate) {
                Ok(())
            } else {
                Err(ConfigError::BitRate {
                    mode: if matches!(mode, BitRateMode::Cbr(_)) { "CBR" } else { "ABR" },
                    value: rate,
                    min: MIN_BIT_RATE_KBPS,
                    max: MAX_BIT_RATE_KBPS,
                })
            }
        }
        BitRateMode::Vbr(quality) => {
            if (MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
                Ok(())
            } else {
                Err(ConfigError::VbrQuality {
                    value: quality,
                    min: MIN_QUALITY,
                    max: MAX_QUALITY,
                })
            }
        }
    }
}

/// Quality must be unset or in 0..=9
pub fn validate_quality(quality: EncodingQuality) -> Result<(), ConfigError> {
    match quality {
        EncodingQuality::Default => Ok(()),
        EncodingQuality::Level(q) if (MIN_QUALITY as i64..=MAX_QUALITY as i64).contains(&q) => {
            Ok(())
        }
        EncodingQuality::Level(q) => Err(ConfigError::Quality {
            value: q,
            min: MIN_QUALITY as i64,
            max: MAX_QUALITY as i64,
        }),
    }
}

/// Everything an encode session is configured with besides the stream format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderSettings {
    bit_rate_mode: BitRateMode,
    channel_mode: ChannelMode,
    quality: EncodingQuality,
}

impl EncoderSettings {
    /// Create settings with the codec's default quality.
    ///
    /// Nothing is checked until `validate` or session open.
    pub fn new(bit_rate_mode: BitRateMode, channel_mode: ChannelMode) -> Self {
        Self::from_parts(bit_rate_mode, channel_mode, EncodingQuality::Default)
    }

    /// Assemble settings from raw parts without checking them
    pub fn from_parts(
        bit_rate_mode: BitRateMode,
        channel_mode: ChannelMode,
        quality: EncodingQuality,
    ) -> Self {
        Self {
            bit_rate_mode,
            channel_mode,
            quality,
        }
    }

    /// Builder-style quality override
    pub fn with_quality(mut self, quality: EncodingQuality) -> Result<Self, ConfigError> {
        self.set_quality(quality)?;
        Ok(self)
    }

    /// Set the encoder algorithm quality; out-of-range levels are rejected
    /// and leave the settings unchanged.
    pub fn set_quality(&mut self, quality: EncodingQuality) -> Result<(), ConfigError> {
        validate_quality(quality)?;
        self.quality = quality;
        Ok(())
    }

    /// Re-check every field
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_bit_rate_mode(&self.bit_rate_mode)?;
        validate_quality(self.quality)
    }

    pub fn bit_rate_mode(&self) -> BitRateMode {
        self.bit_rate_mode
    }

    pub fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }

    pub fn quality(&self) -> EncodingQuality {
        self.quality
    }
}

impl fmt::Display for EncoderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} quality={}",
            self.bit_rate_mode, self.channel_mode, self.quality
        )
    }
}
