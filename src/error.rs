use std::path::PathBuf;
use thiserror::Error;

/// Setup-time failures. None of these are recoverable by retrying.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} = {value} is outside the allowed range {range}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error("max frequency {max} Hz cannot be higher than the Nyquist frequency {nyquist} Hz")]
    AboveNyquist { max: f32, nyquist: f32 },

    #[error("max frequency {max} Hz must be greater than min frequency {min} Hz")]
    InvertedFrequencyBounds { min: f32, max: f32 },

    #[error("unknown pitch algorithm '{0}' (expected time-domain or spectral)")]
    UnknownPitchAlgorithm(String),

    #[error("unknown loudness algorithm '{0}' (expected perceptual or rms)")]
    UnknownLoudnessAlgorithm(String),

    #[error("unknown weighting '{0}' (expected default, A, B, C, D or Z)")]
    UnknownWeighting(String),

    #[error("unsupported tuning frequency {0} Hz (expected 432 or 440)")]
    UnsupportedTuning(f32),

    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
}

/// Per-call failures of the front end. The frame is rejected as a whole and
/// nothing downstream is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("cannot compute the pitch of an empty frame")]
    Empty,

    #[error("cannot compute the pitch of a frame of size 1")]
    SingleSample,
}

/// Either of the above, for whole-signal tracking.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
