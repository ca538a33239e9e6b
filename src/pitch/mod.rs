pub mod front_end;
pub mod loudness;
pub mod spectrum;
pub mod weighting;
pub mod yin;
pub mod yin_fft;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::Config;
use crate::error::ConfigError;
use spectrum::Spectrum;
use yin::Yin;
use yin_fft::YinFft;

/// Per-frame output of the front end. Not retained between hops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PitchEstimate {
    /// Detected pitch in Hz, 0.0 when nothing periodic was found
    pub pitch: f32,
    /// Pitch confidence (0.0-1.0)
    pub confidence: f32,
    pub loudness: f32,
    pub voiced: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum PitchAlgorithm {
    /// YIN on the waveform
    TimeDomain,
    /// YIN-FFT on the Hann-windowed magnitude spectrum
    #[default]
    Spectral,
}

impl FromStr for PitchAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "time-domain" | "yin" | "pyin" => Ok(Self::TimeDomain),
            "spectral" | "yin-fft" | "pyin_fft" => Ok(Self::Spectral),
            _ => Err(ConfigError::UnknownPitchAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for PitchAlgorithm {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for PitchAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeDomain => f.write_str("time-domain"),
            Self::Spectral => f.write_str("spectral"),
        }
    }
}

/// The selected pitch strategy together with the state it owns.
pub enum PitchEstimator {
    TimeDomain(Yin),
    Spectral {
        spectrum: Spectrum,
        magnitudes: Vec<f32>,
        yin: YinFft,
    },
}

impl PitchEstimator {
    pub fn new(config: &Config) -> Self {
        let sr = config.analysis.sample_rate as f32;
        let frame_size = config.analysis.frame_size;
        let p = &config.pitch;

        match p.algorithm {
            PitchAlgorithm::TimeDomain => PitchEstimator::TimeDomain(Yin::new(
                sr,
                frame_size,
                p.min_frequency,
                p.max_frequency,
                p.tolerance,
            )),
            // Only the spectral strategy takes the frequency weighting
            PitchAlgorithm::Spectral => PitchEstimator::Spectral {
                spectrum: Spectrum::with_padding(frame_size, YinFft::PADDING),
                magnitudes: Vec::with_capacity(frame_size + 1),
                yin: YinFft::new(
                    sr,
                    frame_size,
                    p.min_frequency,
                    p.max_frequency,
                    p.weighting,
                    p.tolerance,
                ),
            },
        }
    }

    /// Returns (pitch Hz, confidence).
    pub fn estimate(&mut self, frame: &[f32]) -> (f32, f32) {
        match self {
            PitchEstimator::TimeDomain(yin) => yin.estimate(frame),
            PitchEstimator::Spectral {
                spectrum,
                magnitudes,
                yin,
            } => {
                spectrum.magnitude(frame, magnitudes);
                yin.estimate(magnitudes)
            }
        }
    }

    pub fn algorithm(&self) -> PitchAlgorithm {
        match self {
            PitchEstimator::TimeDomain(_) => PitchAlgorithm::TimeDomain,
            PitchEstimator::Spectral { .. } => PitchAlgorithm::Spectral,
        }
    }
}

#[cfg(test)]
pub(crate) fn sine(freq: f32, sample_rate: f32, len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
        .collect()
}
