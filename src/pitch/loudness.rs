use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LoudnessAlgorithm {
    /// Stevens' power law on the frame energy
    Perceptual,
    /// Root mean square amplitude
    #[default]
    Rms,
}

impl LoudnessAlgorithm {
    pub fn measure(self, frame: &[f32]) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        let energy: f32 = frame.iter().map(|s| s * s).sum();
        match self {
            LoudnessAlgorithm::Perceptual => energy.powf(0.67),
            LoudnessAlgorithm::Rms => (energy / frame.len() as f32).sqrt(),
        }
    }
}

impl FromStr for LoudnessAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "perceptual" | "loudness" => Ok(Self::Perceptual),
            "rms" => Ok(Self::Rms),
            _ => Err(ConfigError::UnknownLoudnessAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for LoudnessAlgorithm {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for LoudnessAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Perceptual => f.write_str("perceptual"),
            Self::Rms => f.write_str("rms"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_constant_is_its_magnitude() {
        assert!((LoudnessAlgorithm::Rms.measure(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn perceptual_follows_power_law() {
        let frame = [0.5f32; 4]; // energy 1.0
        assert!((LoudnessAlgorithm::Perceptual.measure(&frame) - 1.0).abs() < 1e-6);
        let quiet = [0.25f32; 4]; // energy 0.25
        let expected = 0.25f32.powf(0.67);
        assert!((LoudnessAlgorithm::Perceptual.measure(&quiet) - expected).abs() < 1e-6);
    }

    #[test]
    fn silence_is_zero() {
        assert_eq!(LoudnessAlgorithm::Rms.measure(&[0.0; 32]), 0.0);
        assert_eq!(LoudnessAlgorithm::Perceptual.measure(&[0.0; 32]), 0.0);
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(matches!(
            "peak".parse::<LoudnessAlgorithm>(),
            Err(ConfigError::UnknownLoudnessAlgorithm(_))
        ));
    }
}
