use crate::config::Config;
use crate::error::{ConfigError, FrameError};

use super::loudness::LoudnessAlgorithm;
use super::{PitchEstimate, PitchEstimator};

/// Per-frame pitch, confidence, loudness and voicing.
pub struct PitchFrontEnd {
    estimator: PitchEstimator,
    loudness: LoudnessAlgorithm,
    confidence_threshold: f32,
    loudness_threshold: f32,
}

impl PitchFrontEnd {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate_front_end()?;
        let p = &config.pitch;

        log::debug!(
            "Front end: pitch={} loudness={} thresholds: confidence={:.2} loudness={:.4}",
            p.algorithm, p.loudness_algorithm, p.confidence_threshold, p.loudness_threshold
        );

        Ok(Self {
            estimator: PitchEstimator::new(config),
            loudness: p.loudness_algorithm,
            confidence_threshold: p.confidence_threshold,
            loudness_threshold: p.loudness_threshold,
        })
    }

    pub fn analyze(&mut self, frame: &[f32]) -> Result<PitchEstimate, FrameError> {
        match frame.len() {
            0 => return Err(FrameError::Empty),
            1 => return Err(FrameError::SingleSample),
            _ => {}
        }

        let loudness = self.loudness.measure(frame);
        let (pitch, confidence) = self.estimator.estimate(frame);

        Ok(PitchEstimate {
            pitch,
            confidence,
            loudness,
            voiced: self.is_voiced(confidence, loudness),
        })
    }

    pub fn is_voiced(&self, confidence: f32, loudness: f32) -> bool {
        is_voiced(
            confidence,
            loudness,
            self.confidence_threshold,
            self.loudness_threshold,
        )
    }
}

/// Both gates must pass. No memory between hops.
pub fn is_voiced(confidence: f32, loudness: f32, confidence_threshold: f32, loudness_threshold: f32) -> bool {
    confidence >= confidence_threshold && loudness >= loudness_threshold
}
