use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::pitch::loudness::LoudnessAlgorithm;
use crate::pitch::weighting::Weighting;
use crate::pitch::PitchAlgorithm;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub pitch: PitchConfig,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
}

/// Timing base shared by the front end and the segmenter.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PitchConfig {
    #[serde(default = "default_min_frequency")]
    pub min_frequency: f32,
    #[serde(default = "default_max_frequency")]
    pub max_frequency: f32,
    #[serde(default)]
    pub algorithm: PitchAlgorithm,
    #[serde(default)]
    pub loudness_algorithm: LoudnessAlgorithm,
    #[serde(default)]
    pub weighting: Weighting,
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_loudness_threshold")]
    pub loudness_threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationConfig {
    /// Length of the voting window in seconds
    #[serde(default = "default_buffer_duration")]
    pub midi_buffer_duration: f32,
    #[serde(default = "default_min_occurrence_rate")]
    pub min_occurrence_rate: f32,
    #[serde(default = "default_onset_period")]
    pub min_onset_check_period: f32,
    #[serde(default = "default_offset_period")]
    pub min_offset_check_period: f32,
    #[serde(default = "default_note_change_period")]
    pub min_note_change_period: f32,
    #[serde(default = "default_apply_compensation")]
    pub apply_time_compensation: bool,
    #[serde(default = "default_tuning_frequency")]
    pub tuning_frequency: f32,
    #[serde(default)]
    pub transposition: i32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frame_size: default_frame_size(),
            hop_size: default_hop_size(),
        }
    }
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            min_frequency: default_min_frequency(),
            max_frequency: default_max_frequency(),
            algorithm: PitchAlgorithm::default(),
            loudness_algorithm: LoudnessAlgorithm::default(),
            weighting: Weighting::default(),
            tolerance: default_tolerance(),
            confidence_threshold: default_confidence_threshold(),
            loudness_threshold: default_loudness_threshold(),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            midi_buffer_duration: default_buffer_duration(),
            min_occurrence_rate: default_min_occurrence_rate(),
            min_onset_check_period: default_onset_period(),
            min_offset_check_period: default_offset_period(),
            min_note_change_period: default_note_change_period(),
            apply_time_compensation: default_apply_compensation(),
            tuning_frequency: default_tuning_frequency(),
            transposition: 0,
        }
    }
}

fn default_sample_rate() -> u32 { 44100 }
fn default_frame_size() -> usize { 1024 }
fn default_hop_size() -> usize { 128 }
fn default_min_frequency() -> f32 { 60.0 }
fn default_max_frequency() -> f32 { 2300.0 }
fn default_tolerance() -> f32 { 1.0 }
fn default_confidence_threshold() -> f32 { 0.25 }
fn default_loudness_threshold() -> f32 { 0.0031 } // ~ -50 dB
fn default_buffer_duration() -> f32 { 0.015 }
fn default_min_occurrence_rate() -> f32 { 0.5 }
fn default_onset_period() -> f32 { 0.075 }
fn default_offset_period() -> f32 { 0.2 }
fn default_note_change_period() -> f32 { 0.030 }
fn default_apply_compensation() -> bool { true }
fn default_tuning_frequency() -> f32 { 440.0 }

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Duration of one hop in seconds.
    pub fn hop_duration(&self) -> f32 {
        self.analysis.hop_size as f32 / self.analysis.sample_rate as f32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_front_end()?;
        self.validate_segmentation()
    }

    pub fn validate_front_end(&self) -> Result<(), ConfigError> {
        self.validate_analysis()?;
        let p = &self.pitch;

        in_range("min_frequency", p.min_frequency, 10.0, 20000.0, "[10,20000]")?;
        in_range("max_frequency", p.max_frequency, 10.0, 20000.0, "[10,20000]")?;
        in_range("tolerance", p.tolerance, 0.0, 1.0, "[0,1]")?;
        in_range("confidence_threshold", p.confidence_threshold, 0.0, 1.0, "[0,1]")?;
        in_range("loudness_threshold", p.loudness_threshold, 0.0, 1.0, "[0,1]")?;

        let nyquist = self.analysis.sample_rate as f32 * 0.5;
        if p.max_frequency > nyquist {
            return Err(ConfigError::AboveNyquist {
                max: p.max_frequency,
                nyquist,
            });
        }
        if p.max_frequency <= p.min_frequency {
            return Err(ConfigError::InvertedFrequencyBounds {
                min: p.min_frequency,
                max: p.max_frequency,
            });
        }
        Ok(())
    }

    pub fn validate_segmentation(&self) -> Result<(), ConfigError> {
        self.validate_analysis()?;
        let s = &self.segmentation;

        in_range("midi_buffer_duration", s.midi_buffer_duration, 0.005, 0.5, "[0.005,0.5]")?;
        in_range("min_occurrence_rate", s.min_occurrence_rate, 0.0, 1.0, "[0,1]")?;
        in_period("min_onset_check_period", s.min_onset_check_period)?;
        in_period("min_offset_check_period", s.min_offset_check_period)?;
        in_period("min_note_change_period", s.min_note_change_period)?;

        if s.tuning_frequency != 432.0 && s.tuning_frequency != 440.0 {
            return Err(ConfigError::UnsupportedTuning(s.tuning_frequency));
        }
        if s.transposition <= -69 || s.transposition >= 50 {
            return Err(ConfigError::OutOfRange {
                name: "transposition",
                value: s.transposition as f64,
                range: "(-69,50)",
            });
        }
        Ok(())
    }

    fn validate_analysis(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        if a.sample_rate < 8000 {
            return Err(ConfigError::OutOfRange {
                name: "sample_rate",
                value: a.sample_rate as f64,
                range: "[8000,inf)",
            });
        }
        if a.frame_size < 1 {
            return Err(ConfigError::OutOfRange {
                name: "frame_size",
                value: a.frame_size as f64,
                range: "[1,inf)",
            });
        }
        if a.hop_size < 1 {
            return Err(ConfigError::OutOfRange {
                name: "hop_size",
                value: a.hop_size as f64,
                range: "[1,inf)",
            });
        }
        Ok(())
    }
}

fn in_range(name: &'static str, value: f32, lo: f32, hi: f32, range: &'static str) -> Result<(), ConfigError> {
    // NaN fails both comparisons
    if value >= lo && value <= hi {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value: value as f64,
            range,
        })
    }
}

fn in_period(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value: value as f64,
            range: "(0,1]",
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml_str(&content)
}
