use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use tonica::config::Config;
use tonica::pitch::loudness::LoudnessAlgorithm;
use tonica::pitch::weighting::Weighting;
use tonica::pitch::PitchAlgorithm;

#[derive(Parser, Debug)]
#[command(name = "tonica", about = "Monophonic audio-to-MIDI note tracker")]
pub struct Cli {
    /// Input audio files (WAV, MP3, FLAC, OGG)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Config file (TOML). Defaults to ./tonica.toml or the user config dir
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write results here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Notes)]
    pub format: OutputFormat,

    /// Track a single channel (0-based) instead of the channel mix
    #[arg(long)]
    pub channel: Option<usize>,

    /// Analysis frame size in samples
    #[arg(long)]
    pub frame_size: Option<usize>,

    /// Hop size in samples
    #[arg(long)]
    pub hop_size: Option<usize>,

    /// Lowest detectable frequency (Hz)
    #[arg(long)]
    pub min_frequency: Option<f32>,

    /// Highest detectable frequency (Hz)
    #[arg(long)]
    pub max_frequency: Option<f32>,

    /// Pitch estimator: time-domain or spectral
    #[arg(long)]
    pub pitch_algorithm: Option<PitchAlgorithm>,

    /// Loudness measure: perceptual or rms
    #[arg(long)]
    pub loudness_algorithm: Option<LoudnessAlgorithm>,

    /// Spectral weighting: default, A, B, C, D or Z
    #[arg(long)]
    pub weighting: Option<Weighting>,

    /// Pitch confidence needed for a voiced frame (0.0-1.0)
    #[arg(long)]
    pub confidence_threshold: Option<f32>,

    /// Loudness needed for a voiced frame (0.0-1.0)
    #[arg(long)]
    pub loudness_threshold: Option<f32>,

    /// Onset debounce in seconds
    #[arg(long)]
    pub onset_period: Option<f32>,

    /// Offset debounce in seconds
    #[arg(long)]
    pub offset_period: Option<f32>,

    /// Legato note-change debounce in seconds
    #[arg(long)]
    pub note_change_period: Option<f32>,

    /// Reference tuning for A4 (432 or 440)
    #[arg(long)]
    pub tuning: Option<f32>,

    /// Semitones added to every note, for transposing instruments
    #[arg(long, allow_hyphen_values = true)]
    pub transpose: Option<i32>,

    /// Report events at detection time, without latency compensation
    #[arg(long)]
    pub no_compensation: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per note-on/note-off
    Events,
    /// One line per closed note
    Notes,
    /// Events and notes of every file as JSON
    Json,
}

impl Cli {
    /// Command-line values win over the config file.
    pub fn apply(&self, config: &mut Config) {
        let a = &mut config.analysis;
        if let Some(v) = self.frame_size {
            a.frame_size = v;
        }
        if let Some(v) = self.hop_size {
            a.hop_size = v;
        }

        let p = &mut config.pitch;
        if let Some(v) = self.min_frequency {
            p.min_frequency = v;
        }
        if let Some(v) = self.max_frequency {
            p.max_frequency = v;
        }
        if let Some(v) = self.pitch_algorithm {
            p.algorithm = v;
        }
        if let Some(v) = self.loudness_algorithm {
            p.loudness_algorithm = v;
        }
        if let Some(v) = self.weighting {
            p.weighting = v;
        }
        if let Some(v) = self.confidence_threshold {
            p.confidence_threshold = v;
        }
        if let Some(v) = self.loudness_threshold {
            p.loudness_threshold = v;
        }

        let s = &mut config.segmentation;
        if let Some(v) = self.onset_period {
            s.min_onset_check_period = v;
        }
        if let Some(v) = self.offset_period {
            s.min_offset_check_period = v;
        }
        if let Some(v) = self.note_change_period {
            s.min_note_change_period = v;
        }
        if let Some(v) = self.tuning {
            s.tuning_frequency = v;
        }
        if let Some(v) = self.transpose {
            s.transposition = v;
        }
        if self.no_compensation {
            s.apply_time_compensation = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_config_values() {
        let cli = Cli::parse_from([
            "tonica",
            "--hop-size", "64",
            "--pitch-algorithm", "time-domain",
            "--weighting", "A",
            "--transpose", "-2",
            "--no-compensation",
            "sax.wav",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.analysis.hop_size, 64);
        assert_eq!(config.analysis.frame_size, 1024);
        assert_eq!(config.pitch.algorithm, PitchAlgorithm::TimeDomain);
        assert_eq!(config.pitch.weighting, Weighting::A);
        assert_eq!(config.segmentation.transposition, -2);
        assert!(!config.segmentation.apply_time_compensation);
        assert_eq!(cli.format, OutputFormat::Notes);
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let result = Cli::try_parse_from(["tonica", "--loudness-algorithm", "peak", "a.wav"]);
        assert!(result.is_err());
    }

    #[test]
    fn requires_an_input() {
        assert!(Cli::try_parse_from(["tonica"]).is_err());
    }
}
