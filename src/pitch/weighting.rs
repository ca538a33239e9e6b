use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Frequency weighting applied to the power spectrum before the spectral
/// pitch search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Weighting {
    /// Tabulated ear-sensitivity curve
    #[default]
    Default,
    A,
    B,
    C,
    D,
    /// Flat
    Z,
}

// (Hz, dB) breakpoints of the default curve
const DEFAULT_CURVE: [(f32, f32); 34] = [
    (0.0, -75.8), (20.0, -70.1), (25.0, -60.8), (31.5, -52.1), (40.0, -44.2),
    (50.0, -37.5), (63.0, -31.3), (80.0, -25.6), (100.0, -20.9), (125.0, -16.5),
    (160.0, -12.6), (200.0, -9.6), (250.0, -7.0), (315.0, -4.7), (400.0, -3.0),
    (500.0, -1.8), (630.0, -0.8), (800.0, -0.2), (1000.0, 0.0), (1250.0, 0.5),
    (1600.0, 1.6), (2000.0, 3.2), (2500.0, 5.4), (3150.0, 7.8), (4000.0, 8.1),
    (5000.0, 5.3), (6300.0, -2.4), (8000.0, -11.1), (9000.0, -12.8), (10000.0, -12.2),
    (12500.0, -7.4), (15000.0, -17.8), (20000.0, -17.8), (25100.0, -17.8),
];

impl Weighting {
    /// Linear gain at `freq` Hz, normalized to roughly 1.0 at 1 kHz.
    pub fn gain(self, freq: f32) -> f32 {
        let f = freq.max(0.0);
        let f2 = f * f;
        match self {
            Weighting::Default => db_to_linear(interpolate_curve(f)),
            Weighting::A => {
                let r = 12194.0f32.powi(2) * f2 * f2
                    / ((f2 + 20.6f32.powi(2))
                        * ((f2 + 107.7f32.powi(2)) * (f2 + 737.9f32.powi(2))).sqrt()
                        * (f2 + 12194.0f32.powi(2)));
                r * db_to_linear(2.0)
            }
            Weighting::B => {
                let r = 12194.0f32.powi(2) * f2 * f
                    / ((f2 + 20.6f32.powi(2))
                        * (f2 + 158.5f32.powi(2)).sqrt()
                        * (f2 + 12194.0f32.powi(2)));
                r * db_to_linear(0.17)
            }
            Weighting::C => {
                let r = 12194.0f32.powi(2) * f2
                    / ((f2 + 20.6f32.powi(2)) * (f2 + 12194.0f32.powi(2)));
                r * db_to_linear(0.06)
            }
            Weighting::D => {
                let h = ((1037918.48 - f2).powi(2) + 1080768.16 * f2)
                    / ((9837328.0 - f2).powi(2) + 11723776.0 * f2);
                f / 6.896_689e-5 * (h / ((f2 + 79919.29) * (f2 + 1345600.0))).sqrt()
            }
            Weighting::Z => 1.0,
        }
    }
}

fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

fn interpolate_curve(freq: f32) -> f32 {
    let idx = DEFAULT_CURVE.partition_point(|&(f, _)| f <= freq);
    if idx == 0 {
        return DEFAULT_CURVE[0].1;
    }
    if idx >= DEFAULT_CURVE.len() {
        return DEFAULT_CURVE[DEFAULT_CURVE.len() - 1].1;
    }
    let (f0, db0) = DEFAULT_CURVE[idx - 1];
    let (f1, db1) = DEFAULT_CURVE[idx];
    db0 + (db1 - db0) * (freq - f0) / (f1 - f0)
}

impl FromStr for Weighting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            "c" => Ok(Self::C),
            "d" => Ok(Self::D),
            "z" => Ok(Self::Z),
            _ => Err(ConfigError::UnknownWeighting(s.to_string())),
        }
    }
}

impl TryFrom<String> for Weighting {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weighting::Default => "default",
            Weighting::A => "A",
            Weighting::B => "B",
            Weighting::C => "C",
            Weighting::D => "D",
            Weighting::Z => "Z",
        };
        f.write_str(name)
    }
}
