/// Time-domain YIN estimator.
pub struct Yin {
    sample_rate: f32,
    min_frequency: f32,
    max_frequency: f32,
    tolerance: f32,
    diff: Vec<f32>,
}

impl Yin {
    pub fn new(
        sample_rate: f32,
        frame_size: usize,
        min_frequency: f32,
        max_frequency: f32,
        tolerance: f32,
    ) -> Self {
        log::debug!(
            "YIN: frame={} range={:.1}-{:.1}Hz tolerance={:.2}",
            frame_size, min_frequency, max_frequency, tolerance
        );
        Self {
            sample_rate,
            min_frequency,
            max_frequency,
            tolerance,
            diff: Vec::with_capacity(frame_size / 2 + 1),
        }
    }

    /// Returns (pitch Hz, confidence). (0.0, 0.0) when no periodicity is found.
    pub fn estimate(&mut self, frame: &[f32]) -> (f32, f32) {
        let max_lag = frame.len() / 2;
        let Some((lo, hi)) = lag_range(self.sample_rate, self.min_frequency, self.max_frequency, max_lag)
        else {
            return (0.0, 0.0);
        };

        // Difference function over a fixed window so every lag sums the same
        // number of terms
        let window = frame.len() - max_lag;
        self.diff.clear();
        self.diff.resize(max_lag + 1, 0.0);
        for tau in 1..=max_lag {
            self.diff[tau] = frame[..window]
                .iter()
                .zip(&frame[tau..tau + window])
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
        }

        cumulative_mean_normalize(&mut self.diff);

        match pick_minimum(&self.diff, lo, hi, self.tolerance) {
            Some((tau, value)) => (self.sample_rate / tau, (1.0 - value).clamp(0.0, 1.0)),
            None => (0.0, 0.0),
        }
    }
}

/// Lag search range `[lo, hi]` for the frequency bounds, limited to `max_lag`.
pub(crate) fn lag_range(
    sample_rate: f32,
    min_frequency: f32,
    max_frequency: f32,
    max_lag: usize,
) -> Option<(usize, usize)> {
    let lo = ((sample_rate / max_frequency).floor() as usize).max(1);
    let hi = ((sample_rate / min_frequency).ceil() as usize).min(max_lag);
    if lo >= hi {
        return None;
    }
    Some((lo, hi))
}

/// In-place cumulative mean normalized difference. Index 0 becomes 1.0.
pub(crate) fn cumulative_mean_normalize(diff: &mut [f32]) {
    if diff.is_empty() {
        return;
    }
    diff[0] = 1.0;
    let mut running = 0.0f32;
    for tau in 1..diff.len() {
        running += diff[tau];
        diff[tau] = if running > 1e-12 {
            diff[tau] * tau as f32 / running
        } else {
            1.0
        };
    }
}

/// First local minimum in `[lo, hi]` below `tolerance`, else the global
/// minimum over `[lo, hi]`, edges included. A range that never dips below 1.0
/// (the normalized mean, e.g. silence) has no minimum. Returns the
/// parabolically interpolated lag and value.
pub(crate) fn pick_minimum(cmnd: &[f32], lo: usize, hi: usize, tolerance: f32) -> Option<(f32, f32)> {
    let lo = lo.max(1);
    let hi = hi.min(cmnd.len().saturating_sub(1));
    if lo > hi {
        return None;
    }

    for tau in lo..=hi {
        let is_local_min = cmnd[tau] < cmnd[tau - 1]
            && (tau + 1 >= cmnd.len() || cmnd[tau] <= cmnd[tau + 1]);
        if is_local_min && cmnd[tau] < tolerance {
            return Some(interpolate(cmnd, tau));
        }
    }

    let global = (lo..=hi).min_by(|&a, &b| cmnd[a].total_cmp(&cmnd[b]))?;
    if cmnd[global] >= 1.0 {
        return None;
    }
    Some(interpolate(cmnd, global))
}

fn interpolate(cmnd: &[f32], tau: usize) -> (f32, f32) {
    if tau == 0 || tau + 1 >= cmnd.len() {
        return (tau as f32, cmnd[tau]);
    }
    let (y0, y1, y2) = (cmnd[tau - 1], cmnd[tau], cmnd[tau + 1]);
    let denom = y0 - 2.0 * y1 + y2;
    if denom.abs() < 1e-12 {
        return (tau as f32, y1);
    }
    let shift = (0.5 * (y0 - y2) / denom).clamp(-0.5, 0.5);
    (tau as f32 + shift, y1 - 0.25 * (y0 - y2) * shift)
}
