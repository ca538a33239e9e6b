use rustfft::{num_complex::Complex, FftPlanner};

use super::spectrum::hann_window;
use super::weighting::Weighting;
use super::yin::{cumulative_mean_normalize, lag_range, pick_minimum};

/// YIN computed from a magnitude spectrum. The difference function comes
/// from the autocorrelation of the weighted power spectrum.
///
/// The spectrum must come from a Hann-windowed frame zero-padded to
/// [`YinFft::PADDING`] times its length, so that the inverse transform gives
/// the linear autocorrelation rather than a circular one. Each lag is then
/// divided by the window's own autocorrelation to undo the taper.
pub struct YinFft {
    sample_rate: f32,
    min_frequency: f32,
    max_frequency: f32,
    weighting: Weighting,
    tolerance: f32,
    planner: FftPlanner<f32>,
    /// Weighting gain per bin
    gains: Vec<f32>,
    /// Hann autocorrelation for lags `0..=N/2`
    window_acf: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    diff: Vec<f32>,
}

impl YinFft {
    pub const PADDING: usize = 2;

    pub fn new(
        sample_rate: f32,
        frame_size: usize,
        min_frequency: f32,
        max_frequency: f32,
        weighting: Weighting,
        tolerance: f32,
    ) -> Self {
        log::debug!(
            "YIN-FFT: frame={} range={:.1}-{:.1}Hz weighting={} tolerance={:.2}",
            frame_size, min_frequency, max_frequency, weighting, tolerance
        );
        let mut yin = Self {
            sample_rate,
            min_frequency,
            max_frequency,
            weighting,
            tolerance,
            planner: FftPlanner::new(),
            gains: Vec::new(),
            window_acf: Vec::new(),
            buffer: Vec::with_capacity(frame_size * Self::PADDING),
            diff: Vec::with_capacity(frame_size / 2 + 1),
        };
        yin.prepare(frame_size);
        yin
    }

    fn prepare(&mut self, frame_size: usize) {
        let size = frame_size * Self::PADDING;
        let bin_hz = self.sample_rate / size.max(1) as f32;
        self.gains = (0..=size / 2)
            .map(|k| self.weighting.gain(k as f32 * bin_hz))
            .collect();
        self.window_acf = window_autocorrelation(&mut self.planner, frame_size);
    }

    /// `spectrum` holds the `N + 1` magnitude bins of an `N`-sample frame
    /// padded to `2N`. Returns (pitch Hz, confidence).
    pub fn estimate(&mut self, spectrum: &[f32]) -> (f32, f32) {
        let bins = spectrum.len();
        if bins < 2 {
            return (0.0, 0.0);
        }
        let frame_size = (bins - 1) * 2 / Self::PADDING;
        let size = frame_size * Self::PADDING;
        if self.gains.len() != bins {
            self.prepare(frame_size);
        }
        let max_lag = frame_size / 2;
        let Some((lo, hi)) = lag_range(self.sample_rate, self.min_frequency, self.max_frequency, max_lag)
        else {
            return (0.0, 0.0);
        };

        // Hermitian power spectrum, so the inverse transform is real. Every
        // bin takes the gain of the peak it belongs to: weighting the bins of
        // one partial unevenly would skew its frequency.
        self.buffer.clear();
        self.buffer.resize(size, Complex::new(0.0, 0.0));
        for (k, &mag) in spectrum.iter().enumerate() {
            let gain = self.gains[peak_of(spectrum, k)];
            let power = Complex::new(mag * mag * gain, 0.0);
            self.buffer[k] = power;
            if k > 0 && k < size - k {
                self.buffer[size - k] = power;
            }
        }

        let ifft = self.planner.plan_fft_inverse(size);
        ifft.process(&mut self.buffer);

        let r0 = self.buffer[0].re;
        let acf0 = self.window_acf[0];
        self.diff.clear();
        self.diff.extend(
            self.buffer[..=max_lag]
                .iter()
                .zip(&self.window_acf)
                .map(|(c, &w)| {
                    let r = if w > acf0 * 1e-6 { c.re * acf0 / w } else { 0.0 };
                    (2.0 * (r0 - r)).max(0.0)
                }),
        );

        cumulative_mean_normalize(&mut self.diff);

        match pick_minimum(&self.diff, lo, hi, self.tolerance) {
            Some((tau, value)) => (self.sample_rate / tau, (1.0 - value).clamp(0.0, 1.0)),
            None => (0.0, 0.0),
        }
    }
}

/// Bin of the local maximum reached by climbing from bin `k`.
fn peak_of(spectrum: &[f32], mut k: usize) -> usize {
    loop {
        let mut best = k;
        if k > 0 && spectrum[k - 1] > spectrum[best] {
            best = k - 1;
        }
        if k + 1 < spectrum.len() && spectrum[k + 1] > spectrum[best] {
            best = k + 1;
        }
        if best == k {
            return k;
        }
        k = best;
    }
}

/// Linear autocorrelation of the Hann window of `frame_size`, lags `0..=N/2`.
fn window_autocorrelation(planner: &mut FftPlanner<f32>, frame_size: usize) -> Vec<f32> {
    let size = (frame_size * YinFft::PADDING).max(1);
    let mut buffer: Vec<Complex<f32>> = hann_window(frame_size)
        .into_iter()
        .map(|w| Complex::new(w, 0.0))
        .collect();
    buffer.resize(size, Complex::new(0.0, 0.0));

    planner.plan_fft_forward(size).process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(size).process(&mut buffer);

    buffer[..=frame_size / 2]
        .iter()
        .map(|c| c.re / size as f32)
        .collect()
}
