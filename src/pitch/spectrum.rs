use rustfft::{num_complex::Complex, FftPlanner};

/// Hann-windowed magnitude spectrum. Planned for the configured frame size;
/// frames of another length get a new window and plan on the fly.
pub struct Spectrum {
    planner: FftPlanner<f32>,
    window: Vec<f32>,
    padding: usize,
    buffer: Vec<Complex<f32>>,
}

impl Spectrum {
    pub fn new(frame_size: usize) -> Self {
        Self::with_padding(frame_size, 1)
    }

    /// The windowed frame is zero-padded to `padding` times its length before
    /// the transform.
    pub fn with_padding(frame_size: usize, padding: usize) -> Self {
        let padding = padding.max(1);
        let mut planner = FftPlanner::<f32>::new();
        // warm the planner cache for the expected size
        planner.plan_fft_forward((frame_size * padding).max(1));
        Self {
            planner,
            window: hann_window(frame_size),
            padding,
            buffer: Vec::with_capacity(frame_size * padding),
        }
    }

    /// Writes `padding * frame.len() / 2 + 1` magnitude bins into `out`.
    pub fn magnitude(&mut self, frame: &[f32], out: &mut Vec<f32>) {
        out.clear();
        if frame.is_empty() {
            return;
        }
        if self.window.len() != frame.len() {
            self.window = hann_window(frame.len());
        }
        let size = frame.len() * self.padding;

        self.buffer.clear();
        self.buffer.extend(
            frame
                .iter()
                .zip(&self.window)
                .map(|(&s, &w)| Complex::new(s * w, 0.0)),
        );
        self.buffer.resize(size, Complex::new(0.0, 0.0));

        let fft = self.planner.plan_fft_forward(size);
        fft.process(&mut self.buffer);

        out.extend(self.buffer[..size / 2 + 1].iter().map(|c| c.norm()));
    }
}

pub fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}
