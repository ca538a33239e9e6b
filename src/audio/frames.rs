/// Cuts a signal into frames of `frame_size` samples every `hop_size`
/// samples. Frame `k` is centered on sample `k * hop_size`; samples outside
/// the signal read as zero. Stops once the center passes the last sample.
pub struct FrameCutter<'a> {
    samples: &'a [f32],
    frame_size: usize,
    hop_size: usize,
    center: usize,
}

impl<'a> FrameCutter<'a> {
    pub fn new(samples: &'a [f32], frame_size: usize, hop_size: usize) -> Self {
        Self {
            samples,
            frame_size,
            hop_size: hop_size.max(1),
            center: 0,
        }
    }

    /// Number of frames a signal of `len` samples produces.
    pub fn frame_count(len: usize, hop_size: usize) -> usize {
        len.div_ceil(hop_size.max(1))
    }
}

impl Iterator for FrameCutter<'_> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Vec<f32>> {
        if self.center >= self.samples.len() {
            return None;
        }

        let start = self.center as isize - (self.frame_size / 2) as isize;
        let frame = (0..self.frame_size as isize)
            .map(|i| {
                let idx = start + i;
                if idx >= 0 && (idx as usize) < self.samples.len() {
                    self.samples[idx as usize]
                } else {
                    0.0
                }
            })
            .collect();

        self.center += self.hop_size;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.samples.len().saturating_sub(self.center).div_ceil(self.hop_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameCutter<'_> {}
