//! Feedback delay: mono delay line with a damping lowpass inside the loop.

use super::filter::{BiquadFilter, FilterSpec};

/// A mono delay whose feedback path runs through a lowpass filter.
///
/// The loop writes `input + feedback * lowpass(delayed)` into the line and
/// returns the delayed signal (fully wet); dry/wet mixing happens downstream.
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    buffer: Vec<f32>,
    write_pos: usize,
    damping: Option<BiquadFilter>,

    /// Feedback amount (0.0 = single echo).
    pub feedback: f32,
}

impl FeedbackDelay {
    /// Create a delay of `delay_time` seconds.
    ///
    /// `damping_hz` of `None`, or a cutoff outside (0, Nyquist), leaves the
    /// loop unfiltered.
    pub fn new(sample_rate: f64, delay_time: f64, feedback: f32, damping_hz: Option<f64>) -> Self {
        let delay_samples = ((delay_time * sample_rate).max(0.0) as usize).max(1);
        let damping = damping_hz
            .map(|hz| FilterSpec::lowpass(hz, std::f64::consts::FRAC_1_SQRT_2))
            .filter(|spec| spec.in_band(sample_rate))
            .map(|spec| BiquadFilter::new(spec, sample_rate));
        FeedbackDelay {
            buffer: vec![0.0; delay_samples],
            write_pos: 0,
            damping,
            feedback,
        }
    }

    /// Delay length in samples.
    pub fn delay_samples(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        let looped = match self.damping.as_mut() {
            Some(lp) => lp.process(delayed as f64) as f32,
            None => delayed,
        };
        self.buffer[self.write_pos] = input + looped * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        delayed
    }

    /// Process a block in place.
    pub fn process_block(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process(*s);
        }
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        if let Some(lp) = self.damping.as_mut() {
            lp.reset();
        }
    }
}
