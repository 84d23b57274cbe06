//! Biquad filter: RBJ Audio EQ Cookbook shapes used by the operators.
//!
//! Coefficients are computed in f64 and samples run through Direct Form II
//! Transposed, so every operator's filtering is fully specified here rather
//! than delegated to a host audio API.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Filter shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Lowpass,
    /// Constant 0 dB peak gain bandpass.
    Bandpass,
    Peaking,
}

/// Declarative description of one biquad, as attached to a render stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub filter_type: FilterType,
    pub frequency: f64,
    pub q: f64,
    /// Only read by `Peaking`.
    pub gain_db: f64,
}

impl FilterSpec {
    pub fn lowpass(frequency: f64, q: f64) -> Self {
        FilterSpec {
            filter_type: FilterType::Lowpass,
            frequency,
            q,
            gain_db: 0.0,
        }
    }

    pub fn bandpass(frequency: f64, q: f64) -> Self {
        FilterSpec {
            filter_type: FilterType::Bandpass,
            frequency,
            q,
            gain_db: 0.0,
        }
    }

    pub fn peaking(frequency: f64, q: f64, gain_db: f64) -> Self {
        FilterSpec {
            filter_type: FilterType::Peaking,
            frequency,
            q,
            gain_db,
        }
    }

    /// Whether the center/cutoff lies strictly inside (0, Nyquist).
    pub fn in_band(&self, sample_rate: f64) -> bool {
        self.frequency.is_finite() && self.frequency > 0.0 && self.frequency < sample_rate / 2.0
    }
}

/// A second-order IIR section with its own state.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    spec: FilterSpec,

    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    z1: f64,
    z2: f64,
}

impl BiquadFilter {
    pub fn new(spec: FilterSpec, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * spec.frequency / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * spec.q);

        let (b0, b1, b2, a0, a1, a2) = match spec.filter_type {
            FilterType::Lowpass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterType::Bandpass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha),
            FilterType::Peaking => {
                let a_lin = 10.0_f64.powf(spec.gain_db / 40.0);
                (
                    1.0 + alpha * a_lin,
                    -2.0 * cos_w0,
                    1.0 - alpha * a_lin,
                    1.0 + alpha / a_lin,
                    -2.0 * cos_w0,
                    1.0 - alpha / a_lin,
                )
            }
        };

        BiquadFilter {
            spec,
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Filter a block in place.
    pub fn process_block(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process(*s as f64) as f32;
        }
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}
