//! Mixer: summing bus and linear crossfades.

/// A summing bus that accumulates contributions in f64.
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    buffer: Vec<f64>,
}

impl Mixer {
    pub fn new(num_samples: usize) -> Self {
        Mixer {
            buffer: vec![0.0; num_samples],
        }
    }

    /// Add a sample at the given index; out-of-range writes are ignored.
    pub fn add(&mut self, index: usize, sample: f64) {
        if let Some(slot) = self.buffer.get_mut(index) {
            *slot += sample;
        }
    }

    /// Add a whole block starting at `offset`, clipped to the bus length.
    pub fn add_block(&mut self, offset: usize, block: &[f32]) {
        let Some(dest) = self.buffer.get_mut(offset..) else {
            return;
        };
        for (slot, &s) in dest.iter_mut().zip(block) {
            *slot += s as f64;
        }
    }

    /// Bus contents scaled by `gain`.
    pub fn output(&self, gain: f64) -> Vec<f32> {
        self.buffer.iter().map(|&s| (s * gain) as f32).collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// `dry * (1 - mix) + wet * mix`, over the longer of the two inputs.
///
/// The shorter input is treated as zero past its end.
pub fn crossfade(dry: &[f32], wet: &[f32], mix: f32) -> Vec<f32> {
    let len = dry.len().max(wet.len());
    (0..len)
        .map(|i| {
            let d = dry.get(i).copied().unwrap_or(0.0);
            let w = wet.get(i).copied().unwrap_or(0.0);
            d * (1.0 - mix) + w * mix
        })
        .collect()
}
