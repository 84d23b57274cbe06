//! Surface translation: read the target's sorted amplitude distribution
//! through the source's waveform.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::dsp::buffer::PcmBuffer;

use super::params::TransformParams;

/// Maximum jitter as a fraction of the sorted array span.
pub const MAX_JITTER_FRACTION: f64 = 0.05;

/// For every source sample, map its amplitude in [-1, 1] linearly onto an
/// index of the ascending-sorted target channel (plus optional jitter) and
/// emit the value found there.
///
/// The result has the source's length and the target's channel count.
pub fn surface_translation(source: &PcmBuffer, target: &PcmBuffer, params: &TransformParams) -> PcmBuffer {
    let mut rng = match params.seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::seed_from_u64(rand::random()),
    };
    let jitter = params.surface_jitter as f64;
    let len = source.len();

    let channels = (0..target.num_channels())
        .map(|c| {
            let mut sorted = target.channel(c).to_vec();
            sorted.sort_by(f32::total_cmp);
            if sorted.is_empty() {
                return vec![0.0; len];
            }
            let span = (sorted.len() - 1) as f64;
            let max_jitter = span * MAX_JITTER_FRACTION * jitter;

            source
                .channel_or_last(c)
                .iter()
                .map(|&s| {
                    let unit = ((s as f64).clamp(-1.0, 1.0) + 1.0) / 2.0;
                    let mut index = unit * span;
                    if max_jitter > 0.0 {
                        index += rng.gen_range(-1.0..=1.0) * max_jitter;
                    }
                    sorted[index.round().clamp(0.0, span) as usize]
                })
                .collect()
        })
        .collect();

    PcmBuffer::from_aligned(channels, target.sample_rate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> PcmBuffer {
        PcmBuffer::mono(vec![0.3, -0.9, 0.0, 0.9, -0.3], 44100)
    }

    #[test]
    fn extremes_pick_sorted_ends() {
        let source = PcmBuffer::mono(vec![-1.0, 1.0, 0.0, -5.0, 5.0], 44100);
        let out = surface_translation(&source, &target(), &TransformParams::default());
        assert_eq!(out.channel(0), &[-0.9, 0.9, 0.0, -0.9, 0.9]);
    }

    #[test]
    fn output_takes_source_length() {
        let source = PcmBuffer::mono(vec![0.1; 12], 22050);
        let out = surface_translation(&source, &target(), &TransformParams::default());
        assert_eq!(out.len(), 12);
        assert_eq!(out.sample_rate(), 44100);
    }

    #[test]
    fn jitter_is_seeded_and_bounded() {
        let target = PcmBuffer::mono((0..1000).map(|i| i as f32 / 1000.0).collect(), 44100);
        let source = PcmBuffer::mono(vec![0.0; 500], 44100);
        let params = TransformParams {
            surface_jitter: 1.0,
            seed: Some(42),
            ..TransformParams::default()
        };
        let a = surface_translation(&source, &target, &params);
        let b = surface_translation(&source, &target, &params);
        assert_eq!(a, b);

        // Center index 499.5 ± 5% of 999 frames.
        let lo = (499.5 - 49.95f32).floor() / 1000.0;
        let hi = (499.5 + 49.95f32).ceil() / 1000.0;
        assert!(a.channel(0).iter().all(|&v| v >= lo && v <= hi));
        assert!(a.channel(0).iter().any(|&v| v != a.channel(0)[0]));
    }

    #[test]
    fn unseeded_jitter_draws_from_entropy() {
        let target = PcmBuffer::mono((0..1000).map(|i| i as f32 / 1000.0).collect(), 44100);
        let source = PcmBuffer::mono(vec![0.0; 500], 44100);
        let params = TransformParams {
            surface_jitter: 1.0,
            seed: None,
            ..TransformParams::default()
        };
        let out = surface_translation(&source, &target, &params);
        assert_eq!(out.len(), 500);
        assert!(out.channel(0).iter().all(|&v| (0.449..=0.55).contains(&v)));
    }

    #[test]
    fn empty_target_gives_silence_of_source_length() {
        let source = PcmBuffer::mono(vec![0.5; 8], 44100);
        let out = surface_translation(&source, &PcmBuffer::silent(2, 0, 44100), &TransformParams::default());
        assert_eq!(out.num_channels(), 2);
        assert_eq!(out.len(), 8);
        assert!(out.channels().iter().flatten().all(|&s| s == 0.0));
    }
}
