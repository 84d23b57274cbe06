//! Dynamic ring modulation: a sine carrier whose frequency follows the
//! source envelope.

use std::f64::consts::TAU;

use crate::dsp::buffer::PcmBuffer;
use crate::dsp::features::{self, SMOOTHING_FAST};
use crate::dsp::mixer::crossfade;

use super::params::TransformParams;

/// Multiply the target by `sin(phase)`, where the phase integrates
/// `ring_mod_base_freq + envelope * ring_mod_range` Hz, and blend the result
/// with the dry target by `ring_mod_mix`.
///
/// The envelope reads as zero past the end of the source, leaving the carrier
/// at the base frequency. The result has the target's shape.
pub fn dynamic_ring_modulation(source: &PcmBuffer, target: &PcmBuffer, params: &TransformParams) -> PcmBuffer {
    let env = features::envelope(source, SMOOTHING_FAST);
    let sample_rate = target.sample_rate() as f64;

    let channels = (0..target.num_channels())
        .map(|c| {
            let e = env.channel_or_last(c);
            let tgt = target.channel(c);
            let mut phase = 0.0f64;
            let modulated: Vec<f32> = tgt
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    let y = x * phase.sin() as f32;
                    if sample_rate > 0.0 {
                        let level = e.get(i).copied().unwrap_or(0.0) as f64;
                        let freq = params.ring_mod_base_freq + level * params.ring_mod_range;
                        phase = (phase + TAU * freq / sample_rate) % TAU;
                    }
                    y
                })
                .collect();
            crossfade(tgt, &modulated, params.ring_mod_mix)
        })
        .collect();

    PcmBuffer::from_aligned(channels, target.sample_rate())
}
