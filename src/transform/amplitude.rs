//! Envelope-driven operators: amplitude mapping and rhythmic gating.

use crate::dsp::buffer::PcmBuffer;
use crate::dsp::features::{self, SMOOTHING_DEFAULT, SMOOTHING_GATE};

use super::params::TransformParams;

/// Multiply the target by the source's normalized envelope.
///
/// Channels are aligned (source channel `c`, or its last channel) and the
/// result is truncated to the shorter buffer.
pub fn amplitude_mapping(source: &PcmBuffer, target: &PcmBuffer) -> PcmBuffer {
    let env = features::envelope(source, SMOOTHING_DEFAULT);
    modulate(&env, target, |e| e)
}

/// Multiply the target by a hard gate: 1 where the slow source envelope
/// exceeds `gate_threshold`, 0 elsewhere.
pub fn rhythmic_gating(source: &PcmBuffer, target: &PcmBuffer, params: &TransformParams) -> PcmBuffer {
    let env = features::envelope(source, SMOOTHING_GATE);
    let threshold = params.gate_threshold;
    modulate(&env, target, |e| if e > threshold { 1.0 } else { 0.0 })
}

fn modulate(env: &PcmBuffer, target: &PcmBuffer, shape: impl Fn(f32) -> f32) -> PcmBuffer {
    let len = env.len().min(target.len());
    let channels = (0..target.num_channels())
        .map(|c| {
            let e = env.channel_or_last(c);
            target.channel(c)[..len]
                .iter()
                .zip(e)
                .map(|(&t, &g)| t * shape(g))
                .collect()
        })
        .collect();
    PcmBuffer::from_aligned(channels, target.sample_rate())
}
