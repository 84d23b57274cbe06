//! Transformation morph: two operators rendered in parallel and crossfaded.

use crate::dsp::buffer::PcmBuffer;
use crate::dsp::mixer::crossfade;
use crate::error::{TransformError, TransformResult};

use super::params::TransformParams;
use super::{TransformEngine, Transformation};

/// Resolve a morph operand, rejecting unknown names and nested morphs.
fn operand(name: &str) -> TransformResult<Transformation> {
    match name.parse::<Transformation>()? {
        Transformation::TransformationMorph => Err(TransformError::unsupported(name)),
        kind => Ok(kind),
    }
}

/// Run `morph_first` and `morph_second` on the same inputs and blend them at
/// `morph_position` (0 = first only, 1 = second only).
///
/// The result spans the longer of the two outputs (the shorter reads as
/// silence past its end) and carries the smaller channel count.
pub fn transformation_morph(
    engine: &TransformEngine,
    source: &PcmBuffer,
    target: &PcmBuffer,
    params: &TransformParams,
) -> TransformResult<PcmBuffer> {
    let first = operand(&params.morph_first)?;
    let second = operand(&params.morph_second)?;

    let (a, b) = rayon::join(
        || engine.apply(first, source, target, params),
        || engine.apply(second, source, target, params),
    );
    let (a, b) = (a?, b?);

    let channels = (0..a.num_channels().min(b.num_channels()))
        .map(|c| crossfade(a.channel(c), b.channel(c), params.morph_position))
        .collect();
    Ok(PcmBuffer::from_aligned(channels, a.sample_rate()))
}
