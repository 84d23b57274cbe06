//! Interference echoes: a gated feedback delay triggered by source onsets.

use std::ops::Range;

use crate::dsp::buffer::PcmBuffer;
use crate::dsp::features::{self, DEFAULT_MIN_SEPARATION_MS};
use crate::dsp::renderer::{DelaySpec, OfflineRenderer};
use crate::error::{TransformError, TransformResult};

use super::params::TransformParams;

pub const ECHO_DELAY_SECS: f64 = 0.3;
pub const ECHO_DAMPING_HZ: f64 = 4000.0;
pub const PULSE_SECS: f64 = 0.01;
/// Extra render time appended for the echo tail.
pub const TAIL_SECS: f64 = 4.0;

/// Feed the target into a 0.3 s feedback delay whose input gate opens for
/// 10 ms at each source transient, then blend the echoes with the dry target
/// by `interference_mix`.
///
/// The result is the target's length plus a 4 s tail. The target passes
/// through unchanged when the source yields at most one transient entry.
pub fn interference_echoes(
    source: &PcmBuffer,
    target: &PcmBuffer,
    params: &TransformParams,
) -> TransformResult<PcmBuffer> {
    let marks = features::transients(source, params.transient_sensitivity, DEFAULT_MIN_SEPARATION_MS);
    if marks.len() <= 1 {
        log::info!("{}; passing target through", TransformError::insufficient("transients"));
        return Ok(target.clone());
    }

    let tail = (TAIL_SECS * target.sample_rate() as f64) as usize;
    OfflineRenderer::new(target.num_channels(), target.len() + tail, target.sample_rate())
        .gate(pulse_windows(&marks, source.sample_rate(), target.sample_rate()))
        .feedback_delay(DelaySpec {
            time: ECHO_DELAY_SECS,
            feedback: params.interference_feedback,
            damping_hz: Some(ECHO_DAMPING_HZ),
        })
        .dry_wet(params.interference_mix)
        .render(target)
}

/// One 10 ms window per onset, converted from source frames to target frames.
/// The closing end-of-buffer sentinel is not an onset and opens no window.
fn pulse_windows(marks: &[usize], source_rate: u32, target_rate: u32) -> Vec<Range<usize>> {
    if source_rate == 0 {
        return Vec::new();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let width = ((PULSE_SECS * target_rate as f64) as usize).max(1);
    marks[..marks.len() - 1]
        .iter()
        .map(|&frame| {
            let start = (frame as f64 * ratio).round() as usize;
            start..start + width
        })
        .collect()
}
