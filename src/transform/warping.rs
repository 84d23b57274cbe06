//! Time scale warping: re-time target segments onto the source's rhythm.

use crate::dsp::buffer::PcmBuffer;
use crate::dsp::features::{self, DEFAULT_MIN_SEPARATION_MS};

use super::params::TransformParams;

/// Segments shorter than this in either signal are skipped.
pub const MIN_SEGMENT_MS: f64 = 10.0;

/// Pair the i-th inter-transient segment of source and target, resample each
/// target segment to the source segment's duration, and concatenate in order.
///
/// Returns `None` when the inputs yield no usable segment pair (fewer than
/// two transients on either side, or every pair too short).
pub fn time_scale_warping(
    source: &PcmBuffer,
    target: &PcmBuffer,
    params: &TransformParams,
) -> Option<PcmBuffer> {
    let threshold = params.transient_sensitivity;
    let src_marks = features::transients(source, threshold, DEFAULT_MIN_SEPARATION_MS);
    let tgt_marks = features::transients(target, threshold, DEFAULT_MIN_SEPARATION_MS);
    if src_marks.len() < 2 || tgt_marks.len() < 2 {
        return None;
    }

    let src_min = min_frames(source.sample_rate());
    let tgt_min = min_frames(target.sample_rate());
    let pairs = src_marks.len().min(tgt_marks.len()) - 1;

    let segments: Vec<(usize, usize, usize)> = (0..pairs)
        .filter_map(|i| {
            let src_len = src_marks[i + 1] - src_marks[i];
            let (t0, t1) = (tgt_marks[i], tgt_marks[i + 1]);
            (src_len >= src_min && t1 - t0 >= tgt_min).then_some((t0, t1, src_len))
        })
        .collect();
    if segments.is_empty() {
        return None;
    }

    let channels = target
        .channels()
        .iter()
        .map(|ch| {
            let mut out = Vec::with_capacity(segments.iter().map(|s| s.2).sum());
            for &(t0, t1, src_len) in &segments {
                out.extend(resample(&ch[t0..t1], src_len));
            }
            out
        })
        .collect();
    Some(PcmBuffer::from_aligned(channels, target.sample_rate()))
}

fn min_frames(sample_rate: u32) -> usize {
    (MIN_SEGMENT_MS / 1000.0 * sample_rate as f64).ceil() as usize
}

/// Playback-rate resampling of `segment` to exactly `out_len` frames with
/// linear interpolation.
fn resample(segment: &[f32], out_len: usize) -> impl Iterator<Item = f32> + '_ {
    let rate = segment.len() as f64 / out_len as f64;
    let last = segment.len().saturating_sub(1);
    (0..out_len).map(move |j| {
        let pos = j as f64 * rate;
        let i = (pos.floor() as usize).min(last);
        let frac = (pos - i as f64) as f32;
        let a = segment[i];
        let b = segment[(i + 1).min(last)];
        a + (b - a) * frac
    })
}
