//! Spectral operators: the 16-band vocoder and STFT magnitude/phase masking.

use crate::dsp::buffer::PcmBuffer;
use crate::dsp::features::{track_level, SMOOTHING_FAST};
use crate::dsp::fft::{hann_window, FftCache};
use crate::dsp::filter::{BiquadFilter, FilterSpec};
use crate::dsp::mixer::{crossfade, Mixer};
use crate::error::TransformResult;

use super::params::TransformParams;

pub const VOCODER_BANDS: usize = 16;
pub const VOCODER_LOW_HZ: f64 = 60.0;
pub const VOCODER_HIGH_HZ: f64 = 18_000.0;

pub const MASK_FFT_SIZE: usize = 2048;
pub const MASK_HOP: usize = 512;
/// Sum of squared periodic Hann windows at 75% overlap.
const HANN_SQ_OVERLAP: f32 = 1.5;

/// Logarithmically spaced band centers from 60 Hz to 18 kHz.
pub fn vocoder_centers() -> [f64; VOCODER_BANDS] {
    let ratio = VOCODER_HIGH_HZ / VOCODER_LOW_HZ;
    std::array::from_fn(|i| VOCODER_LOW_HZ * ratio.powf(i as f64 / (VOCODER_BANDS - 1) as f64))
}

/// Bandpass Q that makes adjacent bands meet at their -3 dB points.
fn vocoder_q() -> f64 {
    let r = (VOCODER_HIGH_HZ / VOCODER_LOW_HZ).powf(1.0 / (VOCODER_BANDS - 1) as f64);
    r.sqrt() / (r - 1.0)
}

/// Channel vocoder: each target band is scaled by the matching source band's
/// envelope, bands are summed, and the sum is blended with the dry target by
/// `spectral_mix`. Bands at or above the target's Nyquist are skipped.
pub fn spectral_shaping(source: &PcmBuffer, target: &PcmBuffer, params: &TransformParams) -> PcmBuffer {
    let sr = target.sample_rate() as f64;
    let len = target.len();
    let q = vocoder_q();
    let bands: Vec<FilterSpec> = vocoder_centers()
        .into_iter()
        .map(|hz| FilterSpec::bandpass(hz, q))
        .filter(|spec| spec.in_band(sr))
        .collect();

    let channels = (0..target.num_channels())
        .map(|c| {
            let src = source.channel_or_last(c);
            let tgt = target.channel(c);

            // Raw band envelopes first, so they can share one normalization.
            let envelopes: Vec<Vec<f32>> = bands
                .iter()
                .map(|spec| {
                    let mut band = vec![0.0f32; len];
                    let n = src.len().min(len);
                    band[..n].copy_from_slice(&src[..n]);
                    BiquadFilter::new(*spec, sr).process_block(&mut band);
                    track_level(&band, SMOOTHING_FAST)
                })
                .collect();
            let loudest = envelopes
                .iter()
                .flat_map(|e| e.iter())
                .fold(0.0f32, |acc, &v| acc.max(v));
            let norm = if loudest > 0.0 { 1.0 / loudest as f64 } else { 0.0 };

            let mut bus = Mixer::new(len);
            for (spec, env) in bands.iter().zip(&envelopes) {
                let mut band = tgt.to_vec();
                BiquadFilter::new(*spec, sr).process_block(&mut band);
                for (i, (&b, &e)) in band.iter().zip(env).enumerate() {
                    bus.add(i, b as f64 * e as f64);
                }
            }
            crossfade(tgt, &bus.output(norm), params.spectral_mix)
        })
        .collect();

    PcmBuffer::from_aligned(channels, target.sample_rate())
}

/// Frame-by-frame STFT resynthesis with the source's magnitude and the
/// target's phase, Hann-windowed on analysis and synthesis and overlap-added.
///
/// The result spans `min(source, target)` frames.
pub fn fourier_masking(
    source: &PcmBuffer,
    target: &PcmBuffer,
    fft: &FftCache,
) -> TransformResult<PcmBuffer> {
    let len = source.len().min(target.len());
    let window = hann_window(MASK_FFT_SIZE);

    let mut channels = Vec::with_capacity(target.num_channels());
    for c in 0..target.num_channels() {
        let src = source.channel_or_last(c);
        let tgt = target.channel(c);
        let mut bus = Mixer::new(len);

        let mut pos = 0;
        while pos < len {
            let mut s_re = windowed_frame(src, pos, len, &window);
            let mut s_im = vec![0.0f32; MASK_FFT_SIZE];
            let mut t_re = windowed_frame(tgt, pos, len, &window);
            let mut t_im = vec![0.0f32; MASK_FFT_SIZE];
            fft.fft(&mut s_re, &mut s_im, false)?;
            fft.fft(&mut t_re, &mut t_im, false)?;

            for k in 0..MASK_FFT_SIZE {
                let mag = s_re[k].hypot(s_im[k]);
                let phase = t_im[k].atan2(t_re[k]);
                s_re[k] = mag * phase.cos();
                s_im[k] = mag * phase.sin();
            }
            fft.fft(&mut s_re, &mut s_im, true)?;

            for (k, w) in window.iter().enumerate() {
                bus.add(pos + k, (s_re[k] * w) as f64);
            }
            pos += MASK_HOP;
        }
        channels.push(bus.output(1.0 / HANN_SQ_OVERLAP as f64));
    }

    Ok(PcmBuffer::from_aligned(channels, target.sample_rate()))
}

fn windowed_frame(samples: &[f32], pos: usize, len: usize, window: &[f32]) -> Vec<f32> {
    window
        .iter()
        .enumerate()
        .map(|(k, w)| {
            let i = pos + k;
            if i < len { samples[i] * w } else { 0.0 }
        })
        .collect()
}
