//! Resonance imprinting: stamp the source's spectral peaks onto the target as
//! a chain of peaking filters.

use crate::dsp::buffer::PcmBuffer;
use crate::dsp::features::{self, FORMANT_RANGE, PEAK_FFT_SIZE};
use crate::dsp::fft::FftCache;
use crate::dsp::filter::FilterSpec;
use crate::dsp::renderer::OfflineRenderer;
use crate::error::{TransformError, TransformResult};

use super::params::TransformParams;

pub const HARMONIC_GAIN_DB: f64 = 15.0;
pub const FORMANT_GAIN_DB: f64 = 18.0;

/// Boost the target at up to `num_harmonics` strongest source peaks
/// (full spectrum), +15 dB each at Q = `harmonic_q`.
///
/// Passes the target through unchanged when the source has no peaks.
pub fn harmonic_imprinting(
    source: &PcmBuffer,
    target: &PcmBuffer,
    params: &TransformParams,
    fft: &FftCache,
) -> TransformResult<PcmBuffer> {
    let freqs = features::peaks(source, params.num_harmonics as usize, fft, PEAK_FFT_SIZE, None)?;
    if freqs.is_empty() {
        log_passthrough("harmonics");
        return Ok(target.clone());
    }
    peak_chain(target, &freqs, params.harmonic_q, HARMONIC_GAIN_DB).render(target)
}

/// Boost the target at up to `num_formants` source peaks in the 300–5000 Hz
/// band, +18 dB each at Q = `formant_q`, blended with the dry target by
/// `formant_mix`.
///
/// Passes the target through unchanged when the band holds no peaks.
pub fn formant_shifting(
    source: &PcmBuffer,
    target: &PcmBuffer,
    params: &TransformParams,
    fft: &FftCache,
) -> TransformResult<PcmBuffer> {
    let freqs = features::peaks(
        source,
        params.num_formants as usize,
        fft,
        PEAK_FFT_SIZE,
        Some(FORMANT_RANGE),
    )?;
    if freqs.is_empty() {
        log_passthrough("formants");
        return Ok(target.clone());
    }
    peak_chain(target, &freqs, params.formant_q, FORMANT_GAIN_DB)
        .dry_wet(params.formant_mix)
        .render(target)
}

fn peak_chain(target: &PcmBuffer, freqs: &[f64], q: f64, gain_db: f64) -> OfflineRenderer {
    let sample_rate = target.sample_rate() as f64;
    freqs
        .iter()
        .map(|&hz| FilterSpec::peaking(hz, q, gain_db))
        .filter(|spec| spec.in_band(sample_rate))
        .fold(OfflineRenderer::for_buffer(target), OfflineRenderer::filter)
}

fn log_passthrough(feature: &str) {
    log::info!("{}; passing target through", TransformError::insufficient(feature));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::filter::BiquadFilter;
    use std::f64::consts::PI;

    fn tone(freqs: &[f64], sr: u32, len: usize) -> PcmBuffer {
        PcmBuffer::mono(
            (0..len)
                .map(|i| {
                    let t = i as f64 / sr as f64;
                    freqs.iter().map(|f| (2.0 * PI * f * t).sin() as f32 * 0.3).sum()
                })
                .collect(),
            sr,
        )
    }

    fn noise(len: usize) -> Vec<f32> {
        let mut state: u32 = 0x1234_5678;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) * 0.5 - 0.25
            })
            .collect()
    }

    #[test]
    fn silent_source_passes_target_through() {
        let fft = FftCache::new();
        let target = PcmBuffer::mono(noise(4096), 44100);
        let silence = PcmBuffer::silent(1, 8192, 44100);
        let params = TransformParams::default();
        assert_eq!(harmonic_imprinting(&silence, &target, &params, &fft).unwrap(), target);
        assert_eq!(formant_shifting(&silence, &target, &params, &fft).unwrap(), target);
    }

    #[test]
    fn harmonics_apply_peaking_chain() {
        let fft = FftCache::new();
        let source = tone(&[440.0], 44100, 8192);
        let target = PcmBuffer::mono(noise(4096), 44100);
        let params = TransformParams {
            num_harmonics: 1,
            ..TransformParams::default()
        };
        let out = harmonic_imprinting(&source, &target, &params, &fft).unwrap();

        let bin = 44100.0 / PEAK_FFT_SIZE as f64;
        let hz = (440.0 / bin).round() * bin;
        let mut expected = target.channel(0).to_vec();
        BiquadFilter::new(FilterSpec::peaking(hz, 30.0, HARMONIC_GAIN_DB), 44100.0)
            .process_block(&mut expected);
        assert_eq!(out.channel(0), expected.as_slice());
    }

    #[test]
    fn formant_mix_blends_with_dry() {
        let fft = FftCache::new();
        let source = tone(&[800.0, 2400.0], 44100, 8192);
        let target = PcmBuffer::mono(noise(4096), 44100);
        let dry = TransformParams {
            formant_mix: 0.0,
            ..TransformParams::default()
        };
        assert_eq!(formant_shifting(&source, &target, &dry, &fft).unwrap(), target);

        let wet = formant_shifting(&source, &target, &TransformParams::default(), &fft).unwrap();
        assert_eq!(wet.len(), target.len());
        assert_ne!(wet, target);
    }

    #[test]
    fn formants_ignore_peaks_outside_band() {
        // Only a 100 Hz partial; anything picked up must come from inside the band.
        let fft = FftCache::new();
        let source = tone(&[100.0], 44100, 8192);
        let peaks = features::peaks(&source, 4, &fft, PEAK_FFT_SIZE, Some(FORMANT_RANGE)).unwrap();
        let target = PcmBuffer::mono(noise(2048), 44100);
        let out = formant_shifting(&source, &target, &TransformParams::default(), &fft).unwrap();
        if peaks.is_empty() {
            assert_eq!(out, target);
        } else {
            assert!(peaks.iter().all(|&hz| (300.0..=5000.0).contains(&hz)));
        }
    }
}
