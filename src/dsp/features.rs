//! Feature extraction: amplitude envelopes, transient onsets and spectral peaks.
//!
//! All extractors are pure functions of their input buffer.

use crate::error::TransformResult;

use super::buffer::PcmBuffer;
use super::fft::FftCache;

/// General-purpose envelope smoothing.
pub const SMOOTHING_DEFAULT: f32 = 0.995;
/// Slow envelope that favors sustained events (gating).
pub const SMOOTHING_GATE: f32 = 0.998;
/// Fast envelope for modulation control.
pub const SMOOTHING_FAST: f32 = 0.99;

/// Transient detector chunk length in frames.
pub const TRANSIENT_CHUNK: usize = 512;
pub const DEFAULT_TRANSIENT_THRESHOLD: f32 = 1.8;
pub const DEFAULT_MIN_SEPARATION_MS: f64 = 50.0;

pub const PEAK_FFT_SIZE: usize = 8192;
/// Heuristic vocal formant band in Hz.
pub const FORMANT_RANGE: (f64, f64) = (300.0, 5000.0);

/// One-pole follower over `|x|`: `y[n] = s*y[n-1] + (1-s)*|x[n]|`.
pub fn track_level(samples: &[f32], smoothing: f32) -> Vec<f32> {
    let mut level = 0.0f32;
    samples
        .iter()
        .map(|&x| {
            level = smoothing * level + (1.0 - smoothing) * x.abs();
            level
        })
        .collect()
}

/// [`track_level`] normalized to the channel peak (unchanged when silent).
pub fn follow_envelope(samples: &[f32], smoothing: f32) -> Vec<f32> {
    let mut env = track_level(samples, smoothing);
    let peak = env.iter().fold(0.0f32, |acc, &v| acc.max(v));
    if peak > 0.0 {
        for v in env.iter_mut() {
            *v /= peak;
        }
    }
    env
}

/// Per-channel normalized amplitude envelope with the buffer's shape.
pub fn envelope(buffer: &PcmBuffer, smoothing: f32) -> PcmBuffer {
    let channels = buffer
        .channels()
        .iter()
        .map(|ch| follow_envelope(ch, smoothing))
        .collect();
    PcmBuffer::from_aligned(channels, buffer.sample_rate())
}

/// Onset frames in channel 0, bracketed by the sentinels `0` and `len`.
///
/// A chunk is an onset when its RMS exceeds the previous chunk's RMS times
/// `threshold` and it starts at least `min_separation_ms` after the last
/// accepted entry.
pub fn transients(buffer: &PcmBuffer, threshold: f32, min_separation_ms: f64) -> Vec<usize> {
    let samples = buffer.channel_or_last(0);
    let min_gap = (min_separation_ms / 1000.0 * buffer.sample_rate() as f64) as usize;

    let energies: Vec<f32> = samples
        .chunks(TRANSIENT_CHUNK)
        .map(|chunk| (chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32).sqrt())
        .collect();

    let mut found = vec![0usize];
    for (i, pair) in energies.windows(2).enumerate() {
        let frame = (i + 1) * TRANSIENT_CHUNK;
        let last = found.last().copied().unwrap_or(0);
        if pair[1] > pair[0] * threshold && frame - last >= min_gap {
            found.push(frame);
        }
    }

    let end = samples.len();
    if found.last() != Some(&end) {
        found.push(end);
    }
    found
}

/// Frequencies (Hz) of the strongest local maxima in channel 0's spectrum.
///
/// The first `fft_size` frames (zero-padded) are transformed without a
/// window. Only bins whose frequency falls in `range` are considered; the
/// result is sorted by descending magnitude and truncated to `count`.
/// An empty list means the source carries no usable peak.
pub fn peaks(
    buffer: &PcmBuffer,
    count: usize,
    fft: &FftCache,
    fft_size: usize,
    range: Option<(f64, f64)>,
) -> TransformResult<Vec<f64>> {
    let mut real = vec![0.0f32; fft_size];
    let mut imag = vec![0.0f32; fft_size];
    let samples = buffer.channel_or_last(0);
    let take = samples.len().min(fft_size);
    real[..take].copy_from_slice(&samples[..take]);

    fft.fft(&mut real, &mut imag, false)?;

    let half = fft_size / 2;
    let mags: Vec<f32> = real[..half]
        .iter()
        .zip(&imag[..half])
        .map(|(r, i)| r.hypot(*i))
        .collect();

    let bin_hz = buffer.sample_rate() as f64 / fft_size as f64;
    let (lo, hi) = range.unwrap_or((0.0, buffer.sample_rate() as f64 / 2.0));

    let mut found: Vec<(f32, f64)> = (1..half.saturating_sub(1))
        .filter(|&i| {
            let hz = i as f64 * bin_hz;
            hz >= lo && hz <= hi && mags[i] > mags[i - 1] && mags[i] > mags[i + 1]
        })
        .map(|i| (mags[i], i as f64 * bin_hz))
        .collect();

    found.sort_by(|a, b| b.0.total_cmp(&a.0));
    Ok(found.into_iter().take(count).map(|(_, hz)| hz).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use std::f64::consts::PI;

    fn tone(freqs: &[(f64, f32)], sample_rate: u32, len: usize) -> PcmBuffer {
        let samples = (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                freqs
                    .iter()
                    .map(|&(f, a)| a * (2.0 * PI * f * t).sin() as f32)
                    .sum()
            })
            .collect();
        PcmBuffer::mono(samples, sample_rate)
    }

    #[test]
    fn envelope_is_bounded() {
        let mut rng = Pcg32::seed_from_u64(3);
        let left: Vec<f32> = (0..5000).map(|_| rng.gen_range(-2.0..2.0)).collect();
        let right: Vec<f32> = (0..5000).map(|_| rng.gen_range(-0.1..0.1)).collect();
        let buf = PcmBuffer::new(vec![left, right], 44100).unwrap();
        for s in [SMOOTHING_DEFAULT, SMOOTHING_GATE, SMOOTHING_FAST, 0.5] {
            let env = envelope(&buf, s);
            assert_eq!(env.num_channels(), 2);
            assert_eq!(env.len(), 5000);
            for ch in env.channels() {
                assert!(ch.iter().all(|&v| (0.0..=1.0).contains(&v)));
                assert_eq!(ch.iter().fold(0.0f32, |a, &v| a.max(v)), 1.0);
            }
        }
    }

    #[test]
    fn envelope_of_silence_stays_zero() {
        let env = envelope(&PcmBuffer::silent(2, 1000, 44100), SMOOTHING_DEFAULT);
        assert!(env.channels().iter().flatten().all(|&v| v == 0.0));
    }

    #[test]
    fn envelope_tracks_decay() {
        let len = 44100;
        let samples: Vec<f32> = (0..len).map(|i| 1.0 - i as f32 / len as f32).collect();
        let env = follow_envelope(&samples, SMOOTHING_DEFAULT);
        assert!(env[2000] > env[20000]);
        assert!(env[20000] > env[40000]);
    }

    fn impulse_train(sample_rate: u32, len: usize, every: usize) -> PcmBuffer {
        let mut samples = vec![0.0f32; len];
        let mut pos = every;
        while pos < len {
            for k in 0..64 {
                if pos + k < len {
                    samples[pos + k] = 0.9 * (1.0 - k as f32 / 64.0);
                }
            }
            pos += every;
        }
        PcmBuffer::mono(samples, sample_rate)
    }

    #[test]
    fn transients_follow_impulses() {
        let sample_rate = 44100;
        let every = 11025;
        let len = 44100 * 2 + 6000;
        let buf = impulse_train(sample_rate, len, every);
        let found = transients(&buf, DEFAULT_TRANSIENT_THRESHOLD, DEFAULT_MIN_SEPARATION_MS);

        assert_eq!(found.first(), Some(&0));
        assert_eq!(found.last(), Some(&len));

        let impulses: Vec<usize> = (1..).map(|k| k * every).take_while(|&p| p < len).collect();
        let inner = &found[1..found.len() - 1];
        assert_eq!(inner.len(), impulses.len());
        for (onset, impulse) in inner.iter().zip(&impulses) {
            assert!(
                impulse.abs_diff(*onset) < TRANSIENT_CHUNK,
                "onset {onset} not near impulse {impulse}"
            );
        }

        let min_gap = (DEFAULT_MIN_SEPARATION_MS / 1000.0 * sample_rate as f64) as usize;
        for w in found.windows(2) {
            assert!(w[1] > w[0]);
            assert!(w[1] - w[0] >= min_gap, "entries {} and {} too close", w[0], w[1]);
        }
    }

    #[test]
    fn transients_respect_separation() {
        // Impulses 20ms apart collapse to at most one per 50ms.
        let buf = impulse_train(44100, 44100, 882);
        let found = transients(&buf, 1.1, 50.0);
        let min_gap = (0.05 * 44100.0) as usize;
        for w in found[..found.len() - 1].windows(2) {
            assert!(w[1] - w[0] >= min_gap);
        }
    }

    #[test]
    fn transients_of_empty_buffer() {
        let found = transients(&PcmBuffer::mono(Vec::new(), 44100), 1.8, 50.0);
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn transients_of_silence_are_sentinels() {
        let found = transients(&PcmBuffer::silent(1, 10_000, 44100), 1.8, 50.0);
        assert_eq!(found, vec![0, 10_000]);
    }

    #[test]
    fn peaks_find_strongest_partials() {
        let fft = FftCache::new();
        let buf = tone(&[(440.0, 1.0), (1320.0, 0.5), (2200.0, 0.25)], 44100, 8192);
        let found = peaks(&buf, 3, &fft, PEAK_FFT_SIZE, None).unwrap();
        assert_eq!(found.len(), 3);
        let bin = 44100.0 / PEAK_FFT_SIZE as f64;
        for (hz, expected) in found.iter().zip([440.0, 1320.0, 2200.0]) {
            assert!((hz - expected).abs() <= bin, "peak {hz} not near {expected}");
        }
    }

    #[test]
    fn peaks_respect_range() {
        let fft = FftCache::new();
        let buf = tone(&[(150.0, 1.0), (800.0, 0.3)], 44100, 8192);
        let found = peaks(&buf, 1, &fft, PEAK_FFT_SIZE, Some(FORMANT_RANGE)).unwrap();
        assert_eq!(found.len(), 1);
        assert!((found[0] - 800.0).abs() <= 44100.0 / PEAK_FFT_SIZE as f64);
    }

    #[test]
    fn peaks_of_silence_are_empty() {
        let fft = FftCache::new();
        let found = peaks(&PcmBuffer::silent(1, 4096, 44100), 12, &fft, PEAK_FFT_SIZE, None).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn peaks_reject_bad_fft_size() {
        let fft = FftCache::new();
        let buf = tone(&[(440.0, 1.0)], 44100, 1000);
        assert!(peaks(&buf, 4, &fft, 300, None).is_err());
    }
}
