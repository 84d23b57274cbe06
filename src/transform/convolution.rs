//! Convolution morphing: the source becomes an impulse response for the target.

use crate::dsp::buffer::PcmBuffer;
use crate::dsp::fft::FftCache;
use crate::error::TransformResult;

/// Leading frames below this amplitude on every channel are trimmed.
pub const SILENCE_THRESHOLD: f32 = 0.005;

/// Convolve each target channel with the matching source channel.
///
/// The impulse response is scaled to unit energy. The full linear
/// convolution (`source + target - 1` frames) is computed through the FFT,
/// then leading near-silence is trimmed. A result with no frame above the
/// threshold is returned untrimmed.
pub fn convolution_morphing(
    source: &PcmBuffer,
    target: &PcmBuffer,
    fft: &FftCache,
) -> TransformResult<PcmBuffer> {
    if source.is_empty() || target.is_empty() {
        return Ok(PcmBuffer::silent(target.num_channels(), 0, target.sample_rate()));
    }

    let out_len = source.len() + target.len() - 1;
    let size = out_len.next_power_of_two();

    let mut channels = Vec::with_capacity(target.num_channels());
    for c in 0..target.num_channels() {
        let ir = source.channel_or_last(c);
        let energy = ir.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>().sqrt();
        let scale = if energy > 0.0 { (1.0 / energy) as f32 } else { 1.0 };

        let mut ir_re = vec![0.0f32; size];
        let mut ir_im = vec![0.0f32; size];
        for (slot, &s) in ir_re.iter_mut().zip(ir) {
            *slot = s * scale;
        }
        let mut x_re = vec![0.0f32; size];
        let mut x_im = vec![0.0f32; size];
        x_re[..target.len()].copy_from_slice(target.channel(c));

        fft.fft(&mut ir_re, &mut ir_im, false)?;
        fft.fft(&mut x_re, &mut x_im, false)?;
        for k in 0..size {
            let (a, b) = (x_re[k], x_im[k]);
            let (c2, d) = (ir_re[k], ir_im[k]);
            x_re[k] = a * c2 - b * d;
            x_im[k] = a * d + b * c2;
        }
        fft.fft(&mut x_re, &mut x_im, true)?;

        x_re.truncate(out_len);
        channels.push(x_re);
    }

    let start = audible_start(&channels, out_len);
    if start > 0 {
        for ch in channels.iter_mut() {
            ch.drain(..start);
        }
    }

    Ok(PcmBuffer::from_aligned(channels, target.sample_rate()))
}

/// First frame where any channel reaches `SILENCE_THRESHOLD`, or 0 when none does.
fn audible_start(channels: &[Vec<f32>], len: usize) -> usize {
    (0..len)
        .find(|&i| channels.iter().any(|ch| ch[i].abs() >= SILENCE_THRESHOLD))
        .unwrap_or(0)
}
