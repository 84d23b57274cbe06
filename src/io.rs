//! WAV adapter: decode files into [`PcmBuffer`]s and encode results.
//!
//! Only compiled with the `wav` feature. The engine itself never touches files.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::dsp::buffer::PcmBuffer;
use crate::error::TransformResult;

/// Read a WAV file into per-channel f32 samples in [-1, 1].
///
/// Integer PCM of any bit depth is scaled by its full-scale value; float PCM
/// is taken as is.
pub fn read_wav(path: impl AsRef<Path>) -> TransformResult<PcmBuffer> {
    let reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
    };

    log::debug!(
        "read {} frames x {channels}ch @ {} Hz from {}",
        samples.len() / channels.max(1),
        spec.sample_rate,
        path.as_ref().display()
    );
    Ok(PcmBuffer::from_interleaved(&samples, channels, spec.sample_rate))
}

/// Write `buffer` as 32-bit float WAV.
pub fn write_wav(buffer: &PcmBuffer, path: impl AsRef<Path>) -> TransformResult<()> {
    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for s in buffer.to_interleaved() {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}
