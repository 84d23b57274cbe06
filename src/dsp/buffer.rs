//! PCM buffer: decoded multi-channel audio handed between engine stages.

use serde::{Deserialize, Serialize};

use crate::error::{TransformError, TransformResult};

/// Per-channel f32 samples plus a sample rate.
///
/// Every channel holds the same number of frames. Operators take buffers by
/// reference and always allocate a new one for their result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPcmBuffer")]
pub struct PcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

/// Unvalidated wire form; deserialization goes through [`PcmBuffer::new`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl TryFrom<RawPcmBuffer> for PcmBuffer {
    type Error = TransformError;

    fn try_from(raw: RawPcmBuffer) -> Result<Self, Self::Error> {
        PcmBuffer::new(raw.channels, raw.sample_rate)
    }
}

impl PcmBuffer {
    /// Build a buffer, rejecting channels of unequal length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> TransformResult<Self> {
        if let Some(first) = channels.first() {
            let expected = first.len();
            if let Some((channel, ch)) = channels
                .iter()
                .enumerate()
                .find(|(_, ch)| ch.len() != expected)
            {
                return Err(TransformError::ChannelMismatch {
                    channel,
                    expected,
                    found: ch.len(),
                });
            }
        }
        Ok(PcmBuffer {
            channels,
            sample_rate,
        })
    }

    /// Single-channel buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        PcmBuffer {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// All-zero buffer of the given shape.
    pub fn silent(num_channels: usize, len: usize, sample_rate: u32) -> Self {
        PcmBuffer {
            channels: vec![vec![0.0; len]; num_channels],
            sample_rate,
        }
    }

    /// Build from equal-length channels the caller already produced.
    ///
    /// Crate-internal: operators construct their outputs frame-aligned.
    pub(crate) fn from_aligned(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(channels.windows(2).all(|w| w[0].len() == w[1].len()));
        PcmBuffer {
            channels,
            sample_rate,
        }
    }

    /// De-interleave `samples` into `num_channels` channels.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], num_channels: usize, sample_rate: u32) -> Self {
        if num_channels == 0 {
            return PcmBuffer {
                channels: Vec::new(),
                sample_rate,
            };
        }
        let frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        PcmBuffer {
            channels,
            sample_rate,
        }
    }

    /// Interleave all channels frame by frame.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len() * self.num_channels());
        for i in 0..self.len() {
            for ch in &self.channels {
                out.push(ch[i]);
            }
        }
        out
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Frame count (samples per channel).
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Channel `index`, or the last channel when the buffer has fewer.
    ///
    /// Returns an empty slice for a buffer with no channels.
    pub fn channel_or_last(&self, index: usize) -> &[f32] {
        match self.channels.len() {
            0 => &[],
            n => &self.channels[index.min(n - 1)],
        }
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter())
            .fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unequal_channels() {
        let err = PcmBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100).unwrap_err();
        match err {
            TransformError::ChannelMismatch {
                channel,
                expected,
                found,
            } => {
                assert_eq!(channel, 1);
                assert_eq!(expected, 4);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn deserialize_validates_channel_lengths() {
        let ragged = serde_json::from_str::<PcmBuffer>(
            r#"{"channels":[[0.1,0.2,0.3],[0.1]],"sampleRate":8000}"#,
        );
        let err = ragged.unwrap_err().to_string();
        assert!(err.contains("channel 1 has 1 frames, expected 3"), "{err}");

        let buf: PcmBuffer =
            serde_json::from_str(r#"{"channels":[[0.5,0.25],[0.0,-1.0]],"sampleRate":8000}"#).unwrap();
        assert_eq!(buf, PcmBuffer::new(vec![vec![0.5, 0.25], vec![0.0, -1.0]], 8000).unwrap());
    }

    #[test]
    fn interleave_roundtrip_preserves_frames() {
        let buf = PcmBuffer::new(vec![vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]], 48000)
            .unwrap();
        let inter = buf.to_interleaved();
        assert_eq!(inter, vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
        assert_eq!(PcmBuffer::from_interleaved(&inter, 2, 48000), buf);
    }

    #[test]
    fn partial_frame_is_dropped() {
        let buf = PcmBuffer::from_interleaved(&[0.1, 0.2, 0.3], 2, 44100);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.channel(1), &[0.2]);
    }

    #[test]
    fn channel_or_last_falls_back() {
        let buf = PcmBuffer::mono(vec![0.5; 8], 44100);
        assert_eq!(buf.channel_or_last(3), buf.channel(0));
        let none = PcmBuffer::new(Vec::new(), 44100).unwrap();
        assert!(none.channel_or_last(0).is_empty());
        assert!(none.is_empty());
    }

    #[test]
    fn duration_and_peak() {
        let buf = PcmBuffer::mono(vec![0.25, -0.75, 0.5, 0.0], 4);
        assert!((buf.duration_secs() - 1.0).abs() < 1e-12);
        assert_eq!(buf.peak(), 0.75);
        assert_eq!(PcmBuffer::silent(2, 10, 0).duration_secs(), 0.0);
    }
}
