//! Offline renderer: runs an ordered chain of stages over a fixed-length buffer.
//!
//! A render context has a fixed channel count, length and sample rate. The
//! input is placed at frame 0 (zero-padded or truncated to the render length),
//! the stages run over a wet copy in order, and an optional dry/wet crossfade
//! blends the result with the fitted input. Rendering runs to completion
//! before returning; zero-length contexts yield an empty buffer.

use std::ops::Range;

use crate::error::{TransformError, TransformResult};

use super::buffer::PcmBuffer;
use super::delay::FeedbackDelay;
use super::filter::{BiquadFilter, FilterSpec};
use super::mixer::crossfade;

/// Feedback delay parameters for a render stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelaySpec {
    /// Delay time in seconds.
    pub time: f64,
    pub feedback: f32,
    /// Lowpass cutoff inside the feedback loop.
    pub damping_hz: Option<f64>,
}

/// One processing step.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Biquad applied to every channel. Bypassed when its frequency is
    /// outside (0, Nyquist).
    Filter(FilterSpec),
    Gain(f32),
    /// Keep only the frames inside the given windows; silence elsewhere.
    Gate(Vec<Range<usize>>),
    FeedbackDelay(DelaySpec),
}

/// A fixed-shape offline rendering context.
#[derive(Debug, Clone)]
pub struct OfflineRenderer {
    num_channels: usize,
    length: usize,
    sample_rate: u32,
    stages: Vec<Stage>,
    wet_mix: Option<f32>,
}

impl OfflineRenderer {
    pub fn new(num_channels: usize, length: usize, sample_rate: u32) -> Self {
        OfflineRenderer {
            num_channels,
            length,
            sample_rate,
            stages: Vec::new(),
            wet_mix: None,
        }
    }

    /// Context shaped like `buffer`.
    pub fn for_buffer(buffer: &PcmBuffer) -> Self {
        Self::new(buffer.num_channels(), buffer.len(), buffer.sample_rate())
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn filter(self, spec: FilterSpec) -> Self {
        self.stage(Stage::Filter(spec))
    }

    pub fn gain(self, gain: f32) -> Self {
        self.stage(Stage::Gain(gain))
    }

    pub fn gate(self, windows: Vec<Range<usize>>) -> Self {
        self.stage(Stage::Gate(windows))
    }

    pub fn feedback_delay(self, spec: DelaySpec) -> Self {
        self.stage(Stage::FeedbackDelay(spec))
    }

    /// Blend the processed chain with the dry input: `dry*(1-mix) + wet*mix`.
    pub fn dry_wet(mut self, mix: f32) -> Self {
        self.wet_mix = Some(mix);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Render `input` through the chain.
    ///
    /// Fails only when a stage produced non-finite samples.
    pub fn render(&self, input: &PcmBuffer) -> TransformResult<PcmBuffer> {
        let sample_rate = self.sample_rate as f64;
        let mut channels = Vec::with_capacity(self.num_channels);

        for c in 0..self.num_channels {
            let src = input.channel_or_last(c);
            let mut dry = vec![0.0f32; self.length];
            let n = src.len().min(self.length);
            dry[..n].copy_from_slice(&src[..n]);

            let mut wet = dry.clone();
            for stage in &self.stages {
                apply_stage(stage, &mut wet, sample_rate);
            }

            let out = match self.wet_mix {
                Some(mix) => crossfade(&dry, &wet, mix),
                None => wet,
            };
            if let Some(i) = out.iter().position(|s| !s.is_finite()) {
                return Err(TransformError::render_failure(format!(
                    "non-finite sample at frame {i} of channel {c}"
                )));
            }
            channels.push(out);
        }

        Ok(PcmBuffer::from_aligned(channels, self.sample_rate))
    }
}

fn apply_stage(stage: &Stage, samples: &mut [f32], sample_rate: f64) {
    match stage {
        Stage::Filter(spec) => {
            if spec.in_band(sample_rate) {
                BiquadFilter::new(*spec, sample_rate).process_block(samples);
            }
        }
        Stage::Gain(g) => {
            for s in samples.iter_mut() {
                *s *= g;
            }
        }
        Stage::Gate(windows) => {
            let mut open = vec![false; samples.len()];
            for w in windows {
                let end = w.end.min(samples.len());
                if w.start < end {
                    open[w.start..end].fill(true);
                }
            }
            for (s, keep) in samples.iter_mut().zip(open) {
                if !keep {
                    *s = 0.0;
                }
            }
        }
        Stage::FeedbackDelay(spec) => {
            if sample_rate > 0.0 {
                FeedbackDelay::new(sample_rate, spec.time, spec.feedback, spec.damping_hz)
                    .process_block(samples);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> PcmBuffer {
        PcmBuffer::mono((0..len).map(|i| i as f32 / len as f32).collect(), 1000)
    }

    #[test]
    fn zero_length_renders_empty() {
        let out = OfflineRenderer::new(2, 0, 44100)
            .filter(FilterSpec::peaking(1000.0, 10.0, 15.0))
            .dry_wet(0.5)
            .render(&PcmBuffer::silent(2, 0, 44100))
            .unwrap();
        assert_eq!(out.num_channels(), 2);
        assert!(out.is_empty());
    }

    #[test]
    fn no_stages_is_identity() {
        let input = ramp(64);
        let out = OfflineRenderer::for_buffer(&input).render(&input).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn input_is_padded_to_render_length() {
        let input = ramp(4);
        let out = OfflineRenderer::new(2, 6, 1000).render(&input).unwrap();
        assert_eq!(out.num_channels(), 2);
        assert_eq!(out.channel(1), &[0.0, 0.25, 0.5, 0.75, 0.0, 0.0]);
    }

    #[test]
    fn gain_and_dry_wet() {
        let input = PcmBuffer::mono(vec![1.0; 4], 1000);
        let out = OfflineRenderer::for_buffer(&input)
            .gain(3.0)
            .dry_wet(0.25)
            .render(&input)
            .unwrap();
        assert!(out.channel(0).iter().all(|&s| (s - 1.5).abs() < 1e-6));
    }

    #[test]
    fn gate_silences_closed_frames() {
        let input = PcmBuffer::mono(vec![1.0; 10], 1000);
        let out = OfflineRenderer::for_buffer(&input)
            .gate(vec![2..4, 8..20])
            .render(&input)
            .unwrap();
        assert_eq!(
            out.channel(0),
            &[0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn filter_stage_matches_direct_biquad() {
        let input = PcmBuffer::mono((0..512).map(|i| ((i * 7) % 13) as f32 / 13.0).collect(), 44100);
        let spec = FilterSpec::peaking(2000.0, 4.0, 6.0);
        let out = OfflineRenderer::for_buffer(&input).filter(spec).render(&input).unwrap();

        let mut direct = input.channel(0).to_vec();
        BiquadFilter::new(spec, 44100.0).process_block(&mut direct);
        assert_eq!(out.channel(0), direct.as_slice());
    }

    #[test]
    fn out_of_band_filter_is_bypassed() {
        let input = ramp(32);
        let out = OfflineRenderer::for_buffer(&input)
            .filter(FilterSpec::peaking(900.0, 1.0, 12.0))
            .render(&input)
            .unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn delay_stage_echoes() {
        let mut samples = vec![0.0f32; 40];
        samples[0] = 1.0;
        let input = PcmBuffer::mono(samples, 100);
        let out = OfflineRenderer::for_buffer(&input)
            .feedback_delay(DelaySpec {
                time: 0.1,
                feedback: 0.5,
                damping_hz: None,
            })
            .render(&input)
            .unwrap();
        assert!((out.channel(0)[10] - 1.0).abs() < 1e-6);
        assert!((out.channel(0)[20] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn non_finite_output_is_a_render_failure() {
        let input = ramp(8);
        let err = OfflineRenderer::for_buffer(&input)
            .gain(f32::INFINITY)
            .render(&input)
            .unwrap_err();
        assert!(matches!(err, TransformError::RenderFailure { .. }));
    }
}
