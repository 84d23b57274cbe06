//! Transformation operators and the engine that dispatches to them.
//!
//! Every operator takes a source and a target [`PcmBuffer`] plus the shared
//! [`TransformParams`] record, and returns a new buffer. Operators never
//! mutate their inputs. The only state shared between calls is the FFT table
//! cache owned by [`TransformEngine`].

pub mod amplitude;
pub mod convolution;
pub mod echoes;
pub mod morph;
pub mod params;
pub mod resonance;
pub mod ring_mod;
pub mod spectral;
pub mod surface;
pub mod warping;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dsp::buffer::PcmBuffer;
use crate::dsp::fft::FftCache;
use crate::error::{TransformError, TransformResult};

pub use params::{param_spec, ParamSpec, TransformParams, PARAMETERS};

/// The available operators, named as hosts refer to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transformation {
    AmplitudeMapping,
    RhythmicGating,
    SpectralShaping,
    ConvolutionMorphing,
    TimeScaleWarping,
    SurfaceTranslation,
    FourierMasking,
    HarmonicImprinting,
    InterferenceEchoes,
    FormantShifting,
    DynamicRingModulation,
    TransformationMorph,
}

impl Transformation {
    pub const ALL: [Transformation; 12] = [
        Transformation::AmplitudeMapping,
        Transformation::RhythmicGating,
        Transformation::SpectralShaping,
        Transformation::ConvolutionMorphing,
        Transformation::TimeScaleWarping,
        Transformation::SurfaceTranslation,
        Transformation::FourierMasking,
        Transformation::HarmonicImprinting,
        Transformation::InterferenceEchoes,
        Transformation::FormantShifting,
        Transformation::DynamicRingModulation,
        Transformation::TransformationMorph,
    ];

    /// The camelCase name used in parameter maps and at the WASM boundary.
    pub fn name(self) -> &'static str {
        match self {
            Transformation::AmplitudeMapping => "amplitudeMapping",
            Transformation::RhythmicGating => "rhythmicGating",
            Transformation::SpectralShaping => "spectralShaping",
            Transformation::ConvolutionMorphing => "convolutionMorphing",
            Transformation::TimeScaleWarping => "timeScaleWarping",
            Transformation::SurfaceTranslation => "surfaceTranslation",
            Transformation::FourierMasking => "fourierMasking",
            Transformation::HarmonicImprinting => "harmonicImprinting",
            Transformation::InterferenceEchoes => "interferenceEchoes",
            Transformation::FormantShifting => "formantShifting",
            Transformation::DynamicRingModulation => "dynamicRingModulation",
            Transformation::TransformationMorph => "transformationMorph",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Transformation::AmplitudeMapping => "Amplitude Mapping",
            Transformation::RhythmicGating => "Rhythmic Gating",
            Transformation::SpectralShaping => "Spectral Shaping",
            Transformation::ConvolutionMorphing => "Convolution Morphing",
            Transformation::TimeScaleWarping => "Time Scale Warping",
            Transformation::SurfaceTranslation => "Surface Translation",
            Transformation::FourierMasking => "Fourier Masking",
            Transformation::HarmonicImprinting => "Harmonic Imprinting",
            Transformation::InterferenceEchoes => "Interference Echoes",
            Transformation::FormantShifting => "Formant Shifting",
            Transformation::DynamicRingModulation => "Dynamic Ring Modulation",
            Transformation::TransformationMorph => "Transformation Morph",
        }
    }

    /// One-line summary for operator pickers.
    pub fn description(self) -> &'static str {
        match self {
            Transformation::AmplitudeMapping => "Shapes the target's loudness with the source's envelope",
            Transformation::RhythmicGating => "Opens the target only where the source is loud",
            Transformation::SpectralShaping => "16-band vocoder: source band levels drive target bands",
            Transformation::ConvolutionMorphing => "Uses the source as an impulse response for the target",
            Transformation::TimeScaleWarping => "Re-times target segments onto the source's onsets",
            Transformation::SurfaceTranslation => "Reads the target's amplitude distribution through the source waveform",
            Transformation::FourierMasking => "Source magnitudes resynthesized at the target's phases",
            Transformation::HarmonicImprinting => "Resonates the target at the source's strongest partials",
            Transformation::InterferenceEchoes => "Echoes bursts of the target at each source onset",
            Transformation::FormantShifting => "Boosts the target at the source's formant peaks",
            Transformation::DynamicRingModulation => "Ring modulates the target at a frequency following the source",
            Transformation::TransformationMorph => "Blends the results of two other transformations",
        }
    }

    /// The catalog keys this operator reads.
    pub fn parameter_keys(self) -> &'static [&'static str] {
        match self {
            Transformation::AmplitudeMapping
            | Transformation::ConvolutionMorphing
            | Transformation::FourierMasking => &[],
            Transformation::RhythmicGating => &["gateThreshold"],
            Transformation::SpectralShaping => &["spectralMix"],
            Transformation::TimeScaleWarping => &["transientSensitivity"],
            Transformation::SurfaceTranslation => &["surfaceJitter"],
            Transformation::HarmonicImprinting => &["numHarmonics", "harmonicQ"],
            Transformation::InterferenceEchoes => &[
                "transientSensitivity",
                "interferenceFeedback",
                "interferenceMix",
            ],
            Transformation::FormantShifting => &["numFormants", "formantQ", "formantMix"],
            Transformation::DynamicRingModulation => &["ringModBaseFreq", "ringModRange", "ringModMix"],
            Transformation::TransformationMorph => &["morphPosition"],
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Transformation {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Transformation::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| TransformError::unsupported(s))
    }
}

/// Runs transformations against a shared FFT table cache.
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    fft: Arc<FftCache>,
}

impl TransformEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine sharing an existing cache, so several engines populate each
    /// FFT size once.
    pub fn with_cache(fft: Arc<FftCache>) -> Self {
        TransformEngine { fft }
    }

    pub fn fft(&self) -> &Arc<FftCache> {
        &self.fft
    }

    /// Run `kind` on `source` and `target`.
    ///
    /// Parameters are used as given; clamp them with
    /// [`TransformParams::clamped`] first if they come from a UI.
    pub fn apply(
        &self,
        kind: Transformation,
        source: &PcmBuffer,
        target: &PcmBuffer,
        params: &TransformParams,
    ) -> TransformResult<PcmBuffer> {
        log::debug!(
            "{kind}: source {}ch x {} @ {} Hz, target {}ch x {} @ {} Hz",
            source.num_channels(),
            source.len(),
            source.sample_rate(),
            target.num_channels(),
            target.len(),
            target.sample_rate()
        );

        let fft = self.fft.as_ref();
        let result = match kind {
            Transformation::AmplitudeMapping => amplitude::amplitude_mapping(source, target),
            Transformation::RhythmicGating => amplitude::rhythmic_gating(source, target, params),
            Transformation::SpectralShaping => spectral::spectral_shaping(source, target, params),
            Transformation::ConvolutionMorphing => convolution::convolution_morphing(source, target, fft)?,
            Transformation::TimeScaleWarping => match warping::time_scale_warping(source, target, params) {
                Some(warped) => warped,
                None => {
                    log::info!(
                        "{}; passing target through",
                        TransformError::insufficient("transient segments")
                    );
                    target.clone()
                }
            },
            Transformation::SurfaceTranslation => surface::surface_translation(source, target, params),
            Transformation::FourierMasking => spectral::fourier_masking(source, target, fft)?,
            Transformation::HarmonicImprinting => resonance::harmonic_imprinting(source, target, params, fft)?,
            Transformation::InterferenceEchoes => echoes::interference_echoes(source, target, params)?,
            Transformation::FormantShifting => resonance::formant_shifting(source, target, params, fft)?,
            Transformation::DynamicRingModulation => ring_mod::dynamic_ring_modulation(source, target, params),
            Transformation::TransformationMorph => morph::transformation_morph(self, source, target, params)?,
        };

        log::debug!("{kind}: produced {}ch x {}", result.num_channels(), result.len());
        Ok(result)
    }

    /// [`apply`](Self::apply) by operator name.
    pub fn apply_named(
        &self,
        name: &str,
        source: &PcmBuffer,
        target: &PcmBuffer,
        params: &TransformParams,
    ) -> TransformResult<PcmBuffer> {
        self.apply(name.parse()?, source, target, params)
    }
}
