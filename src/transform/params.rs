//! Transformation parameters: one flat record with documented defaults.
//!
//! Hosts send a sparse mapping; missing keys take their defaults. Bounds are
//! declared in [`PARAMETERS`] and only enforced at the UI/WASM boundary via
//! [`TransformParams::clamped`].

use serde::{Deserialize, Serialize};

use crate::error::TransformResult;

/// Declared range and default for one parameter key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub key: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl ParamSpec {
    const fn new(key: &'static str, min: f64, max: f64, step: f64, default: f64) -> Self {
        ParamSpec {
            key,
            min,
            max,
            step,
            default,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// The parameter catalog.
pub const PARAMETERS: &[ParamSpec] = &[
    ParamSpec::new("gateThreshold", 0.01, 1.0, 0.01, 0.2),
    ParamSpec::new("spectralMix", 0.0, 1.0, 0.01, 1.0),
    ParamSpec::new("transientSensitivity", 1.1, 4.0, 0.1, 1.8),
    ParamSpec::new("surfaceJitter", 0.0, 1.0, 0.01, 0.0),
    ParamSpec::new("numHarmonics", 1.0, 20.0, 1.0, 12.0),
    ParamSpec::new("harmonicQ", 1.0, 100.0, 1.0, 30.0),
    ParamSpec::new("interferenceFeedback", 0.0, 0.95, 0.01, 0.5),
    ParamSpec::new("interferenceMix", 0.0, 1.0, 0.01, 0.5),
    ParamSpec::new("numFormants", 1.0, 8.0, 1.0, 4.0),
    ParamSpec::new("formantQ", 1.0, 50.0, 1.0, 20.0),
    ParamSpec::new("formantMix", 0.0, 1.0, 0.01, 0.7),
    ParamSpec::new("ringModBaseFreq", 20.0, 2000.0, 1.0, 100.0),
    ParamSpec::new("ringModRange", 0.0, 5000.0, 10.0, 1000.0),
    ParamSpec::new("ringModMix", 0.0, 1.0, 0.01, 0.5),
    ParamSpec::new("morphPosition", 0.0, 1.0, 0.01, 0.5),
];

/// Look up a catalog entry by key.
pub fn param_spec(key: &str) -> Option<&'static ParamSpec> {
    PARAMETERS.iter().find(|p| p.key == key)
}

/// Superset of every operator's parameters; each operator ignores the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformParams {
    pub gate_threshold: f32,
    pub spectral_mix: f32,
    pub transient_sensitivity: f32,
    pub surface_jitter: f32,
    pub num_harmonics: u32,
    pub harmonic_q: f64,
    pub interference_feedback: f32,
    pub interference_mix: f32,
    pub num_formants: u32,
    pub formant_q: f64,
    pub formant_mix: f32,
    pub ring_mod_base_freq: f64,
    pub ring_mod_range: f64,
    pub ring_mod_mix: f32,
    pub morph_position: f32,
    /// Operator blended in at `morphPosition = 0`.
    pub morph_first: String,
    /// Operator blended in at `morphPosition = 1`.
    pub morph_second: String,
    /// Seed for the surface jitter RNG; entropy-seeded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for TransformParams {
    fn default() -> Self {
        TransformParams {
            gate_threshold: 0.2,
            spectral_mix: 1.0,
            transient_sensitivity: 1.8,
            surface_jitter: 0.0,
            num_harmonics: 12,
            harmonic_q: 30.0,
            interference_feedback: 0.5,
            interference_mix: 0.5,
            num_formants: 4,
            formant_q: 20.0,
            formant_mix: 0.7,
            ring_mod_base_freq: 100.0,
            ring_mod_range: 1000.0,
            ring_mod_mix: 0.5,
            morph_position: 0.5,
            morph_first: "amplitudeMapping".to_string(),
            morph_second: "rhythmicGating".to_string(),
            seed: None,
        }
    }
}

impl TransformParams {
    /// Parse a sparse JSON object; absent keys keep their defaults.
    pub fn from_json(json: &str) -> TransformResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Copy with every catalog key clamped into its declared range.
    pub fn clamped(&self) -> Self {
        fn c32(key: &str, v: f32) -> f32 {
            param_spec(key).map_or(v, |p| p.clamp(v as f64) as f32)
        }
        fn c64(key: &str, v: f64) -> f64 {
            param_spec(key).map_or(v, |p| p.clamp(v))
        }
        fn cu32(key: &str, v: u32) -> u32 {
            param_spec(key).map_or(v, |p| p.clamp(v as f64) as u32)
        }

        TransformParams {
            gate_threshold: c32("gateThreshold", self.gate_threshold),
            spectral_mix: c32("spectralMix", self.spectral_mix),
            transient_sensitivity: c32("transientSensitivity", self.transient_sensitivity),
            surface_jitter: c32("surfaceJitter", self.surface_jitter),
            num_harmonics: cu32("numHarmonics", self.num_harmonics),
            harmonic_q: c64("harmonicQ", self.harmonic_q),
            interference_feedback: c32("interferenceFeedback", self.interference_feedback),
            interference_mix: c32("interferenceMix", self.interference_mix),
            num_formants: cu32("numFormants", self.num_formants),
            formant_q: c64("formantQ", self.formant_q),
            formant_mix: c32("formantMix", self.formant_mix),
            ring_mod_base_freq: c64("ringModBaseFreq", self.ring_mod_base_freq),
            ring_mod_range: c64("ringModRange", self.ring_mod_range),
            ring_mod_mix: c32("ringModMix", self.ring_mod_mix),
            morph_position: c32("morphPosition", self.morph_position),
            morph_first: self.morph_first.clone(),
            morph_second: self.morph_second.clone(),
            seed: self.seed,
        }
    }
}
