pub mod dsp;
pub mod error;
#[cfg(feature = "wav")]
pub mod io;
pub mod transform;

pub use crate::dsp::buffer::PcmBuffer;
pub use crate::dsp::fft::FftCache;
pub use crate::error::{TransformError, TransformResult};
pub use crate::transform::{TransformEngine, TransformParams, Transformation};

use serde::Serialize;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the engine version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// One entry of [`list_transformations`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [&'static str],
}

impl From<Transformation> for TransformationInfo {
    fn from(kind: Transformation) -> Self {
        TransformationInfo {
            name: kind.name(),
            display_name: kind.display_name(),
            description: kind.description(),
            parameters: kind.parameter_keys(),
        }
    }
}

/// Interleaved result handed back across the WASM boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterleavedOutput {
    pub channels: usize,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

/// Every operator with its display metadata and the keys it reads.
pub fn transformation_infos() -> Vec<TransformationInfo> {
    Transformation::ALL.into_iter().map(TransformationInfo::from).collect()
}

/// Run the named operator on interleaved buffers that share `sample_rate`.
///
/// Parameters are clamped into their catalog ranges first.
#[allow(clippy::too_many_arguments)]
pub fn transform_interleaved_with(
    engine: &TransformEngine,
    name: &str,
    source: &[f32],
    source_channels: usize,
    target: &[f32],
    target_channels: usize,
    sample_rate: u32,
    params: &TransformParams,
) -> TransformResult<InterleavedOutput> {
    let source = PcmBuffer::from_interleaved(source, source_channels, sample_rate);
    let target = PcmBuffer::from_interleaved(target, target_channels, sample_rate);
    let result = engine.apply_named(name, &source, &target, &params.clamped())?;
    Ok(InterleavedOutput {
        channels: result.num_channels(),
        sample_rate: result.sample_rate(),
        samples: result.to_interleaved(),
    })
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: list the operators as `{ name, displayName, description, parameters }`.
#[wasm_bindgen]
pub fn list_transformations() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&transformation_infos()).map_err(js_error)
}

/// WASM-exposed: the parameter catalog as `{ key, min, max, step, default }` entries.
#[wasm_bindgen]
pub fn parameter_catalog() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&transform::PARAMETERS).map_err(js_error)
}

/// WASM-exposed: run a transformation on interleaved f32 audio.
///
/// `params` is a sparse object of catalog keys (`undefined` or `null` for all
/// defaults). Returns `{ channels, sampleRate, samples }`.
#[wasm_bindgen]
pub fn transform_interleaved(
    name: &str,
    source: &[f32],
    source_channels: usize,
    target: &[f32],
    target_channels: usize,
    sample_rate: u32,
    params: JsValue,
) -> Result<JsValue, JsValue> {
    let params: TransformParams = if params.is_undefined() || params.is_null() {
        TransformParams::default()
    } else {
        serde_wasm_bindgen::from_value(params).map_err(js_error)?
    };
    let output = transform_interleaved_with(
        &TransformEngine::new(),
        name,
        source,
        source_channels,
        target,
        target_channels,
        sample_rate,
        &params,
    )
    .map_err(js_error)?;
    serde_wasm_bindgen::to_value(&output).map_err(js_error)
}
