//! Error types for the transformation engine.

use thiserror::Error;

/// Result type for engine operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors surfaced by the engine.
///
/// Hard errors (`InvalidSize`, `UnsupportedTransformation`, `RenderFailure`)
/// stop a transformation. `InsufficientFeature` is soft: operators absorb it
/// and pass the target through unchanged, so it only ever reaches a log line.
#[derive(Debug, Error)]
pub enum TransformError {
    /// FFT requested with a zero or non-power-of-two size.
    #[error("invalid FFT size {size}: must be a positive power of two")]
    InvalidSize { size: usize },

    /// Operator name not recognized (including nested morph references).
    #[error("unsupported transformation '{name}'")]
    UnsupportedTransformation { name: String },

    /// A feature extractor found nothing usable in the source.
    #[error("no usable {feature} found in source")]
    InsufficientFeature { feature: String },

    /// An offline render stage could not produce a buffer.
    #[error("render failed: {message}")]
    RenderFailure { message: String },

    /// Channel arrays of one buffer have different lengths.
    #[error("channel {channel} has {found} frames, expected {expected}")]
    ChannelMismatch {
        channel: usize,
        expected: usize,
        found: usize,
    },

    /// Parameter mapping could not be parsed.
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] serde_json::Error),

    /// WAV container could not be read or written.
    #[cfg(feature = "wav")]
    #[error("WAV I/O error: {0}")]
    Wav(#[from] hound::Error),
}

impl TransformError {
    /// Creates an unsupported transformation error.
    pub fn unsupported(name: impl Into<String>) -> Self {
        Self::UnsupportedTransformation { name: name.into() }
    }

    /// Creates a soft "nothing found" error.
    pub fn insufficient(feature: impl Into<String>) -> Self {
        Self::InsufficientFeature {
            feature: feature.into(),
        }
    }

    /// Creates a render failure error.
    pub fn render_failure(message: impl Into<String>) -> Self {
        Self::RenderFailure {
            message: message.into(),
        }
    }
}
