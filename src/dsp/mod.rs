//! DSP building blocks: buffers, FFT, filters, delay, mixing, feature
//! extraction and the offline stage renderer.
//!
//! Everything here is host-independent and deterministic, so operator output
//! is reproducible bit for bit across native and WASM builds.

pub mod buffer;
pub mod delay;
pub mod features;
pub mod fft;
pub mod filter;
pub mod mixer;
pub mod renderer;
