//! FFT: iterative radix-2 Cooley-Tukey transform with per-size table cache.
//!
//! The cache is an explicitly owned object rather than a global. Engines share
//! it through an `Arc`; tables are computed once per size and never mutated.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, RwLock};

use crate::error::{TransformError, TransformResult};

/// Precomputed tables for one transform size.
#[derive(Debug)]
pub struct FftTables {
    size: usize,
    bit_reverse: Vec<usize>,
    cos: Vec<f64>,
    sin: Vec<f64>,
}

impl FftTables {
    fn new(size: usize) -> Self {
        let bits = size.trailing_zeros();
        let bit_reverse = (0..size)
            .map(|i| if bits == 0 { 0 } else { i.reverse_bits() >> (usize::BITS - bits) })
            .collect();
        let (cos, sin) = (0..size)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / size as f64;
                (angle.cos(), angle.sin())
            })
            .unzip();
        FftTables {
            size,
            bit_reverse,
            cos,
            sin,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Size-keyed memo of FFT tables.
///
/// Lookup takes the read lock; a miss computes the tables outside any lock and
/// inserts with `or_insert`, so two racing callers may both compute but every
/// caller receives a complete table.
#[derive(Debug, Default)]
pub struct FftCache {
    tables: RwLock<HashMap<usize, Arc<FftTables>>>,
}

impl FftCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables for `size`, computing and caching them on first use.
    pub fn tables(&self, size: usize) -> TransformResult<Arc<FftTables>> {
        if size == 0 || !size.is_power_of_two() {
            return Err(TransformError::InvalidSize { size });
        }

        if let Ok(map) = self.tables.read() {
            if let Some(t) = map.get(&size) {
                return Ok(Arc::clone(t));
            }
        }

        let fresh = Arc::new(FftTables::new(size));
        match self.tables.write() {
            Ok(mut map) => Ok(Arc::clone(map.entry(size).or_insert(fresh))),
            // A poisoned lock only means another thread panicked mid-insert;
            // the freshly computed tables are still valid.
            Err(_) => Ok(fresh),
        }
    }

    /// Number of sizes currently cached.
    pub fn cached_sizes(&self) -> usize {
        self.tables.read().map_or(0, |m| m.len())
    }

    /// In-place transform of `real`/`imag`.
    ///
    /// Both slices must share a power-of-two length. The inverse transform
    /// divides every output by N.
    pub fn fft(&self, real: &mut [f32], imag: &mut [f32], inverse: bool) -> TransformResult<()> {
        let n = real.len();
        if imag.len() != n {
            return Err(TransformError::InvalidSize { size: imag.len() });
        }
        let tables = self.tables(n)?;

        for i in 0..n {
            let j = tables.bit_reverse[i];
            if j > i {
                real.swap(i, j);
                imag.swap(i, j);
            }
        }

        let sign = if inverse { 1.0 } else { -1.0 };
        let mut size = 2;
        while size <= n {
            let half = size / 2;
            let step = n / size;
            for start in (0..n).step_by(size) {
                for j in 0..half {
                    let k = j * step;
                    let wr = tables.cos[k];
                    let wi = sign * tables.sin[k];
                    let a = start + j;
                    let b = a + half;
                    let br = real[b] as f64;
                    let bi = imag[b] as f64;
                    let tr = br * wr - bi * wi;
                    let ti = br * wi + bi * wr;
                    let ar = real[a] as f64;
                    let ai = imag[a] as f64;
                    real[b] = (ar - tr) as f32;
                    imag[b] = (ai - ti) as f32;
                    real[a] = (ar + tr) as f32;
                    imag[a] = (ai + ti) as f32;
                }
            }
            size *= 2;
        }

        if inverse {
            let scale = 1.0 / n as f32;
            for (r, i) in real.iter_mut().zip(imag.iter_mut()) {
                *r *= scale;
                *i *= scale;
            }
        }
        Ok(())
    }
}

/// Periodic Hann window of length `size`.
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * PI * i as f64 / size as f64;
            (0.5 * (1.0 - phase.cos())) as f32
        })
        .collect()
}
