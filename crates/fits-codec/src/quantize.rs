//! Quantum scale and the affine mapping from raw samples into it.

use tracing::warn;

use crate::error::{Error, Result};
use crate::image::Pixel;

/// One channel value of a decoded pixel.
pub type Quantum = u16;

/// Bits per [`Quantum`].
pub const QUANTUM_DEPTH: u32 = 16;

/// Largest [`Quantum`] value, as a float.
pub const QUANTUM_RANGE: f64 = Quantum::MAX as f64;

/// Largest unsigned integer representable at `depth` bits.
pub const fn max_at_depth(depth: u32) -> u64 {
    if depth >= 64 {
        u64::MAX
    } else {
        (1u64 << depth) - 1
    }
}

/// Numeric maximum of a sample at `depth` bits (`2^depth - 1`).
pub fn quantum_range(depth: u32) -> f64 {
    max_at_depth(depth) as f64
}

/// Round and clamp a scaled value into the quantum range.
///
/// NaN maps to 0.
#[inline]
pub fn clamp_to_quantum(value: f64) -> Quantum {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    if value >= QUANTUM_RANGE {
        return Quantum::MAX;
    }
    (value + 0.5) as Quantum
}

/// Rescale a quantum to an unsigned integer at `depth` bits, rounding.
pub fn scale_quantum_to_depth(q: Quantum, depth: u32) -> u64 {
    let max = u128::from(max_at_depth(depth));
    let range = u128::from(Quantum::MAX);
    ((u128::from(q) * max + range / 2) / range) as u64
}

/// What to do when the data range collapses to a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateRange {
    /// Map every sample to the middle of the quantum range.
    #[default]
    MidGray,
    /// Refuse with [`Error::Domain`].
    Fail,
}

/// Minimum and maximum raw sample values used for normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRange {
    pub min: f64,
    pub max: f64,
}

/// Affine map from raw samples into the quantum range:
/// `QUANTUM_RANGE / (max - min) * (bscale * (raw - min) + bzero)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    bscale: f64,
    bzero: f64,
    min: f64,
    factor: f64,
    constant: Option<Quantum>,
}

impl Quantizer {
    pub fn new(bscale: f64, bzero: f64, range: DataRange, policy: DegenerateRange) -> Result<Self> {
        let span = range.max - range.min;
        if span == 0.0 || !span.is_finite() {
            match policy {
                DegenerateRange::Fail => {
                    return Err(Error::Domain {
                        min: range.min,
                        max: range.max,
                    })
                }
                DegenerateRange::MidGray => {
                    warn!(
                        min = range.min,
                        max = range.max,
                        "degenerate data range, mapping all samples to mid-gray"
                    );
                    return Ok(Quantizer {
                        bscale,
                        bzero,
                        min: range.min,
                        factor: 0.0,
                        constant: Some(Quantum::MAX / 2),
                    });
                }
            }
        }
        Ok(Quantizer {
            bscale,
            bzero,
            min: range.min,
            factor: QUANTUM_RANGE / span,
            constant: None,
        })
    }

    /// Map one raw sample.
    #[inline]
    pub fn map(&self, raw: f64) -> Quantum {
        if let Some(q) = self.constant {
            return q;
        }
        clamp_to_quantum(self.factor * (self.bscale * (raw - self.min) + self.bzero))
    }

    /// Map one raw sample to a gray pixel.
    #[inline]
    pub fn map_gray(&self, raw: f64) -> Pixel {
        Pixel::gray(self.map(raw))
    }
}
