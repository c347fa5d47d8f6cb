//! Color and result records
//!
//! The arithmetic under test, kept byte-for-byte faithful to the original
//! reproducer: a color triple is computed in `f64` from the index pair and
//! narrowed to `f32` at construction, then a result triple widens two of the
//! components back to `f64` in swapped order. The narrow-then-widen path is
//! one of the three documented sensitivity points (the others are the
//! out-of-line helper call and the in-loop print placement, both in
//! [`crate::probe`]).

use crate::diag::full_precision;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multiplier for the second color component (`c1 = C1_COEFF * i + j`).
pub const C1_COEFF: f64 = 200_000.000_2;

/// Multiplier for the third color component (`c2 = C2_COEFF * i + j`).
pub const C2_COEFF: f64 = 300_000.000_3;

/// The fixed byte the auxiliary-sequence helper appends.
pub const FEATURE_BYTE: u8 = 123;

/// Color triple produced per index pair; the `f32` side of the probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRecord {
    /// Components in order: always-zero, `C1_COEFF * i + j`, `C2_COEFF * i + j`,
    /// each evaluated in `f64` and narrowed to `f32` here.
    pub components: [f32; 3],
}

impl ColorRecord {
    /// Compute the color for outer index `i` and inner index `j`.
    ///
    /// Pure: identical inputs give bit-identical outputs, which is exactly
    /// what the prober verifies across the sequential and parallel passes.
    #[must_use]
    pub fn from_indices(outer: usize, inner: usize) -> Self {
        let i = outer as f64;
        let j = inner as f64;
        Self {
            components: [0.0, (C1_COEFF * i + j) as f32, (C2_COEFF * i + j) as f32],
        }
    }
}

impl fmt::Display for ColorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [c0, c1, c2] = self.components;
        write!(
            f,
            "{},{},{}",
            full_precision(f64::from(c0)),
            full_precision(f64::from(c1)),
            full_precision(f64::from(c2))
        )
    }
}

/// Result triple derived from a color; the `f64` side of the probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Components in order: widened `c2`, widened `c1`, always-zero.
    pub components: [f64; 3],
}

impl ResultRecord {
    /// Derive the result from a color: `[widen(c2), widen(c1), 0.0]`.
    #[must_use]
    pub fn from_color(color: &ColorRecord) -> Self {
        Self {
            components: [
                f64::from(color.components[2]),
                f64::from(color.components[1]),
                0.0,
            ],
        }
    }

    /// Raw IEEE-754 bit patterns, for exact comparison.
    #[must_use]
    pub fn bits(&self) -> [u64; 3] {
        self.components.map(f64::to_bits)
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r0, r1, r2] = self.components;
        write!(
            f,
            "{},{},{}",
            full_precision(r0),
            full_precision(r1),
            full_precision(r2)
        )
    }
}
