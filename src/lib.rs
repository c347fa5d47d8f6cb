//! # Comprobar
//!
//! Serial-vs-parallel floating-point discrepancy prober.
//!
//! Comprobar (Spanish: "to verify, to check") runs one deliberately mundane
//! computation twice — a plain sequential loop and a rayon data-parallel
//! loop with one task per outer index — and compares the two result
//! collections bit for bit. The loop body reproduces a reported
//! compiler/runtime anomaly scenario: a color triple computed in `f64`,
//! narrowed to `f32`, widened back to `f64` in swapped order, with an
//! out-of-line helper call and a toggleable in-loop print. Under strict
//! IEEE-754 semantics the passes must agree; comprobar measures instead of
//! assuming, and reports whatever it saw.
//!
//! ## Features
//!
//! - **Bit-exact comparison**: `to_bits` equality, no epsilon anywhere
//! - **Full-precision diagnostics**: every triple rendered at 17
//!   significant digits so a one-ulp divergence is visible in the text
//! - **Faithful scheduling**: one rayon task per outer index
//!   (`with_max_len(1)`), disjoint row writes, optional dedicated pool
//! - **Container leg**: a second pass pair routes values through a
//!   generated-code-style message type before collection
//!
//! ## Example
//!
//! ```rust
//! use comprobar::{run_comparison, DiagnosticSink, ProbeConfig};
//!
//! let sink = DiagnosticSink::capture();
//! let report = run_comparison(&ProbeConfig::default(), &sink).unwrap();
//!
//! assert_eq!(report.verdict_line(), "BUG? no");
//! assert!(sink.captured().unwrap().contains("results sequential==parallel? = true"));
//! ```
//!
//! ## Verdict contract
//!
//! The binary prints a final `BUG? YES` / `BUG? no` line and exits 0 either
//! way; a discrepancy is a finding, not a failure. The only fatal condition
//! is the auxiliary sequence breaking its one-element contract inside a
//! parallel task (exit 1, no cleanup).

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Clippy allows (MUST come after deny/warn to override them)
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // usize -> f64 index promotion is the probed expression
#![allow(clippy::cast_possible_truncation)] // f64 -> f32 narrowing is the probed expression
#![allow(clippy::must_use_candidate)] // Not all methods need #[must_use]
#![allow(clippy::uninlined_format_args)] // Prefer explicit format args
#![allow(clippy::missing_panics_doc)] // Allow missing Panics doc sections
#![allow(clippy::float_cmp)] // Exact float comparison is the point here
#![allow(clippy::doc_markdown)] // Allow technical terms without backticks

/// Diagnostic sink and 17-significant-digit rendering
pub mod diag;
/// Error types for configuration, threading, and report export
pub mod error;
/// Passes, bitwise comparison, and the run report
pub mod probe;
/// Color/result records and the narrowing arithmetic under test
pub mod record;
/// Serialization-container variant of the probe
pub mod wire;

pub use diag::{full_precision, DiagnosticSink};
pub use error::{ComprobarError, Result};
pub use probe::{
    compare_collections, parallel_pass, push_one_feature, run_comparison, sequential_pass,
    ComparisonReport, Mismatch, ProbeConfig, ResultCollection, DEFAULT_OUTER_LEN,
    POPULATED_START,
};
pub use record::{ColorRecord, ResultRecord, C1_COEFF, C2_COEFF, FEATURE_BYTE};
pub use wire::{run_wire_comparison, ColorMessage, KeypointMessage, WireReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
