//! Discrepancy prober core
//!
//! Runs the same trivial computation twice — once with ordinary sequential
//! iteration, once as a rayon data-parallel iteration with one outer index
//! per task — and compares the two result collections bit for bit. The loop
//! body is deliberately mundane: build a one-element auxiliary byte
//! sequence through an out-of-line helper, compute a color triple, emit an
//! optional in-loop print, derive a result triple, store it. Any bitwise
//! divergence between the passes is the finding.
//!
//! Three details are load-bearing and must not be "cleaned up":
//!
//! - the helper call stays out of line ([`push_one_feature`]),
//! - each parallel task covers exactly one outer index (`with_max_len(1)`),
//! - the bare color print sits between color construction and result
//!   derivation, off in the sequential loop and on in the parallel loop.

use crate::diag::DiagnosticSink;
use crate::error::{ComprobarError, Result};
use crate::record::{ColorRecord, ResultRecord, FEATURE_BYTE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// First populated outer index; rows below this stay empty.
pub const POPULATED_START: usize = 1;

/// Default outer iteration bound (the original reproducer's `N`).
pub const DEFAULT_OUTER_LEN: usize = 2;

/// Nested result storage: outer index `i`, inner index `j`.
pub type ResultCollection = Vec<Vec<ResultRecord>>;

/// Configuration for one probe run.
///
/// The defaults reproduce the original scenario exactly: two outer indices
/// (one populated), no in-loop print in the sequential pass, in-loop print
/// enabled in the parallel pass, shared thread pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Outer iteration bound `N`; indices `[POPULATED_START, N)` are populated.
    pub outer_len: usize,
    /// Emit the bare `color = …` line inside the sequential loop.
    pub sequential_color_print: bool,
    /// Emit the bare `color = …` line inside the parallel loop.
    pub parallel_color_print: bool,
    /// Run the parallel pass in a dedicated pool of exactly this many
    /// threads; `None` uses the shared global pool.
    pub threads: Option<usize>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            outer_len: DEFAULT_OUTER_LEN,
            sequential_color_print: false,
            parallel_color_print: true,
            threads: None,
        }
    }
}

impl ProbeConfig {
    /// Default configuration with a custom outer bound.
    ///
    /// # Errors
    ///
    /// Returns [`ComprobarError::InvalidConfiguration`] when `outer_len` is
    /// zero; the populated range `[1, outer_len)` would be nonsense.
    pub fn with_outer_len(outer_len: usize) -> Result<Self> {
        if outer_len < 1 {
            return Err(ComprobarError::InvalidConfiguration {
                reason: format!("outer_len must be at least 1, got {outer_len}"),
            });
        }
        Ok(Self {
            outer_len,
            ..Self::default()
        })
    }

    /// Configuration from the environment, defaults where unset.
    ///
    /// `COMPROBAR_SEQUENTIAL_PRINT` and `COMPROBAR_PARALLEL_PRINT` accept
    /// `1`/`true`/`0`/`false` (case-insensitive); `COMPROBAR_THREADS`
    /// accepts a positive integer. Malformed values keep the default. Argv
    /// is never consulted.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(flag) = env_flag("COMPROBAR_SEQUENTIAL_PRINT") {
            config.sequential_color_print = flag;
        }
        if let Some(flag) = env_flag("COMPROBAR_PARALLEL_PRINT") {
            config.parallel_color_print = flag;
        }
        if let Ok(raw) = std::env::var("COMPROBAR_THREADS") {
            if let Ok(threads) = raw.trim().parse::<usize>() {
                if threads >= 1 {
                    config.threads = Some(threads);
                }
            }
        }
        config
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Append the single fixed feature byte to the sequence.
///
/// The probe is sensitive to this append happening behind a real call
/// boundary, so the function stays out of line.
#[inline(never)]
pub fn push_one_feature(features_out: &mut Vec<u8>) {
    features_out.push(FEATURE_BYTE);
}

/// Sequential reference pass.
///
/// Plain nested loops over `i` in `[POPULATED_START, outer_len)` and `j`
/// over the auxiliary sequence built fresh for each `i`.
pub fn sequential_pass(config: &ProbeConfig, sink: &DiagnosticSink) -> ResultCollection {
    let mut results: ResultCollection = vec![Vec::new(); config.outer_len];
    sink.blank();
    sink.line("Sequential pass:");
    for i in POPULATED_START..config.outer_len {
        let mut features = Vec::new();
        push_one_feature(&mut features);
        for j in 0..features.len() {
            let color = ColorRecord::from_indices(i, j);
            if config.sequential_color_print {
                sink.line(&format!("color = {color}"));
            }
            let result = ResultRecord::from_color(&color);
            results[i].push(result);
            sink.line(&format!("i = {i} ; color = {color} ; result = {result}"));
        }
    }
    results
}

/// Parallel pass: same loop body, one rayon task per outer index.
///
/// Rows are pre-sized and each task writes only its own row, so the
/// collection needs no locking; the call returns after every task has
/// finished. Inside each task the auxiliary sequence must hold exactly one
/// element; a violation is fatal (diagnostic line, then process exit 1,
/// no cleanup).
///
/// # Errors
///
/// Returns [`ComprobarError::ThreadPool`] when a dedicated pool was
/// requested via [`ProbeConfig::threads`] and could not be built.
pub fn parallel_pass(config: &ProbeConfig, sink: &DiagnosticSink) -> Result<ResultCollection> {
    let mut results: ResultCollection = vec![Vec::new(); config.outer_len];
    sink.blank();
    sink.line("Parallel pass:");
    in_configured_pool(config, || parallel_fill(config, sink, &mut results))?;
    Ok(results)
}

/// Run `body` inside the configured rayon pool: a dedicated fixed-size pool
/// when [`ProbeConfig::threads`] is set, the shared global pool otherwise.
pub(crate) fn in_configured_pool(config: &ProbeConfig, body: impl FnOnce() + Send) -> Result<()> {
    match config.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| ComprobarError::ThreadPool {
                    reason: e.to_string(),
                })?;
            pool.install(body);
        }
        None => body(),
    }
    Ok(())
}

fn parallel_fill(config: &ProbeConfig, sink: &DiagnosticSink, results: &mut ResultCollection) {
    use rayon::prelude::*;

    let Some(populated) = results.get_mut(POPULATED_START..) else {
        return;
    };
    populated
        .par_iter_mut()
        .with_max_len(1) // one outer index per task
        .enumerate()
        .for_each(|(offset, row)| {
            let i = POPULATED_START + offset;
            let mut features = Vec::new();
            push_one_feature(&mut features);
            parallel_task_guard(&features);
            for j in 0..features.len() {
                let color = ColorRecord::from_indices(i, j);
                if config.parallel_color_print {
                    sink.line(&format!("color = {color}"));
                }
                let result = ResultRecord::from_color(&color);
                row.push(result);
                sink.line(&format!("i = {i} ; color = {color} ; result = {result}"));
            }
        });
}

/// Validate the helper's contract inside a parallel task: the auxiliary
/// sequence must hold exactly one element. A violation is fatal.
pub(crate) fn parallel_task_guard(features: &[u8]) {
    if features.len() != 1 {
        abort_on_feature_count(features.len());
    }
}

/// The helper broke its contract inside a worker task. The pass cannot be
/// rewound, so terminate immediately without cleanup.
#[cold]
fn abort_on_feature_count(len: usize) -> ! {
    eprintln!("Unexpected feature count after push_one_feature: {len}");
    std::process::exit(1);
}

/// One component-level divergence between the passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Outer index `i`.
    pub outer: usize,
    /// Inner index `j`.
    pub inner: usize,
    /// Component index within the record (`0..3`).
    pub component: usize,
    /// Value the sequential pass produced.
    pub sequential: f64,
    /// Value the parallel pass produced.
    pub parallel: f64,
}

/// Exact comparison of two result collections.
///
/// Returns the shape flag (same outer length and per-row lengths), the
/// number of component comparisons performed, and every bit-level mismatch
/// found over the shared shape. Equality is `to_bits` equality; no epsilon
/// anywhere.
#[must_use]
pub fn compare_collections(
    sequential: &ResultCollection,
    parallel: &ResultCollection,
) -> (bool, usize, Vec<Mismatch>) {
    let mut shape_equal = sequential.len() == parallel.len();
    let mut checked = 0;
    let mut mismatches = Vec::new();
    for (i, (seq_row, par_row)) in sequential.iter().zip(parallel.iter()).enumerate() {
        if seq_row.len() != par_row.len() {
            shape_equal = false;
        }
        for (j, (seq, par)) in seq_row.iter().zip(par_row.iter()).enumerate() {
            let seq_bits = seq.bits();
            let par_bits = par.bits();
            for component in 0..3 {
                checked += 1;
                if seq_bits[component] != par_bits[component] {
                    mismatches.push(Mismatch {
                        outer: i,
                        inner: j,
                        component,
                        sequential: seq.components[component],
                        parallel: par.components[component],
                    });
                }
            }
        }
    }
    (shape_equal, checked, mismatches)
}

/// Outcome of one full comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Configuration the run used.
    pub config: ProbeConfig,
    /// Sequential-pass results.
    pub sequential: ResultCollection,
    /// Parallel-pass results.
    pub parallel: ResultCollection,
    /// Whether the two collections have identical shape.
    pub shape_equal: bool,
    /// Component comparisons performed.
    pub checked: usize,
    /// Every component-level divergence found.
    pub mismatches: Vec<Mismatch>,
}

impl ComparisonReport {
    /// True when anything at all differed between the passes.
    #[must_use]
    pub fn bug_found(&self) -> bool {
        !self.shape_equal || !self.mismatches.is_empty()
    }

    /// The final verdict line, exactly as printed.
    #[must_use]
    pub fn verdict_line(&self) -> &'static str {
        if self.bug_found() {
            "BUG? YES"
        } else {
            "BUG? no"
        }
    }

    /// One-line human summary of the comparison.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.bug_found() {
            format!(
                "{} of {} compared components diverged (shape equal: {})",
                self.mismatches.len(),
                self.checked,
                self.shape_equal
            )
        } else {
            format!("all {} compared components bit-identical", self.checked)
        }
    }

    /// Pretty-printed JSON rendering of the report.
    ///
    /// # Errors
    ///
    /// Returns [`ComprobarError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON rendering to a file.
    ///
    /// # Errors
    ///
    /// Returns [`ComprobarError::Serialization`] or [`ComprobarError::Io`].
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Run both passes, dump both collections, compare, and report.
///
/// Diagnostic output goes to `sink` in the original reproducer's order:
/// sequential pass lines, parallel pass lines, the per-index comparison
/// dump, the `results sequential==parallel? = …` line, and the final
/// verdict line (`BUG? YES` / `BUG? no`). The returned report carries
/// everything needed to re-derive the verdict.
///
/// # Errors
///
/// Only configuration-level failures surface here (see [`parallel_pass`]);
/// a discrepancy is a normal, reported outcome.
pub fn run_comparison(config: &ProbeConfig, sink: &DiagnosticSink) -> Result<ComparisonReport> {
    let sequential = sequential_pass(config, sink);
    let parallel = parallel_pass(config, sink)?;

    sink.blank();
    for (i, row) in parallel.iter().enumerate() {
        for (j, par) in row.iter().enumerate() {
            sink.line(&format!("results_parallel  [{i}][{j}] = {par}"));
            match sequential.get(i).and_then(|r| r.get(j)) {
                Some(seq) => sink.line(&format!("results_sequential[{i}][{j}] = {seq}")),
                None => sink.line(&format!("results_sequential[{i}][{j}] = <missing>")),
            }
        }
    }

    let (shape_equal, checked, mismatches) = compare_collections(&sequential, &parallel);
    let equal = shape_equal && mismatches.is_empty();
    sink.line(&format!("results sequential==parallel? = {equal}"));

    let report = ComparisonReport {
        config: config.clone(),
        sequential,
        parallel,
        shape_equal,
        checked,
        mismatches,
    };
    sink.blank();
    sink.line(report.verdict_line());
    Ok(report)
}
