//! Serialization-container variant of the probe
//!
//! A second pair of passes that routes every computed color through an
//! opaque value container before collection, checking that storage in a
//! message type (set-accessor in, get-accessor out, `f32` fields) neither
//! introduces nor masks a divergence between the passes. The container
//! deliberately mimics generated message code: private fields, getter and
//! setter per field, a lazily-inserted nested message.

use crate::diag::{full_precision, DiagnosticSink};
use crate::error::Result;
use crate::probe::{
    in_configured_pool, parallel_task_guard, push_one_feature, Mismatch, ProbeConfig,
    POPULATED_START,
};
use crate::record::ColorRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-component `f32` message, a strict value container.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorMessage {
    x: f32,
    y: f32,
    z: f32,
}

impl ColorMessage {
    /// First component.
    #[must_use]
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Second component.
    #[must_use]
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Third component.
    #[must_use]
    pub fn z(&self) -> f32 {
        self.z
    }

    /// Set the first component.
    pub fn set_x(&mut self, value: f32) {
        self.x = value;
    }

    /// Set the second component.
    pub fn set_y(&mut self, value: f32) {
        self.y = value;
    }

    /// Set the third component.
    pub fn set_z(&mut self, value: f32) {
        self.z = value;
    }

    /// Raw IEEE-754 bit patterns of the three fields.
    #[must_use]
    pub fn bits(&self) -> [u32; 3] {
        [self.x.to_bits(), self.y.to_bits(), self.z.to_bits()]
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ComprobarError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON. Bit-preserving for finite fields.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ComprobarError::Serialization`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for ColorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            full_precision(f64::from(self.x)),
            full_precision(f64::from(self.y)),
            full_precision(f64::from(self.z))
        )
    }
}

/// Container owning an optional [`ColorMessage`], generated-code style.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointMessage {
    color: Option<ColorMessage>,
}

impl KeypointMessage {
    /// The color message, if one was ever set.
    #[must_use]
    pub fn color(&self) -> Option<&ColorMessage> {
        self.color.as_ref()
    }

    /// Mutable access to the color message, inserting a default first if
    /// the field is unset.
    pub fn color_mut(&mut self) -> &mut ColorMessage {
        self.color.get_or_insert_with(ColorMessage::default)
    }
}

/// Nested message storage: outer index `i`, inner index `j`.
pub type MessageCollection = Vec<Vec<ColorMessage>>;

// Same loop body as the direct passes, except the result triple is stored
// through the container's mutators instead of a ResultRecord: x gets c2,
// y gets c1, z stays zero, all still f32.
fn store_through_container(color: &ColorRecord) -> ColorMessage {
    let mut keypoint = KeypointMessage::default();
    let slot = keypoint.color_mut();
    slot.set_x(color.components[2]);
    slot.set_y(color.components[1]);
    slot.set_z(0.0);
    keypoint.color().copied().unwrap_or_default()
}

/// Sequential wire pass: every color goes through the container.
pub fn sequential_wire_pass(config: &ProbeConfig, sink: &DiagnosticSink) -> MessageCollection {
    let mut messages: MessageCollection = vec![Vec::new(); config.outer_len];
    sink.blank();
    sink.line("Sequential wire pass:");
    for i in POPULATED_START..config.outer_len {
        let mut features = Vec::new();
        push_one_feature(&mut features);
        for j in 0..features.len() {
            let color = ColorRecord::from_indices(i, j);
            if config.sequential_color_print {
                sink.line(&format!("color = {color}"));
            }
            let message = store_through_container(&color);
            messages[i].push(message);
            sink.line(&format!("i = {i} ; color = {color} ; message = {message}"));
        }
    }
    messages
}

/// Parallel wire pass: rayon shape, guard, and print placement identical to
/// [`crate::probe::parallel_pass`].
///
/// # Errors
///
/// Returns [`crate::ComprobarError::ThreadPool`] when a dedicated pool was
/// requested and could not be built.
pub fn parallel_wire_pass(config: &ProbeConfig, sink: &DiagnosticSink) -> Result<MessageCollection> {
    let mut messages: MessageCollection = vec![Vec::new(); config.outer_len];
    sink.blank();
    sink.line("Parallel wire pass:");
    in_configured_pool(config, || parallel_wire_fill(config, sink, &mut messages))?;
    Ok(messages)
}

fn parallel_wire_fill(config: &ProbeConfig, sink: &DiagnosticSink, messages: &mut MessageCollection) {
    use rayon::prelude::*;

    let Some(populated) = messages.get_mut(POPULATED_START..) else {
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
                let message = store_through_container(&color);
                row.push(message);
                sink.line(&format!("i = {i} ; color = {color} ; message = {message}"));
            }
        });
}

/// Outcome of one wire comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireReport {
    /// Configuration the run used.
    pub config: ProbeConfig,
    /// Sequential-pass messages.
    pub sequential: MessageCollection,
    /// Parallel-pass messages.
    pub parallel: MessageCollection,
    /// Whether the two collections have identical shape.
    pub shape_equal: bool,
    /// Field comparisons performed.
    pub checked: usize,
    /// Every field-level divergence found (values widened to `f64`).
    pub mismatches: Vec<Mismatch>,
}

impl WireReport {
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
                "{} of {} compared fields diverged (shape equal: {})",
                self.mismatches.len(),
                self.checked,
                self.shape_equal
            )
        } else {
            format!("all {} compared fields bit-identical", self.checked)
        }
    }

    /// Pretty-printed JSON rendering of the report.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ComprobarError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON rendering to a file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ComprobarError::Serialization`] or
    /// [`crate::ComprobarError::Io`].
    pub fn write_json(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Exact comparison of two message collections (see
/// [`crate::probe::compare_collections`] for the direct-pass analog).
#[must_use]
pub fn compare_messages(
    sequential: &MessageCollection,
    parallel: &MessageCollection,
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
            let seq_fields = [seq.x(), seq.y(), seq.z()];
            let par_fields = [par.x(), par.y(), par.z()];
            for component in 0..3 {
                checked += 1;
                if seq_bits[component] != par_bits[component] {
                    mismatches.push(Mismatch {
                        outer: i,
                        inner: j,
                        component,
                        sequential: f64::from(seq_fields[component]),
                        parallel: f64::from(par_fields[component]),
                    });
                }
            }
        }
    }
    (shape_equal, checked, mismatches)
}

/// Run both wire passes, dump, compare, and report.
///
/// Same diagnostic order as [`crate::probe::run_comparison`], with
/// `message`-flavored labels and its own final verdict line.
///
/// # Errors
///
/// Only configuration-level failures surface here; a discrepancy is a
/// normal, reported outcome.
pub fn run_wire_comparison(config: &ProbeConfig, sink: &DiagnosticSink) -> Result<WireReport> {
    let sequential = sequential_wire_pass(config, sink);
    let parallel = parallel_wire_pass(config, sink)?;

    sink.blank();
    for (i, row) in parallel.iter().enumerate() {
        for (j, par) in row.iter().enumerate() {
            sink.line(&format!("messages_parallel  [{i}][{j}] = {par}"));
            match sequential.get(i).and_then(|r| r.get(j)) {
                Some(seq) => sink.line(&format!("messages_sequential[{i}][{j}] = {seq}")),
                None => sink.line(&format!("messages_sequential[{i}][{j}] = <missing>")),
            }
        }
    }

    let (shape_equal, checked, mismatches) = compare_messages(&sequential, &parallel);
    let equal = shape_equal && mismatches.is_empty();
    sink.line(&format!("messages sequential==parallel? = {equal}"));

    let report = WireReport {
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
