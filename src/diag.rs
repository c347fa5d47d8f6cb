//! Diagnostic output for the prober
//!
//! The original reproducer's stderr stream is its primary product: every
//! computed triple is rendered at 17 significant digits so that a one-ulp
//! divergence between the passes is visible in the text. Two pieces live
//! here:
//!
//! - [`DiagnosticSink`]: a clonable, thread-safe line sink. Production runs
//!   write to stderr; tests capture into a shared buffer and assert on the
//!   stream shape.
//! - [`full_precision`]: `%.17g`-style rendering (fixed notation for
//!   moderate exponents, scientific otherwise, trailing zeros trimmed).

use std::sync::{Arc, Mutex, PoisonError};

/// Thread-safe destination for diagnostic lines.
///
/// Cloning is cheap and clones share the same capture buffer, so a sink can
/// be handed to rayon tasks while the test that created it reads the
/// combined output afterwards. Each [`line`](Self::line) call is a single
/// write, so concurrent emitters interleave at line granularity and never
/// mid-line.
#[derive(Debug, Clone)]
pub struct DiagnosticSink {
    buffer: Option<Arc<Mutex<String>>>,
}

impl DiagnosticSink {
    /// Sink that writes each line to the process's standard error stream.
    #[must_use]
    pub fn stderr() -> Self {
        Self { buffer: None }
    }

    /// Sink that accumulates lines into a shared in-memory buffer.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            buffer: Some(Arc::new(Mutex::new(String::new()))),
        }
    }

    /// Emit one diagnostic line (terminator added here).
    pub fn line(&self, text: &str) {
        match &self.buffer {
            Some(buffer) => {
                let mut guard = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                guard.push_str(text);
                guard.push('\n');
            }
            None => eprintln!("{text}"),
        }
    }

    /// Emit an empty separator line.
    pub fn blank(&self) {
        self.line("");
    }

    /// Contents captured so far, or `None` for a stderr sink.
    #[must_use]
    pub fn captured(&self) -> Option<String> {
        self.buffer
            .as_ref()
            .map(|buffer| buffer.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::stderr()
    }
}

/// Render a float with 17 significant digits, `%.17g` style.
///
/// 17 digits round-trip any `f64`, so two values render identically only if
/// they are the same value. Fixed notation is used when the decimal exponent
/// lies in `[-4, 17)`, scientific notation otherwise; trailing fractional
/// zeros are trimmed in both forms.
#[must_use]
pub fn full_precision(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Decimal exponent, read off the shortest scientific rendering.
    let shortest = format!("{value:e}");
    let exponent: i32 = match shortest.rfind('e') {
        Some(pos) => shortest[pos + 1..].parse().unwrap_or(0),
        None => 0,
    };

    if (-4..17).contains(&exponent) {
        // 17 significant digits total: exponent+1 integer digits when the
        // exponent is non-negative, more decimals when it is negative.
        let decimals = usize::try_from(16 - exponent).unwrap_or(0);
        trim_fraction(&format!("{value:.decimals$}"))
    } else {
        let sci = format!("{value:.16e}");
        match sci.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{exp}", trim_fraction(mantissa)),
            None => sci,
        }
    }
}

/// Drop trailing fractional zeros (and a then-bare decimal point).
fn trim_fraction(rendered: &str) -> String {
    if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        rendered.to_string()
    }
}
