//! comprobar binary — run the discrepancy probe against stderr.
//!
//! Takes no command-line arguments; the probe's whole point is a fixed,
//! reproducible scenario. Configuration comes from the environment
//! (`COMPROBAR_SEQUENTIAL_PRINT`, `COMPROBAR_PARALLEL_PRINT`,
//! `COMPROBAR_THREADS`), and `COMPROBAR_REPORT=<path>` additionally writes
//! the JSON report there.
//!
//! Exit status: 0 on normal completion whatever the verdict says, 1 when
//! the auxiliary-sequence contract is violated inside the parallel pass,
//! 2 when a requested thread pool cannot be built.

use comprobar::{run_comparison, DiagnosticSink, ProbeConfig};

fn main() {
    let config = ProbeConfig::from_env();
    let sink = DiagnosticSink::stderr();

    let report = match run_comparison(&config, &sink) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("comprobar: {e}");
            std::process::exit(2);
        }
    };

    if let Ok(path) = std::env::var("COMPROBAR_REPORT") {
        match report.write_json(&path) {
            Ok(()) => eprintln!("report written to {path}"),
            Err(e) => eprintln!("comprobar: failed to write report to {path}: {e}"),
        }
    }
}
