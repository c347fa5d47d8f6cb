//! End-to-end verdict tests
//!
//! Drive complete comparison runs through a capture sink and assert on the
//! verdict line and the exact shape of the diagnostic stream — the stream
//! IS the product for a reproducer like this, so its line structure is
//! pinned here.

use comprobar::{
    run_comparison, run_wire_comparison, ComparisonReport, DiagnosticSink, ProbeConfig,
    WireReport,
};

fn run_captured(config: &ProbeConfig) -> (ComparisonReport, String) {
    let sink = DiagnosticSink::capture();
    let report = run_comparison(config, &sink).expect("comparison run");
    let captured = sink.captured().expect("capture sink");
    (report, captured)
}

#[test]
fn test_default_run_verdict_and_stream_shape() {
    let (report, captured) = run_captured(&ProbeConfig::default());
    eprintln!("captured diagnostic stream:\n{captured}");

    let verdict = report.verdict_line();
    assert!(
        verdict == "BUG? YES" || verdict == "BUG? no",
        "verdict must be one of the two exact forms, got {verdict:?}"
    );
    assert_eq!(verdict, "BUG? no", "strict IEEE passes must agree");
    assert!(!report.bug_found());
    assert_eq!(report.checked, 3);

    // Pass headers in order, one combined line pair for the single
    // populated index, verdict as the final line.
    let seq_pos = captured.find("Sequential pass:").expect("sequential header");
    let par_pos = captured.find("Parallel pass:").expect("parallel header");
    assert!(seq_pos < par_pos);
    assert_eq!(
        captured.matches("i = 1 ; color = ").count(),
        2,
        "one combined line per (i, j) per pass"
    );
    assert_eq!(
        captured
            .lines()
            .filter(|line| line.starts_with("color = "))
            .count(),
        1,
        "bare color line only in the parallel pass by default"
    );
    assert!(captured.contains("results_parallel  [1][0] = 300000,200000,0"));
    assert!(captured.contains("results_sequential[1][0] = 300000,200000,0"));
    assert!(captured.contains("results sequential==parallel? = true"));
    assert!(captured.ends_with("BUG? no\n"));
}

#[test]
fn test_run_comparison_is_idempotent() {
    let config = ProbeConfig::default();
    let (first, _) = run_captured(&config);
    let (second, _) = run_captured(&config);
    assert_eq!(first.verdict_line(), second.verdict_line());
    assert_eq!(first.mismatches.len(), second.mismatches.len());
    assert_eq!(first.checked, second.checked);
    assert_eq!(second.verdict_line(), "BUG? no");
}

#[test]
fn test_parallel_print_toggle_regression() {
    // The original report claimed enabling the in-loop print in the
    // parallel pass "fixes" the discrepancy. Exercise both positions and
    // pin that the verdict does not depend on the toggle here.
    let with_print = ProbeConfig::default();
    let without_print = ProbeConfig {
        parallel_color_print: false,
        ..ProbeConfig::default()
    };

    let (report_on, stream_on) = run_captured(&with_print);
    let (report_off, stream_off) = run_captured(&without_print);

    assert_eq!(report_on.verdict_line(), report_off.verdict_line());
    assert_eq!(report_off.verdict_line(), "BUG? no");

    let bare_lines = |stream: &str| {
        stream
            .lines()
            .filter(|line| line.starts_with("color = "))
            .count()
    };
    assert_eq!(bare_lines(&stream_on), 1);
    assert_eq!(bare_lines(&stream_off), 0);
}

#[test]
fn test_sequential_print_toggle_regression() {
    let config = ProbeConfig {
        sequential_color_print: true,
        ..ProbeConfig::default()
    };
    let (report, captured) = run_captured(&config);
    assert_eq!(report.verdict_line(), "BUG? no");
    assert_eq!(
        captured
            .lines()
            .filter(|line| line.starts_with("color = "))
            .count(),
        2,
        "both in-loop prints enabled: one bare line per pass"
    );
}

#[test]
fn test_wire_variant_matches_direct_verdict() {
    let config = ProbeConfig::default();
    let (direct, _) = run_captured(&config);

    let sink = DiagnosticSink::capture();
    let wire = run_wire_comparison(&config, &sink).expect("wire comparison");
    assert_eq!(wire.verdict_line(), direct.verdict_line());
    assert!(!wire.bug_found());

    let captured = sink.captured().expect("capture sink");
    assert!(captured.contains("Sequential wire pass:"));
    assert!(captured.contains("messages sequential==parallel? = true"));
    assert!(captured.ends_with("BUG? no\n"));
}

#[test]
fn test_larger_iteration_space_stays_identical() {
    let mut config = ProbeConfig::with_outer_len(32).expect("valid outer_len");
    config.threads = Some(4);
    let (report, captured) = run_captured(&config);

    assert_eq!(report.verdict_line(), "BUG? no");
    assert_eq!(report.checked, 31 * 3);
    assert!(report.shape_equal);
    assert_eq!(
        captured
            .lines()
            .filter(|line| line.starts_with("i = "))
            .count(),
        31 * 2,
        "one combined line per populated index per pass"
    );
}

#[test]
fn test_report_round_trips_through_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("report.json");

    let (report, _) = run_captured(&ProbeConfig::default());
    report.write_json(&path).expect("write report");

    let contents = std::fs::read_to_string(&path).expect("read report");
    let parsed: ComparisonReport = serde_json::from_str(&contents).expect("parse report");
    assert_eq!(parsed.checked, report.checked);
    assert_eq!(parsed.config.outer_len, 2);
    assert!(parsed.mismatches.is_empty());
    assert_eq!(parsed.verdict_line(), "BUG? no");
}

#[test]
fn test_wire_report_round_trips_through_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("wire_report.json");

    let sink = DiagnosticSink::capture();
    let report = run_wire_comparison(&ProbeConfig::default(), &sink).expect("wire comparison");
    report.write_json(&path).expect("write wire report");

    let contents = std::fs::read_to_string(&path).expect("read wire report");
    let parsed: WireReport = serde_json::from_str(&contents).expect("parse wire report");
    assert_eq!(parsed.checked, report.checked);
    assert!(parsed.mismatches.is_empty());
    assert_eq!(parsed.verdict_line(), "BUG? no");
}
