//! Wire-shape and summary tests for gate domain types.

use crate::gate::domain::{
    DEFAULT_GATE_TIMEOUT_SECS, GateResult, GateRunReport, GateSpec, GateSummary, PassCriteria,
    all_passed,
};
use chrono::Utc;
use rstest::rstest;
use std::time::Duration;

fn result(name: &str, passed: bool, millis: u64) -> GateResult {
    GateResult::completed(
        name.to_owned(),
        passed,
        i32::from(!passed),
        String::new(),
        String::new(),
        Duration::from_millis(millis),
        Utc::now(),
    )
}

#[rstest]
fn minimal_wire_shape_applies_defaults() {
    let spec: GateSpec = serde_json::from_str(r#"{"name": "lint", "command": "cargo clippy"}"#)
        .expect("minimal gate should parse");

    assert_eq!(spec.name(), "lint");
    assert_eq!(spec.pass_criteria(), PassCriteria::ExitCode0);
    assert_eq!(spec.timeout(), Duration::from_secs(DEFAULT_GATE_TIMEOUT_SECS));
    assert!(spec.is_required());
    assert!(spec.fail_task_on_error());
    assert!(spec.description().is_none());
    assert!(spec.expected_output().is_none());
}

#[rstest]
fn full_wire_shape_is_honoured() {
    let spec: GateSpec = serde_json::from_value(serde_json::json!({
        "name": "coverage",
        "description": "coverage threshold",
        "command": "cargo llvm-cov",
        "pass_criteria": "output_matches",
        "expected_output": "TOTAL\\s+9\\d%",
        "timeout": 300,
        "fail_task_on_error": false,
        "required": false
    }))
    .expect("full gate should parse");

    assert_eq!(spec.pass_criteria(), PassCriteria::OutputMatches);
    assert_eq!(spec.expected_output(), Some("TOTAL\\s+9\\d%"));
    assert_eq!(spec.timeout(), Duration::from_secs(300));
    assert!(!spec.is_required());
    assert!(!spec.fail_task_on_error());
}

#[rstest]
#[case("exit_code_0", PassCriteria::ExitCode0)]
#[case("output_contains", PassCriteria::OutputContains)]
#[case("output_matches", PassCriteria::OutputMatches)]
#[case("checksum_equals", PassCriteria::Unknown)]
fn pass_criteria_accepts_unknown_strings(#[case] raw: &str, #[case] expected: PassCriteria) {
    let parsed: PassCriteria =
        serde_json::from_value(serde_json::Value::String(raw.to_owned())).expect("criteria");

    assert_eq!(parsed, expected);
    assert_eq!(PassCriteria::from(raw), expected);
}

#[rstest]
fn serialized_spec_uses_wire_names() {
    let spec = GateSpec::new("tests", "cargo test").with_timeout_secs(120);

    let value = serde_json::to_value(&spec).expect("serialize gate");

    assert_eq!(value["pass_criteria"], "exit_code_0");
    assert_eq!(value["timeout"], 120);
    assert!(value.get("description").is_none());
}

#[rstest]
fn summary_of_empty_results_has_zero_pass_rate() {
    let summary = GateSummary::from_results(&[]);

    assert_eq!(summary.total, 0);
    assert_eq!(summary.passed, 0);
    assert!(summary.pass_rate.abs() < f64::EPSILON);
    assert!(summary.all_passed);
    assert!(all_passed(&[]));
}

#[rstest]
fn summary_counts_and_times_results() {
    let results = vec![
        result("a", true, 100),
        result("b", false, 250),
        result("c", true, 150),
        result("d", true, 500),
    ];

    let summary = GateSummary::from_results(&results);

    assert_eq!(summary.total, 4);
    assert_eq!(summary.passed, 3);
    assert_eq!(summary.failed, 1);
    assert!((summary.pass_rate - 0.75).abs() < f64::EPSILON);
    assert_eq!(summary.total_execution_time, Duration::from_secs(1));
    assert!(!summary.all_passed);
    assert!(!all_passed(&results));
}

#[rstest]
fn report_lists_failed_gate_names() {
    let report = GateRunReport::new(vec![result("lint", true, 1), result("tests", false, 1)]);

    assert!(!report.all_passed());
    assert_eq!(report.failed_gate_names().collect::<Vec<_>>(), vec!["tests"]);
}

#[rstest]
fn errored_results_never_pass() {
    let errored = GateResult::errored(
        "lint".to_owned(),
        "Execution error: boom".to_owned(),
        Duration::ZERO,
        Utc::now(),
    );

    assert!(!errored.passed());
    assert_eq!(errored.exit_code(), -1);
    assert_eq!(errored.error(), Some("Execution error: boom"));
}
