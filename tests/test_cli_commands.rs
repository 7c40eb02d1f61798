mod common;

use common::PhaseClockProcess;

#[test]
fn validate_valid_schedule() {
    let output = PhaseClockProcess::run(&["validate", &PhaseClockProcess::fixture("ftc_match.yaml")]);
    assert!(
        output.status.success(),
        "validate should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ftc-match (4 phases, 158.000s, tick 50ms)"), "{stdout}");
    assert!(stdout.contains("Endgame"));
}

#[test]
fn validate_json_output() {
    let output = PhaseClockProcess::run(&[
        "validate",
        "--format",
        "json",
        &PhaseClockProcess::fixture("ftc_match.yaml"),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("output should be valid JSON");
    assert_eq!(parsed["name"], "ftc-match");
    assert_eq!(parsed["phases"].as_array().map(Vec::len), Some(4));
    assert_eq!(parsed["phases"][2]["start_seconds"], 38.0);
    assert_eq!(parsed["phases"][2]["end_seconds"], 128.0);
    assert_eq!(parsed["total_seconds"], 158.0);
}

#[test]
fn validate_multiple_files() {
    let output = PhaseClockProcess::run(&[
        "validate",
        &PhaseClockProcess::fixture("ftc_match.yaml"),
        &PhaseClockProcess::fixture("quick.yaml"),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ftc-match"));
    assert!(stdout.contains("quick"));
}

#[test]
fn validate_empty_schedule_fails_with_config_code() {
    let output = PhaseClockProcess::run(&["validate", &PhaseClockProcess::fixture("no_phases.yaml")]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("At least one phase is required"), "{stderr}");
}

#[test]
fn validate_reports_every_bad_duration() {
    let output =
        PhaseClockProcess::run(&["validate", &PhaseClockProcess::fixture("bad_duration.yaml")]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("phases[0].duration"), "{stderr}");
    assert!(stderr.contains("phases[1].duration"), "{stderr}");
}

#[test]
fn validate_overflowing_duration_fails_with_config_code() {
    let output =
        PhaseClockProcess::run(&["validate", &PhaseClockProcess::fixture("overflow_duration.yaml")]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("phases[0].duration"), "{stderr}");
}

#[test]
fn validate_missing_file() {
    let output = PhaseClockProcess::run(&["validate", "/tmp/nonexistent_phaseclock_schedule.yaml"]);
    assert!(!output.status.success());
}

#[test]
fn validate_duplicate_names_warn_unless_strict() {
    let path = PhaseClockProcess::fixture("duplicate_names.yaml");

    let output = PhaseClockProcess::run(&["validate", &path]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("warning: Duplicate phase name 'Drive'"), "{stdout}");

    let output = PhaseClockProcess::run(&["validate", "--strict", &path]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn version_human_and_json() {
    let output = PhaseClockProcess::run(&["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("phaseclock "));

    let output = PhaseClockProcess::run(&["version", "--format", "json"]);
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("version JSON");
    assert_eq!(parsed["name"], "phaseclock");
    assert_eq!(parsed["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn run_emits_events_in_order() {
    let output = PhaseClockProcess::run(&[
        "run",
        "--config",
        &PhaseClockProcess::fixture("quick.yaml"),
        "--speed",
        "20",
        "--events",
        "-",
    ]);
    assert!(
        output.status.success(),
        "run should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let events: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).expect("JSONL line"))
        .collect();

    let types: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(types.first(), Some(&"ScheduleStarted"));
    assert_eq!(types.last(), Some(&"ScheduleFinished"));

    let last = &events[events.len() - 1];
    assert_eq!(last["reason"], "completed");
    assert_eq!(last["final_phase"], "Cooldown");

    let sequences: Vec<u64> = events.iter().filter_map(|e| e["sequence"].as_u64()).collect();
    let expected: Vec<u64> = (0..events.len() as u64).collect();
    assert_eq!(sequences, expected);

    let entered: Vec<&str> = events
        .iter()
        .filter(|e| e["type"] == "PhaseEntered")
        .filter_map(|e| e["phase_name"].as_str())
        .collect();
    assert_eq!(entered.last(), Some(&"Cooldown"));
}

#[test]
fn run_prints_transitions() {
    let output = PhaseClockProcess::run(&[
        "run",
        "-c",
        &PhaseClockProcess::fixture("quick.yaml"),
        "--speed",
        "20",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-> Cooldown"), "{stdout}");
}

#[test]
fn run_quiet_prints_nothing_to_stdout() {
    let output = PhaseClockProcess::run(&[
        "-q",
        "run",
        "-c",
        &PhaseClockProcess::fixture("quick.yaml"),
        "--speed",
        "20",
    ]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn run_rejects_zero_tick() {
    let output = PhaseClockProcess::run(&[
        "run",
        "-c",
        &PhaseClockProcess::fixture("quick.yaml"),
        "--tick",
        "0ms",
    ]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn run_invalid_schedule_exits_with_config_code() {
    let output = PhaseClockProcess::run(&["run", "-c", &PhaseClockProcess::fixture("no_phases.yaml")]);
    assert_eq!(output.status.code(), Some(2));
}
