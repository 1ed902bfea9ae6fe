//! Integration tests for the battlecalc binary.
//!
//! Spawns the CLI against the bundled Revised scenario and checks its output.

use std::process::{Command, Output};

const REVISED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/revised.json");

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_battlecalc"))
        .args(args)
        .output()
        .expect("failed to start battlecalc")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn json_summary(args: &[&str]) -> serde_json::Value {
    let output = run_cli(args);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    serde_json::from_str(&stdout(&output)).unwrap()
}

#[test]
fn text_summary() {
    let output = run_cli(&[
        "--scenario",
        REVISED,
        "--territory",
        "Germany",
        "--attacker",
        "Russians",
        "--attack",
        "infantry:20,armour:5",
        "--runs",
        "100",
        "--seed",
        "5",
        "--threads",
        "2",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Russians (25 units) attacks Germans (11 units) in Germany"));
    assert!(text.contains("Runs:               100"));
    assert!(text.contains("Attacker wins:"));
    assert!(text.contains("TUV swing:"));
}

#[test]
fn json_output() {
    let summary = json_summary(&[
        "--scenario",
        REVISED,
        "--territory",
        "Germany",
        "--attacker",
        "Russians",
        "--attack",
        "infantry:10",
        "--runs",
        "50",
        "--seed",
        "1",
        "--json",
    ]);
    assert_eq!(summary["runs"], 50);
    assert_eq!(summary["attacker"], "Russians");
    assert_eq!(summary["defender"], "Germans");
    let total = summary["attacker_win_percent"].as_f64().unwrap()
        + summary["defender_win_percent"].as_f64().unwrap()
        + summary["draw_percent"].as_f64().unwrap();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(summary["average_tuv_swing"].is_number());
}

#[test]
fn explicit_defenders() {
    let summary = json_summary(&[
        "--scenario",
        REVISED,
        "--territory",
        "Kenya",
        "--attacker",
        "Germans",
        "--attack",
        "armour:3",
        "--defender",
        "British",
        "--defend",
        "infantry",
        "--runs",
        "20",
        "--no-retreat",
        "--json",
    ]);
    assert_eq!(summary["defender"], "British");
    assert_eq!(summary["runs"], 20);
}

#[test]
fn amphibious_landings_cannot_retreat() {
    let rounds = |amphibious: bool| {
        let mut args = vec![
            "--scenario",
            REVISED,
            "--territory",
            "Germany",
            "--attacker",
            "Russians",
            "--attack",
            "infantry:3",
            "--retreat-after-round",
            "1",
            "--runs",
            "200",
            "--seed",
            "3",
            "--json",
        ];
        if amphibious {
            args.push("--amphibious");
        }
        json_summary(&args)["average_battle_rounds_fought"]
            .as_f64()
            .unwrap()
    };
    assert_eq!(rounds(false), 1.0);
    assert!(rounds(true) > 1.0);
}

#[test]
fn unknown_territory_fails() {
    let output = run_cli(&[
        "--scenario",
        REVISED,
        "--territory",
        "Atlantis",
        "--attacker",
        "Russians",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Atlantis"));
}

#[test]
fn unknown_unit_type_fails() {
    let output = run_cli(&[
        "--scenario",
        REVISED,
        "--territory",
        "Germany",
        "--attacker",
        "Russians",
        "--attack",
        "tank:3",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unknown unit type 'tank'"));
}

#[test]
fn non_bombarding_units_are_rejected() {
    let output = run_cli(&[
        "--scenario",
        REVISED,
        "--territory",
        "Germany",
        "--attacker",
        "Russians",
        "--attack",
        "infantry:3",
        "--bombard",
        "infantry:5",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("infantry cannot bombard"));
}

#[test]
fn bad_arguments_print_usage() {
    let output = run_cli(&["--runs"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Usage: battlecalc"));

    let output = run_cli(&["--frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Unknown argument: --frobnicate"));
}

#[test]
fn help_exits_cleanly() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("--scenario FILE"));
}
