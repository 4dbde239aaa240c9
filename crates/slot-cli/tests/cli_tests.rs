//! Integration tests for the `slots` CLI binary.
//!
//! Every test runs in its own temporary directory with an explicit state file and
//! a fixed `--now`, so results do not depend on the wall clock.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const NOW: &str = "2099-01-01T08:00";
const DATE: &str = "2099-01-02";

/// Helper: a `slots` command running inside `dir` with its own state file.
fn slots(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("slots").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .args(["--now", NOW, "--state"])
        .arg(state_path(dir));
    cmd
}

fn state_path(dir: &TempDir) -> PathBuf {
    dir.path().join("state.json")
}

/// Helper: run a command expected to succeed and parse its stdout as JSON.
fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout must be JSON")
}

fn publish(dir: &TempDir, ranges: &[&str]) -> Value {
    let mut cmd = slots(dir);
    cmd.args(["publish", "--talent", "t-1", "--date", DATE]);
    for range in ranges {
        cmd.args(["--range", range]);
    }
    json_output(&mut cmd)
}

fn book(dir: &TempDir, slot: &str) -> Value {
    json_output(slots(dir).args([
        "book",
        "--talent",
        "t-1",
        "--user",
        "u-1",
        "--card",
        "c-1",
        "--card-title",
        "Intro call",
        "--duration",
        "30",
        "--date",
        DATE,
        "--slot",
        slot,
        "--session-type",
        "CoffeeCall",
    ]))
}

fn read_state(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// publish / free-slots
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn publish_prints_window_and_persists_it() {
    let dir = TempDir::new().unwrap();

    let window = publish(&dir, &["09:00-11:00"]);

    assert_eq!(window["talent_id"], "t-1");
    assert_eq!(window["available_date"], DATE);
    assert_eq!(window["available_slots"][0]["startTime"], "09:00");
    assert_eq!(window["available_slots"][0]["endTime"], "11:00");

    let state = read_state(&state_path(&dir));
    assert_eq!(state["windows"].as_array().unwrap().len(), 1);
}

#[test]
fn free_slots_after_booking() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &["09:00-11:00"]);
    book(&dir, "10:00-10:30");

    let free = json_output(slots(&dir).args(["free-slots", "--talent", "t-1", "--duration", "30"]));

    assert_eq!(
        free["available_slots"][DATE],
        serde_json::json!(["09:00-09:30", "09:30-10:00", "10:30-11:00"])
    );
    assert_eq!(free["booked_slots"][DATE], serde_json::json!(["10:00-10:30"]));
}

#[test]
fn publish_over_booking_fails_with_collision_code() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &["09:00-11:00"]);
    book(&dir, "10:00-10:30");
    let before = std::fs::read_to_string(state_path(&dir)).unwrap();

    slots(&dir)
        .args(["publish", "--talent", "t-1", "--date", DATE, "--range", "10:15-12:00"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("collides"));

    let after = std::fs::read_to_string(state_path(&dir)).unwrap();
    assert_eq!(before, after);
}

#[test]
fn malformed_range_is_rejected_by_argument_parsing() {
    let dir = TempDir::new().unwrap();

    slots(&dir)
        .args(["publish", "--talent", "t-1", "--date", DATE, "--range", "11:00-09:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("11:00-09:00"));

    assert!(!state_path(&dir).exists());
}

#[test]
fn past_date_is_a_validation_error() {
    let dir = TempDir::new().unwrap();

    slots(&dir)
        .args(["publish", "--talent", "t-1", "--date", "2098-12-31", "--range", "09:00-10:00"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("in the past"));
}

#[test]
fn invalid_now_is_reported() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("slots")
        .unwrap()
        .current_dir(dir.path())
        .args(["--now", "tomorrow", "windows", "--talent", "t-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid --now"));
}

// ─────────────────────────────────────────────────────────────────────────────
// bookings
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn book_outside_availability_is_rejected() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &["09:00-10:00"]);

    slots(&dir)
        .args([
            "book", "--talent", "t-1", "--user", "u-1", "--card", "c-1", "--card-title", "Call",
            "--duration", "30", "--date", DATE, "--slot", "10:00-10:30",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("outside the published availability"));
}

#[test]
fn cancel_booking_frees_the_slot() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &["09:00-10:00"]);
    let created = book(&dir, "09:00-09:30");
    let id = created[0]["booking_id"].as_str().unwrap().to_string();
    assert_eq!(created[0]["status"], "Scheduled");
    assert_eq!(created[0]["session_type"], "CoffeeCall");

    let updated = json_output(slots(&dir).args([
        "update-booking",
        "--id",
        id.as_str(),
        "--status",
        "Cancelled",
    ]));
    assert_eq!(updated["status"], "Cancelled");

    let free = json_output(slots(&dir).args(["free-slots", "--talent", "t-1", "--duration", "30"]));
    assert_eq!(
        free["available_slots"][DATE],
        serde_json::json!(["09:00-09:30", "09:30-10:00"])
    );
}

#[test]
fn update_unknown_booking_is_not_found() {
    let dir = TempDir::new().unwrap();

    slots(&dir)
        .args(["update-booking", "--id", "nope", "--status", "Completed"])
        .assert()
        .code(5);
}

#[test]
fn unknown_status_is_rejected() {
    let dir = TempDir::new().unwrap();

    slots(&dir)
        .args(["update-booking", "--id", "b-1", "--status", "Lost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown value 'Lost'"));
}

#[test]
fn bookings_listed_by_talent_or_user() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &["09:00-10:00"]);
    book(&dir, "09:30-10:00");

    let by_talent = json_output(slots(&dir).args(["bookings", "--talent", "t-1"]));
    assert_eq!(by_talent.as_array().unwrap().len(), 1);

    let by_user = json_output(slots(&dir).args(["bookings", "--user", "u-2"]));
    assert_eq!(by_user, serde_json::json!([]));

    slots(&dir).arg("bookings").assert().failure();
}

#[test]
fn read_only_commands_do_not_create_state() {
    let dir = TempDir::new().unwrap();

    let windows = json_output(slots(&dir).args(["windows", "--talent", "t-1"]));

    assert_eq!(windows, serde_json::json!([]));
    assert!(!state_path(&dir).exists());
}

// ─────────────────────────────────────────────────────────────────────────────
// concurrent invocations
// ─────────────────────────────────────────────────────────────────────────────

/// Helper: start a `slots` process sharing `dir`'s state file without waiting.
fn spawn_slots(dir: &TempDir, args: &[&str]) -> std::process::Child {
    std::process::Command::new(assert_cmd::cargo::cargo_bin("slots"))
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .args(["--now", NOW, "--state"])
        .arg(state_path(dir))
        .args(args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .expect("slots binary must start")
}

#[test]
fn concurrent_publishes_are_all_kept() {
    for _ in 0..5 {
        let dir = TempDir::new().unwrap();
        let talents = ["a", "b", "c", "d", "e", "f"];

        let children: Vec<_> = talents
            .iter()
            .map(|talent| {
                spawn_slots(
                    &dir,
                    &["publish", "--talent", *talent, "--date", DATE, "--range", "09:00-10:00"],
                )
            })
            .collect();
        for mut child in children {
            assert!(child.wait().unwrap().success());
        }

        let state = read_state(&state_path(&dir));
        assert_eq!(state["windows"].as_array().unwrap().len(), talents.len());
    }
}

#[test]
fn concurrent_bookings_for_one_slot_admit_exactly_one() {
    let dir = TempDir::new().unwrap();
    publish(&dir, &["09:00-10:00"]);

    let children: Vec<_> = (0..6)
        .map(|i| {
            let user = format!("u-{i}");
            spawn_slots(
                &dir,
                &[
                    "book", "--talent", "t-1", "--user", &user, "--card", "c-1",
                    "--card-title", "Call", "--duration", "30", "--date", DATE,
                    "--slot", "09:00-09:30",
                ],
            )
        })
        .collect();
    let codes: Vec<_> = children
        .into_iter()
        .map(|mut child| child.wait().unwrap().code())
        .collect();

    assert_eq!(codes.iter().filter(|c| **c == Some(0)).count(), 1);
    assert_eq!(codes.iter().filter(|c| **c == Some(4)).count(), 5);
    let state = read_state(&state_path(&dir));
    assert_eq!(state["bookings"].as_array().unwrap().len(), 1);
}

#[test]
fn corrupt_state_file_is_a_store_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(state_path(&dir), "{ not json").unwrap();

    slots(&dir)
        .args(["windows", "--talent", "t-1"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Failed to parse state file"));
}

// ─────────────────────────────────────────────────────────────────────────────
// configuration
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn yaml_config_selects_state_file_and_overlap_rule() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("slots.yaml"),
        "state_file: custom.json\nengine:\n  overlap_rule: inclusive\n",
    )
    .unwrap();

    let run = |args: &[&str]| {
        let mut cmd = Command::cargo_bin("slots").unwrap();
        cmd.current_dir(dir.path()).args(["--now", NOW]).args(args);
        cmd
    };

    run(&["publish", "--talent", "t-1", "--date", DATE, "--range", "09:00-10:00"])
        .assert()
        .success();
    run(&[
        "book", "--talent", "t-1", "--user", "u-1", "--card", "c-1", "--card-title", "Call",
        "--duration", "30", "--date", DATE, "--slot", "09:30-10:00",
    ])
    .assert()
    .success();
    assert!(dir.path().join("custom.json").exists());

    // Touching ranges collide under the inclusive rule.
    run(&["publish", "--talent", "t-1", "--date", DATE, "--range", "10:00-11:00"])
        .assert()
        .code(4);
}

#[test]
fn env_config_disables_window_requirement() {
    let dir = TempDir::new().unwrap();

    slots(&dir)
        .env("SLOTS_ENGINE__REQUIRE_AVAILABILITY_FOR_BOOKINGS", "false")
        .args([
            "book", "--talent", "t-1", "--user", "u-1", "--card", "c-1", "--card-title", "Call",
            "--duration", "30", "--date", DATE, "--slot", "13:00-13:30",
        ])
        .assert()
        .success();
}

#[test]
fn bad_config_fails_before_touching_state() {
    let dir = TempDir::new().unwrap();

    slots(&dir)
        .env("SLOTS_ENGINE__TIMEZONE", "Nowhere/Special")
        .args(["windows", "--talent", "t-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}
