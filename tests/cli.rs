// Drives the compiled binary's non-interactive surface.

use std::path::Path;
use std::process::Output;

use assert_cmd::Command;
use chrono::Local;
use tempfile::tempdir;

use mindswitch::{
    log_store::{CsvLogRepository, LogRepository},
    SessionRecord, Stimulus,
};

fn run(home: &Path, args: &[&str]) -> Output {
    Command::cargo_bin("mindswitch")
        .unwrap()
        .env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn row(stimulus: Stimulus, mwi: Option<f64>) -> SessionRecord {
    SessionRecord {
        timestamp: Local::now().naive_local(),
        work_minutes: 25,
        rest_minutes: 2,
        recommended_stimulus: Some(stimulus),
        recommend_reason: None,
        chosen_stimulus: stimulus,
        pre_rt: None,
        post_rt: None,
        pre_err: Some(3),
        post_err: Some(1),
        pre_idea: None,
        post_idea: None,
        d_rt: None,
        d_err: None,
        d_idea: None,
        mwi,
        easy_pre_q1: None,
        easy_q1: None,
        easy_q2: None,
        easy_q3: None,
        easy_mwi: None,
    }
}

#[test]
fn today_with_empty_log() {
    let home = tempdir().unwrap();
    let log = home.path().join("log.csv");
    let out = run(home.path(), &["--today", "--log-file", log.to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("No sessions logged today."));
    assert!(!log.exists());
}

#[test]
fn today_lists_logged_sessions() {
    let home = tempdir().unwrap();
    let log = home.path().join("log.csv");
    let mut repo = CsvLogRepository::new(&log);
    repo.append(&row(Stimulus::BreathGuide, Some(0.2))).unwrap();
    repo.append(&row(Stimulus::AudioNoise, None)).unwrap();

    let out = run(home.path(), &["--today", "--log-file", log.to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(": 2"));
    assert!(stdout.contains("Mean MWI by stimulus (1 scored)"));
    assert!(stdout.contains(Stimulus::BreathGuide.label()));
    assert!(stdout.contains(&format!("Full log: {}", log.display())));
}

#[test]
fn out_of_range_work_minutes_is_rejected() {
    let home = tempdir().unwrap();
    let out = run(home.path(), &["--today", "--no-log", "-w", "7"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("work duration"));
}

#[test]
#[cfg(target_os = "linux")]
fn save_config_persists_flags() {
    let home = tempdir().unwrap();
    let out = run(
        home.path(),
        &["--today", "--no-log", "--save-config", "-w", "50", "-r", "4"],
    );
    assert!(out.status.success());

    let saved = std::fs::read_to_string(
        home.path()
            .join(".config")
            .join("mindswitch")
            .join("config.json"),
    )
    .unwrap();
    assert!(saved.contains("\"work_minutes\": 50"));
    assert!(saved.contains("\"rest_minutes\": 4"));
}

#[test]
fn interactive_mode_needs_a_tty() {
    let home = tempdir().unwrap();
    let out = run(home.path(), &["--no-log"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("stdin must be a tty"));
}
