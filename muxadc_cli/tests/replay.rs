use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_replay_config(dir: &tempfile::TempDir, trace: &str) -> PathBuf {
    let toml = format!(
        r#"
[acquisition]
conversion_timeout_ms = 20

[drain]
interval_ms = 5

[hardware]
backend = "replay"
replay = "{trace}"

[sim]
conversion_us = 10
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
fn replay_rejects_spike_on_channel_three() {
    let dir = tempdir().unwrap();
    let mut f = fs::File::create(dir.path().join("trace.csv")).unwrap();
    writeln!(f, "channel,raw").unwrap();
    for raw in [30, 25, 1000, 28, 27] {
        writeln!(f, "3,{raw}").unwrap();
    }
    // relative path resolves next to the config file
    let cfg = write_replay_config(&dir, "trace.csv");

    Command::cargo_bin("muxadc")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("read")
        .arg("--channel")
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("ADC_3: 28"));
}

#[rstest]
fn replay_reports_bad_trace_header() {
    let dir = tempdir().unwrap();
    let mut f = fs::File::create(dir.path().join("trace.csv")).unwrap();
    writeln!(f, "ch,value").unwrap();
    writeln!(f, "0,100").unwrap();
    let cfg = write_replay_config(&dir, "trace.csv");

    Command::cargo_bin("muxadc")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers"));
}
