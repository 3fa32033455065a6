//! CLI end-to-end tests
//!
//! Tests for the vidsplit command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the vidsplit binary
#[allow(deprecated)]
fn vidsplit_cmd() -> Command {
    Command::cargo_bin("vidsplit").unwrap()
}

fn ffmpeg_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

#[test]
fn test_cli_no_args_shows_help() {
    vidsplit_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    vidsplit_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("vidsplit"))
        .stdout(predicate::str::contains("split"));
}

#[test]
fn test_cli_version_command() {
    vidsplit_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("vidsplit "));
}

#[test]
fn test_cli_split_help() {
    vidsplit_cmd()
        .args(["split", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--slice"))
        .stdout(predicate::str::contains("--output-dir"));
}

#[test]
fn test_cli_check_tools_command() {
    vidsplit_cmd()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"));
}

#[test]
fn test_cli_split_missing_file() {
    vidsplit_cmd()
        .args(["split", "/nonexistent/clip.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_split_rejects_bad_slice() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    fs::write(&input, b"not really a video").unwrap();

    for bad in ["0", "-5", "abc"] {
        vidsplit_cmd()
            .arg("split")
            .arg(&input)
            .args(["--slice", bad])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid slice length"));
    }
    assert!(!dir.path().join("output").exists());
}

#[test]
fn test_cli_probe_missing_file() {
    vidsplit_cmd()
        .args(["probe", "/nonexistent/clip.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_validate_defaults() {
    vidsplit_cmd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Slice: 60s"))
        .stdout(predicate::str::contains("Container: same as source"));
}

#[test]
fn test_cli_validate_reports_warnings() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"split": {"slice_seconds": 0, "container": "mkv"}}"#).unwrap();

    vidsplit_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("slice_seconds must be a positive integer"))
        .stdout(predicate::str::contains("Container: mkv"));
}

#[test]
fn test_cli_validate_rejects_malformed_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{ not json").unwrap();

    vidsplit_cmd()
        .args(["--config"])
        .arg(&config)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config parse error"));
}

fn make_test_video(path: &Path, seconds: u32) {
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=duration={seconds}:size=64x64:rate=10"))
        .args(["-c:v", "mpeg4", "-g", "10"])
        .arg(path)
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn test_cli_split_real_video() {
    if !ffmpeg_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }

    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    make_test_video(&input, 5);
    let out = dir.path().join("clips");

    let assert = vidsplit_cmd()
        .arg("split")
        .arg(&input)
        .args(["--slice", "2", "--json", "--output-dir"])
        .arg(&out)
        .assert()
        .success();

    let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(report["duration_seconds"], 5);
    assert_eq!(report["slice_seconds"], 2);

    let clips = report["clips"].as_array().unwrap();
    let names: Vec<&str> = clips.iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["output_1.mp4", "output_2.mp4", "output_3.mp4"]);
    for clip in clips {
        let path = out.join(clip["name"].as_str().unwrap());
        let size = fs::metadata(&path).unwrap().len();
        assert!(size > 0);
        assert_eq!(clip["size"], size);
        assert!(clip["reference"].as_str().unwrap().starts_with("sha256:"));
    }
}

#[test]
fn test_cli_split_keeps_source_container() {
    if !ffmpeg_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }

    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mkv");
    make_test_video(&input, 3);
    let out = dir.path().join("clips");

    let assert = vidsplit_cmd()
        .arg("split")
        .arg(&input)
        .args(["--slice", "2", "--json", "--output-dir"])
        .arg(&out)
        .assert()
        .success();

    let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let clips = report["clips"].as_array().unwrap();
    let names: Vec<&str> = clips.iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["output_1.mkv", "output_2.mkv"]);
    assert!(clips.iter().all(|c| c["mime_type"] == "video/x-matroska"));
    assert!(out.join("output_2.mkv").is_file());
}
