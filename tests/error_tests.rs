//! Failure paths of the binary: bad config input and an unreachable backend

use std::process::Command;

use tempfile::TempDir;

struct Run {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// Runs `memento` with a throwaway config home and no credentials from the environment
fn run(args: &[&str]) -> Run {
    let home = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_memento"))
        .args(args)
        .env("XDG_CONFIG_HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("MEMENTO_SERVER_URL")
        .env_remove("MEMENTO_ACCESS_TOKEN")
        .output()
        .unwrap();

    Run {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

#[test]
fn unknown_key_is_rejected_for_get_and_set() {
    for args in [
        &["config", "get", "unknown_key"][..],
        &["config", "set", "unknown_key", "value"][..],
    ] {
        let out = run(args);
        assert_ne!(out.code, Some(0));
        assert!(
            out.stderr.contains("Unknown") && out.stderr.contains("server_url"),
            "{:?}: {}",
            args,
            out.stderr
        );
    }
}

#[test]
fn set_explains_each_invalid_value() {
    let cases = [
        ("max_duration", "forever", "Invalid duration"),
        ("server_url", "diary.example.com", "http://"),
        ("notify", "maybe", "true/false"),
        ("cache_dir", "", "must not be empty"),
    ];
    for (key, value, hint) in cases {
        let out = run(&["config", "set", key, value]);
        assert_eq!(out.code, Some(1), "{} = {:?}", key, value);
        assert!(out.stderr.contains(hint), "{}: {}", key, out.stderr);
    }
}

#[test]
fn list_without_a_file_shows_every_key_unset() {
    let out = run(&["config", "list"]);
    assert_eq!(out.code, Some(0));
    for key in ["server_url", "access_token", "cache_dir", "max_duration", "notify"] {
        assert!(out.stdout.contains(key), "{}", out.stdout);
    }
    assert_eq!(out.stdout.matches("(not set)").count(), 5);
}

#[test]
fn unreachable_backend_is_an_error() {
    // Nothing listens on the discard port
    let out = run(&[
        "--server-url",
        "http://127.0.0.1:9",
        "diary",
        "show",
        "2024-05-17",
    ]);
    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("request failed"), "{}", out.stderr);
}
