//! Integration tests for the mount-rosetta binary

use std::process::Command;

/// Helper to run mount-rosetta with an isolated config location
fn mount_rosetta(args: &[&str], home: &std::path::Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_mount-rosetta"))
        .args(args)
        .env("HOME", home)
        .env_remove("ROSETTAFS_CONFIG")
        .env_remove("ROSETTAFS_LOG_LEVEL")
        .env_remove("ROSETTAFS_BINFMT_NAME")
        .output()
        .expect("Failed to execute mount-rosetta")
}

#[test]
fn test_missing_binary_fails_fast() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("rosetta");

    let output = mount_rosetta(&[missing.to_str().unwrap()], home.path());
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Rosetta binary not found"));
}

#[test]
fn test_directory_is_not_a_binary() {
    let home = tempfile::tempdir().unwrap();

    let output = mount_rosetta(&[home.path().to_str().unwrap()], home.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Rosetta binary not found"));
}

#[test]
fn test_print_config_outputs_toml() {
    let home = tempfile::tempdir().unwrap();

    let output = mount_rosetta(&["--print-config"], home.path());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("[logging]"));
    assert!(stdout.contains("[binfmt]"));
    assert!(stdout.contains("[mount]"));
}

#[test]
fn test_print_config_reads_config_file() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("custom.toml");
    std::fs::write(&config, "[binfmt]\nname = \"rosetta-custom\"\n").unwrap();

    let output = mount_rosetta(
        &["--config", config.to_str().unwrap(), "--print-config"],
        home.path(),
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("rosetta-custom"));
}

#[test]
fn test_invalid_log_level_rejected() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("custom.toml");
    std::fs::write(&config, "[logging]\nlevel = \"chatty\"\n").unwrap();

    let output = mount_rosetta(&["--config", config.to_str().unwrap(), "/bin/sh"], home.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid log level"));
}
