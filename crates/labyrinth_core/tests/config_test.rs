//! Tests for loading game configuration from TOML files.

use labyrinth_core::{ConfigErrorKind, GameConfig};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config("prepare_delay_ms = 1500\nseed = 7\n");

    let config = GameConfig::from_file(file.path()).unwrap();

    assert_eq!(config, GameConfig::new(Some(1500), Some(7)));
    assert_eq!(config.prepare_delay(), Some(Duration::from_millis(1500)));
}

#[test]
fn test_missing_keys_default_to_none() {
    let file = write_config("");

    let config = GameConfig::from_file(file.path()).unwrap();

    assert_eq!(config, GameConfig::default());
    assert_eq!(config.prepare_delay(), None);
}

#[test]
fn test_malformed_config_is_rejected() {
    let file = write_config("prepare_delay_ms = \"soon\"\n");

    let err = GameConfig::from_file(file.path()).unwrap_err();

    assert_eq!(err.kind, ConfigErrorKind::Parse);
    assert_eq!(err.path, file.path().display().to_string());
}

#[test]
fn test_unknown_key_is_rejected() {
    let file = write_config("prepare_delay = 100\n");

    let err = GameConfig::from_file(file.path()).unwrap_err();

    assert_eq!(err.kind, ConfigErrorKind::Parse);
    assert!(err.message.contains("prepare_delay"));
}

#[test]
fn test_missing_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let err = GameConfig::from_file(dir.path().join("absent.toml")).unwrap_err();

    assert_eq!(err.kind, ConfigErrorKind::Read);
    assert!(err.to_string().starts_with("Config read error in"));
}
