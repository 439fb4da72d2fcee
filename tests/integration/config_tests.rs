//! Configuration layering: defaults < TOML file < environment < CLI flags.

use clap::Parser;
use data_symmetry::cli::Cli;
use data_symmetry::config::{Config, ConfigError};
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all DS_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("DS_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_defaults_without_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    let config = Config::load_from_path(None).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_toml_file_overrides_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "scan_workers = 3\nhash_workers = 7\nread_buffer_kib = 128\nverify_size = false\n",
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.scan_workers, 3);
    assert_eq!(config.hash_workers, 7);
    assert_eq!(config.read_buffer_kib, 128);
    assert!(!config.verify_size);
    assert!(!config.follow_symlinks);
}

#[test]
fn test_missing_default_file_is_fine() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    let config = Config::load_from_path(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.hash_workers, 32);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    let result = Config::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "hash_workers = 7\n").unwrap();
    std::env::set_var("DS_HASH_WORKERS", "5");
    std::env::set_var("DS_FOLLOW_SYMLINKS", "true");

    let config = Config::load(Some(&path));
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.hash_workers, 5);
    assert!(config.follow_symlinks);
}

#[test]
fn test_cli_overrides_env() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    std::env::set_var("DS_SCAN_WORKERS", "2");

    let config = Config::load_from_path(None);
    clear_env();
    let mut config = config.unwrap();
    assert_eq!(config.scan_workers, 2);

    let cli = Cli::try_parse_from([
        "ds",
        "--scan-workers",
        "6",
        "twincheck",
        "-a",
        "/x",
        "-b",
        "/y",
    ])
    .unwrap();
    config.merge_cli(&cli);

    assert_eq!(config.scan_workers, 6);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_values_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    fs::write(&path, "scan_workers = 0\n").unwrap();
    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Invalid {
            field: "scan_workers",
            ..
        })
    ));

    fs::write(&path, "read_buffer_kib = 1048576\n").unwrap();
    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Invalid {
            field: "read_buffer_kib",
            ..
        })
    ));

    fs::write(&path, "hash_workers = \"many\"\n").unwrap();
    assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Parse(_))));
}
