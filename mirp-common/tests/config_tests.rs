//! Integration tests for configuration loading and graceful degradation
//!
//! Missing or broken config files never stop the process: the loader warns
//! and falls back to compiled defaults.
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate MIRP_CONFIG are marked with #[serial].

use mirp_common::config::{
    default_config_file, resolve_config_path, RescalePolicy, SyncConfig, CONFIG_ENV_VAR,
};
use mirp_common::time::TimeUnit;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
[series]
fps = 25.0
rescale = "whole_series"

[playback]
analytic_rate_hz = 10.0
reduced_motion = true

[scrub]
drag_threshold_px = 6.0

[overlay]
margin = { top = 10.0, right = 10.0, bottom = 10.0, left = 40.0 }

[transcript]
time_unit = "ms"
epsilon_sec = 0.05

[logging]
level = "debug"
"#,
    );

    let config = SyncConfig::load(file.path()).unwrap();
    assert_eq!(config.series.fps, 25.0);
    assert_eq!(config.series.rescale, RescalePolicy::WholeSeries);
    assert_eq!(config.playback.analytic_rate_hz, 10.0);
    assert!(config.playback.reduced_motion);
    assert_eq!(config.scrub.drag_threshold_px, 6.0);
    assert_eq!(config.overlay.margin.left, 40.0);
    assert_eq!(config.transcript.time_unit, TimeUnit::Milliseconds);
    assert_eq!(config.transcript.epsilon_sec, 0.05);
    assert_eq!(config.logging.level, "debug");

    // Untouched keys keep their defaults
    assert_eq!(config.playback.settle_ms, SyncConfig::default().playback.settle_ms);
}

#[test]
fn test_load_missing_file_is_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(SyncConfig::load(&missing).is_err());
}

#[test]
fn test_load_or_default_survives_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    let config = SyncConfig::load_or_default(Some(&missing));
    assert_eq!(config, SyncConfig::default());
}

#[test]
fn test_load_or_default_survives_broken_file() {
    let file = write_config("[series\nfps = ");
    let config = SyncConfig::load_or_default(Some(file.path()));
    assert_eq!(config, SyncConfig::default());
}

#[test]
fn test_out_of_range_values_are_sanitized() {
    let file = write_config("[series]\nfps = 0.0\n[playback]\nanalytic_rate_hz = -3.0\n");
    let config = SyncConfig::load(file.path()).unwrap();
    assert_eq!(config.series.fps, 30.0);
    assert_eq!(config.playback.analytic_rate_hz, 15.0);
}

#[test]
#[serial]
fn test_env_var_used_when_no_cli_arg() {
    let file = write_config("[scrub]\ndrag_threshold_px = 9.0\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_eq!(resolved.as_deref(), Some(file.path()));
    let config = SyncConfig::load_or_default(None);
    assert_eq!(config.scrub.drag_threshold_px, 9.0);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");
    let cli = PathBuf::from("/from/cli.toml");
    assert_eq!(
        resolve_config_path(Some(&cli), CONFIG_ENV_VAR),
        Some(cli.clone())
    );
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");
    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    // Only the platform file (if this machine has one) may be returned
    assert!(resolved.is_none() || resolved == default_config_file());
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_default_config_file_location() {
    if let Some(path) = default_config_file() {
        assert!(path.ends_with(Path::new("mirp").join("config.toml")));
    }
}
