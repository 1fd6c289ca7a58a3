// Configuration file loading tests

use overseer::config::OverlayConfig;
use overseer::error::OverseerError;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_minimal_toml_applies_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "overseer.toml",
        r#"
engine_path = "/opt/cslol/mod-tools"
game_dir = "/games/league/Game"
profile_dir = "/data/profiles/Default"
status_path = "/data/mod-status.json"
"#,
    );

    let config = OverlayConfig::from_file(&path).unwrap();

    assert_eq!(config.engine_path, PathBuf::from("/opt/cslol/mod-tools"));
    assert_eq!(config.engine_name, "mod-tools");
    assert_eq!(
        config.startup_marker,
        "Status: Waiting for league match to start"
    );
    assert_eq!(config.startup_timeout_secs, 15);
    assert_eq!(config.launcher_hint, "run_overlay");
    assert_eq!(config.restart_settle_ms, 250);
    assert_eq!(config.orphan_settle_ms, 200);
    assert!(config.cwd.is_none());
}

#[test]
fn test_load_full_toml_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "overseer.toml",
        r#"
engine_path = "/opt/engine/overlay"
engine_name = "overlay"
game_dir = "/games/Game"
profile_dir = "/profiles/Main"
status_path = "/var/run/overlay-status.json"
cwd = "/opt/engine"
startup_marker = "READY"
startup_timeout_secs = 5
launcher_hint = "launch_overlay"
restart_settle_ms = 100
orphan_settle_ms = 100
"#,
    );

    let config = OverlayConfig::from_file(&path).unwrap();

    assert_eq!(config.engine_name, "overlay");
    assert_eq!(config.startup_marker, "READY");
    assert_eq!(config.startup_timeout_secs, 5);
    assert_eq!(config.cwd, Some(PathBuf::from("/opt/engine")));
    assert_eq!(config.working_dir(), Some(PathBuf::from("/opt/engine")));
}

#[test]
fn test_load_json_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "overseer.json",
        r#"{
  "engine_path": "/opt/cslol/mod-tools",
  "game_dir": "/games/league/Game",
  "profile_dir": "/data/profiles/Default",
  "status_path": "/data/mod-status.json",
  "startup_timeout_secs": 30
}"#,
    );

    let config = OverlayConfig::from_file(&path).unwrap();
    assert_eq!(config.startup_timeout_secs, 30);
    assert_eq!(config.engine_name, "mod-tools");
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "overseer.yaml", "engine_path: /opt/engine");

    let result = OverlayConfig::from_file(&path);
    assert!(matches!(
        result.unwrap_err(),
        OverseerError::InvalidConfig(_)
    ));
}

#[test]
fn test_missing_file_is_a_config_error() {
    let result = OverlayConfig::from_file(&PathBuf::from("/no/such/overseer.toml"));
    assert!(matches!(result.unwrap_err(), OverseerError::ConfigError(_)));
}

#[test]
fn test_missing_required_field_fails_parse() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "overseer.toml",
        r#"
game_dir = "/games/league/Game"
profile_dir = "/data/profiles/Default"
status_path = "/data/mod-status.json"
"#,
    );

    let result = OverlayConfig::from_file(&path);
    assert!(matches!(
        result.unwrap_err(),
        OverseerError::InvalidConfig(_)
    ));
}

#[test]
fn test_empty_marker_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "overseer.toml",
        r#"
engine_path = "/opt/cslol/mod-tools"
game_dir = "/games/league/Game"
profile_dir = "/data/profiles/Default"
status_path = "/data/mod-status.json"
startup_marker = ""
"#,
    );

    let result = OverlayConfig::from_file(&path);
    assert!(matches!(
        result.unwrap_err(),
        OverseerError::MissingConfigField(field) if field == "startup_marker"
    ));
}
