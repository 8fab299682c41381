//! Config file loading.

use std::fs;
use tempfile::tempdir;
use vidcue::config::{apply_overrides, load_config, load_config_or_default, Config};

#[test]
fn load_full_config() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("vidcue.toml");
    fs::write(
        &path,
        r#"
[api]
base_url = "http://anime.local:5000"
timeout_secs = 3

[probe]
enabled = false

[playback]
engine_available = false
native_adaptive = true

[engine]
max_buffer_length_secs = 60
max_max_buffer_length_secs = 600
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.api.base_url, "http://anime.local:5000");
    assert_eq!(config.api.timeout_secs, 3);
    assert!(!config.probe.enabled);
    assert!(!config.playback.engine_available);
    assert!(config.playback.native_adaptive);
    assert_eq!(config.engine.max_buffer_length_secs, 60);
    assert!(config.validate().is_empty());
}

#[test]
fn empty_file_is_default() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("vidcue.toml");
    fs::write(&path, "").unwrap();

    assert_eq!(load_config(&path).unwrap(), Config::default());
}

#[test]
fn missing_file_is_an_error() {
    let temp = tempdir().unwrap();
    let err = load_config(&temp.path().join("nope.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn explicit_path_wins_over_defaults() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("custom.toml");
    fs::write(&path, "[api]\nbase_url = \"http://10.0.0.2:5000\"\n").unwrap();

    let config = load_config_or_default(Some(&path)).unwrap();
    assert_eq!(config.api.base_url, "http://10.0.0.2:5000");
}

#[test]
fn server_override_trims_slash() {
    let mut config = Config::default();
    apply_overrides(&mut config, Some("http://backend:8000/"));
    assert_eq!(config.api.base_url, "http://backend:8000");

    apply_overrides(&mut config, None);
    assert_eq!(config.api.base_url, "http://backend:8000");
}
