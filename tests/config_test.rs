//! Config file round-trip test (uses `tempfile` to avoid touching the real
//! home directory's config).

use std::fs;

use consolemux::Config;

#[test]
fn parses_partial_toml_with_defaults() {
    let toml = r#"
        history_size = 250
    "#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.history_size, 250);
    assert!(config.shell.is_none());
}

#[test]
fn round_trips_through_toml() {
    let config = Config {
        history_size: 42,
        shell: Some("/bin/bash".to_string()),
        log_path: "~/.config/cmux/cmux.log".to_string(),
    };
    let serialized = toml::to_string_pretty(&config).unwrap();
    let parsed: Config = toml::from_str(&serialized).unwrap();
    assert_eq!(parsed.history_size, 42);
    assert_eq!(parsed.shell, Some("/bin/bash".to_string()));
}

#[test]
fn save_then_load_uses_written_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = Config {
        history_size: 777,
        shell: None,
        log_path: "~/.config/cmux/cmux.log".to_string(),
    };
    fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
    let contents = fs::read_to_string(&path).unwrap();
    let parsed: Config = toml::from_str(&contents).unwrap();
    assert_eq!(parsed.history_size, 777);
}
