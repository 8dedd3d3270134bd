//! Configuration loaded from `~/.config/cmux/config.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default = "default_log_path")]
    pub log_path: String,
}

fn default_history_size() -> usize {
    5000
}

fn default_log_path() -> String {
    "~/.config/cmux/cmux.log".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            shell: None,
            log_path: default_log_path(),
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("cmux"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Expand a leading `~/` in a path-shaped config field.
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn log_path(&self) -> PathBuf {
        Self::expand_path(&self.log_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.history_size, 5000);
        assert!(config.shell.is_none());
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = Config {
            history_size: 1000,
            shell: Some("/bin/zsh".to_string()),
            log_path: default_log_path(),
        };
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.history_size, config.history_size);
        assert_eq!(parsed.shell, config.shell);
    }

    #[test]
    fn expand_path_expands_tilde() {
        let path = Config::expand_path("~/x/y");
        assert!(!path.to_string_lossy().contains('~'));
        assert!(path.to_string_lossy().ends_with("x/y"));
    }

    #[test]
    fn expand_path_leaves_absolute_paths_alone() {
        let path = Config::expand_path("/tmp/cmux.log");
        assert_eq!(path, PathBuf::from("/tmp/cmux.log"));
    }
}
