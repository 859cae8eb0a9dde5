//! Configuration management.
//!
//! Handles loading and saving the optional `config.toml` that lives next to
//! the vault file. Command-line flags always take precedence over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default timeout for `run` in seconds (no timeout when unset)
    pub default_timeout_secs: Option<u64>,

    /// Editor used by `edit` when `$EDITOR` is unset
    pub editor: Option<String>,
}

impl Config {
    /// Configuration file name, resolved relative to the vault directory.
    pub const FILE_NAME: &'static str = "config.toml";

    /// Path of the config file that accompanies the given vault file.
    pub fn path_for_vault(vault_path: &Path) -> PathBuf {
        match vault_path.parent() {
            Some(dir) => dir.join(Self::FILE_NAME),
            None => PathBuf::from(Self::FILE_NAME),
        }
    }

    /// Load configuration for the given vault, falling back to defaults when
    /// no file exists.
    pub fn load_for_vault(vault_path: &Path) -> anyhow::Result<Self> {
        Self::load_from_file(&Self::path_for_vault(vault_path))
    }

    /// Load configuration from a specific file, or defaults if it is absent.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a specific file.
    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let config = Config::load_from_file(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(config.default_timeout_secs.is_none());
        assert!(config.editor.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config { default_timeout_secs: Some(120), editor: Some("nano".to_string()) };
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.default_timeout_secs, Some(120));
        assert_eq!(loaded.editor.as_deref(), Some("nano"));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_timeout_secs = 30\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.default_timeout_secs, Some(30));
        assert!(config.editor.is_none());
    }

    #[test]
    fn test_path_for_vault() {
        let path = Config::path_for_vault(Path::new("data/vault.json"));
        assert_eq!(path, PathBuf::from("data/config.toml"));
    }
}
