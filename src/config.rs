//! Filter configuration.
//!
//! Defaults reproduce the behavior shipped in the browser extension. Hosts
//! can override any field from TOML:
//!
//! ```toml
//! storage_key = "bettercodex_selected_repo"
//! ignored_exact_labels = ["Repositories", "Environments"]
//! ignored_partial_labels = ["configure", "manage"]
//! init_delay_ms = 1000
//! observer_delay_ms = 1500
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Storage slot used by every released version of the extension.
pub const DEFAULT_STORAGE_KEY: &str = "bettercodex_selected_repo";

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Tunables for catalog seeding, persistence and lifecycle timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Key of the single local storage slot holding the active terms.
    pub storage_key: String,

    /// Selector-widget labels that are section headers, not repositories.
    /// Compared case-insensitively against the whole label.
    pub ignored_exact_labels: Vec<String>,

    /// Substrings marking action entries ("Configure…", "Manage…").
    /// Compared case-insensitively.
    pub ignored_partial_labels: Vec<String>,

    /// Wait before the first init, letting the host finish rendering.
    pub init_delay_ms: u64,

    /// Wait before attaching the row observer, measured from the same start.
    pub observer_delay_ms: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            ignored_exact_labels: vec![
                "Umgebungen".into(),
                "Repositorys".into(),
                "Environments".into(),
                "Repositories".into(),
            ],
            ignored_partial_labels: vec![
                "konfigurieren".into(),
                "verwalten".into(),
                "configure".into(),
                "manage".into(),
            ],
            init_delay_ms: 1000,
            observer_delay_ms: 1500,
        }
    }
}

impl FilterConfig {
    /// Parse and validate configuration from TOML text. Missing fields fall
    /// back to the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns the defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storage_key cannot be empty".into(),
            ));
        }
        if self.observer_delay_ms < self.init_delay_ms {
            return Err(ConfigError::Validation(format!(
                "observer_delay_ms ({}) must not be shorter than init_delay_ms ({})",
                self.observer_delay_ms, self.init_delay_ms
            )));
        }
        if self
            .ignored_partial_labels
            .iter()
            .any(|label| label.trim().is_empty())
        {
            // An empty substring would exclude every label.
            return Err(ConfigError::Validation(
                "ignored_partial_labels cannot contain empty entries".into(),
            ));
        }
        Ok(())
    }

    pub fn init_delay(&self) -> Duration {
        Duration::from_millis(self.init_delay_ms)
    }

    pub fn observer_delay(&self) -> Duration {
        Duration::from_millis(self.observer_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FilterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.init_delay(), Duration::from_millis(1000));
        assert_eq!(config.observer_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = FilterConfig::from_toml_str("init_delay_ms = 200\nobserver_delay_ms = 300\n")
            .expect("parse");
        assert_eq!(config.init_delay_ms, 200);
        assert_eq!(config.observer_delay_ms, 300);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert!(config.ignored_partial_labels.contains(&"manage".to_string()));
    }

    #[test]
    fn observer_before_init_is_rejected() {
        let err = FilterConfig::from_toml_str("init_delay_ms = 900\nobserver_delay_ms = 100\n")
            .expect_err("should fail");
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn empty_storage_key_is_rejected() {
        let err = FilterConfig::from_toml_str("storage_key = \"  \"\n").expect_err("should fail");
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn empty_partial_label_is_rejected() {
        let err = FilterConfig::from_toml_str("ignored_partial_labels = [\"\"]\n")
            .expect_err("should fail");
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let config = FilterConfig::load_from(&tmp.path().join("absent.toml")).expect("load");
        assert_eq!(config, FilterConfig::default());
    }

    #[test]
    fn load_from_reads_file() {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let path = tmp.path().join("filter.toml");
        std::fs::write(&path, "storage_key = \"custom_slot\"\n").expect("write");
        let config = FilterConfig::load_from(&path).expect("load");
        assert_eq!(config.storage_key, "custom_slot");
    }
}
