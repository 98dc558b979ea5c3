//! Navigator configuration.
//!
//! Loaded from `settings.toml` in the platform config directory. Every field
//! has a default, so a partial file (or none at all) is valid:
//!
//! ```toml
//! recent_capacity = 5
//! search_min_chars = 2
//! debounce_ms = 300
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "settings.toml";

/// Tunables for one navigator session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Maximum number of recent codes remembered.
    pub recent_capacity: usize,
    /// Maximum number of favorite codes remembered.
    pub favorite_capacity: usize,
    /// Query length (in characters) at which the widget switches to search.
    pub search_min_chars: usize,
    /// Quiet period after the last keystroke before a search is issued.
    pub debounce_ms: u64,
    /// Maximum hits requested per search.
    pub search_limit: usize,
    /// Timeout applied to root/children fetches. 0 disables it.
    pub fetch_timeout_ms: u64,
    /// Timeout applied to search requests. 0 disables it.
    pub search_timeout_ms: u64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            recent_capacity: 5,
            favorite_capacity: 5,
            search_min_chars: 2,
            debounce_ms: 300,
            search_limit: 20,
            fetch_timeout_ms: 10_000,
            search_timeout_ms: 10_000,
        }
    }
}

impl NavigatorConfig {
    /// Load from the default path, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, falling back to defaults when the file is missing or
    /// cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let config = match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<NavigatorConfig>(&content) {
                Ok(config) => {
                    tracing::info!("Loaded navigator settings from {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file found at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        };
        config.normalized()
    }

    /// Save to `path`, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write settings: {}", e))
    }

    /// Default config file path.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "TariffNavigator", "tariff-navigator")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
    }

    /// Clamp capacities and the search threshold to at least 1.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for (name, value) in [
            ("recent_capacity", &mut self.recent_capacity),
            ("favorite_capacity", &mut self.favorite_capacity),
            ("search_min_chars", &mut self.search_min_chars),
            ("search_limit", &mut self.search_limit),
        ] {
            if *value == 0 {
                tracing::warn!("{} must be positive, using 1", name);
                *value = 1;
            }
        }
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_ms > 0).then(|| Duration::from_millis(self.fetch_timeout_ms))
    }

    pub fn search_timeout(&self) -> Option<Duration> {
        (self.search_timeout_ms > 0).then(|| Duration::from_millis(self.search_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "debounce_ms = 150\n").unwrap();

        let config = NavigatorConfig::load_from(&path);
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.recent_capacity, 5);
        assert_eq!(config.search_min_chars, 2);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config = NavigatorConfig {
            recent_capacity: 0,
            search_min_chars: 0,
            ..NavigatorConfig::default()
        }
        .normalized();
        assert_eq!(config.recent_capacity, 1);
        assert_eq!(config.search_min_chars, 1);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "debounce_ms = \"soon\"").unwrap();
        assert_eq!(NavigatorConfig::load_from(&path), NavigatorConfig::default());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("settings.toml");
        let config = NavigatorConfig {
            search_limit: 50,
            fetch_timeout_ms: 0,
            ..NavigatorConfig::default()
        };
        config.save_to(&path).unwrap();
        let loaded = NavigatorConfig::load_from(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.fetch_timeout(), None);
    }
}
