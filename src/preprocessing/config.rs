//! Normalizer configuration

use crate::error::{ListingsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder written into `paint_color` when the color is missing
pub const DEFAULT_UNKNOWN_COLOR: &str = "unknown";

/// Configuration for the listings normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Sentinel string for missing `paint_color`
    pub unknown_color: String,

    /// Fill cells of partitions with no informative values using the
    /// column-wide statistic. Off by default: such cells stay null and are
    /// listed in the report.
    pub global_fallback: bool,

    /// Emit a warning for every partition whose statistic is undefined
    pub warn_unresolved: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            unknown_color: DEFAULT_UNKNOWN_COLOR.to_string(),
            global_fallback: false,
            warn_unresolved: true,
        }
    }
}

impl NormalizerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the unknown-color sentinel
    pub fn with_unknown_color(mut self, sentinel: impl Into<String>) -> Self {
        self.unknown_color = sentinel.into();
        self
    }

    /// Builder method to enable the column-wide fallback statistic
    pub fn with_global_fallback(mut self, enabled: bool) -> Self {
        self.global_fallback = enabled;
        self
    }

    /// Builder method to toggle unresolved-partition warnings
    pub fn with_unresolved_warnings(mut self, enabled: bool) -> Self {
        self.warn_unresolved = enabled;
        self
    }

    /// Check that the color sentinel is usable
    pub fn validate(&self) -> Result<()> {
        if self.unknown_color.trim().is_empty() {
            return Err(ListingsError::ConfigError(
                "unknown_color must be a non-empty string".to_string(),
            ));
        }
        Ok(())
    }

    /// Save the configuration as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NormalizerConfig::default();
        assert_eq!(config.unknown_color, "unknown");
        assert!(!config.global_fallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = NormalizerConfig::new()
            .with_unknown_color("desconocido")
            .with_global_fallback(true)
            .with_unresolved_warnings(false);

        assert_eq!(config.unknown_color, "desconocido");
        assert!(config.global_fallback);
        assert!(!config.warn_unresolved);
    }

    #[test]
    fn test_rejects_blank_color_sentinel() {
        let config = NormalizerConfig::new().with_unknown_color("  ");
        assert!(matches!(config.validate(), Err(ListingsError::ConfigError(_))));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config: NormalizerConfig =
            serde_json::from_str(r#"{"missing_4wd_value": 1.0, "unknown_color": "n/a"}"#).unwrap();
        assert_eq!(config.unknown_color, "n/a");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NormalizerConfig = serde_json::from_str(r#"{"global_fallback": true}"#).unwrap();
        assert!(config.global_fallback);
        assert_eq!(config.unknown_color, DEFAULT_UNKNOWN_COLOR);
    }

    #[test]
    fn test_save_and_load() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = NormalizerConfig::new().with_unknown_color("n/a");
        config.save(file.path()).unwrap();

        let loaded = NormalizerConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
