//! Session configuration.

use serde::{Deserialize, Serialize};

/// Configuration for dialogue traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Reading speed used for text-timed rows.
    pub chars_per_second: f32,

    /// Maximum number of automatic hops (Start advances and Return jumps)
    /// taken by one call. Guards against Return loops.
    pub max_auto_steps: usize,

    /// Whether finishing emits `CloseDialogueWidget`.
    pub close_on_finish: bool,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            chars_per_second: 15.0,
            max_auto_steps: 64,
            close_on_finish: true,
        }
    }
}

impl TraversalConfig {
    /// Parse a configuration from TOML. Missing fields keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config = TraversalConfig::from_toml_str("max_auto_steps = 8").unwrap();
        assert_eq!(config.max_auto_steps, 8);
        assert_eq!(config.chars_per_second, 15.0);
        assert!(config.close_on_finish);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(TraversalConfig::from_toml_str("").unwrap(), TraversalConfig::default());
    }

    #[test]
    fn test_wrong_type() {
        assert!(TraversalConfig::from_toml_str("close_on_finish = 3").is_err());
    }
}
