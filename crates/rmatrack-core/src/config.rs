use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::links::DeepLinkConfig;
use crate::overdue::OverdueThresholds;
use crate::reconcile::DEFAULT_MAX_CATCH_UP_DAYS;

/// Tracker settings, loadable from a TOML file. Every field has a default
/// matching the production dashboard, so a missing or partial file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub thresholds: OverdueThresholds,
    pub deep_links: DeepLinkConfig,
    pub max_catch_up_days: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            thresholds: OverdueThresholds::default(),
            deep_links: DeepLinkConfig::default(),
            max_catch_up_days: DEFAULT_MAX_CATCH_UP_DAYS,
        }
    }
}

impl TrackerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: TrackerConfig = toml::from_str(
            r#"
            max_catch_up_days = 7

            [thresholds]
            send_days = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.max_catch_up_days, 7);
        assert_eq!(config.thresholds.send_days, 5);
        assert_eq!(config.thresholds.reminder_days, 2);
        assert_eq!(config.deep_links, DeepLinkConfig::default());
    }

    #[test]
    fn empty_toml_is_the_default_config() {
        let config: TrackerConfig = toml::from_str("").unwrap();
        assert_eq!(config, TrackerConfig::default());
    }
}
