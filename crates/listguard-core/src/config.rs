//! Process configuration read from the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Switches for whole pipeline stages, applied to every category.
///
/// Category rules still decide what each stage looks for; these only turn
/// a stage on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSettings {
    /// Reject titles carrying a category accessory keyword.
    pub enable_hard_filter: bool,
    /// Escalate titles carrying a soft accessory keyword.
    pub enable_soft_filter: bool,
    pub enable_price_anomaly_detection: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enable_hard_filter: true,
            enable_soft_filter: true,
            enable_price_anomaly_detection: true,
        }
    }
}

impl FilterSettings {
    /// Read overrides from `LISTGUARD_*` variables on top of the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enable_hard_filter: env_parse("LISTGUARD_HARD_FILTER")
                .unwrap_or(defaults.enable_hard_filter),
            enable_soft_filter: env_parse("LISTGUARD_SOFT_FILTER")
                .unwrap_or(defaults.enable_soft_filter),
            enable_price_anomaly_detection: env_parse("LISTGUARD_PRICE_ANOMALY")
                .unwrap_or(defaults.enable_price_anomaly_detection),
        }
    }
}

/// Top-level listguard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListguardConfig {
    /// HTTP server port.
    pub port: u16,
    /// Optional JSON rules file; built-in rules are used when absent.
    pub rules_path: Option<PathBuf>,
    /// Directory holding `escalation.json`.
    pub data_dir: PathBuf,
    pub filters: FilterSettings,
}

impl ListguardConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Self {
        let port = env_parse("PORT").unwrap_or(3010);
        let rules_path = std::env::var("LISTGUARD_RULES").ok().map(PathBuf::from);
        let data_dir = std::env::var("LISTGUARD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        Self {
            port,
            rules_path,
            data_dir,
            filters: FilterSettings::from_env(),
        }
    }

    /// Location of the escalation and adjudicator configuration.
    pub fn escalation_config_path(&self) -> PathBuf {
        self.data_dir.join("escalation.json")
    }
}

/// Parse an environment variable, warning about values that do not parse.
pub fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring unparsable {}={:?}", name, raw);
            None
        }
    }
}
