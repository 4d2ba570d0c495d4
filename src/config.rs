use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a probe group is issued and when it gives up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Probes per group.
    pub pings_per_call: u32,
    /// Window the probes of one group are spread across.
    pub wait_ms: u64,
    /// Per-probe timeout honoured by the probe issuer.
    pub timeout_ms: u64,
    /// End the group once this many timeouts occur back to back.
    pub report_after_consecutive_timeouts: u32,
    /// ICMP payload size in bytes.
    pub packet_size: usize,
    /// How long a resolved target address is reused.
    pub dns_ttl_secs: u64,
    /// Stop the job after this many groups; run until stopped when unset.
    pub group_limit: Option<u32>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            pings_per_call: 60,
            wait_ms: 60_000,
            timeout_ms: 4_000,
            report_after_consecutive_timeouts: 5,
            packet_size: 32,
            dns_ttl_secs: 300,
            group_limit: None,
        }
    }
}

impl BehaviorConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Ceilings above which a finished group is flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub minimum_ping: u64,
    pub average_ping: f64,
    pub maximum_ping: u64,
    pub jitter: f64,
    /// Percent.
    pub packet_loss: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            minimum_ping: 50,
            average_ping: 100.0,
            maximum_ping: 250,
            jitter: 30.0,
            packet_loss: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target: String,
    pub behavior: BehaviorConfig,
    pub thresholds: ThresholdConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target: "8.8.8.8".to_string(),
            behavior: BehaviorConfig::default(),
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("PingAgent");

        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join("config.json"))
    }

    /// Read the config file, falling back to defaults when it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::get_config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        Self::from_json(&content)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {e}");
            Self::default()
        })
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::get_config_path()?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.trim().is_empty() {
            return Err(ConfigError::invalid("target must not be empty"));
        }
        let behavior = &self.behavior;
        if behavior.pings_per_call == 0 {
            return Err(ConfigError::invalid("pings_per_call must be at least 1"));
        }
        if behavior.wait_ms == 0 {
            return Err(ConfigError::invalid("wait_ms must be greater than 0"));
        }
        if behavior.timeout_ms == 0 {
            return Err(ConfigError::invalid("timeout_ms must be greater than 0"));
        }
        if behavior.report_after_consecutive_timeouts == 0 {
            return Err(ConfigError::invalid(
                "report_after_consecutive_timeouts must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_in_defaults() {
        let config = AppConfig::from_json(r#"{"target": "1.1.1.1", "behavior": {"pings_per_call": 4}}"#)
            .unwrap();
        assert_eq!(config.target, "1.1.1.1");
        assert_eq!(config.behavior.pings_per_call, 4);
        assert_eq!(config.behavior.wait_ms, BehaviorConfig::default().wait_ms);
        assert_eq!(config.thresholds, ThresholdConfig::default());
    }

    #[test]
    fn zero_probe_budget_is_rejected() {
        let err = AppConfig::from_json(r#"{"behavior": {"pings_per_call": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_timeout_threshold_is_rejected() {
        let mut config = AppConfig::default();
        config.behavior.report_after_consecutive_timeouts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            AppConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
