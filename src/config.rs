// =============================================================================
// Bot Configuration — JSON-backed settings with atomic save
// =============================================================================
//
// Every field carries a serde default so that loading an older config file
// never breaks when new fields are added. Persistence uses a tmp + rename
// write to prevent corruption on crash.
// =============================================================================

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_rest_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_remote_trigger_bind() -> String {
    "tcp://0.0.0.0:21913".to_string()
}

fn default_candle_window() -> usize {
    500
}

fn default_algorithm_timeout_secs() -> u64 {
    300
}

// =============================================================================
// BotConfig
// =============================================================================

/// Top-level configuration for a `TradingBot` instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Client API key; also scopes the order events subscription.
    #[serde(default)]
    pub api_key: String,

    /// Secret used for REST request signing. Never logged.
    #[serde(default)]
    pub api_secret: String,

    /// Base URL of the Order Manager REST API.
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,

    /// Data feed topics to snapshot and subscribe to.
    #[serde(default)]
    pub data_feed_topics: Vec<String>,

    /// Subset of topics whose messages are eligible to trigger the algorithm.
    #[serde(default)]
    pub trigger_topics: Vec<String>,

    /// Whether to run the remote trigger gateway.
    #[serde(default)]
    pub allow_remote_triggering: bool,

    /// Endpoint the remote trigger gateway binds to.
    #[serde(default = "default_remote_trigger_bind")]
    pub remote_trigger_bind: String,

    /// Trailing window kept per candle topic.
    #[serde(default = "default_candle_window")]
    pub candle_window: usize,

    /// Hard cap on a single algorithm run, in seconds. `0` disables the cap.
    #[serde(default = "default_algorithm_timeout_secs")]
    pub algorithm_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            rest_base_url: default_rest_base_url(),
            data_feed_topics: Vec::new(),
            trigger_topics: Vec::new(),
            allow_remote_triggering: false,
            remote_trigger_bind: default_remote_trigger_bind(),
            candle_window: default_candle_window(),
            algorithm_timeout_secs: default_algorithm_timeout_secs(),
        }
    }
}

impl BotConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read bot config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse bot config from {}", path.display()))?;

        info!(
            path = %path.display(),
            topics = ?config.data_feed_topics,
            trigger_topics = ?config.trigger_topics,
            "bot config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise bot config")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "bot config saved (atomic)");
        Ok(())
    }

    /// Algorithm run cap as a `Duration`; `None` when disabled.
    pub fn algorithm_timeout(&self) -> Option<Duration> {
        (self.algorithm_timeout_secs > 0).then(|| Duration::from_secs(self.algorithm_timeout_secs))
    }

    /// Trigger topics as a lookup set.
    pub fn trigger_topic_set(&self) -> HashSet<String> {
        self.trigger_topics.iter().cloned().collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = BotConfig::default();
        assert_eq!(cfg.rest_base_url, "http://localhost:8080");
        assert_eq!(cfg.remote_trigger_bind, "tcp://0.0.0.0:21913");
        assert_eq!(cfg.candle_window, 500);
        assert_eq!(cfg.algorithm_timeout_secs, 300);
        assert!(!cfg.allow_remote_triggering);
        assert!(cfg.data_feed_topics.is_empty());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: BotConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.candle_window, 500);
        assert_eq!(cfg.algorithm_timeout_secs, 300);
        assert!(!cfg.allow_remote_triggering);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "api_key": "k",
            "data_feed_topics": ["book:BTC/USD"],
            "trigger_topics": ["book:BTC/USD"],
            "allow_remote_triggering": true
        }"#;
        let cfg: BotConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.api_key, "k");
        assert_eq!(cfg.data_feed_topics, vec!["book:BTC/USD"]);
        assert!(cfg.allow_remote_triggering);
        assert_eq!(cfg.rest_base_url, "http://localhost:8080");
    }

    #[test]
    fn zero_timeout_disables_the_cap() {
        let mut cfg = BotConfig::default();
        assert_eq!(cfg.algorithm_timeout(), Some(Duration::from_secs(300)));
        cfg.algorithm_timeout_secs = 0;
        assert_eq!(cfg.algorithm_timeout(), None);
    }

    #[test]
    fn roundtrip_serialisation() {
        let mut cfg = BotConfig::default();
        cfg.trigger_topics = vec!["trades:BTC/USD".into()];
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: BotConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.trigger_topics, cfg2.trigger_topics);
        assert_eq!(cfg.candle_window, cfg2.candle_window);
    }
}
