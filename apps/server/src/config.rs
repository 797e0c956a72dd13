//! Application configuration.

use bigdeal_alerts::PollConfig;
use bigdeal_feeds::FeedConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upstream feed settings.
    pub feed: FeedConfig,
    /// Polling settings.
    pub poll: PollConfig,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            poll: PollConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. A missing file yields the defaults; missing
    /// fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval_ms == 0 {
            return Err(ConfigError::Invalid("poll.interval_ms must be positive".into()));
        }
        if !(1..=100).contains(&self.feed.limit) {
            return Err(ConfigError::Invalid("feed.limit must be between 1 and 100".into()));
        }
        if self.feed.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("feed.symbol must not be empty".into()));
        }
        if self.feed.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("feed.base_url must not be empty".into()));
        }
        Ok(())
    }
}

/// Read the bot token from the environment.
pub fn bot_token_from_env() -> Result<String, ConfigError> {
    match std::env::var(BOT_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(ConfigError::MissingToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("bigdeal-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.poll.interval_ms, 1000);
        assert_eq!(config.poll.default_threshold, 500_000);
        assert_eq!(config.feed.symbol, "BTCUSDT");
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("/nonexistent/bigdeal/config.json").unwrap();
        assert_eq!(config.feed.limit, 10);
    }

    #[test]
    fn test_load_partial_file() {
        let path = temp_config(
            "partial",
            r#"{"poll": {"interval_ms": 2500}, "feed": {"symbol": "ETHUSDT"}}"#,
        );
        let config = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.poll.interval_ms, 2500);
        assert_eq!(config.poll.default_threshold, 500_000);
        assert_eq!(config.feed.symbol, "ETHUSDT");
        assert_eq!(config.feed.limit, 10);
    }

    #[test]
    fn test_load_malformed_file() {
        let path = temp_config("malformed", "{ not json");
        let result = AppConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.poll.interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.feed.limit = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.feed.symbol = " ".to_string();
        assert!(config.validate().is_err());
    }
}
