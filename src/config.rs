//! Configuration loading and validation

use crate::error::{Error, Result};
use serde::Deserialize;

/// Top-level configuration, loaded from a TOML file with
/// `SCANNER__`-prefixed environment overrides
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub indodax: IndodaxConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

/// Detection engine parameters. All static for the process lifetime.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Seconds between scan cycles
    pub poll_interval_secs: u64,
    /// Minimum quote volume for a pair to be admitted into history
    pub min_quote_volume: f64,
    /// Per-pair history window capacity
    pub history_len: usize,
    /// Minimum seconds between two alerts for the same pair
    pub cooldown_secs: i64,
    /// Minimum priority for a candidate to be dispatched
    pub alert_threshold: f64,
    /// Signal store capacity, most recent first
    pub max_signals: usize,
    /// Quote-currency suffix a pair key must carry to be scanned
    pub quote_suffix: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            min_quote_volume: 1_000_000.0,
            history_len: 12,
            cooldown_secs: 240,
            alert_threshold: 6.0,
            max_signals: 20,
            quote_suffix: "idr".to_string(),
        }
    }
}

/// Upstream API endpoints and request policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndodaxConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for IndodaxConfig {
    fn default() -> Self {
        Self {
            base_url: "https://indodax.com/api".to_string(),
            timeout_secs: 6,
            retries: 3,
            retry_delay_ms: 300,
            user_agent: "Mozilla/5.0 (compatible; IndodaxScanner/2.0)".to_string(),
        }
    }
}

/// Signals API bind address
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Outbound alert channel credentials
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(default = "default_true")]
    pub notify_signals: bool,
    #[serde(default = "default_true")]
    pub notify_startup: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from `path` (optional) layered with environment
    /// variables, e.g. `SCANNER__TELEGRAM__BOT_TOKEN`.
    pub fn load(path: &str) -> Result<Config> {
        let path = shellexpand::tilde(path);
        let raw = config::Config::builder()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("SCANNER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Config = raw.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Startup-time validation. This is the only fatal error class in the
    /// service; everything past startup degrades per cycle instead.
    pub fn validate(&self) -> Result<()> {
        if let Some(telegram) = &self.telegram {
            if telegram.bot_token.is_empty() || telegram.chat_id.is_empty() {
                return Err(Error::InvalidConfig(
                    "telegram.bot_token and telegram.chat_id must both be set".to_string(),
                ));
            }
        }
        if self.scanner.poll_interval_secs == 0 {
            return Err(Error::InvalidConfig(
                "scanner.poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.scanner.history_len < 2 {
            return Err(Error::InvalidConfig(
                "scanner.history_len must be at least 2".to_string(),
            ));
        }
        if self.scanner.max_signals == 0 {
            return Err(Error::InvalidConfig(
                "scanner.max_signals must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
