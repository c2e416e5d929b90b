use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Coinbase Advanced Trade REST root.
pub const DEFAULT_COINBASE_BASE_URL: &str = "https://api.coinbase.com";

/// All configuration loaded from environment variables at startup.
/// A missing or empty credential is a configuration error: no pass may run.
#[derive(Clone)]
pub struct Config {
    // Coinbase credentials are checked at startup; the market routes are public.
    pub coinbase_api_key: String,
    pub coinbase_secret: String,
    pub coinbase_base_url: String,

    // Telegram
    pub telegram_bot_key: String,
    pub telegram_chat_id: String,

    // Pass behaviour
    /// Delay after every per-asset external call.
    pub pacing: Duration,
    /// Per-request timeout for market data calls.
    pub http_timeout: Duration,

    /// TOML scan definitions. Built-in scans are used when unset.
    pub scan_config_path: Option<PathBuf>,
    /// Append-only plain-text run log. Disabled when unset.
    pub run_log_path: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("coinbase_api_key", &"<redacted>")
            .field("coinbase_secret", &"<redacted>")
            .field("coinbase_base_url", &self.coinbase_base_url)
            .field("telegram_bot_key", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("pacing", &self.pacing)
            .field("http_timeout", &self.http_timeout)
            .field("scan_config_path", &self.scan_config_path)
            .field("run_log_path", &self.run_log_path)
            .finish()
    }
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            match lookup(key).map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(Error::Config(format!(
                    "required environment variable '{key}' is not set. Check your .env file."
                ))),
            }
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let pacing_ms = match optional("PACING_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::Config(format!("PACING_MS must be an integer, got '{raw}'")))?,
            None => 1_000,
        };
        let timeout_secs = match optional("HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(Error::Config(format!(
                        "HTTP_TIMEOUT_SECS must be a positive integer, got '{raw}'"
                    )))
                }
            },
            None => 10,
        };

        Ok(Config {
            coinbase_api_key: required("COINBASE_API_KEY")?,
            coinbase_secret: required("COINBASE_SECRET_KEY")?,
            coinbase_base_url: optional("COINBASE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COINBASE_BASE_URL.to_string()),
            telegram_bot_key: required("TELEGRAM_BOT_KEY")?,
            telegram_chat_id: required("TELEGRAM_CHAT_ID")?,
            pacing: Duration::from_millis(pacing_ms),
            http_timeout: Duration::from_secs(timeout_secs),
            scan_config_path: optional("SCAN_CONFIG_PATH").map(PathBuf::from),
            run_log_path: optional("RUN_LOG_PATH").map(PathBuf::from),
        })
    }
}
