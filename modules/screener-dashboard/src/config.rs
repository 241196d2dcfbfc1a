use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use screener_client::DEFAULT_TIMEOUT;

const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000";

/// Dashboard configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Scheme, host and port of the API server; `/api` is appended per request.
    pub api_origin: String,
    pub timeout: Duration,
    /// Tag outgoing requests with `X-Request-Id`.
    pub request_ids: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_origin: DEFAULT_ORIGIN.to_string(),
            timeout: DEFAULT_TIMEOUT,
            request_ids: false,
        }
    }
}

impl Config {
    /// Load from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let timeout = match env::var("SCREENER_TIMEOUT_MS") {
            Ok(raw) => Duration::from_millis(
                raw.trim()
                    .parse()
                    .with_context(|| format!("SCREENER_TIMEOUT_MS must be a number, got {raw:?}"))?,
            ),
            Err(_) => DEFAULT_TIMEOUT,
        };

        let config = Self {
            api_origin: env::var("SCREENER_API_ORIGIN")
                .map(|s| s.trim().to_string())
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            timeout,
            request_ids: env::var("SCREENER_REQUEST_IDS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false),
        };

        config.log_summary();
        Ok(config)
    }

    fn log_summary(&self) {
        info!(
            api_origin = self.api_origin.as_str(),
            timeout_ms = self.timeout.as_millis() as u64,
            request_ids = self.request_ids,
            "Config loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_transport_defaults() {
        let config = Config::default();
        assert_eq!(config.api_origin, "http://127.0.0.1:8000");
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert!(!config.request_ids);
    }
}
