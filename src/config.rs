//! Environment-driven configuration.
//!
//! All addresses and lifetimes consumed by the core are named environment
//! variables with local-development defaults. A `.env` file is honored when
//! present.

use chrono::Duration;

use crate::error::{CoreError, Result};

/// Default backend address for local development
const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:8000";

/// Default Redis address for local development
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// Access token lifetime in minutes.
/// Backend-issued JWTs expire after ~30 minutes.
const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 30;

/// Refresh token lifetime in days. The session store TTL matches this so
/// stale sessions self-expire without explicit cleanup.
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_base_url: String,
    pub redis_url: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub request_timeout: std::time::Duration,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let backend_base_url = std::env::var("BACKEND_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());

        let access_minutes = parse_env_i64("ACCESS_TOKEN_TTL_MINUTES")?
            .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_MINUTES);
        let refresh_days =
            parse_env_i64("REFRESH_TOKEN_TTL_DAYS")?.unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_DAYS);
        let timeout_secs = parse_env_i64("REQUEST_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS as i64);

        if access_minutes <= 0 || refresh_days <= 0 || timeout_secs <= 0 {
            return Err(CoreError::Config(
                "Token lifetimes and timeouts must be positive".to_string(),
            ));
        }

        Ok(Self {
            backend_base_url,
            redis_url,
            access_token_ttl: Duration::minutes(access_minutes),
            refresh_token_ttl: Duration::days(refresh_days),
            request_timeout: std::time::Duration::from_secs(timeout_secs as u64),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_base_url: DEFAULT_BACKEND_BASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            access_token_ttl: Duration::minutes(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            refresh_token_ttl: Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
            request_timeout: std::time::Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

fn parse_env_i64(name: &str) -> Result<Option<i64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| CoreError::Config(format!("{name} must be an integer, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}
