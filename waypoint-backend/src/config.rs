use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;

/// Application configuration with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    /// Request body size limit in bytes
    /// Env: REQUEST_BODY_LIMIT (default: 4194304 = 4MB)
    /// Full-server snapshots are much larger than ordinary requests
    pub request_body_limit: usize,

    /// Request timeout in seconds
    /// Env: REQUEST_TIMEOUT_SECS (default: 30)
    pub request_timeout: Duration,

    /// Server port
    /// Env: PORT (default: 3000)
    pub port: u16,

    /// Directory holding one history file per player
    /// Env: HISTORY_DIR (default: "history")
    pub history_dir: String,

    /// Shared secret pollers must send as a bearer token
    /// Env: INGEST_TOKEN (optional, ingestion is open when unset)
    pub ingest_token: Option<String>,

    /// Rate limit for snapshot ingestion (requests per second)
    /// Env: RATE_LIMIT_INGEST_PER_SEC (default: 10)
    pub rate_limit_ingest_per_sec: u64,

    /// Burst size for snapshot ingestion
    /// Env: RATE_LIMIT_INGEST_BURST (default: 20)
    pub rate_limit_ingest_burst: u32,

    /// Rate limit for read endpoints (requests per second)
    /// Env: RATE_LIMIT_GENERAL_PER_SEC (default: 10)
    pub rate_limit_general_per_sec: u64,

    /// Burst size for read endpoints
    /// Env: RATE_LIMIT_GENERAL_BURST (default: 20)
    pub rate_limit_general_burst: u32,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let _ = dotenv(); //for debugging mostly
        Self {
            request_body_limit: env_or_default("REQUEST_BODY_LIMIT", 4 * 1024 * 1024),
            request_timeout: Duration::from_secs(env_or_default("REQUEST_TIMEOUT_SECS", 30)),
            port: env_or_default("PORT", 3000),
            history_dir: env_or_default_string("HISTORY_DIR", "history"),
            ingest_token: var("INGEST_TOKEN").ok().filter(|token| !token.is_empty()),
            rate_limit_ingest_per_sec: env_or_default("RATE_LIMIT_INGEST_PER_SEC", 10),
            rate_limit_ingest_burst: env_or_default("RATE_LIMIT_INGEST_BURST", 20),
            rate_limit_general_per_sec: env_or_default("RATE_LIMIT_GENERAL_PER_SEC", 10),
            rate_limit_general_burst: env_or_default("RATE_LIMIT_GENERAL_BURST", 20),
        }
    }

    /// Create configuration with all default values
    pub fn default() -> Self {
        Self {
            request_body_limit: 4 * 1024 * 1024, // 4 MB
            request_timeout: Duration::from_secs(30),
            port: 3000,
            history_dir: "history".to_string(),
            ingest_token: None,
            rate_limit_ingest_per_sec: 10,
            rate_limit_ingest_burst: 20,
            rate_limit_general_per_sec: 10,
            rate_limit_general_burst: 20,
        }
    }

    /// Rate limits as consumed by the router
    pub fn rate_limit(&self) -> crate::RateLimitConfig {
        crate::RateLimitConfig {
            ingest_per_sec: self.rate_limit_ingest_per_sec,
            ingest_burst: self.rate_limit_ingest_burst,
            general_per_sec: self.rate_limit_general_per_sec,
            general_burst: self.rate_limit_general_burst,
        }
    }
}

/// Parse environment variable or return default value
fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

/// Parse environment variable string or return default value
fn env_or_default_string(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.request_body_limit, 4 * 1024 * 1024);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.port, 3000);
        assert_eq!(config.history_dir, "history");
        assert!(config.ingest_token.is_none());
        assert_eq!(config.rate_limit_ingest_per_sec, 10);
        assert_eq!(config.rate_limit_ingest_burst, 20);
        assert_eq!(config.rate_limit_general_per_sec, 10);
        assert_eq!(config.rate_limit_general_burst, 20);
    }

    #[test]
    fn test_rate_limit_mirrors_config() {
        let mut config = Config::default();
        config.rate_limit_ingest_burst = 3;
        let limits = config.rate_limit();
        assert_eq!(limits.ingest_per_sec, 10);
        assert_eq!(limits.ingest_burst, 3);
        assert_eq!(limits.general_burst, 20);
    }
}
