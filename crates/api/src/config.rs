//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `7000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `HEALTH_TIMEOUT_MS` — per-probe budget for the aggregated health check,
///   in milliseconds (default: `1000`); a backing service that does not answer
///   within the budget is reported DOWN
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub health_timeout: Duration,
}

const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 1_000;

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(7000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            health_timeout: Duration::from_millis(
                std::env::var("HEALTH_TIMEOUT_MS")
                    .ok()
                    .and_then(|ms| ms.parse().ok())
                    .unwrap_or(DEFAULT_HEALTH_TIMEOUT_MS),
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7000,
            log_level: "info".to_string(),
            health_timeout: Duration::from_millis(DEFAULT_HEALTH_TIMEOUT_MS),
        }
    }
}
