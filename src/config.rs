//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (host:port)
    pub bind_address: String,

    /// Log level
    pub log_level: String,

    /// Public update-check rate limit (requests per window)
    pub public_rate_limit: u32,

    /// Public update-check rate limit window in milliseconds
    pub public_rate_window_ms: u64,

    /// Admin API rate limit (requests per window)
    pub admin_rate_limit: u32,

    /// Admin API rate limit window in milliseconds
    pub admin_rate_window_ms: u64,

    /// CI artifact-upload rate limit (requests per window)
    pub ci_rate_limit: u32,

    /// CI artifact-upload rate limit window in milliseconds
    pub ci_rate_window_ms: u64,

    /// Interval between rate-limiter purge sweeps in milliseconds
    pub rate_sweep_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            public_rate_limit: env_u32("PUBLIC_RATE_LIMIT", 60),
            public_rate_window_ms: env_u64("PUBLIC_RATE_WINDOW_MS", 60_000),
            admin_rate_limit: env_u32("ADMIN_RATE_LIMIT", 100),
            admin_rate_window_ms: env_u64("ADMIN_RATE_WINDOW_MS", 60_000),
            ci_rate_limit: env_u32("CI_RATE_LIMIT", 30),
            ci_rate_window_ms: env_u64("CI_RATE_WINDOW_MS", 60_000),
            rate_sweep_interval_ms: env_u64("RATE_SWEEP_INTERVAL_MS", 60_000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".into(),
            log_level: "info".into(),
            public_rate_limit: 60,
            public_rate_window_ms: 60_000,
            admin_rate_limit: 100,
            admin_rate_window_ms: 60_000,
            ci_rate_limit: 30,
            ci_rate_window_ms: 60_000,
            rate_sweep_interval_ms: 60_000,
        }
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
