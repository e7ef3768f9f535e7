/// Configuration management for Engagement Service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration, absent when running on the in-memory store
    pub database: Option<DatabaseConfig>,
    /// Coordinator tuning
    pub engagement: EngagementConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Emit JSON logs instead of the human-readable format
    pub json_logs: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Engagement coordinator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementConfig {
    /// Window after a like/share settles during which further like/share calls are ignored
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Upper bound on a single store call; unset means wait indefinitely
    pub store_timeout_ms: Option<u64>,
    /// Buffered notices per subscriber
    #[serde(default = "default_notice_capacity")]
    pub notice_capacity: usize,
}

// Default values
fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_cooldown_ms() -> u64 {
    450
}

fn default_notice_capacity() -> usize {
    16
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            store_timeout_ms: None,
            notice_capacity: default_notice_capacity(),
        }
    }
}

impl EngagementConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        let database = match std::env::var("DATABASE_URL") {
            Ok(url) => Some(DatabaseConfig {
                url,
                max_connections: std::env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_connections),
                min_connections: std::env::var("DB_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_min_connections),
            }),
            Err(_) => None,
        };

        let engagement = EngagementConfig {
            cooldown_ms: parse_optional("ENGAGEMENT_COOLDOWN_MS")?
                .unwrap_or_else(default_cooldown_ms),
            store_timeout_ms: parse_optional("ENGAGEMENT_STORE_TIMEOUT_MS")?,
            notice_capacity: parse_optional("NOTICE_CAPACITY")?
                .unwrap_or_else(default_notice_capacity),
        };

        if engagement.notice_capacity == 0 {
            anyhow::bail!("NOTICE_CAPACITY must be greater than zero");
        }

        Ok(Config {
            app,
            database,
            engagement,
        })
    }

    /// Database settings, failing when `DATABASE_URL` was not provided
    pub fn require_database(&self) -> Result<&DatabaseConfig> {
        self.database
            .as_ref()
            .context("DATABASE_URL environment variable not set")
    }
}

fn parse_optional<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} is not a valid value: {:?}", key, raw)),
        Err(_) => Ok(None),
    }
}
