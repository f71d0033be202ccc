//! Engine configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{EngineOptions, RelayMode, RepeatPolicy};
use crate::util::retry::RetryPolicy;

/// Notification store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationBackendConfig {
    /// In-memory store for development/testing.
    #[default]
    InMemory,
    /// JSON-lines file under `data_dir`.
    File,
}

/// Caller-side retry settings for transient store failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Backoff cap in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 50,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryConfig {
    /// Convert into a runtime policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Answer to repeated terminal transitions.
    pub repeat_decision: RepeatPolicy,
    /// Notification backend.
    pub notifications: NotificationBackendConfig,
    /// Directory for file-backed stores.
    pub data_dir: Option<String>,
    /// Stream name used in file names.
    pub stream: String,
    /// How events reach the fan-out.
    pub relay: RelayMode,
    /// Outbox events read per batch.
    pub relay_batch_size: usize,
    /// Background relay polling interval in milliseconds.
    pub relay_idle_ms: u64,
    /// Page size for recent notifications.
    pub recent_limit: usize,
    /// Retry settings.
    pub retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            repeat_decision: RepeatPolicy::NoOp,
            notifications: NotificationBackendConfig::InMemory,
            data_dir: None,
            stream: "default".into(),
            relay: RelayMode::Inline,
            relay_batch_size: 64,
            relay_idle_ms: 500,
            recent_limit: 10,
            retry: RetryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.relay_batch_size == 0 {
            return Err("relay_batch_size must be greater than 0".into());
        }
        if self.relay_idle_ms == 0 {
            return Err("relay_idle_ms must be greater than 0".into());
        }
        if self.recent_limit == 0 {
            return Err("recent_limit must be greater than 0".into());
        }
        if self.stream.trim().is_empty() {
            return Err("stream must not be empty".into());
        }
        if self.notifications == NotificationBackendConfig::File && self.data_dir.is_none() {
            return Err("file notification backend requires data_dir".into());
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err("retry.initial_delay_ms must not exceed retry.max_delay_ms".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `MATCH_*` environment variables, loading a `.env`
    /// file first if one exists. Unset variables keep their defaults.
    ///
    /// Recognized: `MATCH_REPEAT_DECISION`, `MATCH_NOTIFICATIONS`, `MATCH_DATA_DIR`,
    /// `MATCH_STREAM`, `MATCH_RELAY`, `MATCH_RELAY_BATCH_SIZE`, `MATCH_RELAY_IDLE_MS`,
    /// `MATCH_RECENT_LIMIT`, `MATCH_RETRY_MAX`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the variable that failed to parse, or a
    /// validation message.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`EngineConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut cfg = Self::default();
        if let Some(v) = lookup("MATCH_REPEAT_DECISION") {
            cfg.repeat_decision = parse_enum("MATCH_REPEAT_DECISION", &v)?;
        }
        if let Some(v) = lookup("MATCH_NOTIFICATIONS") {
            cfg.notifications = parse_enum("MATCH_NOTIFICATIONS", &v)?;
        }
        if let Some(v) = lookup("MATCH_DATA_DIR") {
            cfg.data_dir = Some(v);
        }
        if let Some(v) = lookup("MATCH_STREAM") {
            cfg.stream = v;
        }
        if let Some(v) = lookup("MATCH_RELAY") {
            cfg.relay = parse_enum("MATCH_RELAY", &v)?;
        }
        if let Some(v) = lookup("MATCH_RELAY_BATCH_SIZE") {
            cfg.relay_batch_size = parse_num("MATCH_RELAY_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("MATCH_RELAY_IDLE_MS") {
            cfg.relay_idle_ms = parse_num("MATCH_RELAY_IDLE_MS", &v)?;
        }
        if let Some(v) = lookup("MATCH_RECENT_LIMIT") {
            cfg.recent_limit = parse_num("MATCH_RECENT_LIMIT", &v)?;
        }
        if let Some(v) = lookup("MATCH_RETRY_MAX") {
            cfg.retry.max_retries = parse_num("MATCH_RETRY_MAX", &v)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Engine tunables derived from this configuration.
    #[must_use]
    pub const fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            repeat: self.repeat_decision,
            relay_mode: self.relay,
            relay_batch_size: self.relay_batch_size,
            recent_limit: self.recent_limit,
        }
    }

    /// Background relay polling interval.
    #[must_use]
    pub const fn relay_idle(&self) -> Duration {
        Duration::from_millis(self.relay_idle_ms)
    }
}

fn parse_enum<T: serde::de::DeserializeOwned>(key: &str, value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase()))
        .map_err(|e| format!("{key}: {e}"))
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| format!("{key}: {e}"))
}
