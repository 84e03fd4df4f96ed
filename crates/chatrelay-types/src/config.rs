//! Service tunables for chatrelay.
//!
//! `ServiceConfig` collects the knobs that shape the request pipeline:
//! the model call, the dedup window, the store pool, and session pruning.
//! Connection details and secrets are resolved separately by the binary.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Pipeline configuration. Every field has a default, so an empty TOML file
/// is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Model identifier sent to the provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for every generation.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Upper bound on a single provider call, in seconds.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Width of the dedup time bucket, in seconds.
    #[serde(default = "default_dedup_bucket_secs")]
    pub dedup_bucket_secs: u64,

    /// Maximum number of fingerprints held by the dedup cache.
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,

    /// Maximum pooled store connections.
    #[serde(default = "default_pool_max_connections")]
    pub pool_max_connections: u32,

    /// How long a caller waits for a pooled connection, in seconds.
    #[serde(default = "default_pool_acquire_timeout_secs")]
    pub pool_acquire_timeout_secs: u64,

    /// Sessions idle longer than this are dropped from the tracker.
    /// `None` keeps every session for the life of the process.
    #[serde(default)]
    pub session_idle_secs: Option<u64>,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f64 {
    0.5
}

fn default_generation_timeout_secs() -> u64 {
    60
}

fn default_dedup_bucket_secs() -> u64 {
    10
}

fn default_dedup_capacity() -> usize {
    100
}

fn default_pool_max_connections() -> u32 {
    5
}

fn default_pool_acquire_timeout_secs() -> u64 {
    5
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            generation_timeout_secs: default_generation_timeout_secs(),
            dedup_bucket_secs: default_dedup_bucket_secs(),
            dedup_capacity: default_dedup_capacity(),
            pool_max_connections: default_pool_max_connections(),
            pool_acquire_timeout_secs: default_pool_acquire_timeout_secs(),
            session_idle_secs: None,
        }
    }
}

impl ServiceConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(invalid("model", "must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("temperature", "must be between 0 and 2"));
        }
        if self.generation_timeout_secs == 0 {
            return Err(invalid("generation_timeout_secs", "must be positive"));
        }
        if self.dedup_bucket_secs == 0 {
            return Err(invalid("dedup_bucket_secs", "must be positive"));
        }
        if self.dedup_capacity == 0 {
            return Err(invalid("dedup_capacity", "must be positive"));
        }
        if self.pool_max_connections == 0 {
            return Err(invalid("pool_max_connections", "must be positive"));
        }
        if self.session_idle_secs == Some(0) {
            return Err(invalid("session_idle_secs", "must be positive when set"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}
