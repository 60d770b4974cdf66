use std::time::Duration;

use crate::outbox::RetryPolicy;

// ============================================================================
// Outbox Configuration
// ============================================================================
//
// Tunables for the outbox pipeline. Defaults match the documented behaviour
// (1s poll, batches of 10, 3 attempts, 1s base backoff); every value can be
// overridden from the environment.
//
// ============================================================================

pub const ENV_POLL_INTERVAL_MS: &str = "TABB_OUTBOX_POLL_INTERVAL_MS";
pub const ENV_BATCH_SIZE: &str = "TABB_OUTBOX_BATCH_SIZE";
pub const ENV_MAX_RETRIES: &str = "TABB_OUTBOX_MAX_RETRIES";
pub const ENV_BASE_DELAY_SECS: &str = "TABB_OUTBOX_BASE_DELAY_SECS";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboxConfig {
    /// Sleep between worker iterations
    pub poll_interval: Duration,
    /// Maximum entries fetched per processing pass
    pub batch_size: usize,
    /// Retry policy stamped onto newly created entries
    pub retry_policy: RetryPolicy,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 10,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl OutboxConfig {
    /// Load from process environment, falling back to defaults for unset keys
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let poll_interval = match parse::<u64>(&lookup, ENV_POLL_INTERVAL_MS)? {
            Some(0) => return Err(invalid(ENV_POLL_INTERVAL_MS, "0")),
            Some(ms) => Duration::from_millis(ms),
            None => defaults.poll_interval,
        };

        let batch_size = match parse::<usize>(&lookup, ENV_BATCH_SIZE)? {
            Some(0) => return Err(invalid(ENV_BATCH_SIZE, "0")),
            Some(n) => n,
            None => defaults.batch_size,
        };

        let max_retries = parse::<u32>(&lookup, ENV_MAX_RETRIES)?
            .unwrap_or(defaults.retry_policy.max_retries());
        let base_delay = parse::<u32>(&lookup, ENV_BASE_DELAY_SECS)?
            .unwrap_or(defaults.retry_policy.base_delay_seconds());

        let retry_policy = RetryPolicy::new(max_retries, base_delay)
            .map_err(|_| invalid(ENV_MAX_RETRIES, &max_retries.to_string()))?;

        Ok(Self {
            poll_interval,
            batch_size,
            retry_policy,
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(key, &raw)),
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}
