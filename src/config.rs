//! Environment-driven configuration for the binaries.
//!
//! Values that fail to parse fall back to their default with a warning.
//! Values that parse but can never work are rejected.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::http::rate_limit::RateLimitConfig;
use crate::pipeline::{IngestConfig, SweepFailurePolicy};
use crate::retention::DEFAULT_SWEEP_PROBABILITY;
use crate::storage::{Channel, DEFAULT_STORAGE_TIMEOUT};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_EXPIRATION_MINUTES: i64 = 1440;
const DEFAULT_RATE_WINDOW_SECS: i64 = 60;

const DEFAULT_TARGET_URL: &str = "http://localhost:3000/api/vercel/load-test";
const DEFAULT_PERIOD_MS: u64 = 1000;
const DEFAULT_BATCH_SIZE: usize = 9;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: i64 },

    #[error("invalid channel entry {0:?}, expected <id> or <id>:<minutes>")]
    InvalidChannel(String),
}

/// Read `name` through `lookup`, parsing it as `T`.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                log::warn!("CONFIG_INVALID var={} value={:?} error={}", name, raw, e);
                default
            }
        },
    }
}

/// Settings for `ingest-server`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub storage_timeout: Duration,
    pub sweep_probability: f64,
    pub sweep_failure_policy: SweepFailurePolicy,
    /// `None` disables limiting and the `x-ratelimit-*` headers.
    pub rate_limit: Option<RateLimitConfig>,
    /// Channels registered with the in-memory store at startup.
    pub channels: Vec<Channel>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_var(&lookup, "INGEST_PORT", DEFAULT_PORT);
        let timeout_ms = parse_var(
            &lookup,
            "INGEST_STORAGE_TIMEOUT_MS",
            DEFAULT_STORAGE_TIMEOUT.as_millis() as u64,
        );
        if timeout_ms == 0 {
            return Err(ConfigError::Zero {
                name: "INGEST_STORAGE_TIMEOUT_MS",
            });
        }

        let sweep_probability = parse_var(
            &lookup,
            "INGEST_SWEEP_PROBABILITY",
            DEFAULT_SWEEP_PROBABILITY,
        );
        if !(0.0..=1.0).contains(&sweep_probability) {
            return Err(ConfigError::ProbabilityOutOfRange {
                name: "INGEST_SWEEP_PROBABILITY",
                value: sweep_probability,
            });
        }

        let sweep_failure_policy =
            parse_var(&lookup, "INGEST_SWEEP_FAILURES", SweepFailurePolicy::default());

        let limit = parse_var(&lookup, "INGEST_RATE_LIMIT", 0u64);
        let window_secs = parse_var(&lookup, "INGEST_RATE_WINDOW_SECS", DEFAULT_RATE_WINDOW_SECS);
        if limit > 0 && window_secs <= 0 {
            return Err(ConfigError::Zero {
                name: "INGEST_RATE_WINDOW_SECS",
            });
        }
        let rate_limit = (limit > 0).then(|| RateLimitConfig {
            limit,
            window: chrono::Duration::seconds(window_secs),
        });

        let default_expiration = parse_var(
            &lookup,
            "INGEST_DEFAULT_EXPIRATION_MIN",
            DEFAULT_EXPIRATION_MINUTES,
        );
        if default_expiration < 0 {
            return Err(ConfigError::Negative {
                name: "INGEST_DEFAULT_EXPIRATION_MIN",
                value: default_expiration,
            });
        }
        let channels = match lookup("INGEST_CHANNELS") {
            Some(raw) => parse_channels(&raw, default_expiration)?,
            None => Vec::new(),
        };

        Ok(Self {
            port,
            storage_timeout: Duration::from_millis(timeout_ms),
            sweep_probability,
            sweep_failure_policy,
            rate_limit,
            channels,
        })
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            storage_timeout: self.storage_timeout,
            sweep_failure_policy: self.sweep_failure_policy,
        }
    }
}

/// Parse `id[:minutes]` entries separated by commas.
pub fn parse_channels(raw: &str, default_expiration: i64) -> Result<Vec<Channel>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            None => Ok(Channel::new(entry, default_expiration)),
            Some((id, minutes)) if !id.is_empty() => minutes
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|m| *m >= 0)
                .map(|m| Channel::new(id, m))
                .ok_or_else(|| ConfigError::InvalidChannel(entry.to_string())),
            Some(_) => Err(ConfigError::InvalidChannel(entry.to_string())),
        })
        .collect()
}

/// Settings for `load-harness`.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub target_url: String,
    pub period: Duration,
    pub batch_size: usize,
    /// Body sent with every request.
    pub payload: String,
    pub request_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            period: Duration::from_millis(DEFAULT_PERIOD_MS),
            batch_size: DEFAULT_BATCH_SIZE,
            payload: default_payload(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let period_ms = parse_var(&lookup, "HARNESS_PERIOD_MS", DEFAULT_PERIOD_MS);
        if period_ms == 0 {
            return Err(ConfigError::Zero {
                name: "HARNESS_PERIOD_MS",
            });
        }
        let batch_size = parse_var(&lookup, "HARNESS_BATCH_SIZE", DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(ConfigError::Zero {
                name: "HARNESS_BATCH_SIZE",
            });
        }

        Ok(Self {
            target_url: lookup("HARNESS_TARGET_URL").unwrap_or(defaults.target_url),
            period: Duration::from_millis(period_ms),
            batch_size,
            payload: lookup("HARNESS_PAYLOAD").unwrap_or(defaults.payload),
            request_timeout: defaults.request_timeout,
        })
    }
}

/// A single valid event, so every request exercises the full write path.
fn default_payload() -> String {
    serde_json::json!([{
        "id": "load-harness",
        "deploymentId": "dpl_load_harness",
        "source": "load-harness",
        "host": "localhost",
        "timestamp": chrono::Utc::now().timestamp_millis(),
        "projectId": "prj_load_harness",
        "level": "warn",
        "message": "hello",
        "type": "text"
    }])
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage_timeout, Duration::from_secs(5));
        assert_eq!(config.sweep_probability, 0.05);
        assert_eq!(config.sweep_failure_policy, SweepFailurePolicy::Swallow);
        assert!(config.rate_limit.is_none());
        assert!(config.channels.is_empty());
    }

    #[test]
    fn test_server_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("INGEST_PORT", "8080"),
            ("INGEST_SWEEP_FAILURES", "surface"),
            ("INGEST_RATE_LIMIT", "100"),
            ("INGEST_RATE_WINDOW_SECS", "30"),
            ("INGEST_CHANNELS", "c1:60, c2"),
            ("INGEST_DEFAULT_EXPIRATION_MIN", "15"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.sweep_failure_policy, SweepFailurePolicy::Surface);
        assert_eq!(
            config.rate_limit,
            Some(RateLimitConfig {
                limit: 100,
                window: chrono::Duration::seconds(30)
            })
        );
        assert_eq!(
            config.channels,
            vec![Channel::new("c1", 60), Channel::new("c2", 15)]
        );
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[("INGEST_PORT", "eighty")])).unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_probability_out_of_range() {
        let err = ServerConfig::from_lookup(lookup(&[("INGEST_SWEEP_PROBABILITY", "1.5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ProbabilityOutOfRange { .. }));
    }

    #[test]
    fn test_negative_default_expiration() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("INGEST_DEFAULT_EXPIRATION_MIN", "-5"),
            ("INGEST_CHANNELS", "c1"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Negative {
                name: "INGEST_DEFAULT_EXPIRATION_MIN",
                value: -5
            }
        );
    }

    #[test]
    fn test_bad_channel_entry() {
        assert_eq!(
            parse_channels("c1:soon", 10),
            Err(ConfigError::InvalidChannel("c1:soon".to_string()))
        );
        assert!(parse_channels(":5", 10).is_err());
        assert_eq!(parse_channels("", 10), Ok(vec![]));
    }

    #[test]
    fn test_harness_defaults() {
        let config = HarnessConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.period, Duration::from_millis(1000));
        assert_eq!(config.batch_size, 9);
        let payload: serde_json::Value = serde_json::from_str(&config.payload).unwrap();
        assert!(crate::validation::validate_batch(&payload).is_ok());
    }

    #[test]
    fn test_harness_rejects_zero_batch() {
        let err = HarnessConfig::from_lookup(lookup(&[("HARNESS_BATCH_SIZE", "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Zero {
                name: "HARNESS_BATCH_SIZE"
            }
        );
    }
}
