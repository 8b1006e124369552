//! Configuration types
//!
//! `ProcessorSettings` is the frozen per-run configuration of the batch
//! processor. `SyncConfig` is the YAML file the CLI host reads, wrapping the
//! settings together with cursor, HTTP and polling options.

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::{max_commit_timestamp, min_commit_timestamp, BackoffType, CommitTimestamp};
use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public NuGet service index
pub const DEFAULT_SERVICE_INDEX_URL: &str = "https://api.nuget.org/v3/index.json";

/// Pages processed per invocation
pub const DEFAULT_BATCH_SIZE: usize = 12;

/// Concurrency slots per available processing unit
pub const CONCURRENCY_PER_CPU: usize = 8;

// ============================================================================
// Processor Settings
// ============================================================================

/// Settings of the batch catalog processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSettings {
    /// URL of the feed's service index
    #[serde(default = "default_service_index_url")]
    pub service_index_url: String,

    /// Window floor; a cursor below it is moved up to it
    #[serde(default = "min_commit_timestamp")]
    pub min_commit_timestamp: CommitTimestamp,

    /// Window ceiling (inclusive)
    #[serde(default = "max_commit_timestamp")]
    pub max_commit_timestamp: CommitTimestamp,

    /// Lower bound used only when no cursor has been persisted
    #[serde(default)]
    pub default_min_commit_timestamp: Option<CommitTimestamp>,

    /// Drop leaves superseded by a later leaf of the same package in a page
    #[serde(default)]
    pub exclude_redundant_leaves: bool,

    /// Maximum pages per invocation
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent page and leaf fetches
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_service_index_url() -> String {
    DEFAULT_SERVICE_INDEX_URL.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_concurrency() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get) * CONCURRENCY_PER_CPU
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            service_index_url: DEFAULT_SERVICE_INDEX_URL.to_string(),
            min_commit_timestamp: min_commit_timestamp(),
            max_commit_timestamp: max_commit_timestamp(),
            default_min_commit_timestamp: None,
            exclude_redundant_leaves: false,
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl ProcessorSettings {
    /// Create settings for a service index
    pub fn new(service_index_url: impl Into<String>) -> Self {
        Self {
            service_index_url: service_index_url.into(),
            ..Self::default()
        }
    }

    /// Set the window floor
    #[must_use]
    pub fn with_min_commit_timestamp(mut self, value: CommitTimestamp) -> Self {
        self.min_commit_timestamp = value;
        self
    }

    /// Set the window ceiling
    #[must_use]
    pub fn with_max_commit_timestamp(mut self, value: CommitTimestamp) -> Self {
        self.max_commit_timestamp = value;
        self
    }

    /// Set the lower bound used when there is no cursor
    #[must_use]
    pub fn with_default_min_commit_timestamp(mut self, value: CommitTimestamp) -> Self {
        self.default_min_commit_timestamp = Some(value);
        self
    }

    /// Enable or disable redundant leaf exclusion
    #[must_use]
    pub fn with_exclude_redundant_leaves(mut self, exclude: bool) -> Self {
        self.exclude_redundant_leaves = exclude;
        self
    }

    /// Set the page batch size
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the concurrency gate capacity
    #[must_use]
    pub fn with_max_concurrency(mut self, capacity: usize) -> Self {
        self.max_concurrency = capacity;
        self
    }

    /// Whether a ceiling other than "unbounded" is configured
    pub fn has_ceiling(&self) -> bool {
        self.max_commit_timestamp != max_commit_timestamp()
    }

    /// Check the settings before a processor is built
    pub fn validate(&self) -> Result<()> {
        if self.service_index_url.trim().is_empty() {
            return Err(Error::missing_field("service_index_url"));
        }
        url::Url::parse(&self.service_index_url)?;

        if self.batch_size == 0 {
            return Err(Error::invalid_value("batch_size", "must be at least 1"));
        }
        if self.max_concurrency == 0 {
            return Err(Error::invalid_value(
                "max_concurrency",
                "must be at least 1",
            ));
        }
        if self.min_commit_timestamp >= self.max_commit_timestamp {
            return Err(Error::invalid_value(
                "max_commit_timestamp",
                "must be later than min_commit_timestamp",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Host Config File
// ============================================================================

/// HTTP options of the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff strategy
    #[serde(default)]
    pub backoff: BackoffType,

    /// Optional request rate limit
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            rate_limit: None,
            user_agent: None,
        }
    }
}

impl HttpSettings {
    /// Build the HTTP client configuration
    pub fn client_config(&self) -> HttpClientConfig {
        let defaults = HttpClientConfig::default();
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .backoff(self.backoff, defaults.initial_backoff, defaults.max_backoff);
        if let Some(rate_limit) = &self.rate_limit {
            builder = builder.rate_limit(rate_limit.clone());
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }
}

/// Config file of the CLI host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Processor settings
    #[serde(default)]
    pub settings: ProcessorSettings,

    /// Cursor file; an in-memory cursor is used when absent
    #[serde(default)]
    pub cursor: Option<PathBuf>,

    /// HTTP options
    #[serde(default)]
    pub http: HttpSettings,

    /// Pause between invocations in `run` mode
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Start this many hours back when there is no cursor (0 = from the floor)
    #[serde(default)]
    pub previous_hours: u32,

    /// Package URL template for emitted operations
    #[serde(default)]
    pub package_url_template: Option<String>,
}

fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settings: ProcessorSettings::default(),
            cursor: None,
            http: HttpSettings::default(),
            poll_interval_secs: default_poll_interval_secs(),
            previous_hours: 0,
            package_url_template: None,
        }
    }
}

impl SyncConfig {
    /// Load a config file (YAML or JSON)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse a config document; YAML is a superset of JSON so both work
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Processor settings with `previous_hours` applied
    ///
    /// A non-zero `previous_hours` moves the no-cursor start point to that
    /// many hours before `now`, unless a default start was configured.
    pub fn effective_settings(&self, now: CommitTimestamp) -> ProcessorSettings {
        let mut settings = self.settings.clone();
        if self.previous_hours > 0 && settings.default_min_commit_timestamp.is_none() {
            settings.default_min_commit_timestamp =
                Some(now - ChronoDuration::hours(i64::from(self.previous_hours)));
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ProcessorSettings::default();
        assert_eq!(settings.service_index_url, DEFAULT_SERVICE_INDEX_URL);
        assert_eq!(settings.batch_size, 12);
        assert!(settings.max_concurrency >= CONCURRENCY_PER_CPU);
        assert!(!settings.exclude_redundant_leaves);
        assert!(!settings.has_ceiling());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_builder() {
        let settings = ProcessorSettings::new("https://example.org/v3/index.json")
            .with_min_commit_timestamp(ts("2020-01-01T00:00:00Z"))
            .with_max_commit_timestamp(ts("2030-01-01T00:00:00Z"))
            .with_default_min_commit_timestamp(ts("2024-01-01T00:00:00Z"))
            .with_exclude_redundant_leaves(true)
            .with_batch_size(3)
            .with_max_concurrency(2);

        assert_eq!(settings.batch_size, 3);
        assert_eq!(settings.max_concurrency, 2);
        assert!(settings.exclude_redundant_leaves);
        assert!(settings.has_ceiling());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validate_missing_url() {
        let err = ProcessorSettings::new("  ").validate().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { .. }));
    }

    #[test]
    fn test_settings_validate_bad_url() {
        let err = ProcessorSettings::new("not a url").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_settings_validate_zero_sizes() {
        let base = ProcessorSettings::new("https://example.org/v3/index.json");
        assert!(base.clone().with_batch_size(0).validate().is_err());
        assert!(base.with_max_concurrency(0).validate().is_err());
    }

    #[test]
    fn test_settings_validate_inverted_window() {
        let err = ProcessorSettings::new("https://example.org/v3/index.json")
            .with_min_commit_timestamp(ts("2024-01-02T00:00:00Z"))
            .with_max_commit_timestamp(ts("2024-01-01T00:00:00Z"))
            .validate()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_sync_config_from_yaml() {
        let config = SyncConfig::from_yaml(
            r#"
settings:
  service_index_url: https://example.org/v3/index.json
  min_commit_timestamp: "2024-01-01T00:00:00Z"
  exclude_redundant_leaves: true
  batch_size: 4
cursor: state/cursor.json
http:
  timeout_secs: 10
  rate_limit:
    requests_per_second: 5
    burst_size: 5
poll_interval_secs: 30
previous_hours: 6
"#,
        )
        .unwrap();

        assert_eq!(config.settings.batch_size, 4);
        assert!(config.settings.exclude_redundant_leaves);
        assert_eq!(
            config.settings.min_commit_timestamp,
            ts("2024-01-01T00:00:00Z")
        );
        assert_eq!(config.cursor, Some(PathBuf::from("state/cursor.json")));
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.previous_hours, 6);

        let http = config.http.client_config();
        assert_eq!(http.timeout, Duration::from_secs(10));
        assert!(http.rate_limit.is_some());
    }

    #[test]
    fn test_sync_config_empty_document_uses_defaults() {
        let config = SyncConfig::from_yaml("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn test_effective_settings_previous_hours() {
        let now = ts("2024-01-02T00:00:00Z");
        let config = SyncConfig {
            previous_hours: 24,
            ..SyncConfig::default()
        };

        let settings = config.effective_settings(now);
        assert_eq!(
            settings.default_min_commit_timestamp,
            Some(ts("2024-01-01T00:00:00Z"))
        );

        let explicit = SyncConfig {
            previous_hours: 24,
            settings: ProcessorSettings::default()
                .with_default_min_commit_timestamp(ts("2020-01-01T00:00:00Z")),
            ..SyncConfig::default()
        };
        assert_eq!(
            explicit.effective_settings(now).default_min_commit_timestamp,
            Some(ts("2020-01-01T00:00:00Z"))
        );
    }
}
