//! Application configuration structures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::PortalSelectors;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Portal endpoint and request settings
    #[serde(default)]
    pub portal: PortalConfig,

    /// Attempt bounds and backoff policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-subject scheduling
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Snapshot location and overwrite guard
    #[serde(default)]
    pub storage: StorageConfig,

    /// Console output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults only when the file is
    /// missing. A file that exists but does not parse is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("Config file {:?} not found. Using defaults.", path);
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.portal.base_url.trim().is_empty() {
            return Err(AppError::config("portal.base_url is empty"));
        }
        url::Url::parse(&self.portal.base_url)?;
        if self.portal.user_agent.trim().is_empty() {
            return Err(AppError::config("portal.user_agent is empty"));
        }
        if self.portal.session_cookie.trim().is_empty() {
            return Err(AppError::config("portal.session_cookie is empty"));
        }
        if self.portal.timeout_secs == 0 {
            return Err(AppError::config("portal.timeout_secs must be > 0"));
        }
        if self.retry.table_attempts == 0 {
            return Err(AppError::config("retry.table_attempts must be > 0"));
        }
        if self.retry.discovery_attempts == 0 {
            return Err(AppError::config("retry.discovery_attempts must be > 0"));
        }
        if self.retry.export_attempts == 0 {
            return Err(AppError::config("retry.export_attempts must be > 0"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(AppError::config("retry.backoff_multiplier must be >= 1.0"));
        }
        if self.retry.max_backoff_ms < self.retry.initial_backoff_ms {
            return Err(AppError::config(
                "retry.max_backoff_ms must be >= retry.initial_backoff_ms",
            ));
        }
        if self.collector.max_concurrent == 0 {
            return Err(AppError::config("collector.max_concurrent must be > 0"));
        }
        if self.storage.guard.max_drop_percent > 100 {
            return Err(AppError::config(
                "storage.guard.max_drop_percent must be <= 100",
            ));
        }
        Ok(())
    }
}

/// Statistics portal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Portal root; subjects are read from here and results are posted here
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Path of the CSV export, relative to `base_url`
    #[serde(default = "defaults::export_path")]
    pub export_path: String,

    /// Name of the cookie carrying the session credential
    #[serde(default = "defaults::session_cookie")]
    pub session_cookie: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// `statType` form value
    #[serde(default = "defaults::stat_type")]
    pub stat_type: String,

    /// `numDays` form value
    #[serde(default = "defaults::num_days")]
    pub num_days: String,

    /// Oldest term the portal can report on
    #[serde(default = "defaults::min_term")]
    pub min_term: String,

    /// Markup layout of the portal pages
    #[serde(default)]
    pub selectors: PortalSelectors,
}

impl PortalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            export_path: defaults::export_path(),
            session_cookie: defaults::session_cookie(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            stat_type: defaults::stat_type(),
            num_days: defaults::num_days(),
            min_term: defaults::min_term(),
            selectors: PortalSelectors::default(),
        }
    }
}

/// Attempt bounds and backoff policy.
///
/// Every bound counts requests, so `table_attempts = 10` means at most ten
/// results requests per subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Results requests per subject before the subject is skipped
    #[serde(default = "defaults::table_attempts")]
    pub table_attempts: u32,

    /// Subject-page requests before the run fails
    #[serde(default = "defaults::discovery_attempts")]
    pub discovery_attempts: u32,

    /// CSV export requests before the download fails
    #[serde(default = "defaults::export_attempts")]
    pub export_attempts: u32,

    /// Delay after the first failed attempt
    #[serde(default = "defaults::initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Growth factor applied per further failure
    #[serde(default = "defaults::backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound on any single delay
    #[serde(default = "defaults::max_backoff")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            table_attempts: defaults::table_attempts(),
            discovery_attempts: defaults::discovery_attempts(),
            export_attempts: defaults::export_attempts(),
            initial_backoff_ms: defaults::initial_backoff(),
            backoff_multiplier: defaults::backoff_multiplier(),
            max_backoff_ms: defaults::max_backoff(),
        }
    }
}

/// Per-subject scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Subjects fetched concurrently; output order is unaffected
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Snapshot storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for snapshots and exports
    #[serde(default = "defaults::storage_dir")]
    pub dir: PathBuf,

    #[serde(default)]
    pub guard: GuardConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
            guard: GuardConfig::default(),
        }
    }
}

/// Overwrite guard thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "defaults::guard_enabled")]
    pub enabled: bool,

    /// Maximum allowed drop in record count (0-100)
    #[serde(default = "defaults::max_drop_percent")]
    pub max_drop_percent: u8,

    /// Previous snapshots smaller than this are never protected
    #[serde(default = "defaults::min_baseline")]
    pub min_baseline: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::guard_enabled(),
            max_drop_percent: defaults::max_drop_percent(),
            min_baseline: defaults::min_baseline(),
        }
    }
}

/// Console output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Log each subject as it finishes
    #[serde(default = "defaults::show_progress")]
    pub show_progress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            show_progress: defaults::show_progress(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Portal defaults
    pub fn base_url() -> String {
        "https://ivy.yale.edu/course-stats/".into()
    }
    pub fn export_path() -> String {
        "course/download".into()
    }
    pub fn session_cookie() -> String {
        "JSESSIONID".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; course-stats/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn stat_type() -> String {
        "REGISTERED".into()
    }
    pub fn num_days() -> String {
        "7".into()
    }
    pub fn min_term() -> String {
        "202103".into()
    }

    // Retry defaults
    pub fn table_attempts() -> u32 {
        10
    }
    pub fn discovery_attempts() -> u32 {
        10
    }
    pub fn export_attempts() -> u32 {
        5
    }
    pub fn initial_backoff() -> u64 {
        500
    }
    pub fn backoff_multiplier() -> f64 {
        2.0
    }
    pub fn max_backoff() -> u64 {
        8_000
    }

    // Collector defaults
    pub fn max_concurrent() -> usize {
        4
    }

    // Storage defaults
    pub fn storage_dir() -> PathBuf {
        PathBuf::from("storage")
    }
    pub fn guard_enabled() -> bool {
        true
    }
    pub fn max_drop_percent() -> u8 {
        20
    }
    pub fn min_baseline() -> usize {
        10
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn show_progress() -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_table_attempts_is_ten() {
        assert_eq!(Config::default().retry.table_attempts, 10);
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.retry.table_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.discovery_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.collector.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.portal.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(AppError::Url(_))));
    }

    #[test]
    fn validate_rejects_shrinking_backoff() {
        let mut config = Config::default();
        config.retry.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [portal]
            timeout_secs = 5

            [retry]
            table_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.portal.timeout_secs, 5);
        assert_eq!(config.portal.stat_type, "REGISTERED");
        assert_eq!(config.retry.table_attempts, 3);
        assert_eq!(config.retry.discovery_attempts, 10);
        assert_eq!(config.collector.max_concurrent, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_falls_back_on_missing_file() {
        let config = Config::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config.portal.min_term, "202103");
    }

    #[test]
    fn load_or_default_rejects_malformed_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.toml");
        fs::write(&path, "[portal]\nmin_term = \"202301\"\n[retry\n").unwrap();

        assert!(matches!(
            Config::load_or_default(&path),
            Err(AppError::Toml(_))
        ));
    }

    #[test]
    fn shipped_config_is_valid() {
        let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/config.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.portal.selectors.enrollment_column, 7);
    }
}
