/*!
 * Configuration types for Craftlink
 */

use craftlink_resilience::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CraftlinkError, Result};

/// Top-level client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CraftlinkConfig {
    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub preflight: PreflightConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Query access layer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// How long a fetched value is served from cache without a remote call
    #[serde(default = "default_stale_time")]
    pub stale_time_secs: u64,

    /// Retries after a transient failure (0 or 1)
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay before the retry, in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Deadline for a single remote call (None = wait indefinitely)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: default_stale_time(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl QueryConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    /// Build the retry policy for remote calls
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        let policy = RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
        .map_err(|e| CraftlinkError::Config(format!("query.retry_attempts: {}", e)))?;
        Ok(policy.with_attempt_timeout(self.request_timeout_ms.map(Duration::from_millis)))
    }
}

/// Preflight sweep settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightConfig {
    /// Run the sweep at all (disabled sessions are marked skipped)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Deadline per probe in milliseconds (None = wait indefinitely)
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: Option<u64>,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

impl PreflightConfig {
    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_ms.map(Duration::from_millis)
    }
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level for diagnostic output
    #[serde(default)]
    pub level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for level = debug)
    #[serde(default)]
    pub verbose: bool,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_stale_time() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_delay() -> u64 {
    250
}

fn default_request_timeout() -> Option<u64> {
    Some(10_000)
}

fn default_probe_timeout() -> Option<u64> {
    Some(15_000)
}

impl CraftlinkConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: CraftlinkConfig =
            toml::from_str(&contents).map_err(|source| CraftlinkError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CraftlinkConfig = toml::from_str(contents)
            .map_err(|e| CraftlinkError::Config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        self.query.retry_policy()?;

        if self.query.request_timeout_ms == Some(0) {
            return Err(CraftlinkError::Config(
                "query.request_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.preflight.probe_timeout_ms == Some(0) {
            return Err(CraftlinkError::Config(
                "preflight.probe_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = CraftlinkConfig::default();
        assert_eq!(config.query.retry_attempts, 1);
        assert_eq!(config.query.stale_time(), Duration::from_secs(30));
        assert!(config.preflight.enabled);
        assert_eq!(
            config.preflight.probe_timeout(),
            Some(Duration::from_secs(15))
        );
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = CraftlinkConfig::from_toml_str(
            r#"
            [query]
            stale_time_secs = 5

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.query.stale_time_secs, 5);
        assert_eq!(config.query.retry_delay_ms, 250);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.preflight.enabled);
    }

    #[test]
    fn test_retry_storm_rejected() {
        let err = CraftlinkConfig::from_toml_str("[query]\nretry_attempts = 5\n").unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("retry_attempts"));
    }

    #[test]
    fn test_zero_probe_timeout_rejected() {
        let result = CraftlinkConfig::from_toml_str("[preflight]\nprobe_timeout_ms = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[preflight]\nenabled = false\nprobe_timeout_ms = 500").unwrap();

        let config = CraftlinkConfig::from_file(file.path()).unwrap();
        assert!(!config.preflight.enabled);
        assert_eq!(
            config.preflight.probe_timeout(),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_from_file_parse_error_names_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[query\nbroken").unwrap();

        let err = CraftlinkConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CraftlinkError::ConfigParse { .. }));
        assert!(err
            .to_string()
            .contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
