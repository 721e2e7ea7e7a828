//! Synchronization configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine configuration
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// conflict_threshold_ms = 500
/// poll_interval_ms = 15000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// How far (in version units, milliseconds for the wall clock) the cache
    /// may have advanced past a failed write before the failure is treated as
    /// superseded instead of rolled back
    pub conflict_threshold_ms: u64,
    /// Show a notice when a write is confirmed
    pub notify_on_success: bool,
    /// Poll the server while a board is open
    pub poll_interval_ms: Option<u64>,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With conflict threshold
    #[inline]
    #[must_use]
    pub fn with_conflict_threshold(mut self, threshold: Duration) -> Self {
        self.conflict_threshold_ms = u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With success notices
    #[inline]
    #[must_use]
    pub fn with_success_notices(mut self, enabled: bool) -> Self {
        self.notify_on_success = enabled;
        self
    }

    /// With polling
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Polling interval, if polling is enabled
    #[must_use]
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms.map(Duration::from_millis)
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML or unknown keys
    /// - `ConfigError::Invalid` for unusable values
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// As [`SyncConfig::from_toml_str`], plus `ConfigError::Io`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check field values
    ///
    /// # Errors
    /// `ConfigError::Invalid` if the polling interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            conflict_threshold_ms: 2_000,
            notify_on_success: false,
            poll_interval_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = SyncConfig::new();
        assert_eq!(config.conflict_threshold_ms, 2_000);
        assert!(!config.notify_on_success);
        assert_eq!(config.poll_interval(), None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SyncConfig::from_toml_str("poll_interval_ms = 15000").unwrap();
        assert_eq!(config.poll_interval(), Some(Duration::from_secs(15)));
        assert_eq!(config.conflict_threshold_ms, 2_000);
    }

    #[test]
    fn zero_poll_interval_is_invalid() {
        let err = SyncConfig::from_toml_str("poll_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "poll_interval_ms", .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SyncConfig::from_toml_str("conflict_treshold_ms = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn builder_methods() {
        let config = SyncConfig::new()
            .with_conflict_threshold(Duration::from_millis(250))
            .with_success_notices(true);
        assert_eq!(config.conflict_threshold_ms, 250);
        assert!(config.notify_on_success);
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "conflict_threshold_ms = 750").unwrap();
        writeln!(file, "notify_on_success = true").unwrap();

        let config = SyncConfig::from_file(file.path()).unwrap();
        assert_eq!(config.conflict_threshold_ms, 750);
        assert!(config.notify_on_success);
    }

    #[test]
    fn from_file_missing_path() {
        let err = SyncConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
