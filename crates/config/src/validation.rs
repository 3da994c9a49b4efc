//! Configuration validation
//!
//! Rejects values the sink cannot run with:
//! - Empty file name template, or one that escapes the target directory
//! - Zero batch size or idle timeout
//! - A tail scan limit too small to hold the closing delimiter

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::sink::SinkConfig;

/// Smallest tail scan that can see `]` plus the byte before it
const MIN_TAIL_SCAN_LIMIT: usize = 2;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_sink(&config.sink)
}

/// Validate sink settings
pub fn validate_sink(sink: &SinkConfig) -> Result<()> {
    if sink.file_name.trim().is_empty() {
        return Err(ConfigError::invalid_value(
            "sink",
            "file_name",
            "must not be empty",
        ));
    }

    if sink.file_name.contains('/') || sink.file_name.contains('\\') {
        return Err(ConfigError::invalid_value(
            "sink",
            "file_name",
            format!("'{}' must be a bare file name", sink.file_name),
        ));
    }

    if sink.max_batch_entries == 0 {
        return Err(ConfigError::invalid_value(
            "sink",
            "max_batch_entries",
            "must be at least 1",
        ));
    }

    if sink.idle_timeout.is_zero() {
        return Err(ConfigError::invalid_value(
            "sink",
            "idle_timeout",
            "must be greater than zero",
        ));
    }

    if sink.tail_scan_limit < MIN_TAIL_SCAN_LIMIT {
        return Err(ConfigError::invalid_value(
            "sink",
            "tail_scan_limit",
            format!("must be at least {}", MIN_TAIL_SCAN_LIMIT),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_path_in_file_name() {
        let mut config = Config::default();
        config.sink.file_name = "../escape_{date}.json".into();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("file_name"));
    }

    #[test]
    fn test_rejects_zero_batch() {
        let mut config = Config::default();
        config.sink.max_batch_entries = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_idle_timeout() {
        let mut config = Config::default();
        config.sink.idle_timeout = Duration::ZERO;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_tiny_tail_scan() {
        let mut config = Config::default();
        config.sink.tail_scan_limit = 1;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("tail_scan_limit"));
    }
}
