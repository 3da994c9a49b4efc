//! Logjar Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid configuration - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use logjar_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[sink]\ndirectory = \"/var/log/app\"").unwrap();
//! assert!(config.sink.directory.ends_with("app"));
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [sink]
//! directory = "logs"
//! file_name = "errors_{date}.json"
//! pretty = true
//! verbose = true
//! format = "array"
//! idle_timeout = "5s"
//! max_batch_entries = 1024
//! tail_scan_limit = 4096
//! ```

mod error;
mod logging;
mod sink;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use sink::{DATE_PLACEHOLDER, DEFAULT_FILE_NAME, FileFormat, SinkConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Internal diagnostic logging
    pub log: LogConfig,

    /// Log sink settings (directory, naming, formatting, writer tuning)
    pub sink: SinkConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.log.level, LogLevel::Info);
        assert_eq!(config.sink.directory, PathBuf::from("logs"));
        assert_eq!(config.sink.file_name, DEFAULT_FILE_NAME);
        assert!(!config.sink.pretty);
        assert!(!config.sink.verbose);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "compact"

[sink]
directory = "/var/log/app"
file_name = "errors_{date}.json"
pretty = true
verbose = true
format = "lines"
idle_timeout = "250ms"
max_batch_entries = 64
tail_scan_limit = 512
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Compact);
        assert_eq!(config.sink.directory, PathBuf::from("/var/log/app"));
        assert_eq!(config.sink.file_name, "errors_{date}.json");
        assert!(config.sink.pretty);
        assert!(config.sink.verbose);
        assert_eq!(config.sink.format, FileFormat::JsonLines);
        assert_eq!(config.sink.idle_timeout, Duration::from_millis(250));
        assert_eq!(config.sink.max_batch_entries, 64);
        assert_eq!(config.sink.tail_scan_limit, 512);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_runs_on_parse() {
        let result = Config::from_str("[sink]\nfile_name = \"\"");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sink]\npretty = true").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.sink.pretty);
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/nonexistent/logjar.toml");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
        assert!(err.to_string().contains("/nonexistent/logjar.toml"));
    }
}
