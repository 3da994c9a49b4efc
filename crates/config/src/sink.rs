//! Sink configuration
//!
//! Where and how log entries are persisted. The engine takes a `SinkConfig`
//! by value at construction; nothing here is process-global.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::validation;

/// Placeholder replaced with the current date (`YYYYMMDD`) in file name templates
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Default file name template
pub const DEFAULT_FILE_NAME: &str = "log_{date}.json";

/// On-disk layout of a destination file
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum FileFormat {
    /// Whole file is one JSON array, grown in place (default)
    #[default]
    #[serde(rename = "array")]
    JsonArray,
    /// One compact JSON object per line
    #[serde(rename = "lines")]
    JsonLines,
}

/// Log sink configuration
///
/// # Example
///
/// ```toml
/// [sink]
/// directory = "/var/log/app"
/// file_name = "errors_{date}.json"
/// pretty = true
/// idle_timeout = "10s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Directory holding destination files (created on first write)
    /// Default: "logs"
    pub directory: PathBuf,

    /// File name template; `{date}` is replaced with the local date as YYYYMMDD
    /// Default: "log_{date}.json"
    pub file_name: String,

    /// Pretty-print (indent) serialized entries
    /// Default: false
    pub pretty: bool,

    /// Include the full error source chain when formatting errors
    /// Default: false
    pub verbose: bool,

    /// File layout (array, lines)
    /// Default: array
    pub format: FileFormat,

    /// How long a writer waits for new entries before retiring
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,

    /// Upper bound on entries persisted by a single flush
    /// Default: 1024
    pub max_batch_entries: usize,

    /// Maximum trailing bytes scanned when splicing into an existing array
    /// Default: 4096
    pub tail_scan_limit: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: DEFAULT_FILE_NAME.into(),
            pretty: false,
            verbose: false,
            format: FileFormat::JsonArray,
            idle_timeout: Duration::from_secs(5),
            max_batch_entries: 1024,
            tail_scan_limit: 4096,
        }
    }
}

impl SinkConfig {
    /// Check the settings are usable by the sink
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        validation::validate_sink(self)
    }

    /// Set the target directory
    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Set the file name template
    #[must_use]
    pub fn with_file_name(mut self, template: impl Into<String>) -> Self {
        self.file_name = template.into();
        self
    }

    /// Enable indented output
    #[must_use]
    pub fn with_pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Format errors with their full source chain by default
    #[must_use]
    pub fn with_verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Set the file layout
    #[must_use]
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the writer idle timeout
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}
