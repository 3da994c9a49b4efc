//! Log entry model
//!
//! A `LogEntry` is plain data: once built it is only read, serialized, and
//! compared. Field names on disk follow the `Date/Type/Message/...` layout so
//! files stay readable by existing consumers.

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Result, SinkError};
use crate::report::ErrorReport;

/// Entry severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            _ => Err(SinkError::UnknownSeverity(s.to_string())),
        }
    }
}

/// A single persisted log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "Date")]
    timestamp: DateTime<Utc>,

    #[serde(rename = "Type")]
    severity: Severity,

    #[serde(rename = "Message")]
    message: String,

    #[serde(rename = "Source", default)]
    source: Option<String>,

    #[serde(rename = "StackTrace", default)]
    stack_trace: Option<String>,

    #[serde(rename = "TargetSite", default)]
    target_site: Option<String>,
}

impl LogEntry {
    /// Create a free-text entry stamped with the current time
    ///
    /// # Errors
    ///
    /// Returns `SinkError::EmptyMessage` if the message is empty or whitespace.
    pub fn new(severity: Severity, message: impl Into<String>) -> Result<Self> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(SinkError::EmptyMessage);
        }

        Ok(Self {
            timestamp: Utc::now(),
            severity,
            message,
            source: None,
            stack_trace: None,
            target_site: None,
        })
    }

    /// Create an entry describing an error
    ///
    /// The message is rendered by [`ErrorReport`]; `target_site` records the
    /// caller's location.
    #[track_caller]
    pub fn from_error<E>(severity: Severity, error: &E, verbose: bool) -> Self
    where
        E: std::error::Error + ?Sized + 'static,
    {
        let location = Location::caller();
        let report = ErrorReport::capture(error, verbose);

        Self {
            timestamp: Utc::now(),
            severity,
            message: report.message,
            source: Some(report.origin),
            stack_trace: report.backtrace,
            target_site: Some(format!("{}:{}", location.file(), location.line())),
        }
    }

    /// Replace the timestamp
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the source (component or crate that produced the entry)
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    pub fn target_site(&self) -> Option<&str> {
        self.target_site.as_deref()
    }
}

#[cfg(test)]
#[path = "entry_test.rs"]
mod entry_test;
