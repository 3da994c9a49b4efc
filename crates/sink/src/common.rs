//! Common types for the log sink
//!
//! Errors reported by every stage (submission, dispatch, persistence, reading)
//! and the sink-wide metrics counters.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors raised by the log sink
#[derive(Debug, Error)]
pub enum SinkError {
    /// Message was empty or whitespace only
    #[error("log message must not be empty")]
    EmptyMessage,

    /// Severity string did not name a known severity
    #[error("unknown severity '{0}' (expected error or warning)")]
    UnknownSeverity(String),

    /// Destination file name could not be computed
    #[error("failed to resolve destination: {0}")]
    Resolve(String),

    /// Sink configuration rejected
    #[error(transparent)]
    Config(#[from] logjar_config::ConfigError),

    /// No tokio runtime to run writers on
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),

    /// Failed to create the log directory
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDirectory {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// I/O error on a specific file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Existing file content does not end like a JSON array
    #[error("{} is not a well-formed JSON array: {reason}", path.display())]
    MalformedFile {
        /// Offending file
        path: PathBuf,
        /// What the tail scan found
        reason: String,
    },

    /// Writer task died before finishing its batch
    #[error("writer task failed: {0}")]
    Task(String),

    /// A drained batch could not be persisted
    #[error("lost {entries} entries for {destination}: {source}")]
    Persist {
        /// Destination file name
        destination: String,
        /// Entries in the failed batch
        entries: usize,
        /// Underlying failure
        #[source]
        source: Box<SinkError>,
    },
}

impl SinkError {
    /// Create a resolution error
    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::Resolve(msg.into())
    }

    /// Create an I/O error bound to a path
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a malformed file error
    pub fn malformed(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::MalformedFile {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Wrap a failure that cost a batch of entries
    pub fn persist(destination: impl Into<String>, entries: usize, source: SinkError) -> Self {
        Self::Persist {
            destination: destination.into(),
            entries,
            source: Box::new(source),
        }
    }
}

/// Sink-wide counters
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Entries accepted by dispatch
    pub entries_submitted: AtomicU64,

    /// Entries dropped before reaching a writer (resolution failure)
    pub entries_dropped: AtomicU64,

    /// Batches successfully persisted
    pub batches_written: AtomicU64,

    /// Entries successfully persisted
    pub entries_written: AtomicU64,

    /// Bytes appended to destination files
    pub bytes_written: AtomicU64,

    /// Batches lost to persistence failures
    pub write_errors: AtomicU64,

    /// Writer tasks started
    pub writers_started: AtomicU64,

    /// Writer tasks retired after going idle
    pub writers_retired: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            entries_submitted: AtomicU64::new(0),
            entries_dropped: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
            entries_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            writers_started: AtomicU64::new(0),
            writers_retired: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn entry_submitted(&self) {
        self.entries_submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn entry_dropped(&self) {
        self.entries_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a persisted batch
    #[inline]
    pub fn batch_written(&self, entries: u64, bytes: u64) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.entries_written.fetch_add(entries, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn writer_started(&self) {
        self.writers_started.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn writer_retired(&self) {
        self.writers_retired.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entries_submitted: self.entries_submitted.load(Ordering::Relaxed),
            entries_dropped: self.entries_dropped.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            entries_written: self.entries_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            writers_started: self.writers_started.load(Ordering::Relaxed),
            writers_retired: self.writers_retired.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub entries_submitted: u64,
    pub entries_dropped: u64,
    pub batches_written: u64,
    pub entries_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
    pub writers_started: u64,
    pub writers_retired: u64,
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
