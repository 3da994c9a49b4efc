//! LogJar - Sink
//!
//! Asynchronous file-backed log sink. Entries are routed to a per-destination
//! writer task and spliced into a JSON array file on disk.
//!
//! # Architecture
//!
//! Callers submit entries from any thread without blocking on I/O. Each
//! destination file has exactly one writer, which batches whatever is queued
//! and appends it without rewriting existing content.
//!
//! ```text
//! [LogJar::write_*] --resolve--> [writer map] --mpsc--> [writer task] --splice--> [file]
//! ```
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `entry` | `LogEntry` record and `Severity` |
//! | `report` | Error and source chain rendering |
//! | `destination` | File name resolution (template or custom namer) |
//! | `dispatch` | `LogJar` handle, writer map and writer tasks |
//! | `append` | Splice a batch into an array (or lines) file |
//! | `reader` | Query persisted entries by date or name |
//!
//! # Example
//!
//! ```ignore
//! use logjar_config::SinkConfig;
//! use logjar_sink::{LogJar, LogReader, Severity};
//!
//! let jar = LogJar::new(SinkConfig::default())?;
//! jar.write_message(Severity::Error, "disk full")?;
//! jar.flush().await;
//!
//! let today = chrono::Local::now().date_naive();
//! for (file, entries) in LogReader::new("logs").by_date(today)? {
//!     println!("{}: {} entries", file.name, entries.len());
//! }
//! ```

/// Splice engine for destination files
pub mod append;

/// Writer map, writer tasks and the `LogJar` handle
pub mod dispatch;

/// Destination file naming
pub mod destination;

/// Log entry data model
pub mod entry;

/// Read-side queries over the log directory
pub mod reader;

/// Error report rendering
pub mod report;

/// Shared utilities
pub mod util;

/// Errors and metrics
mod common;

// =============================================================================
// Public re-exports
// =============================================================================

pub use common::{MetricsSnapshot, Result, SinkError, SinkMetrics};

pub use append::{AppendOptions, append_batch};
pub use destination::{DestinationResolver, FileNamer, NamerError};
pub use dispatch::{ErrorHandler, LogJar, LogJarBuilder};
pub use entry::{LogEntry, Severity};
pub use reader::{LogFileInfo, LogFiles, LogReader, parse_entries, read_entries};
pub use report::{ErrorReport, format_error};

pub use logjar_config::{FileFormat, SinkConfig};
