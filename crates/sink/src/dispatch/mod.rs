//! Dispatch - routes submitted entries to per-destination writers
//!
//! # Architecture
//!
//! ```text
//! [write_*()] → [resolve destination] → [writers.entry(dest)] → [channel.send()] → [writer task]
//!                                              ↓ (absent or dead)
//!                                        [spawn writer, insert]
//! ```
//!
//! - **One writer per destination**: the map holds at most one handle per file
//!   name, and a writer is the only task that touches its file.
//! - **Per-key locking**: sends happen under the map's entry lock, and writers
//!   retire under the same lock, so an entry can never be sent to a writer that
//!   has already decided to exit.
//! - **Non-blocking submit**: unbounded channels; the caller never waits on I/O.
//! - **Failures go to a handler**: callers only see input validation errors.
//!
//! # Example
//!
//! ```ignore
//! use logjar_config::SinkConfig;
//! use logjar_sink::{LogJar, Severity};
//!
//! let jar = LogJar::new(SinkConfig::default().with_directory("/var/log/app"))?;
//! jar.write_message(Severity::Error, "disk full")?;
//! jar.flush().await;
//! ```

mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use logjar_config::SinkConfig;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::append::AppendOptions;
use crate::common::{MetricsSnapshot, Result, SinkError, SinkMetrics};
use crate::destination::{DestinationResolver, FileNamer};
use crate::entry::{LogEntry, Severity};
use crate::util::RateLimitedLogger;

use worker::WriterMessage;

/// Callback receiving every failure the sink swallows
pub type ErrorHandler = Arc<dyn Fn(&SinkError) + Send + Sync>;

/// Live writer for one destination
struct WriterHandle {
    /// Unique per spawn, lets a writer recognise its own map entry
    id: u64,
    sender: mpsc::UnboundedSender<WriterMessage>,
    task: JoinHandle<()>,
}

/// State shared by the sink handle and its writer tasks
struct Shared {
    config: SinkConfig,
    append: AppendOptions,
    resolver: DestinationResolver,
    writers: DashMap<Arc<str>, WriterHandle>,
    next_writer_id: AtomicU64,
    on_error: ErrorHandler,
    metrics: SinkMetrics,
    runtime: Handle,
}

impl Shared {
    fn report(&self, error: &SinkError) {
        (self.on_error)(error);
    }

    /// Spawn a writer for `destination` with `first` already queued
    fn start_writer(self: &Arc<Self>, destination: Arc<str>, first: LogEntry) -> WriterHandle {
        let id = self.next_writer_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();

        // Receiver is still in scope, so this send cannot fail
        let _ = sender.send(WriterMessage::Entry(first));

        tracing::debug!(destination = %destination, writer = id, "starting writer");
        self.metrics.writer_started();

        let task = self.runtime.spawn(worker::run_writer(
            Arc::clone(self),
            destination,
            id,
            receiver,
        ));

        WriterHandle { id, sender, task }
    }

    /// Remove writer `id` from the map if its queue is empty
    ///
    /// Runs under the entry lock, so no producer can send between the
    /// emptiness check and the removal. Returns true when the writer should
    /// exit: either it retired, or its entry belongs to someone else.
    fn try_retire(
        &self,
        destination: &str,
        id: u64,
        receiver: &mpsc::UnboundedReceiver<WriterMessage>,
    ) -> bool {
        let removed = self
            .writers
            .remove_if(destination, |_, handle| handle.id == id && receiver.is_empty());

        if removed.is_some() {
            self.metrics.writer_retired();
            tracing::debug!(destination = %destination, writer = id, "writer retired");
            return true;
        }

        // Only this task consumes the queue: empty here means the map entry
        // was replaced or removed and our sender is gone
        receiver.is_empty()
    }
}

/// Asynchronous file-backed log sink
///
/// Cheap to clone; all clones share the same writers.
#[derive(Clone)]
pub struct LogJar {
    shared: Arc<Shared>,
}

impl LogJar {
    /// Create a sink on the current tokio runtime
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid or no runtime is active.
    pub fn new(config: SinkConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start building a sink with a custom namer, error handler or runtime
    pub fn builder(config: SinkConfig) -> LogJarBuilder {
        LogJarBuilder {
            config,
            namer: None,
            on_error: None,
            runtime: None,
        }
    }

    /// Submit a free-text entry
    ///
    /// # Errors
    ///
    /// Returns `SinkError::EmptyMessage` for an empty message. Nothing is
    /// queued in that case. Later failures go to the error handler.
    pub fn write_message(&self, severity: Severity, message: impl Into<String>) -> Result<()> {
        let entry = LogEntry::new(severity, message)?;
        self.submit(entry);
        Ok(())
    }

    /// Submit an entry describing `error`, using the configured verbosity
    ///
    /// Pass the concrete error type where possible. A `dyn Error` (for
    /// example `&*boxed`) can only be named as `dyn core::error::Error`, and
    /// the entry's source becomes `core`.
    #[track_caller]
    pub fn write_error<E>(&self, severity: Severity, error: &E)
    where
        E: std::error::Error + ?Sized + 'static,
    {
        self.write_error_verbose(severity, error, self.shared.config.verbose);
    }

    /// Submit an entry describing `error`, optionally with its source chain
    #[track_caller]
    pub fn write_error_verbose<E>(&self, severity: Severity, error: &E, verbose: bool)
    where
        E: std::error::Error + ?Sized + 'static,
    {
        self.submit(LogEntry::from_error(severity, error, verbose));
    }

    /// Route a pre-built entry to the writer for its destination
    ///
    /// Never fails from the caller's point of view.
    pub fn submit(&self, entry: LogEntry) {
        let shared = &self.shared;

        let destination = match shared.resolver.resolve() {
            Ok(name) => name,
            Err(e) => {
                shared.metrics.entry_dropped();
                shared.report(&e);
                return;
            }
        };

        shared.metrics.entry_submitted();

        match shared.writers.entry(Arc::from(destination)) {
            Entry::Occupied(mut occupied) => {
                if let Err(mpsc::error::SendError(message)) =
                    occupied.get().sender.send(WriterMessage::Entry(entry))
                {
                    // Writer task is gone (panicked); replace it
                    let WriterMessage::Entry(entry) = message else {
                        return;
                    };
                    tracing::warn!(destination = %occupied.key(), "replacing dead writer");
                    let handle = shared.start_writer(Arc::clone(occupied.key()), entry);
                    occupied.insert(handle);
                }
            }
            Entry::Vacant(vacant) => {
                let handle = shared.start_writer(Arc::clone(vacant.key()), entry);
                vacant.insert(handle);
            }
        }
    }

    /// Wait until everything submitted before this call is on disk
    ///
    /// Failed batches count as done; they were reported to the error handler.
    pub async fn flush(&self) {
        let acks: Vec<oneshot::Receiver<()>> = self
            .shared
            .writers
            .iter()
            .filter_map(|writer| {
                let (ack, done) = oneshot::channel();
                writer.sender.send(WriterMessage::Flush(ack)).ok().map(|()| done)
            })
            .collect();

        for done in acks {
            let _ = done.await;
        }
    }

    /// Close every writer and wait for them to drain
    ///
    /// Entries submitted concurrently with shutdown start fresh writers.
    pub async fn shutdown(&self) {
        let destinations: Vec<Arc<str>> = self
            .shared
            .writers
            .iter()
            .map(|writer| Arc::clone(writer.key()))
            .collect();

        let mut tasks = Vec::with_capacity(destinations.len());
        for destination in destinations {
            // Dropping the handle's sender closes the channel
            if let Some((_, handle)) = self.shared.writers.remove(&destination) {
                tasks.push(handle.task);
            }
        }

        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "writer ended abnormally");
            }
        }

        tracing::info!("log sink stopped");
    }

    /// Number of live writers
    pub fn writer_count(&self) -> usize {
        self.shared.writers.len()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn config(&self) -> &SinkConfig {
        &self.shared.config
    }
}

/// Builder for [`LogJar`]
pub struct LogJarBuilder {
    config: SinkConfig,
    namer: Option<Arc<dyn FileNamer>>,
    on_error: Option<ErrorHandler>,
    runtime: Option<Handle>,
}

impl LogJarBuilder {
    /// Name destination files with `namer` instead of the template
    #[must_use]
    pub fn namer(mut self, namer: impl FileNamer + 'static) -> Self {
        self.namer = Some(Arc::new(namer));
        self
    }

    /// Receive swallowed failures (resolution and persistence)
    ///
    /// Default: rate-limited `tracing::error!`.
    #[must_use]
    pub fn on_error(mut self, handler: impl Fn(&SinkError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Run writers on `runtime` instead of the current one
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<LogJar> {
        self.config.validate()?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| SinkError::NoRuntime(e.to_string()))?,
        };

        let mut resolver = DestinationResolver::new(self.config.file_name.clone());
        if let Some(namer) = self.namer {
            resolver = resolver.with_namer(namer);
        }

        let on_error = self.on_error.unwrap_or_else(|| {
            let logger = RateLimitedLogger::default();
            Arc::new(move |error: &SinkError| {
                logger.error(error);
            })
        });

        tracing::info!(
            directory = %self.config.directory.display(),
            file_name = %self.config.file_name,
            format = ?self.config.format,
            "log sink ready"
        );

        Ok(LogJar {
            shared: Arc::new(Shared {
                append: AppendOptions::from(&self.config),
                config: self.config,
                resolver,
                writers: DashMap::new(),
                next_writer_id: AtomicU64::new(0),
                on_error,
                metrics: SinkMetrics::new(),
                runtime,
            }),
        })
    }
}
