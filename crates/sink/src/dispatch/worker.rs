//! Writer task: drains one destination's queue and persists batches

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::Shared;
use crate::append::append_batch;
use crate::common::SinkError;
use crate::entry::LogEntry;

/// Message sent to a writer
pub(super) enum WriterMessage {
    Entry(LogEntry),
    /// Acknowledge once everything queued before this is persisted
    Flush(oneshot::Sender<()>),
}

/// Writer loop for one destination
///
/// Exits when the channel closes (shutdown) or after retiring on idle.
pub(super) async fn run_writer(
    shared: Arc<Shared>,
    destination: Arc<str>,
    id: u64,
    mut receiver: mpsc::UnboundedReceiver<WriterMessage>,
) {
    let idle_timeout = shared.config.idle_timeout;
    let max_batch = shared.config.max_batch_entries;

    loop {
        let first = match tokio::time::timeout(idle_timeout, receiver.recv()).await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(_) => {
                if shared.try_retire(&destination, id, &receiver) {
                    break;
                }
                continue;
            }
        };

        let mut batch = Vec::new();
        let mut acks = Vec::new();
        let mut next = Some(first);

        while let Some(message) = next {
            match message {
                WriterMessage::Entry(entry) => batch.push(entry),
                WriterMessage::Flush(ack) => acks.push(ack),
            }
            next = if batch.len() < max_batch {
                receiver.try_recv().ok()
            } else {
                None
            };
        }

        if !batch.is_empty() {
            persist(&shared, &destination, batch).await;
        }

        for ack in acks {
            // Flusher may have given up waiting
            let _ = ack.send(());
        }
    }

    tracing::debug!(destination = %destination, writer = id, "writer finished");
}

/// Write a batch on the blocking pool and account for the outcome
async fn persist(shared: &Shared, destination: &Arc<str>, batch: Vec<LogEntry>) {
    let entries = batch.len();
    let directory = shared.config.directory.clone();
    let options = shared.append;
    let file_name = Arc::clone(destination);

    let result = tokio::task::spawn_blocking(move || {
        append_batch(&directory, &file_name, &batch, &options)
    })
    .await;

    let error = match result {
        Ok(Ok(bytes)) => {
            shared.metrics.batch_written(entries as u64, bytes);
            tracing::trace!(destination = %destination, entries, bytes, "batch persisted");
            return;
        }
        Ok(Err(e)) => e,
        Err(e) => SinkError::Task(e.to_string()),
    };

    shared.metrics.write_error();
    shared.report(&SinkError::persist(destination.as_ref(), entries, error));
}
