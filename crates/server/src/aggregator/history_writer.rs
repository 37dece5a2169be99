// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drains queued history batches into storage off the hot ingest path.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use pankha_storage::types::HistorySample;
use pankha_storage::Storage;

/// Runs until `cancel` fires or the channel closes, writing every batch it
/// receives in its own transaction. Never panics on a write failure; logs
/// and keeps draining so one bad batch can't wedge the queue.
pub async fn run(mut rx: mpsc::Receiver<Vec<HistorySample>>, storage: Storage, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            batch = rx.recv() => {
                let Some(batch) = batch else { break };
                if let Err(err) = storage.history.insert_batch(&batch).await {
                    tracing::error!(error = %err, samples = batch.len(), "failed to write history batch");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "history_writer_tests.rs"]
mod tests;
