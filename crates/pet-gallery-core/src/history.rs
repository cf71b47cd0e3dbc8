//! Append-only log of exported images, persisted as one JSON array.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::model::DownloadHistoryEntry;
use crate::storage::KeyValueStore;

/// Storage key holding the serialized history.
pub const HISTORY_KEY: &str = "downloadHistory";

/// The persisted download history.
///
/// Every write is a read-modify-write of the whole array performed under one
/// lock, so an export's append and a user's clear never interleave.
#[derive(Debug)]
pub struct DownloadHistory<S> {
    store: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> DownloadHistory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// All recorded entries, oldest first.
    ///
    /// A missing key, unreadable storage, or a value that is not a JSON array
    /// of entries all read as an empty history.
    pub async fn read(&self) -> Vec<DownloadHistoryEntry> {
        match self.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "download history unreadable; treating as empty");
                Vec::new()
            }
        }
    }

    /// Append `entries` and persist the whole log. Returns the new length.
    pub async fn append(&self, entries: Vec<DownloadHistoryEntry>) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().await;
        // Storage I/O failures propagate here; only corrupt content is reset.
        let mut log = self.load().await?;
        let added = entries.len();
        log.extend(entries);
        self.store
            .set(HISTORY_KEY, &serde_json::to_string(&log)?)
            .await?;
        debug!(added, total = log.len(), "download history persisted");
        Ok(log.len())
    }

    /// Replace the log with an empty list.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.store.set(HISTORY_KEY, "[]").await?;
        debug!("download history cleared");
        Ok(())
    }

    async fn load(&self) -> Result<Vec<DownloadHistoryEntry>, StorageError> {
        let Some(raw) = self.store.get(HISTORY_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(error = %e, "download history is corrupt; starting fresh");
                Ok(Vec::new())
            }
        }
    }
}
