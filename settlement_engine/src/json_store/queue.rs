use std::{path::PathBuf, sync::Arc};

use log::*;
use tokio::sync::Mutex;

use crate::{
    db_types::QueueEntry,
    json_store::DocumentFile,
    traits::{QueueManagement, StorageError},
};

/// FIFO command queue backed by one JSON document. Clones share the same file and lock.
#[derive(Clone)]
pub struct JsonQueue {
    file: Arc<Mutex<DocumentFile>>,
}

impl JsonQueue {
    pub fn new<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let file = DocumentFile::create(path.into())?;
        debug!("🗃️ Command queue opened at {}", file.path().display());
        Ok(Self { file: Arc::new(Mutex::new(file)) })
    }
}

impl QueueManagement for JsonQueue {
    async fn enqueue(&self, entry: QueueEntry) -> Result<(), StorageError> {
        let file = self.file.lock().await;
        let mut entries = file.load::<QueueEntry>()?;
        trace!("🗃️ Enqueueing order {} behind {} pending entries", entry.order_id, entries.len());
        entries.push(entry);
        file.save(&entries)
    }

    async fn peek(&self) -> Result<Option<QueueEntry>, StorageError> {
        let file = self.file.lock().await;
        let entries = file.load::<QueueEntry>()?;
        Ok(entries.first().cloned())
    }

    async fn dequeue(&self) -> Result<Option<QueueEntry>, StorageError> {
        let file = self.file.lock().await;
        let mut entries = file.load::<QueueEntry>()?;
        if entries.is_empty() {
            return Ok(None);
        }
        let head = entries.remove(0);
        file.save(&entries)?;
        trace!("🗃️ Dequeued order {}. {} entries remain", head.order_id, entries.len());
        Ok(Some(head))
    }

    async fn is_pending(&self, order_id: u64) -> Result<bool, StorageError> {
        let file = self.file.lock().await;
        let entries = file.load::<QueueEntry>()?;
        Ok(entries.iter().any(|e| e.order_id == order_id))
    }
}
