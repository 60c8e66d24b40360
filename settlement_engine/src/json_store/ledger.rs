use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Utc};
use log::*;
use tokio::sync::Mutex;

use crate::{
    db_types::LedgerRecord,
    json_store::DocumentFile,
    traits::{LedgerManagement, StorageError},
};

/// Append-only sales ledger backed by one JSON document. Clones share the same file and lock.
#[derive(Clone)]
pub struct JsonLedger {
    file: Arc<Mutex<DocumentFile>>,
}

impl JsonLedger {
    pub fn new<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let file = DocumentFile::create(path.into())?;
        debug!("🗃️ Sales ledger opened at {}", file.path().display());
        Ok(Self { file: Arc::new(Mutex::new(file)) })
    }
}

impl LedgerManagement for JsonLedger {
    async fn record_sale(&self, record: LedgerRecord) -> Result<(), StorageError> {
        let file = self.file.lock().await;
        let mut records = file.load::<LedgerRecord>()?;
        records.push(record);
        file.save(&records)?;
        debug!("🗃️ Sale recorded. The ledger now holds {} records", records.len());
        Ok(())
    }

    async fn records_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LedgerRecord>, StorageError> {
        let file = self.file.lock().await;
        let records = file.load::<LedgerRecord>()?;
        Ok(records.into_iter().filter(|r| r.timestamp >= start && r.timestamp < end).collect())
    }
}
