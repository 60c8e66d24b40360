use chrono::{DateTime, Utc};

use crate::{db_types::LedgerRecord, traits::StorageError};

/// The append-only sales ledger.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Append one settled sale. Records are never mutated or deleted afterwards.
    async fn record_sale(&self, record: LedgerRecord) -> Result<(), StorageError>;

    /// All records with `start <= timestamp < end`, in insertion order.
    async fn records_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LedgerRecord>, StorageError>;
}
