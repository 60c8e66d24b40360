use chrono::{DateTime, Duration, Utc};
use msr_common::Centavos;
use serde::{Deserialize, Serialize};

/// One pending order reference, produced by triage and consumed exactly once by the settlement worker, in strict
/// FIFO order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub seller_id: u64,
    pub order_id: u64,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(seller_id: u64, order_id: u64, enqueued_at: DateTime<Utc>) -> Self {
        Self { seller_id, order_id, enqueued_at }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.enqueued_at
    }

    /// An entry is mature once it has spent the full maturation window in the queue. Until then the marketplace
    /// may still be filling in the order's fee and shipping detail.
    pub fn is_mature(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now) >= window
    }
}

/// One settled sale. Records are immutable once appended; the ledger is the source of truth for all reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub timestamp: DateTime<Utc>,
    pub seller_id: u64,
    pub gross: Centavos,
    pub net: Centavos,
}
