use crate::{db_types::QueueEntry, traits::StorageError};

/// The pending-settlement command queue.
///
/// Entries are strictly FIFO by insertion. Triage pushes, the settlement worker pops; the queue is what lets the
/// webhook handler acknowledge immediately while the maturation delay runs its course off the request path.
#[allow(async_fn_in_trait)]
pub trait QueueManagement {
    /// Append an entry at the tail.
    async fn enqueue(&self, entry: QueueEntry) -> Result<(), StorageError>;

    /// Return a copy of the head entry without removing it.
    async fn peek(&self) -> Result<Option<QueueEntry>, StorageError>;

    /// Remove and return the head entry.
    async fn dequeue(&self) -> Result<Option<QueueEntry>, StorageError>;

    /// Whether an entry for `order_id` is currently waiting in the queue. Triage uses this to refuse a second
    /// enqueue for an order that has been accepted but not yet dequeued.
    async fn is_pending(&self, order_id: u64) -> Result<bool, StorageError>;
}
