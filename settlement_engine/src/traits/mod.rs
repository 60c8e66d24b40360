//! Behaviour contracts for the durable stores.
//!
//! The baseline backend rewrites a whole JSON document under a lock for every mutation. Any replacement backend
//! (an embedded transactional store, say) must preserve the same externally visible contract: FIFO ordering,
//! non-destructive `peek`, and no partially written state ever being observable by another reader.
mod ledger_management;
mod queue_management;

use thiserror::Error;

pub use ledger_management::LedgerManagement;
pub use queue_management::QueueManagement;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on the backing store. {0}")]
    Io(#[from] std::io::Error),
    #[error("The backing store contains invalid JSON. {0}")]
    Serialization(String),
}
