//! File-backed store implementations.
//!
//! Each store is a single JSON document holding a flat list. Every mutation takes the store's lock, reads the
//! whole document, applies the change, and rewrites the file before releasing the lock, so no reader can observe
//! a half-applied mutation. This is deliberately not a log-structured append; the whole-document rewrite is the
//! durability contract.
mod document;
mod ledger;
mod queue;

pub(crate) use document::DocumentFile;
pub use ledger::JsonLedger;
pub use queue::JsonQueue;
