//! Settlement engine
//!
//! The domain core of the marketplace settlement relay. It owns everything that must behave identically no matter
//! which marketplace or notification transport sits around it:
//!
//! 1. The durable stores ([`JsonQueue`], [`JsonLedger`]): a FIFO command queue of pending order references and an append-only
//!    sales ledger, each backed by a single JSON document that is rewritten in full under a lock on every mutation.
//!    Callers go through the [`traits`] so the backing store can be swapped without touching the pipeline.
//! 2. The settlement computation ([`mod@settlement`]): a deterministic net-revenue figure over integer centavos,
//!    with a fixed precedence between itemized fee components and per-item sale fees.
//! 3. The idempotency and scheduling primitives: the process-lifetime processed-order set ([`ProcessedOrders`]),
//!    the bounded [`retry`] policy, and the report aggregation ([`mod@reports`]).
pub mod db_types;
mod json_store;
mod processed;
pub mod reports;
pub mod retry;
pub mod settlement;
pub mod traits;

pub use json_store::{JsonLedger, JsonQueue};
pub use processed::ProcessedOrders;
