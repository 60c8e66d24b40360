//! # Settlement relay server
//! This crate hosts the HTTP face and the background loops of the marketplace settlement relay. It is
//! responsible for:
//! Listening for incoming payment webhook notifications from the marketplace.
//! Triaging each notification into the durable command queue, exactly once per order.
//! Settling mature queue entries in a background worker and pushing Telegram alerts.
//! Emitting daily and monthly sales reports from the ledger.
//!
//! ## Configuration
//! The server is configured via `MSR_`-prefixed environment variables. See [config](config/index.html) for more
//! information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/ml-notifications`: The webhook route for receiving marketplace notifications. It always acknowledges.

pub mod accounts;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod meli_routes;
pub mod routes;
pub mod server;

pub mod integrations;
pub mod messages;
pub mod notifier;
pub mod report_worker;
pub mod settlement_worker;

#[cfg(test)]
mod endpoint_tests;
