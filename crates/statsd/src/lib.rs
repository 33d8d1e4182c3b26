//! statsd - incident statistics aggregation daemon.
//!
//! Serves per-macroregion incident statistics over a REST endpoint and
//! a WebSocket push channel. Incidents come from a JSON snapshot file;
//! SLA bucketing and aggregation are pure functions over that snapshot.

pub mod aggregate;
pub mod config;
pub mod routes;
pub mod server;
pub mod store;
