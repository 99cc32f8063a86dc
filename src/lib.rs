//! # tracking-rs
//!
//! Tracking event ingestion backed by Postgres.
//!
//! Clients submit events over HTTP; each event is validated, encoded as a
//! task, and queued on pgmq. A bounded worker pool consumes the queue and
//! writes every event exactly once per id into the `tracking_events` table,
//! retrying failed deliveries with backoff.

pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod model;
pub mod queue;
pub mod store;
pub mod telemetry;
pub mod worker;
