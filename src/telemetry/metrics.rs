//! Metric instrument factories for tracking-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"tracking-rs"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for tracking-rs instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("tracking-rs")
}

/// Counter: ingestion attempts.
/// Labels: `result` ("accepted" | "invalid" | "encode_failed" | "dispatch_failed" |
/// "dispatch_timeout").
pub fn events_ingested() -> Counter<u64> {
    meter()
        .u64_counter("tracking.events.ingested")
        .with_description("Number of tracking events submitted for ingestion")
        .build()
}

/// Counter: queue-level operations (create, send, read, set_vt, archive, delete).
/// Labels: `queue`, `operation`.
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("tracking.queue.operations")
        .with_description("Number of queue operations")
        .build()
}

/// Counter: task deliveries handled by the worker pool.
/// Labels: `task_type`, `result` ("completed" | "retry" | "abandoned").
pub fn tasks_processed() -> Counter<u64> {
    meter()
        .u64_counter("tracking.tasks.processed")
        .with_description("Number of task deliveries processed")
        .build()
}

/// Counter: event document writes.
/// Labels: `result` ("inserted" | "duplicate").
pub fn events_persisted() -> Counter<u64> {
    meter()
        .u64_counter("tracking.events.persisted")
        .with_description("Number of tracking events written to the store")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("tracking.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
