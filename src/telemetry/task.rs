//! Task delivery span helpers.
//!
//! Provides span creation and disposition recording for queue deliveries
//! flowing through the worker pool.

use tracing::Span;

/// Start a span for one task delivery.
///
/// The `task.disposition` field is declared empty and is filled by
/// [`record_disposition`] once the delivery settles.
pub fn start_task_span(task_type: &str, msg_id: i64, attempt: i32) -> Span {
    tracing::info_span!(
        "task.process",
        "task.type" = task_type,
        "task.msg_id" = msg_id,
        "task.attempt" = attempt,
        "task.disposition" = tracing::field::Empty,
    )
}

/// Record how a delivery settled on its span.
pub fn record_disposition(span: &Span, disposition: &str) {
    span.record("task.disposition", disposition);
    span.in_scope(|| {
        tracing::debug!(disposition, "task settled");
    });
}
