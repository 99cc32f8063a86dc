//! Persist handler: decode a tracking event task and store the event.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use opentelemetry::KeyValue;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::queue::{PERSIST_EVENT_TASK, Task};
use crate::store::EventStore;
use crate::telemetry::metrics;

use super::registry::TaskHandler;

pub struct EventProcessor {
    store: Arc<dyn EventStore>,
}

impl EventProcessor {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TaskHandler for EventProcessor {
    fn task_type(&self) -> &str {
        PERSIST_EVENT_TASK
    }

    async fn handle(&self, task: &Task) -> Result<()> {
        if task.task_type() != PERSIST_EVENT_TASK {
            error!(task_type = task.task_type(), "unexpected task type routed to event processor");
            return Err(Error::UnexpectedTaskType {
                expected: PERSIST_EVENT_TASK.to_string(),
                found: task.task_type().to_string(),
            });
        }

        let event = task.decode().inspect_err(|e| {
            warn!(error = %e, "failed to decode event payload");
        })?;

        let start = Instant::now();
        let ack = self.store.persist(&event).await.inspect_err(|e| {
            error!(event_id = %event.id(), error = %e, "failed to persist event");
        })?;
        metrics::operation_duration_ms().record(
            start.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("operation", "event.persist")],
        );

        debug!(event_id = %event.id(), ack = ack.as_str(), "event persisted");
        Ok(())
    }
}
