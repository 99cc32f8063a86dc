//! Ingestion orchestrator: validate, build, encode, dispatch.
//!
//! A successful ingest means "accepted for asynchronous processing". The
//! event is stored later by a worker; nothing here touches the store.
//!
//! Two budgets bound every call. The dispatch budget caps the enqueue alone
//! so a degraded queue fails fast; the request budget caps the whole
//! operation. Dispatch is never retried here; the caller retries the whole
//! ingest.

use std::sync::Arc;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use tracing::{debug, error, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::model::{Event, NewEvent};
use crate::queue::{Dispatcher, Task};
use crate::telemetry::metrics;

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

pub struct Ingestor {
    dispatcher: Arc<dyn Dispatcher>,
    clock: Arc<dyn Clock>,
    dispatch_timeout: Duration,
    request_timeout: Duration,
}

impl Ingestor {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher,
            clock: Arc::new(SystemClock),
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timeouts(mut self, dispatch_timeout: Duration, request_timeout: Duration) -> Self {
        self.dispatch_timeout = dispatch_timeout;
        self.request_timeout = request_timeout;
        self
    }

    /// Validate the input and hand the resulting event to the queue.
    ///
    /// Returns the event (with its generated id and `received_at`) once the
    /// task is enqueued.
    pub async fn ingest(&self, new: NewEvent) -> Result<Event> {
        let start = Instant::now();

        let result = match tokio::time::timeout(self.request_timeout, self.ingest_inner(new)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::DispatchTimeout(self.request_timeout)),
        };

        let label = match &result {
            Ok(_) => "accepted",
            Err(Error::Validation(_)) => "invalid",
            Err(Error::Encode(_)) => "encode_failed",
            Err(Error::DispatchTimeout(_)) => "dispatch_timeout",
            Err(_) => "dispatch_failed",
        };
        metrics::events_ingested().add(1, &[KeyValue::new("result", label)]);
        metrics::operation_duration_ms().record(
            start.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("operation", "event.ingest")],
        );

        result
    }

    async fn ingest_inner(&self, new: NewEvent) -> Result<Event> {
        let event = Event::construct(new, self.clock.as_ref()).inspect_err(|e| {
            warn!(error = %e, "rejected tracking event");
        })?;

        let task = Task::encode(&event).inspect_err(|e| {
            error!(event_id = %event.id(), error = %e, "failed to encode event task");
        })?;

        let receipt = tokio::time::timeout(self.dispatch_timeout, self.dispatcher.dispatch(&task))
            .await
            .map_err(|_| Error::DispatchTimeout(self.dispatch_timeout))
            .and_then(|dispatched| dispatched)
            .inspect_err(|e| {
                error!(event_id = %event.id(), error = %e, "event dispatch failed");
            })?;

        debug!(
            event_id = %event.id(),
            queue = %receipt.queue,
            msg_id = receipt.msg_id,
            "event accepted"
        );

        Ok(event)
    }
}
