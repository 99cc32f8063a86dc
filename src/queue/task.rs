//! Task codec: an [`Event`] in transit through the durable queue.
//!
//! The envelope travels as the pgmq message body:
//!
//! ```json
//! { "type": "tracking:event:ingest", "payload": "{\"id\":...}", "max_retry": 5 }
//! ```
//!
//! The payload is the serialized event as JSON text, so the queue never
//! rewrites the event bytes (pgmq stores messages as JSONB).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Event;

/// Task type identifying "persist tracking event".
pub const PERSIST_EVENT_TASK: &str = "tracking:event:ingest";

/// Delivery budget stamped on every encoded task.
pub const MAX_RETRY: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "type")]
    task_type: String,
    payload: String,
    max_retry: u32,
}

impl Task {
    /// Build a task from its parts. Handlers and tests use this to craft
    /// envelopes the codec would never produce.
    pub fn new(task_type: impl Into<String>, payload: impl Into<String>, max_retry: u32) -> Self {
        Self {
            task_type: task_type.into(),
            payload: payload.into(),
            max_retry,
        }
    }

    /// Serialize an event into a persist task with the standard retry budget.
    pub fn encode(event: &Event) -> Result<Self> {
        let payload = serde_json::to_string(event).map_err(Error::Encode)?;
        Ok(Self::new(PERSIST_EVENT_TASK, payload, MAX_RETRY))
    }

    /// Recover the event carried by this task.
    ///
    /// A foreign task type is rejected, never coerced: it means the task was
    /// routed to the wrong handler.
    pub fn decode(&self) -> Result<Event> {
        if self.task_type != PERSIST_EVENT_TASK {
            return Err(Error::UnexpectedTaskType {
                expected: PERSIST_EVENT_TASK.to_string(),
                found: self.task_type.clone(),
            });
        }
        serde_json::from_str(&self.payload)
            .map_err(|e| Error::Decode(format!("unmarshal event payload: {e}")))
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn max_retry(&self) -> u32 {
        self.max_retry
    }

    /// Queue message body for this task.
    pub fn to_message(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(Error::Encode)
    }

    /// Parse a queue message body back into a task envelope.
    pub fn from_message(message: &serde_json::Value) -> Result<Self> {
        Self::deserialize(message).map_err(|e| Error::Decode(format!("bad task envelope: {e}")))
    }
}
