//! Persistence port: durably store one event, keyed by its id.
//!
//! Workers deliver at least once, so every implementation must treat a
//! second write of the same id as a successful no-op.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use opentelemetry::KeyValue;

use crate::db::Db;
use crate::error::{Error, Result};
use crate::model::Event;
use crate::telemetry::metrics;

/// Outcome of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// A new document was written.
    Inserted,
    /// A document with this id already existed; nothing changed.
    Duplicate,
}

impl Ack {
    pub fn as_str(self) -> &'static str {
        match self {
            Ack::Inserted => "inserted",
            Ack::Duplicate => "duplicate",
        }
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn persist(&self, event: &Event) -> Result<Ack>;
}

#[async_trait]
impl EventStore for Db {
    async fn persist(&self, event: &Event) -> Result<Ack> {
        let inserted = self
            .insert_event(event)
            .await
            .map_err(|e| Error::Persistence {
                id: event.id(),
                reason: e.to_string(),
            })?;
        let ack = if inserted { Ack::Inserted } else { Ack::Duplicate };
        metrics::events_persisted().add(1, &[KeyValue::new("result", ack.as_str())]);
        Ok(ack)
    }
}
