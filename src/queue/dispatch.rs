//! Dispatch port: place an encoded task on the durable queue.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::Db;
use crate::error::{Error, Result};

use super::task::Task;

/// Where a dispatched task landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub queue: String,
    pub msg_id: i64,
}

/// Capability to enqueue a task. Callers bound the call with their own
/// timeout; implementations should not retry internally.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, task: &Task) -> Result<DispatchReceipt>;
}

/// Dispatcher backed by a pgmq queue.
pub struct PgmqDispatcher {
    db: Arc<Db>,
    queue: String,
}

impl PgmqDispatcher {
    pub fn new(db: Arc<Db>, queue: impl Into<String>) -> Self {
        Self {
            db,
            queue: queue.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }
}

#[async_trait]
impl Dispatcher for PgmqDispatcher {
    async fn dispatch(&self, task: &Task) -> Result<DispatchReceipt> {
        let message = task.to_message()?;
        let msg_id = self
            .db
            .enqueue_task(&self.queue, &message)
            .await
            .map_err(|e| Error::Dispatch(format!("enqueue event task: {e}")))?;
        Ok(DispatchReceipt {
            queue: self.queue.clone(),
            msg_id,
        })
    }
}
