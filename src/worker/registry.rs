//! Task handler trait and registry.
//!
//! The queue runtime looks up the handler for each delivery by the task
//! type carried in its envelope.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::queue::Task;

/// Capability invoked once per delivered task. `Ok` completes the task;
/// `Err` reports a failure and the runtime decides whether to redeliver.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The task type this handler owns.
    fn task_type(&self) -> &str;

    async fn handle(&self, task: &Task) -> Result<()>;
}

/// Registry of handlers, indexed by task type.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry with no handlers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a handler under its own task type, replacing any previous
    /// handler for that type.
    pub fn register(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers
            .insert(handler.task_type().to_string(), handler);
        self
    }

    /// Look up the handler for a task type.
    pub fn get(&self, task_type: &str) -> Option<&Arc<dyn TaskHandler>> {
        self.handlers.get(task_type)
    }

    pub fn task_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}
