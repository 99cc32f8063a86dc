//! Worker side: queue runtime, task routing, and the persist handler.

pub mod processor;
pub mod registry;
pub mod retry;
pub mod runtime;

pub use processor::EventProcessor;
pub use registry::{HandlerRegistry, TaskHandler};
pub use retry::Disposition;
pub use runtime::{WorkerConfig, WorkerPool, process_delivery};
