//! Durable queue boundary: the task envelope and the dispatch port.

pub mod dispatch;
pub mod task;

pub use dispatch::{DispatchReceipt, Dispatcher, PgmqDispatcher};
pub use task::{MAX_RETRY, PERSIST_EVENT_TASK, Task};
