//! Worker pool: reads deliveries from pgmq, routes them to handlers, and
//! settles each one as complete, retried, or abandoned.
//!
//! Delivery is at least once. A worker that dies after its handler succeeds
//! but before the message is deleted leaves the message to reappear when
//! its visibility timeout lapses, so handlers must be idempotent.

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use tokio::sync::{Notify, Semaphore};
use tracing::{Instrument, debug, error, info, warn};

use crate::config::DEFAULT_QUEUE;
use crate::db::Db;
use crate::db::pgmq::{PgmqMessage, ready_channel};
use crate::error::{Error, Result};
use crate::queue::{MAX_RETRY, Task};
use crate::telemetry::metrics;
use crate::telemetry::task::{record_disposition, start_task_span};

use super::registry::HandlerRegistry;
use super::retry::{self, Disposition};

/// Configuration for the worker pool.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Queue to consume.
    pub queue: String,
    /// Maximum deliveries handled in parallel.
    pub concurrency: usize,
    /// Visibility timeout (seconds) for pgmq reads. Must exceed
    /// `task_timeout`, or a slow delivery is handed to a second worker.
    pub visibility_timeout: i32,
    /// Poll interval fallback when no NOTIFY arrives.
    pub poll_interval: Duration,
    /// Budget for one handler invocation.
    pub task_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue: DEFAULT_QUEUE.to_string(),
            concurrency: 50,
            visibility_timeout: 60,
            poll_interval: Duration::from_secs(1),
            task_timeout: Duration::from_secs(30),
        }
    }
}

/// Bounded pool of concurrent deliveries over one queue.
#[derive(Clone)]
pub struct WorkerPool {
    db: Arc<Db>,
    registry: Arc<HandlerRegistry>,
    config: WorkerConfig,
    shutdown: Arc<Notify>,
    slots: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(db: Arc<Db>, registry: Arc<HandlerRegistry>, config: WorkerConfig) -> Self {
        let slots = Arc::new(Semaphore::new(config.concurrency));
        Self {
            db,
            registry,
            config,
            shutdown: Arc::new(Notify::new()),
            slots,
        }
    }

    /// Signal the pool to stop reading. In-flight deliveries still settle.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Deliveries currently being handled.
    pub fn in_flight(&self) -> usize {
        self.config.concurrency - self.slots.available_permits()
    }

    /// Run until shutdown, then wait for in-flight deliveries.
    pub async fn run(&self) -> Result<()> {
        let mut listener = sqlx::postgres::PgListener::connect_with(self.db.pool()).await?;
        listener.listen(&ready_channel(&self.config.queue)).await?;

        info!(
            queue = %self.config.queue,
            concurrency = self.config.concurrency,
            task_types = ?self.registry.task_types().collect::<Vec<_>>(),
            "worker pool started"
        );

        loop {
            self.fill_slots().await;

            tokio::select! {
                () = self.shutdown.notified() => {
                    info!("worker pool shutting down");
                    break;
                }
                notif = listener.recv() => {
                    match notif {
                        Ok(n) => debug!(msg_id = n.payload(), "notified of new task"),
                        Err(e) => warn!("PgListener error: {e}, falling back to poll"),
                    }
                }
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        let all = u32::try_from(self.config.concurrency).unwrap_or(u32::MAX);
        let _drained = self.slots.acquire_many(all).await;
        info!("worker pool stopped");
        Ok(())
    }

    /// Claim messages until the queue is empty or every slot is busy.
    async fn fill_slots(&self) {
        loop {
            let Ok(permit) = Arc::clone(&self.slots).try_acquire_owned() else {
                return;
            };

            let msg = match self
                .db
                .read_from_queue(&self.config.queue, self.config.visibility_timeout)
                .await
            {
                Ok(Some(msg)) => msg,
                Ok(None) => return,
                Err(e) => {
                    error!("queue read error: {e}");
                    return;
                }
            };

            let pool = self.clone();
            tokio::spawn(async move {
                pool.settle(msg).await;
                drop(permit);
            });
        }
    }

    async fn settle(&self, msg: PgmqMessage) {
        let disposition = process_delivery(&self.registry, &msg, self.config.task_timeout).await;
        if let Err(e) = self.apply(&msg, &disposition).await {
            // The message keeps its visibility timeout and comes back.
            error!(msg_id = msg.msg_id, "failed to settle delivery: {e}");
        }
    }

    async fn apply(&self, msg: &PgmqMessage, disposition: &Disposition) -> Result<()> {
        let queue = &self.config.queue;
        match disposition {
            Disposition::Complete => self.db.delete_message(queue, msg.msg_id).await,
            Disposition::Retry { delay_secs } => {
                self.db
                    .set_visibility_timeout(queue, msg.msg_id, *delay_secs)
                    .await
            }
            Disposition::Abandon { reason } => {
                error!(
                    msg_id = msg.msg_id,
                    attempt = msg.read_ct,
                    %reason,
                    "task abandoned, archiving"
                );
                self.db.archive_message(queue, msg.msg_id).await
            }
        }
    }
}

/// Run one delivery through its handler and decide what happens next.
///
/// Never touches the queue itself: the caller applies the returned
/// [`Disposition`].
pub async fn process_delivery(
    registry: &HandlerRegistry,
    msg: &PgmqMessage,
    task_timeout: Duration,
) -> Disposition {
    let task = match Task::from_message(&msg.message) {
        Ok(task) => task,
        Err(e) => {
            warn!(
                msg_id = msg.msg_id,
                attempt = msg.read_ct,
                error = %e,
                "undecodable task envelope"
            );
            let disposition = retry::disposition_for(msg.read_ct, MAX_RETRY, &e);
            count(&disposition, "unknown");
            return disposition;
        }
    };

    let span = start_task_span(task.task_type(), msg.msg_id, msg.read_ct);

    let disposition = async {
        let Some(handler) = registry.get(task.task_type()) else {
            error!(task_type = task.task_type(), "no handler for task type");
            return Disposition::Abandon {
                reason: format!("no handler for task type {}", task.task_type()),
            };
        };

        let err = match tokio::time::timeout(task_timeout, handler.handle(&task)).await {
            Ok(Ok(())) => return Disposition::Complete,
            Ok(Err(e)) => e,
            Err(_) => Error::TaskTimeout(task_timeout),
        };

        warn!(
            msg_id = msg.msg_id,
            attempt = msg.read_ct,
            max_retry = task.max_retry(),
            error = %err,
            "task failed"
        );
        retry::disposition_for(msg.read_ct, task.max_retry(), &err)
    }
    .instrument(span.clone())
    .await;

    record_disposition(&span, disposition.as_str());
    count(&disposition, task.task_type());
    disposition
}

fn count(disposition: &Disposition, task_type: &str) {
    metrics::tasks_processed().add(
        1,
        &[
            KeyValue::new("task_type", task_type.to_string()),
            KeyValue::new("result", disposition.as_str()),
        ],
    );
}
