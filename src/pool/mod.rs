//! Bounded pool of delete workers.
//!
//! `worker_size` tokio tasks share one bounded MPMC queue of `queue_size`
//! slots. [`WorkerPool::submit`] never waits for capacity: when every worker
//! is busy and the queue is full the task is handed back to the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_channel::{Receiver, Sender, TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::config::PoolConfig;
use crate::deleter::BatchDeleter;
use crate::types::DeleteBatchTask;
use crate::types::error::BatchDeleteError;


/// Outcome of [`WorkerPool::submit`].
#[derive(Debug, PartialEq)]
pub enum SubmitResult {
    /// The task was queued and will run exactly once.
    Accepted,
    /// Every worker is busy and the queue is full. The task is handed back.
    Rejected(DeleteBatchTask),
    /// The pool no longer accepts work. The task is handed back.
    Closed(DeleteBatchTask),
}

/// Aggregated outcome of a drained pool.
#[derive(Debug, Default)]
pub struct PoolResult {
    /// Tasks that ran to completion and produced a result.
    pub completed_tasks: u64,
    /// Worker panics, one entry per lost task.
    pub errors: Vec<anyhow::Error>,
}

impl PoolResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct WorkerPool {
    worker_size: u16,
    queue_size: u32,
    sender: Sender<DeleteBatchTask>,
    workers: Vec<JoinHandle<()>>,
    completed_tasks: Arc<AtomicU64>,
    errors: Arc<Mutex<Vec<anyhow::Error>>>,
}

impl WorkerPool {
    /// Spawn the workers on the current tokio runtime.
    pub fn new(pool_config: &PoolConfig, deleter: Arc<BatchDeleter>) -> Self {
        let worker_size = pool_config.worker_size.max(1);
        let queue_size = pool_config.queue_size.max(1);

        let (sender, receiver) = async_channel::bounded(queue_size as usize);
        let completed_tasks = Arc::new(AtomicU64::new(0));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let workers = (0..worker_size)
            .map(|worker_index| {
                tokio::spawn(run_worker(
                    worker_index,
                    receiver.clone(),
                    deleter.clone(),
                    completed_tasks.clone(),
                    errors.clone(),
                ))
            })
            .collect();

        debug!(worker_size, queue_size, "worker pool started.");

        Self {
            worker_size,
            queue_size,
            sender,
            workers,
            completed_tasks,
            errors,
        }
    }

    /// Offer `task` to the pool without waiting.
    pub fn submit(&self, task: DeleteBatchTask) -> SubmitResult {
        match self.sender.try_send(task) {
            Ok(()) => SubmitResult::Accepted,
            Err(TrySendError::Full(task)) => SubmitResult::Rejected(task),
            Err(TrySendError::Closed(task)) => SubmitResult::Closed(task),
        }
    }

    pub fn worker_size(&self) -> u16 {
        self.worker_size
    }

    pub fn queue_size(&self) -> u32 {
        self.queue_size
    }

    /// Tasks accepted but not yet picked up by a worker.
    pub fn queued_tasks(&self) -> usize {
        self.sender.len()
    }

    /// Stop accepting work and wait until every queued and running task
    /// has finished.
    pub async fn drain(self) -> PoolResult {
        self.sender.close();
        debug!("worker pool draining.");

        for worker in self.workers {
            if let Err(e) = worker.await {
                error!("delete worker panicked: {}", e);
                self.errors.lock().unwrap().push(anyhow!(
                    BatchDeleteError::WorkerPanicked(e.to_string())
                ));
            }
        }

        let errors = std::mem::take(&mut *self.errors.lock().unwrap());
        let completed_tasks = self.completed_tasks.load(Ordering::SeqCst);
        debug!(completed_tasks, "worker pool drained.");

        PoolResult {
            completed_tasks,
            errors,
        }
    }
}

/// Worker loop: runs tasks until the queue is closed and empty.
///
/// Each task runs in its own spawned task so a panic loses only that task.
async fn run_worker(
    worker_index: u16,
    receiver: Receiver<DeleteBatchTask>,
    deleter: Arc<BatchDeleter>,
    completed_tasks: Arc<AtomicU64>,
    errors: Arc<Mutex<Vec<anyhow::Error>>>,
) {
    debug!(worker_index, "delete worker started.");

    while let Ok(task) = receiver.recv().await {
        let batch_index = task.batch_index();
        let deleter = deleter.clone();

        let join_result =
            tokio::spawn(async move { deleter.delete(worker_index, task).await }).await;

        match join_result {
            Ok(_) => {
                completed_tasks.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                error!(worker_index, batch_index, "delete task panicked: {}", e);
                errors
                    .lock()
                    .unwrap()
                    .push(anyhow!(BatchDeleteError::WorkerPanicked(format!(
                        "batch {batch_index}: {e}"
                    ))));
            }
        }
    }

    debug!(worker_index, "delete worker has been completed.");
}
