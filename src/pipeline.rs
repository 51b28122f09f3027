//! Deletion pipeline orchestrator.
//!
//! Walks the bucket listing one page at a time and hands each page to a
//! bounded [`WorkerPool`] as one [`DeleteBatchTask`]. When the pool is
//! saturated the task comes back and is offered again after a fixed sleep.
//! Once listing ends, successfully or not, the pool is drained.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::deleter::BatchDeleter;
use crate::lister::ObjectLister;
use crate::pool::{SubmitResult, WorkerPool};
use crate::storage::s3::S3StorageFactory;
use crate::storage::{Storage, StorageFactory};
use crate::types::error::BatchDeleteError;
use crate::types::{DeleteBatchTask, DeletionStats, DeletionStatsReport};

/// The core deletion pipeline.
///
/// ```text
/// ObjectLister → (one task per page) → WorkerPool → BatchDeleter
/// ```
///
/// ## Usage
///
/// ```no_run
/// # async fn example() {
/// use s3_batch_delete::{Config, DeletionPipeline};
///
/// let config = Config::for_target("my-bucket", Some("logs/"));
/// let mut pipeline = DeletionPipeline::new(config).await;
/// pipeline.run().await;
/// if pipeline.has_error() {
///     eprintln!("{:?}", pipeline.get_errors_and_consume().unwrap()[0]);
/// }
/// # }
/// ```
pub struct DeletionPipeline {
    config: Config,
    target: Storage,
    has_error: Arc<AtomicBool>,
    has_warning: Arc<AtomicBool>,
    errors: Arc<Mutex<VecDeque<anyhow::Error>>>,
    ready: bool,
    deletion_stats_report: Arc<DeletionStatsReport>,
}

impl DeletionPipeline {
    /// Create a pipeline backed by S3, built from `config.target_client_config`.
    pub async fn new(config: Config) -> Self {
        let target = S3StorageFactory::create(&config).await;
        Self::with_storage(config, target)
    }

    /// Create a pipeline over an already constructed storage.
    pub fn with_storage(config: Config, target: Storage) -> Self {
        Self {
            config,
            target,
            has_error: Arc::new(AtomicBool::new(false)),
            has_warning: Arc::new(AtomicBool::new(false)),
            errors: Arc::new(Mutex::new(VecDeque::new())),
            ready: true,
            deletion_stats_report: Arc::new(DeletionStatsReport::new()),
        }
    }

    /// Run the pipeline to completion.
    ///
    /// Outcome is reported through [`has_error`](Self::has_error),
    /// [`has_warning`](Self::has_warning) and
    /// [`get_deletion_stats`](Self::get_deletion_stats).
    pub async fn run(&mut self) {
        assert!(self.ready, "DeletionPipeline::run() called more than once");
        self.ready = false;

        let started = Instant::now();
        debug!(bucket = self.target.bucket(), "deletion pipeline started.");

        let deleter = Arc::new(BatchDeleter::new(
            self.target.clone(),
            self.deletion_stats_report.clone(),
            self.has_warning.clone(),
        ));
        let pool = WorkerPool::new(&self.config.pool_config, deleter);

        if let Err(e) = self.list_and_submit(&pool).await {
            error!("{:#}", e);
            self.record_error(e);
        }

        let pool_result = pool.drain().await;
        for e in pool_result.errors {
            self.record_error(e);
        }

        let stats = self.get_deletion_stats();
        info!(
            batches = stats.batches_completed,
            deleted = stats.deleted_objects,
            failed = stats.failed_objects,
            duration_sec = started.elapsed().as_secs_f64(),
            "{} objects deleted, {} failed, in {} batches.",
            stats.deleted_objects,
            stats.failed_objects,
            stats.batches_completed,
        );
    }

    /// Check if any error occurred during the pipeline execution.
    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }

    /// Check if any key failed to delete.
    pub fn has_warning(&self) -> bool {
        self.has_warning.load(Ordering::SeqCst)
    }

    /// Consume and return all accumulated errors.
    ///
    /// Returns `None` if no errors occurred.
    pub fn get_errors_and_consume(&self) -> Option<Vec<anyhow::Error>> {
        if !self.has_error() {
            return None;
        }
        let mut error_list = self.errors.lock().unwrap();
        Some(error_list.drain(..).collect())
    }

    /// Get error messages without consuming them.
    pub fn get_error_messages(&self) -> Option<Vec<String>> {
        if !self.has_error() {
            return None;
        }
        let error_list = self.errors.lock().unwrap();
        Some(error_list.iter().map(|e| format!("{e:#}")).collect())
    }

    /// Get a snapshot of the current deletion statistics.
    pub fn get_deletion_stats(&self) -> DeletionStats {
        self.deletion_stats_report.snapshot()
    }

    // -----------------------------------------------------------------------
    // Internal methods
    // -----------------------------------------------------------------------

    /// Fetch pages sequentially and submit one task per non-empty page.
    ///
    /// Stops at the first listing error. Tasks already accepted keep running.
    async fn list_and_submit(&self, pool: &WorkerPool) -> Result<()> {
        let mut lister = ObjectLister::new(self.target.clone(), self.config.prefix.clone());
        let mut batch_index: u64 = 0;

        while let Some(page) = lister
            .next_page()
            .await
            .context(BatchDeleteError::Listing(self.config.bucket.clone()))?
        {
            if page.is_empty() {
                if page.is_truncated() {
                    debug!("empty truncated page skipped.");
                }
                continue;
            }

            let task = DeleteBatchTask::new(batch_index, page.into_keys());
            self.submit_with_retry(pool, task).await?;
            self.deletion_stats_report.increment_submitted();
            batch_index += 1;
        }

        debug!(batches = batch_index, "object listing has been completed.");
        Ok(())
    }

    /// Offer `task` to the pool until it is accepted.
    async fn submit_with_retry(&self, pool: &WorkerPool, mut task: DeleteBatchTask) -> Result<()> {
        let retry_interval =
            Duration::from_millis(self.config.pool_config.submit_retry_interval_milliseconds);

        loop {
            match pool.submit(task) {
                SubmitResult::Accepted => return Ok(()),
                SubmitResult::Rejected(rejected) => {
                    info!(
                        batch_index = rejected.batch_index(),
                        "waiting for next execution slot."
                    );
                    task = rejected;
                    tokio::time::sleep(retry_interval).await;
                }
                SubmitResult::Closed(closed) => {
                    return Err(anyhow!(BatchDeleteError::PoolClosed)).with_context(|| {
                        format!("batch {} could not be submitted", closed.batch_index())
                    });
                }
            }
        }
    }

    /// Record an error and set the error flag.
    fn record_error(&self, error: anyhow::Error) {
        self.has_error.store(true, Ordering::SeqCst);
        self.errors.lock().unwrap().push_back(error);
    }
}
