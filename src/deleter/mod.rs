//! Batch deletion using the S3 DeleteObjects API.
//!
//! A [`BatchDeleter`] executes one [`DeleteBatchTask`] against the target
//! storage and turns every outcome, including a failed request, into a
//! [`DeleteResult`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsError;
use tracing::{debug, info, warn};

use crate::storage::Storage;
use crate::storage::s3::extract_sdk_error_details;
use crate::types::{DeleteBatchTask, DeleteResult, DeletionStatsReport};


/// Maximum objects per batch DeleteObjects API call (S3 limit).
pub const MAX_BATCH_SIZE: usize = 1000;

/// Deletes one listing page per call with a single DeleteObjects request.
///
/// Shared by every pool worker. Per-key failures are logged and counted, and
/// set the shared warning flag. They never abort the worker.
pub struct BatchDeleter {
    target: Storage,
    deletion_stats_report: Arc<DeletionStatsReport>,
    has_warning: Arc<AtomicBool>,
}

impl BatchDeleter {
    pub fn new(
        target: Storage,
        deletion_stats_report: Arc<DeletionStatsReport>,
        has_warning: Arc<AtomicBool>,
    ) -> Self {
        Self {
            target,
            deletion_stats_report,
            has_warning,
        }
    }

    /// Execute `task` and report its outcome.
    ///
    /// Always yields exactly one result whose deleted and failed keys
    /// together equal the task's keys.
    pub async fn delete(&self, worker_index: u16, task: DeleteBatchTask) -> DeleteResult {
        let batch_index = task.batch_index();

        if task.is_empty() {
            debug!(worker_index, batch_index, "empty batch skipped.");
            let result = DeleteResult::default();
            self.deletion_stats_report.record_batch(&result);
            return result;
        }

        debug!(
            worker_index,
            batch_index,
            batch_size = task.len(),
            "sending DeleteObjects batch request."
        );

        let result = match self.target.delete_batch(task.keys()).await {
            Ok(result) => result.reconcile(task.keys()),
            Err(e) => {
                let (error_code, error_message) = error_details(&e);
                warn!(
                    worker_index,
                    batch_index,
                    object_count = task.len(),
                    code = error_code,
                    message = error_message,
                    "DeleteObjects request failed for {} objects: {} ({}).",
                    task.len(),
                    error_code,
                    error_message,
                );
                DeleteResult::all_failed(task.keys(), &error_code, &error_message)
            }
        };

        self.report(worker_index, batch_index, &result);
        self.deletion_stats_report.record_batch(&result);

        result
    }

    fn report(&self, worker_index: u16, batch_index: u64, result: &DeleteResult) {
        if let Some(first) = result.deleted.first() {
            info!(
                worker_index,
                batch_index,
                deleted = result.deleted.len(),
                failed = result.failed.len(),
                key = first.key.as_str(),
                "deleted next {} after '{}'.",
                result.deleted.len(),
                first.key,
            );
        }

        if result.failed.is_empty() {
            return;
        }

        for failed in &result.failed {
            warn!(
                worker_index,
                batch_index,
                key = failed.key.as_str(),
                code = failed.error_code.as_str(),
                message = failed.error_message.as_str(),
                "failed to delete '{}': {} ({}).",
                failed.key,
                failed.error_code,
                failed.error_message,
            );
        }

        self.has_warning.store(true, Ordering::SeqCst);
    }
}

/// S3 error code and message of a failed DeleteObjects request.
fn error_details(e: &anyhow::Error) -> (String, String) {
    match e.downcast_ref::<SdkError<DeleteObjectsError>>() {
        Some(sdk_error) => extract_sdk_error_details(sdk_error),
        None => ("N/A".to_string(), format!("{e:#}")),
    }
}
