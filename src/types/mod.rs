use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod error;

/// Error code recorded for a submitted key that the backend left out of its
/// DeleteObjects response.
pub const MISSING_FROM_RESPONSE_ERROR_CODE: &str = "MissingFromResponse";

/// One page of a paginated object listing.
///
/// Produced by a [`StorageTrait`](crate::storage::StorageTrait) implementation
/// and consumed exactly once by the deletion pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    prefix: Option<String>,
    keys: Vec<String>,
    next_continuation_token: Option<String>,
    is_truncated: bool,
}

impl ListingPage {
    pub fn new(
        prefix: Option<String>,
        keys: Vec<String>,
        next_continuation_token: Option<String>,
        is_truncated: bool,
    ) -> Self {
        Self {
            prefix,
            keys,
            next_continuation_token,
            is_truncated,
        }
    }

    /// The prefix this page was listed under. Continuation requests reuse it.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn next_continuation_token(&self) -> Option<&str> {
        self.next_continuation_token.as_deref()
    }

    /// Whether more pages follow this one.
    pub fn is_truncated(&self) -> bool {
        self.is_truncated
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// A copy of this page without its keys, holding only what is needed to
    /// request the following page.
    pub fn cursor(&self) -> ListingPage {
        ListingPage {
            prefix: self.prefix.clone(),
            keys: Vec::new(),
            next_continuation_token: self.next_continuation_token.clone(),
            is_truncated: self.is_truncated,
        }
    }

    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}

/// A unit of work for the worker pool: exactly one listing page's keys.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBatchTask {
    batch_index: u64,
    keys: Vec<String>,
}

impl DeleteBatchTask {
    pub fn new(batch_index: u64, keys: Vec<String>) -> Self {
        Self { batch_index, keys }
    }

    /// Zero-based position of the source page in listing order.
    pub fn batch_index(&self) -> u64 {
        self.batch_index
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}

/// Result of a batch deletion, reporting which keys succeeded and which failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteResult {
    /// Keys that were successfully deleted.
    pub deleted: Vec<DeletedKey>,
    /// Keys that failed, with error details.
    pub failed: Vec<FailedKey>,
}

/// A successfully deleted key.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedKey {
    pub key: String,
}

/// A key that failed to delete.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedKey {
    pub key: String,
    pub error_code: String,
    pub error_message: String,
}

impl DeleteResult {
    /// Build a result in which every key failed for the same reason. Used
    /// when the batch request as a whole could not be completed.
    pub fn all_failed(keys: &[String], error_code: &str, error_message: &str) -> Self {
        Self {
            deleted: vec![],
            failed: keys
                .iter()
                .map(|key| FailedKey {
                    key: key.clone(),
                    error_code: error_code.to_string(),
                    error_message: error_message.to_string(),
                })
                .collect(),
        }
    }

    /// Align this result with the keys that were actually submitted.
    ///
    /// After reconciliation the deleted and failed sets are disjoint and their
    /// union equals `submitted`. A key reported both ways counts as failed.
    /// Keys the backend did not mention become failures with
    /// [`MISSING_FROM_RESPONSE_ERROR_CODE`]. Keys that were never submitted
    /// are dropped.
    pub fn reconcile(self, submitted: &[String]) -> Self {
        let submitted_set: HashSet<&str> = submitted.iter().map(String::as_str).collect();
        let mut seen: HashSet<String> = HashSet::with_capacity(submitted.len());

        let mut failed = Vec::with_capacity(self.failed.len());
        for failed_key in self.failed {
            if submitted_set.contains(failed_key.key.as_str()) && seen.insert(failed_key.key.clone())
            {
                failed.push(failed_key);
            }
        }

        let mut deleted = Vec::with_capacity(self.deleted.len());
        for deleted_key in self.deleted {
            if submitted_set.contains(deleted_key.key.as_str())
                && seen.insert(deleted_key.key.clone())
            {
                deleted.push(deleted_key);
            }
        }

        for key in submitted {
            if seen.insert(key.clone()) {
                failed.push(FailedKey {
                    key: key.clone(),
                    error_code: MISSING_FROM_RESPONSE_ERROR_CODE.to_string(),
                    error_message: "key was not reported by the DeleteObjects response"
                        .to_string(),
                });
            }
        }

        Self { deleted, failed }
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Snapshot of the counters collected during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionStats {
    pub batches_submitted: u64,
    pub batches_completed: u64,
    pub deleted_objects: u64,
    pub failed_objects: u64,
}

/// Lock-free counters shared between the pipeline and the pool workers.
#[derive(Debug, Default)]
pub struct DeletionStatsReport {
    batches_submitted: AtomicU64,
    batches_completed: AtomicU64,
    deleted_objects: AtomicU64,
    failed_objects: AtomicU64,
}

impl DeletionStatsReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_submitted(&self) {
        self.batches_submitted.fetch_add(1, Ordering::SeqCst);
    }

    /// Count one completed batch and its per-key outcome.
    pub fn record_batch(&self, result: &DeleteResult) {
        self.deleted_objects
            .fetch_add(result.deleted.len() as u64, Ordering::SeqCst);
        self.failed_objects
            .fetch_add(result.failed.len() as u64, Ordering::SeqCst);
        self.batches_completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> DeletionStats {
        DeletionStats {
            batches_submitted: self.batches_submitted.load(Ordering::SeqCst),
            batches_completed: self.batches_completed.load(Ordering::SeqCst),
            deleted_objects: self.deleted_objects.load(Ordering::SeqCst),
            failed_objects: self.failed_objects.load(Ordering::SeqCst),
        }
    }
}
