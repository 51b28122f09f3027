use anyhow::Error;
use thiserror::Error;

/// Application-level error types for s3-batch-delete.
///
/// ## Exit Codes
///
/// Each variant maps to an exit code (via `exit_code()`):
/// - 1: Missing required option, fatal run errors (Listing, AwsSdk, PoolClosed, WorkerPanicked)
/// - 2: Invalid option value (InvalidConfig)
/// - 3: Partial failure (some objects deleted, some failed)
#[derive(Error, Debug, PartialEq)]
pub enum BatchDeleteError {
    /// AWS SDK error outside of listing.
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// A required command-line option was not supplied.
    #[error("Missing required option: {0}")]
    MissingOption(String),

    /// An option value could not be parsed or is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Listing the bucket failed. Fatal to the whole run.
    #[error("Failed to list objects in bucket '{0}'")]
    Listing(String),

    /// A task was submitted after the pool started draining.
    #[error("Worker pool is closed")]
    PoolClosed,

    /// A worker task panicked while executing a batch.
    #[error("Worker task panicked: {0}")]
    WorkerPanicked(String),

    /// The run finished but some keys could not be deleted.
    #[error("Partial failure: {deleted} deleted, {failed} failed")]
    PartialFailure { deleted: u64, failed: u64 },
}

impl BatchDeleteError {
    /// Get the appropriate process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BatchDeleteError::InvalidConfig(_) => 2,
            BatchDeleteError::PartialFailure { .. } => 3,
            _ => 1,
        }
    }
}

/// Check if an anyhow::Error wraps a listing failure.
pub fn is_listing_error(e: &Error) -> bool {
    matches!(
        e.downcast_ref::<BatchDeleteError>(),
        Some(BatchDeleteError::Listing(_))
    )
}

/// Extract the exit code from an anyhow::Error, defaulting to 1.
pub fn exit_code_from_error(e: &Error) -> i32 {
    if let Some(err) = e.downcast_ref::<BatchDeleteError>() {
        return err.exit_code();
    }
    1
}
