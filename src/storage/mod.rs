use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::types::{DeleteResult, ListingPage};

pub mod s3;

/// Shared handle to a storage backend.
///
/// One instance is shared read-only by the lister and every worker.
pub type Storage = Arc<dyn StorageTrait + Send + Sync>;

/// Factory trait for creating Storage instances.
#[async_trait]
pub trait StorageFactory {
    async fn create(config: &Config) -> Storage;
}

/// Storage operations needed by the deletion pipeline.
///
/// The bucket is bound when the storage is constructed.
#[async_trait]
pub trait StorageTrait {
    /// Bucket this storage lists and deletes from.
    fn bucket(&self) -> &str;

    /// Request the first listing page under `prefix` (or the whole bucket).
    ///
    /// Listing failures are treated as unrecoverable errors.
    async fn list_first_page(&self, prefix: Option<&str>) -> Result<ListingPage>;

    /// Request the page that follows `previous`, using its continuation token.
    ///
    /// Only valid when `previous.is_truncated()` is true.
    async fn list_next_page(&self, previous: &ListingPage) -> Result<ListingPage>;

    /// Delete up to 1000 keys with one batched request.
    ///
    /// Per-key failures are reported inside the returned [`DeleteResult`].
    /// `Err` means the request as a whole failed.
    async fn delete_batch(&self, keys: &[String]) -> Result<DeleteResult>;
}
