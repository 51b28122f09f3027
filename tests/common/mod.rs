//! Shared integration test infrastructure for s3-batch-delete.
//!
//! Provides `InMemoryBucket`, a `StorageTrait` implementation that keeps
//! keys in a sorted set and paginates with start-after continuation tokens,
//! plus helpers to run a pipeline against it.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use s3_batch_delete::config::PoolConfig;
use s3_batch_delete::types::{DeletedKey, FailedKey};
use s3_batch_delete::{Config, DeleteResult, DeletionPipeline, DeletionStats, ListingPage, StorageTrait};

/// Result of running a deletion pipeline.
#[derive(Debug)]
pub struct PipelineResult {
    pub stats: DeletionStats,
    pub has_error: bool,
    pub has_warning: bool,
    /// Error messages collected from the pipeline (empty if no errors).
    pub errors: Vec<String>,
}

pub struct InMemoryBucket {
    name: String,
    keys: Mutex<BTreeSet<String>>,
    page_size: usize,
    denied_keys: HashSet<String>,
    fail_listing_at: Option<usize>,
    list_calls: AtomicUsize,
    delete_requests: Mutex<Vec<usize>>,
}

impl InMemoryBucket {
    pub fn new(name: &str, keys: impl IntoIterator<Item = String>, page_size: usize) -> Self {
        Self {
            name: name.to_string(),
            keys: Mutex::new(keys.into_iter().collect()),
            page_size,
            denied_keys: HashSet::new(),
            fail_listing_at: None,
            list_calls: AtomicUsize::new(0),
            delete_requests: Mutex::new(Vec::new()),
        }
    }

    /// Keys that every DeleteObjects response reports as AccessDenied.
    pub fn with_denied_keys(mut self, keys: &[String]) -> Self {
        self.denied_keys = keys.iter().cloned().collect();
        self
    }

    /// Fail the listing call with this zero-based index.
    pub fn with_listing_failure_at(mut self, call_index: usize) -> Self {
        self.fail_listing_at = Some(call_index);
        self
    }

    pub fn remaining_keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().iter().cloned().collect()
    }

    /// Number of keys in each DeleteObjects request, in arrival order.
    pub fn delete_request_sizes(&self) -> Vec<usize> {
        self.delete_requests.lock().unwrap().clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn list_after(&self, prefix: Option<&str>, start_after: Option<&str>) -> Result<ListingPage> {
        let call_index = self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing_at == Some(call_index) {
            return Err(anyhow!("InternalError: listing call {call_index} failed"));
        }

        let keys = self.keys.lock().unwrap();
        let mut matching = keys
            .iter()
            .filter(|key| prefix.is_none_or(|p| key.starts_with(p)))
            .filter(|key| start_after.is_none_or(|after| key.as_str() > after));

        let page: Vec<String> = matching.by_ref().take(self.page_size).cloned().collect();
        let is_truncated = matching.next().is_some();
        let token = if is_truncated { page.last().cloned() } else { None };

        Ok(ListingPage::new(
            prefix.map(str::to_string),
            page,
            token,
            is_truncated,
        ))
    }
}

#[async_trait]
impl StorageTrait for InMemoryBucket {
    fn bucket(&self) -> &str {
        &self.name
    }

    async fn list_first_page(&self, prefix: Option<&str>) -> Result<ListingPage> {
        self.list_after(prefix, None)
    }

    async fn list_next_page(&self, previous: &ListingPage) -> Result<ListingPage> {
        let token = previous
            .next_continuation_token()
            .ok_or_else(|| anyhow!("missing continuation token"))?;
        self.list_after(previous.prefix(), Some(token))
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<DeleteResult> {
        tokio::task::yield_now().await;
        self.delete_requests.lock().unwrap().push(keys.len());

        let mut stored = self.keys.lock().unwrap();
        let mut result = DeleteResult::default();
        for key in keys {
            if self.denied_keys.contains(key) {
                result.failed.push(FailedKey {
                    key: key.clone(),
                    error_code: "AccessDenied".to_string(),
                    error_message: "Access Denied".to_string(),
                });
            } else {
                stored.remove(key);
                result.deleted.push(DeletedKey { key: key.clone() });
            }
        }
        Ok(result)
    }
}

pub fn make_keys(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}file{i:05}.dat")).collect()
}

pub fn make_config(bucket: &str, prefix: Option<&str>, worker_size: u16) -> Config {
    let mut config = Config::for_target(bucket, prefix);
    config.pool_config = PoolConfig {
        worker_size,
        queue_size: worker_size as u32,
        submit_retry_interval_milliseconds: 5,
    };
    config
}

pub async fn run_pipeline(config: Config, bucket: Arc<InMemoryBucket>) -> PipelineResult {
    let mut pipeline = DeletionPipeline::with_storage(config, bucket);
    pipeline.run().await;

    PipelineResult {
        stats: pipeline.get_deletion_stats(),
        has_error: pipeline.has_error(),
        has_warning: pipeline.has_warning(),
        errors: pipeline.get_error_messages().unwrap_or_default(),
    }
}
