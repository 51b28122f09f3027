//! Shared test utilities for the s3-batch-delete library crate.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::config::{Config, PoolConfig};
use crate::storage::StorageTrait;
use crate::types::{DeleteResult, DeletedKey, FailedKey, ListingPage};

/// Initialise a dummy tracing subscriber for tests.
///
/// Uses `try_init` so that only the first call in a process actually
/// installs the subscriber; subsequent calls are silently ignored.
pub(crate) fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}

/// Create a [`Config`] for "test-bucket" with no countdown and a short
/// submission retry interval.
pub(crate) fn make_test_config(worker_size: u16, queue_size: u32) -> Config {
    let mut config = Config::for_target("test-bucket", None);
    config.pool_config = PoolConfig {
        worker_size,
        queue_size,
        submit_retry_interval_milliseconds: 10,
    };
    config
}

/// Generate `count` keys named `prefix` + zero-padded index.
pub(crate) fn make_keys(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i:06}")).collect()
}

/// In-memory storage for unit tests.
///
/// Keys are paginated `page_size` at a time after prefix filtering. Every call
/// is recorded. Deletes can be held behind a semaphore gate so tests can
/// observe the pool while workers are busy.
#[derive(Clone)]
pub(crate) struct MockStorage {
    bucket: String,
    keys: Vec<String>,
    page_size: usize,
    fail_listing_at: Option<usize>,
    failed_keys: HashMap<String, (String, String)>,
    fail_all_deletes: bool,
    delete_gate: Option<Arc<Semaphore>>,
    pub list_calls: Arc<Mutex<Vec<Option<String>>>>,
    pub delete_calls: Arc<Mutex<Vec<Vec<String>>>>,
    pub deletes_started: Arc<AtomicUsize>,
    active_deletes: Arc<AtomicUsize>,
    pub max_active_deletes: Arc<AtomicUsize>,
}

impl MockStorage {
    pub fn new(keys: Vec<String>, page_size: usize) -> Self {
        MockStorage {
            bucket: "test-bucket".to_string(),
            keys,
            page_size: page_size.max(1),
            fail_listing_at: None,
            failed_keys: HashMap::new(),
            fail_all_deletes: false,
            delete_gate: None,
            list_calls: Arc::new(Mutex::new(Vec::new())),
            delete_calls: Arc::new(Mutex::new(Vec::new())),
            deletes_started: Arc::new(AtomicUsize::new(0)),
            active_deletes: Arc::new(AtomicUsize::new(0)),
            max_active_deletes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the listing call with this zero-based index.
    pub fn with_listing_failure_at(mut self, call_index: usize) -> Self {
        self.fail_listing_at = Some(call_index);
        self
    }

    /// Report `key` as failed in every delete response that contains it.
    pub fn with_failed_key(mut self, key: &str, code: &str, message: &str) -> Self {
        self.failed_keys
            .insert(key.to_string(), (code.to_string(), message.to_string()));
        self
    }

    /// Fail every delete request as a whole.
    pub fn with_total_delete_failure(mut self) -> Self {
        self.fail_all_deletes = true;
        self
    }

    /// Block every delete until a permit is added to `gate`.
    pub fn with_delete_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.delete_gate = Some(gate);
        self
    }

    pub fn deleted_batches(&self) -> Vec<Vec<String>> {
        self.delete_calls.lock().unwrap().clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    fn page_at(&self, prefix: Option<&str>, page_index: usize) -> ListingPage {
        let matching: Vec<&String> = self
            .keys
            .iter()
            .filter(|key| prefix.is_none_or(|p| key.starts_with(p)))
            .collect();

        let start = page_index * self.page_size;
        let end = (start + self.page_size).min(matching.len());
        let page_keys = matching
            .get(start..end)
            .map(|slice| slice.iter().map(|k| k.to_string()).collect())
            .unwrap_or_default();
        let is_truncated = end < matching.len();

        ListingPage::new(
            prefix.map(str::to_string),
            page_keys,
            is_truncated.then(|| format!("page-{}", page_index + 1)),
            is_truncated,
        )
    }

    fn record_list_call(&self, token: Option<&str>) -> Result<()> {
        let mut calls = self.list_calls.lock().unwrap();
        let call_index = calls.len();
        calls.push(token.map(str::to_string));

        if self.fail_listing_at == Some(call_index) {
            return Err(anyhow!("injected listing failure at call {call_index}"));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageTrait for MockStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_first_page(&self, prefix: Option<&str>) -> Result<ListingPage> {
        self.record_list_call(None)?;
        Ok(self.page_at(prefix, 0))
    }

    async fn list_next_page(&self, previous: &ListingPage) -> Result<ListingPage> {
        let token = previous
            .next_continuation_token()
            .ok_or_else(|| anyhow!("no continuation token"))?;
        self.record_list_call(Some(token))?;

        let page_index = token
            .strip_prefix("page-")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| anyhow!("unknown continuation token {token}"))?;
        Ok(self.page_at(previous.prefix(), page_index))
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<DeleteResult> {
        self.deletes_started.fetch_add(1, Ordering::SeqCst);
        let active = self.active_deletes.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_deletes.fetch_max(active, Ordering::SeqCst);

        if let Some(gate) = &self.delete_gate {
            gate.acquire().await?.forget();
        }

        self.delete_calls.lock().unwrap().push(keys.to_vec());
        self.active_deletes.fetch_sub(1, Ordering::SeqCst);

        if self.fail_all_deletes {
            return Err(anyhow!("injected DeleteObjects failure"));
        }

        let mut result = DeleteResult::default();
        for key in keys {
            match self.failed_keys.get(key) {
                Some((code, message)) => result.failed.push(FailedKey {
                    key: key.clone(),
                    error_code: code.clone(),
                    error_message: message.clone(),
                }),
                None => result.deleted.push(DeletedKey { key: key.clone() }),
            }
        }
        Ok(result)
    }
}
