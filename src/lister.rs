use anyhow::Result;
use tracing::debug;

use crate::storage::Storage;
use crate::types::ListingPage;

/// Sequential cursor over the paginated listing of one bucket.
///
/// Pages are requested one at a time. The next request is only issued after
/// the caller asks for it, so two listing requests are never in flight at
/// once.
pub struct ObjectLister {
    target: Storage,
    prefix: Option<String>,
    cursor: Option<ListingPage>,
    finished: bool,
}

impl ObjectLister {
    pub fn new(target: Storage, prefix: Option<String>) -> Self {
        Self {
            target,
            prefix,
            cursor: None,
            finished: false,
        }
    }

    /// Fetch the next listing page.
    ///
    /// Returns `Ok(None)` once the last (non-truncated) page has been
    /// returned. After an error the lister is finished as well.
    pub async fn next_page(&mut self) -> Result<Option<ListingPage>> {
        if self.finished {
            return Ok(None);
        }

        let result = match &self.cursor {
            None => {
                debug!(prefix = self.prefix.as_deref(), "list first page.");
                self.target.list_first_page(self.prefix.as_deref()).await
            }
            Some(cursor) => {
                debug!(
                    continuation_token = cursor.next_continuation_token(),
                    "list next page."
                );
                self.target.list_next_page(cursor).await
            }
        };

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        if page.is_truncated() {
            self.cursor = Some(page.cursor());
        } else {
            self.finished = true;
            self.cursor = None;
        }

        Ok(Some(page))
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockStorage, init_dummy_tracing_subscriber, make_keys};
    use std::sync::Arc;

    #[tokio::test]
    async fn lists_all_pages_in_order() {
        init_dummy_tracing_subscriber();

        let mock = MockStorage::new(make_keys("k", 25), 10);
        let mut lister = ObjectLister::new(Arc::new(mock.clone()), None);

        let mut sizes = vec![];
        while let Some(page) = lister.next_page().await.unwrap() {
            sizes.push(page.len());
        }

        assert_eq!(sizes, vec![10, 10, 5]);
        assert!(lister.is_finished());
        assert_eq!(
            *mock.list_calls.lock().unwrap(),
            vec![None, Some("page-1".to_string()), Some("page-2".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_bucket_yields_one_empty_page() {
        init_dummy_tracing_subscriber();

        let mock = MockStorage::new(vec![], 10);
        let mut lister = ObjectLister::new(Arc::new(mock.clone()), None);

        let page = lister.next_page().await.unwrap().unwrap();
        assert!(page.is_empty());
        assert!(!page.is_truncated());
        assert!(lister.next_page().await.unwrap().is_none());
        assert_eq!(mock.list_call_count(), 1);
    }

    #[tokio::test]
    async fn prefix_is_carried_to_every_page() {
        init_dummy_tracing_subscriber();

        let mut keys = make_keys("logs/", 15);
        keys.extend(make_keys("data/", 15));
        let mock = MockStorage::new(keys, 10);
        let mut lister = ObjectLister::new(Arc::new(mock), Some("logs/".to_string()));

        let mut listed = vec![];
        while let Some(page) = lister.next_page().await.unwrap() {
            assert_eq!(page.prefix(), Some("logs/"));
            listed.extend(page.into_keys());
        }

        assert_eq!(listed, make_keys("logs/", 15));
    }

    #[tokio::test]
    async fn stops_after_listing_error() {
        init_dummy_tracing_subscriber();

        let mock = MockStorage::new(make_keys("k", 30), 10).with_listing_failure_at(1);
        let mut lister = ObjectLister::new(Arc::new(mock.clone()), None);

        assert!(lister.next_page().await.unwrap().is_some());
        assert!(lister.next_page().await.is_err());
        assert!(lister.next_page().await.unwrap().is_none());
        assert_eq!(mock.list_call_count(), 2);
    }
}
