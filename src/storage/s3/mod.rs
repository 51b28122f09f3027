pub mod client_builder;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use std::sync::Arc;

use crate::config::Config;
use crate::storage::{Storage, StorageFactory, StorageTrait};
use crate::types::error::BatchDeleteError;
use crate::types::{DeleteResult, DeletedKey, FailedKey, ListingPage};

/// Extracts the S3 error code and message from an AWS SDK error.
///
/// For service errors (S3 API responses), returns the S3 error code
/// (e.g. "AccessDenied", "InternalError") and the message from the response.
/// For other error types (network, timeout, construction failure), returns
/// "N/A" as the code and the full error description as the message.
pub(crate) fn extract_sdk_error_details<E: std::fmt::Display + ProvideErrorMetadata>(
    e: &SdkError<E>,
) -> (String, String) {
    if let Some(service_err) = e.as_service_error() {
        (
            service_err.code().unwrap_or("unknown").to_string(),
            service_err.message().unwrap_or("no message").to_string(),
        )
    } else {
        ("N/A".to_string(), e.to_string())
    }
}

/// Factory for creating S3 storage instances.
pub struct S3StorageFactory;

#[async_trait]
impl StorageFactory for S3StorageFactory {
    async fn create(config: &Config) -> Storage {
        let client = match &config.target_client_config {
            Some(client_config) => client_config.create_client().await,
            None => Client::new(&aws_config::load_defaults(BehaviorVersion::latest()).await),
        };

        Arc::new(S3Storage::new(client, &config.bucket, config.max_keys))
    }
}

/// S3 storage backed by `ListObjectsV2` and `DeleteObjects`.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    max_keys: i32,
}

impl S3Storage {
    pub fn new(client: Client, bucket: &str, max_keys: i32) -> Self {
        S3Storage {
            client,
            bucket: bucket.to_string(),
            max_keys,
        }
    }

    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ListingPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(prefix.map(str::to_string))
            .set_continuation_token(continuation_token.map(str::to_string))
            .max_keys(self.max_keys)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = self.bucket,
                    prefix = prefix.unwrap_or_default(),
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 ListObjectsV2 API call failed for s3://{}/{}: {} ({}).",
                    self.bucket,
                    prefix.unwrap_or_default(),
                    s3_error_code,
                    s3_error_message,
                );
                anyhow!(e).context(BatchDeleteError::AwsSdk(
                    "aws_sdk_s3::client::list_objects_v2() failed.".to_string(),
                ))
            })?;

        Ok(page_from_output(prefix, output))
    }
}

#[async_trait]
impl StorageTrait for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_first_page(&self, prefix: Option<&str>) -> Result<ListingPage> {
        self.list_page(prefix, None).await
    }

    async fn list_next_page(&self, previous: &ListingPage) -> Result<ListingPage> {
        let continuation_token = previous.next_continuation_token().ok_or_else(|| {
            anyhow!(
                "truncated listing page for bucket '{}' has no continuation token.",
                self.bucket
            )
        })?;

        self.list_page(previous.prefix(), Some(continuation_token))
            .await
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<DeleteResult> {
        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to build ObjectIdentifier")?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .context("Failed to build Delete request")?;

        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                let (s3_error_code, s3_error_message) = extract_sdk_error_details(&e);
                tracing::error!(
                    bucket = self.bucket,
                    object_count = keys.len(),
                    s3_error_code = s3_error_code,
                    s3_error_message = s3_error_message,
                    "S3 DeleteObjects API call failed for {} objects in s3://{}: {} ({}).",
                    keys.len(),
                    self.bucket,
                    s3_error_code,
                    s3_error_message,
                );
                anyhow!(e).context(BatchDeleteError::AwsSdk(
                    "aws_sdk_s3::client::delete_objects() failed.".to_string(),
                ))
            })?;

        Ok(result_from_output(output, keys))
    }
}

fn page_from_output(prefix: Option<&str>, output: ListObjectsV2Output) -> ListingPage {
    let keys = output
        .contents()
        .iter()
        .filter_map(|object| object.key().map(str::to_string))
        .collect();

    ListingPage::new(
        prefix.map(str::to_string),
        keys,
        output.next_continuation_token().map(str::to_string),
        output.is_truncated() == Some(true),
    )
}

fn result_from_output(output: DeleteObjectsOutput, submitted: &[String]) -> DeleteResult {
    let deleted = output
        .deleted()
        .iter()
        .filter_map(|deleted| deleted.key())
        .map(|key| DeletedKey {
            key: key.to_string(),
        })
        .collect();

    let failed = output
        .errors()
        .iter()
        .filter_map(|error| {
            error.key().map(|key| FailedKey {
                key: key.to_string(),
                error_code: error.code().unwrap_or("unknown").to_string(),
                error_message: error.message().unwrap_or("no message").to_string(),
            })
        })
        .collect();

    DeleteResult { deleted, failed }.reconcile(submitted)
}
