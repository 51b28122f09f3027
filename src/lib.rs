/*!
# Overview
s3-batch-delete empties an Amazon S3 (or S3-compatible) bucket, optionally
restricted to a key prefix.

It walks the bucket listing one page at a time and deletes every page with a
single `DeleteObjects` request, running up to `--threads` requests
concurrently. When every worker is busy the next page waits and is offered
again after a short sleep, so memory use stays bounded regardless of bucket
size. Keys that fail to delete are reported individually.

## As a Library
The `s3-batch-delete` CLI is a thin wrapper over this library.

```no_run
use s3_batch_delete::config::Config;
use s3_batch_delete::config::args::parse_from_args;
use s3_batch_delete::DeletionPipeline;

#[tokio::main]
async fn main() {
    let args = vec![
        "s3-batch-delete",
        "--region", "eu-central-1",
        "--bucket", "my-bucket",
        "--profile", "admin",
        "--prefix", "tmp/",
    ];

    let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();
    let mut pipeline = DeletionPipeline::new(config).await;
    pipeline.run().await;

    if pipeline.has_error() {
        eprintln!("{:?}", pipeline.get_errors_and_consume().unwrap()[0]);
    }
}
```
*/

pub mod config;
pub mod deleter;
pub mod lister;
pub mod pipeline;
pub mod pool;
pub mod safety;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;
pub use config::args::CLIArgs;
pub use pipeline::DeletionPipeline;
pub use safety::SafetyChecker;
pub use storage::{Storage, StorageTrait};
pub use types::error::{BatchDeleteError, exit_code_from_error, is_listing_error};
pub use types::{DeleteBatchTask, DeleteResult, DeletionStats, ListingPage};
