use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, trace};

use s3_batch_delete::config::Config;
use s3_batch_delete::config::args::exit_code_from_clap_error;
use s3_batch_delete::types::error::BatchDeleteError;
use s3_batch_delete::{CLIArgs, DeletionPipeline, SafetyChecker};

mod tracing_init;

/// s3-batch-delete - delete every object in an S3 bucket with batched requests.
///
/// This binary is a thin wrapper over the s3_batch_delete library.
#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config_exit_if_err();

    start_tracing_if_necessary(&config);

    trace!("config = {:?}", config);

    SafetyChecker::new(&config)
        .announce_and_count_down(&mut std::io::stdout(), Duration::from_secs(1))
        .await?;

    run(config).await
}

/// Parse the command line, exiting with 1 for a missing required option
/// and 2 for an invalid value.
fn load_config_exit_if_err() -> Config {
    let cli_args = match CLIArgs::try_parse() {
        Ok(cli_args) => cli_args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(exit_code_from_clap_error(&e));
        }
    };

    match Config::try_from(cli_args) {
        Ok(config) => config,
        Err(error_message) => {
            let e = BatchDeleteError::InvalidConfig(error_message);
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn start_tracing_if_necessary(config: &Config) -> bool {
    let Some(tracing_config) = config.tracing_config.as_ref() else {
        return false;
    };

    tracing_init::init_tracing(tracing_config);
    true
}

async fn run(config: Config) -> Result<()> {
    let start_time = tokio::time::Instant::now();
    debug!("deletion pipeline start.");

    let mut pipeline = DeletionPipeline::new(config).await;
    pipeline.run().await;

    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());

    if pipeline.has_error() {
        let errors = pipeline.get_errors_and_consume().unwrap_or_default();
        for err in &errors {
            error!("{:#}", err);
        }
        error!(duration_sec = duration_sec, "s3-batch-delete failed.");
        return Err(anyhow::anyhow!("s3-batch-delete failed."));
    }

    if pipeline.has_warning() {
        let stats = pipeline.get_deletion_stats();
        let warning = BatchDeleteError::PartialFailure {
            deleted: stats.deleted_objects,
            failed: stats.failed_objects,
        };
        error!(duration_sec = duration_sec, "{}", warning);
        std::process::exit(warning.exit_code());
    }

    debug!(duration_sec = duration_sec, "s3-batch-delete has been completed.");
    Ok(())
}
