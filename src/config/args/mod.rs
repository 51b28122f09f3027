use crate::config::{
    CLITimeoutConfig, ClientConfig, Config, PoolConfig, RetryConfig, TracingConfig,
};
use crate::types::error::BatchDeleteError;
use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use clap::error::ErrorKind;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::ffi::OsString;

mod value_parser;


// ---------------------------------------------------------------------------
// Default constants
// ---------------------------------------------------------------------------

const DEFAULT_THREADS: u16 = 4;
const DEFAULT_SUBMIT_RETRY_INTERVAL_MILLISECONDS: u64 = 500;
const DEFAULT_MAX_KEYS: i32 = 1000;
const DEFAULT_COUNTDOWN_SECONDS: u64 = 10;
const DEFAULT_AWS_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_INITIAL_BACKOFF_MILLISECONDS: u64 = 100;
const DEFAULT_FORCE_PATH_STYLE: bool = false;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;

const MAX_KEYS_LIMIT: i32 = 1000;

// ---------------------------------------------------------------------------
// Error messages
// ---------------------------------------------------------------------------

const ERROR_MESSAGE_THREADS_ZERO: &str = "--threads must be at least 1.";
const ERROR_MESSAGE_QUEUE_SIZE_ZERO: &str = "--queue-size must be at least 1.";
const ERROR_MESSAGE_MAX_KEYS_OUT_OF_RANGE: &str =
    "--max-keys must be between 1 and 1000 (S3 API limit).";
const ERROR_MESSAGE_AWS_MAX_ATTEMPTS_ZERO: &str = "--aws-max-attempts must be at least 1.";

// ---------------------------------------------------------------------------
// CLIArgs (clap-derived argument struct)
// ---------------------------------------------------------------------------

/// s3-batch-delete - delete every object in an S3 bucket with batched requests.
///
/// Lists the bucket page by page and deletes each page with one
/// DeleteObjects request, using a fixed pool of concurrent workers.
///
/// Example:
///   s3-batch-delete --region eu-central-1 --bucket my-bucket --profile admin
///   s3-batch-delete --region us-east-1 --bucket my-bucket --profile admin --prefix tmp/ --threads 16
#[derive(Parser, Clone, Debug)]
#[command(name = "s3-batch-delete", version, about, long_about = None)]
pub struct CLIArgs {
    // -----------------------------------------------------------------------
    // Target options
    // -----------------------------------------------------------------------
    /// The AWS region of the bucket.
    #[arg(long, env = "S3_BATCH_DELETE_REGION", value_parser = NonEmptyStringValueParser::new(), help_heading = "Target")]
    pub region: String,

    /// The bucket to empty.
    #[arg(long, env = "S3_BATCH_DELETE_BUCKET", value_parser = NonEmptyStringValueParser::new(), help_heading = "Target")]
    pub bucket: String,

    /// The AWS credentials profile.
    #[arg(long, env = "S3_BATCH_DELETE_PROFILE", value_parser = NonEmptyStringValueParser::new(), help_heading = "Target")]
    pub profile: String,

    /// Only delete objects whose key starts with this prefix.
    #[arg(long, env = "S3_BATCH_DELETE_PREFIX", value_parser = NonEmptyStringValueParser::new(), help_heading = "Target")]
    pub prefix: Option<String>,

    /// Alternate service endpoint (e.g. MinIO, Ceph, a VPC endpoint).
    #[arg(
        long,
        alias = "serviceEndpoint",
        env = "S3_BATCH_DELETE_SERVICE_ENDPOINT",
        value_parser = value_parser::url::check_endpoint,
        help_heading = "Target"
    )]
    pub service_endpoint: Option<String>,

    /// Use path-style addressing (required by some S3-compatible services).
    #[arg(long, env = "S3_BATCH_DELETE_FORCE_PATH_STYLE", default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "Target")]
    pub force_path_style: bool,

    // -----------------------------------------------------------------------
    // Performance options
    // -----------------------------------------------------------------------
    /// Number of parallel delete requests. Default: 4.
    #[arg(long, env = "S3_BATCH_DELETE_THREADS", default_value_t = DEFAULT_THREADS, help_heading = "Performance")]
    pub threads: u16,

    /// Number of pages that may wait for a free worker. Default: same as --threads.
    #[arg(long, env = "S3_BATCH_DELETE_QUEUE_SIZE", help_heading = "Performance")]
    pub queue_size: Option<u32>,

    /// Wait time before retrying a page when all workers are busy. Default: 500.
    #[arg(long, env = "S3_BATCH_DELETE_SUBMIT_RETRY_INTERVAL_MILLISECONDS", default_value_t = DEFAULT_SUBMIT_RETRY_INTERVAL_MILLISECONDS, help_heading = "Performance")]
    pub submit_retry_interval_milliseconds: u64,

    /// Keys per listing page, which is also the batch size (1-1000). Default: 1000.
    #[arg(long, env = "S3_BATCH_DELETE_MAX_KEYS", default_value_t = DEFAULT_MAX_KEYS, help_heading = "Performance")]
    pub max_keys: i32,

    // -----------------------------------------------------------------------
    // Safety options
    // -----------------------------------------------------------------------
    /// Seconds to wait after printing the summary banner. 0 starts immediately.
    #[arg(long, env = "S3_BATCH_DELETE_COUNTDOWN_SECONDS", default_value_t = DEFAULT_COUNTDOWN_SECONDS, help_heading = "Safety")]
    pub countdown_seconds: u64,

    // -----------------------------------------------------------------------
    // Logging options
    // -----------------------------------------------------------------------
    /// Verbosity level. -q (quiet), default (info), -v, -vv.
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Output logs in JSON format.
    #[arg(long, env = "S3_BATCH_DELETE_JSON_TRACING", default_value_t = DEFAULT_JSON_TRACING, help_heading = "Logging")]
    pub json_tracing: bool,

    /// Enable AWS SDK tracing.
    #[arg(long, env = "S3_BATCH_DELETE_AWS_SDK_TRACING", default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Logging")]
    pub aws_sdk_tracing: bool,

    /// Enable tracing span events.
    #[arg(long, env = "S3_BATCH_DELETE_SPAN_EVENTS_TRACING", default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Logging")]
    pub span_events_tracing: bool,

    /// Disable colored output in logs.
    #[arg(long, env = "S3_BATCH_DELETE_DISABLE_COLOR_TRACING", default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Logging")]
    pub disable_color_tracing: bool,

    // -----------------------------------------------------------------------
    // Retry options
    // -----------------------------------------------------------------------
    /// Maximum attempts for each AWS SDK request. Default: 10.
    #[arg(long, env = "S3_BATCH_DELETE_AWS_MAX_ATTEMPTS", default_value_t = DEFAULT_AWS_MAX_ATTEMPTS, help_heading = "Retry")]
    pub aws_max_attempts: u32,

    /// Initial backoff in milliseconds for SDK retries. Default: 100.
    #[arg(long, env = "S3_BATCH_DELETE_INITIAL_BACKOFF_MILLISECONDS", default_value_t = DEFAULT_INITIAL_BACKOFF_MILLISECONDS, help_heading = "Retry")]
    pub initial_backoff_milliseconds: u64,

    // -----------------------------------------------------------------------
    // Timeout options
    // -----------------------------------------------------------------------
    /// Operation timeout in milliseconds.
    #[arg(long, env = "S3_BATCH_DELETE_OPERATION_TIMEOUT_MILLISECONDS", help_heading = "Timeout")]
    pub operation_timeout_milliseconds: Option<u64>,

    /// Operation attempt timeout in milliseconds.
    #[arg(long, env = "S3_BATCH_DELETE_OPERATION_ATTEMPT_TIMEOUT_MILLISECONDS", help_heading = "Timeout")]
    pub operation_attempt_timeout_milliseconds: Option<u64>,

    /// Connect timeout in milliseconds.
    #[arg(long, env = "S3_BATCH_DELETE_CONNECT_TIMEOUT_MILLISECONDS", help_heading = "Timeout")]
    pub connect_timeout_milliseconds: Option<u64>,

    /// Read timeout in milliseconds.
    #[arg(long, env = "S3_BATCH_DELETE_READ_TIMEOUT_MILLISECONDS", help_heading = "Timeout")]
    pub read_timeout_milliseconds: Option<u64>,
}

// ---------------------------------------------------------------------------
// parse_from_args (public API)
// ---------------------------------------------------------------------------

/// Parse command-line arguments into a `CLIArgs` struct.
///
/// # Example
///
/// ```
/// use s3_batch_delete::config::args::parse_from_args;
///
/// let args = vec![
///     "s3-batch-delete",
///     "--region", "eu-central-1",
///     "--bucket", "my-bucket",
///     "--profile", "admin",
/// ];
/// let cli_args = parse_from_args(args).unwrap();
/// assert_eq!(cli_args.threads, 4);
/// ```
pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

/// Parse arguments and build a Config in one step.
pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    Config::try_from(cli_args)
}

/// Map a clap parse failure to the process exit code.
///
/// A missing required option and an unparsable value exit with different
/// codes. `--help` and `--version` exit with 0.
pub fn exit_code_from_clap_error(e: &clap::Error) -> i32 {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        ErrorKind::MissingRequiredArgument
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            BatchDeleteError::MissingOption(e.to_string()).exit_code()
        }
        _ => BatchDeleteError::InvalidConfig(e.to_string()).exit_code(),
    }
}

// ---------------------------------------------------------------------------
// Validation and Config conversion
// ---------------------------------------------------------------------------

impl CLIArgs {
    fn validate(&self) -> Result<(), String> {
        if self.threads == 0 {
            return Err(ERROR_MESSAGE_THREADS_ZERO.to_string());
        }
        if self.queue_size == Some(0) {
            return Err(ERROR_MESSAGE_QUEUE_SIZE_ZERO.to_string());
        }
        if !(1..=MAX_KEYS_LIMIT).contains(&self.max_keys) {
            return Err(ERROR_MESSAGE_MAX_KEYS_OUT_OF_RANGE.to_string());
        }
        if self.aws_max_attempts == 0 {
            return Err(ERROR_MESSAGE_AWS_MAX_ATTEMPTS_ZERO.to_string());
        }
        Ok(())
    }

    fn build_pool_config(&self) -> PoolConfig {
        PoolConfig {
            worker_size: self.threads,
            queue_size: self.queue_size.unwrap_or(self.threads as u32),
            submit_retry_interval_milliseconds: self.submit_retry_interval_milliseconds,
        }
    }

    fn build_client_config(&self) -> ClientConfig {
        ClientConfig {
            profile: Some(self.profile.clone()),
            region: Some(self.region.clone()),
            endpoint_url: self.service_endpoint.clone(),
            force_path_style: self.force_path_style,
            retry_config: RetryConfig {
                aws_max_attempts: self.aws_max_attempts,
                initial_backoff_milliseconds: self.initial_backoff_milliseconds,
            },
            cli_timeout_config: CLITimeoutConfig {
                operation_timeout_milliseconds: self.operation_timeout_milliseconds,
                operation_attempt_timeout_milliseconds: self.operation_attempt_timeout_milliseconds,
                connect_timeout_milliseconds: self.connect_timeout_milliseconds,
                read_timeout_milliseconds: self.read_timeout_milliseconds,
            },
        }
    }

    fn build_tracing_config(&self) -> Option<TracingConfig> {
        let log_level = self.verbosity.log_level()?;

        Some(TracingConfig {
            tracing_level: log_level,
            json_tracing: self.json_tracing,
            aws_sdk_tracing: self.aws_sdk_tracing,
            span_events_tracing: self.span_events_tracing,
            disable_color_tracing: self.disable_color_tracing,
        })
    }
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(args: CLIArgs) -> Result<Self, Self::Error> {
        args.validate()?;

        Ok(Config {
            bucket: args.bucket.clone(),
            prefix: args.prefix.clone(),
            max_keys: args.max_keys,
            pool_config: args.build_pool_config(),
            target_client_config: Some(args.build_client_config()),
            tracing_config: args.build_tracing_config(),
            countdown_seconds: args.countdown_seconds,
        })
    }
}
