pub mod args;

/// Main configuration for a s3-batch-delete run.
///
/// Built once at start-up (from [`args::CLIArgs`] or [`Config::for_target`])
/// and passed by value into the [`DeletionPipeline`](crate::DeletionPipeline).
/// Nothing reads options from global state.
///
/// # Quick Start
///
/// ```
/// use s3_batch_delete::Config;
///
/// let config = Config::for_target("my-bucket", Some("logs/2024/"));
/// assert_eq!(config.pool_config.worker_size, 4);
/// assert_eq!(config.max_keys, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub bucket: String,
    pub prefix: Option<String>,
    /// Page size for each ListObjectsV2 request (1..=1000).
    pub max_keys: i32,
    pub pool_config: PoolConfig,
    pub target_client_config: Option<ClientConfig>,
    pub tracing_config: Option<TracingConfig>,
    /// Seconds to count down after printing the start-up banner. 0 disables it.
    pub countdown_seconds: u64,
}

impl Config {
    /// Create a `Config` with library defaults for the given bucket and prefix.
    ///
    /// The start-up countdown is disabled, which suits programmatic use.
    pub fn for_target(bucket: &str, prefix: Option<&str>) -> Self {
        Config {
            bucket: bucket.to_string(),
            prefix: prefix.map(|p| p.to_string()),
            countdown_seconds: 0,
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bucket: String::new(),
            prefix: None,
            max_keys: 1000,
            pool_config: PoolConfig::default(),
            target_client_config: None,
            tracing_config: None,
            countdown_seconds: 10,
        }
    }
}

/// Worker pool sizing and submission backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of concurrent delete workers.
    pub worker_size: u16,
    /// Number of tasks that may wait for a free worker before `submit` rejects.
    pub queue_size: u32,
    /// Delay before a rejected submission is retried.
    pub submit_retry_interval_milliseconds: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            worker_size: 4,
            queue_size: 4,
            submit_retry_interval_milliseconds: 500,
        }
    }
}

/// AWS S3 client configuration: credentials profile, region, endpoint,
/// SDK retry policy and timeouts.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub retry_config: RetryConfig,
    pub cli_timeout_config: CLITimeoutConfig,
}

/// Retry configuration for AWS SDK operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub aws_max_attempts: u32,
    pub initial_backoff_milliseconds: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CLITimeoutConfig {
    pub operation_timeout_milliseconds: Option<u64>,
    pub operation_attempt_timeout_milliseconds: Option<u64>,
    pub connect_timeout_milliseconds: Option<u64>,
    pub read_timeout_milliseconds: Option<u64>,
}

/// Tracing (logging) configuration.
///
/// Supports verbosity levels, JSON format, color control, and AWS SDK tracing.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}
