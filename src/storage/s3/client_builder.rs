use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig as SdkRetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, ConfigLoader};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use std::time::Duration;

use crate::config::ClientConfig;

impl ClientConfig {
    /// Build an S3 client from this configuration.
    ///
    /// The region is always applied, even with a custom endpoint, because it
    /// is still used for request signing.
    pub async fn create_client(&self) -> Client {
        let sdk_config = self.load_sdk_config().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.force_path_style)
            .build();

        Client::from_conf(s3_config)
    }

    async fn load_sdk_config(&self) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }

        loader = self.apply_region(loader);

        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader
            .retry_config(self.build_retry_config())
            .timeout_config(self.build_timeout_config())
            .load()
            .await
    }

    fn apply_region(&self, loader: ConfigLoader) -> ConfigLoader {
        let region_provider = RegionProviderChain::first_try(self.region.clone().map(Region::new))
            .or_default_provider();
        loader.region(region_provider)
    }

    fn build_retry_config(&self) -> SdkRetryConfig {
        SdkRetryConfig::standard()
            .with_max_attempts(self.retry_config.aws_max_attempts)
            .with_initial_backoff(Duration::from_millis(
                self.retry_config.initial_backoff_milliseconds,
            ))
    }

    fn build_timeout_config(&self) -> TimeoutConfig {
        let timeouts = &self.cli_timeout_config;
        let mut builder = TimeoutConfig::builder();

        if let Some(ms) = timeouts.operation_timeout_milliseconds {
            builder = builder.operation_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = timeouts.operation_attempt_timeout_milliseconds {
            builder = builder.operation_attempt_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = timeouts.connect_timeout_milliseconds {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = timeouts.read_timeout_milliseconds {
            builder = builder.read_timeout(Duration::from_millis(ms));
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CLITimeoutConfig, RetryConfig};

    fn make_client_config(endpoint_url: Option<&str>) -> ClientConfig {
        ClientConfig {
            profile: None,
            region: Some("eu-central-1".to_string()),
            endpoint_url: endpoint_url.map(str::to_string),
            force_path_style: true,
            retry_config: RetryConfig {
                aws_max_attempts: 3,
                initial_backoff_milliseconds: 250,
            },
            cli_timeout_config: CLITimeoutConfig {
                operation_timeout_milliseconds: Some(30_000),
                operation_attempt_timeout_milliseconds: None,
                connect_timeout_milliseconds: Some(5_000),
                read_timeout_milliseconds: None,
            },
        }
    }

    #[tokio::test]
    async fn client_uses_configured_region() {
        let client = make_client_config(None).create_client().await;
        assert_eq!(
            client.config().region().map(|r| r.to_string()),
            Some("eu-central-1".to_string())
        );
    }

    #[tokio::test]
    async fn region_kept_with_custom_endpoint() {
        let client = make_client_config(Some("http://localhost:9000"))
            .create_client()
            .await;
        assert_eq!(
            client.config().region().map(|r| r.to_string()),
            Some("eu-central-1".to_string())
        );
    }

    #[test]
    fn retry_config_applied() {
        let retry_config = make_client_config(None).build_retry_config();
        assert_eq!(retry_config.max_attempts(), 3);
        assert_eq!(retry_config.initial_backoff(), Duration::from_millis(250));
    }

    #[test]
    fn timeout_config_only_sets_given_values() {
        let timeout_config = make_client_config(None).build_timeout_config();
        assert_eq!(
            timeout_config.operation_timeout(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(timeout_config.connect_timeout(), Some(Duration::from_secs(5)));
        assert!(timeout_config.operation_attempt_timeout().is_none());
        assert!(timeout_config.read_timeout().is_none());
    }
}
