//! Start-up safeguard for s3-batch-delete.
//!
//! Before the first request the binary prints what is about to be deleted
//! and counts down, giving the operator a few seconds to press Ctrl-C.
//! A countdown of zero skips both the banner and the wait.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;

use crate::config::Config;

const UNKNOWN: &str = "default";

/// Prints the start-up banner and runs the countdown.
pub struct SafetyChecker {
    bucket: String,
    prefix: Option<String>,
    region: String,
    profile: String,
    worker_size: u16,
    countdown_seconds: u64,
}

impl SafetyChecker {
    pub fn new(config: &Config) -> Self {
        let client_config = config.target_client_config.as_ref();

        Self {
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
            region: client_config
                .and_then(|c| c.region.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            profile: client_config
                .and_then(|c| c.profile.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            worker_size: config.pool_config.worker_size,
            countdown_seconds: config.countdown_seconds,
        }
    }

    /// Lines describing the run, printed before the countdown.
    pub fn banner(&self) -> Vec<String> {
        let target = match &self.prefix {
            Some(prefix) => format!(
                "Delete all objects from bucket '{}' in region '{}' under prefix '{}'",
                self.bucket, self.region, prefix
            ),
            None => format!(
                "Delete all objects from bucket '{}' in region '{}'",
                self.bucket, self.region
            ),
        };

        vec![
            format!("{target} logged in with profile '{}'.", self.profile),
            format!("Using {} workers.", self.worker_size),
        ]
    }

    /// Write the banner and count down one number per `tick`.
    ///
    /// Output looks like `Starting in 3 2 1 now`.
    pub async fn announce_and_count_down<W: Write + Send>(
        &self,
        out: &mut W,
        tick: Duration,
    ) -> Result<()> {
        if self.countdown_seconds == 0 {
            return Ok(());
        }

        for line in self.banner() {
            writeln!(out, "{line}")?;
        }

        write!(out, "Starting in")?;
        for remaining in (1..=self.countdown_seconds).rev() {
            write!(out, " {remaining}")?;
            out.flush()?;
            tokio::time::sleep(tick).await;
        }
        writeln!(out, " now")?;
        out.flush()?;

        Ok(())
    }
}
