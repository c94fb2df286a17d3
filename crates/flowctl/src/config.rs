//! CLI configuration.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use task_runner::{BackoffPolicy, MonitorPolicy, RunnerConfig};

/// Configuration loaded from environment variables.
///
/// Environment variables are prefixed with `FLOWCTL_`:
/// - `FLOWCTL_EXECUTOR_ROLE_ARN`: IAM role state machines run as
/// - `FLOWCTL_REGION`: AWS region (default: from the AWS config chain)
/// - `FLOWCTL_ENDPOINT_URL`: endpoint override, e.g. a local emulator
/// - `FLOWCTL_POLL_INTERVAL_SECS`: execution poll interval (default: 2)
/// - `FLOWCTL_TIMEOUT_SECS`: local execution timeout (default: 60)
/// - `FLOWCTL_WORKER_IDLE_DELAY_SECS`: worker delay between polls (default: 1)
/// - `FLOWCTL_WORKER_ERROR_DELAY_SECS`: worker delay after an error (default: 5)
/// - `FLOWCTL_WORKER_NAME`: name reported by the activity worker
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub executor_role_arn: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_idle_delay")]
    pub worker_idle_delay_secs: u64,

    #[serde(default = "default_error_delay")]
    pub worker_error_delay_secs: u64,

    #[serde(default)]
    pub worker_name: Option<String>,
}

fn default_poll_interval() -> u64 {
    2
}

fn default_timeout() -> u64 {
    60
}

fn default_idle_delay() -> u64 {
    1
}

fn default_error_delay() -> u64 {
    5
}

impl AppConfig {
    /// Load configuration from `FLOWCTL_` environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("FLOWCTL_").from_env::<AppConfig>()
    }

    /// The executor role, required for creating or updating state machines.
    pub fn require_role_arn(&self) -> Result<&str> {
        self.executor_role_arn.as_deref().ok_or_else(|| {
            anyhow::anyhow!("No executor role configured; set FLOWCTL_EXECUTOR_ROLE_ARN or pass --role-arn")
        })
    }

    /// Runner settings for the hello-world demo.
    pub fn runner_config(&self) -> RunnerConfig {
        let config = RunnerConfig::default()
            .with_monitor(MonitorPolicy {
                poll_interval: Duration::from_secs(self.poll_interval_secs),
                timeout: Duration::from_secs(self.timeout_secs),
            })
            .with_backoff(BackoffPolicy {
                idle_delay: Duration::from_secs(self.worker_idle_delay_secs),
                error_delay: Duration::from_secs(self.worker_error_delay_secs),
            });

        match &self.worker_name {
            Some(name) => config.with_worker_name(name.clone()),
            None => config,
        }
    }

    /// Build the shared AWS SDK configuration.
    pub async fn load_sdk_config(&self) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &self.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url.clone());
        }

        loader.load().await
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            executor_role_arn: None,
            region: None,
            endpoint_url: None,
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_timeout(),
            worker_idle_delay_secs: default_idle_delay(),
            worker_error_delay_secs: default_error_delay(),
            worker_name: None,
        }
    }
}
