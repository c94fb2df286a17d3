//! Runner configuration.

use std::time::Duration;

/// Delays applied between worker polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after an iteration that completed without error.
    pub idle_delay: Duration,

    /// Delay after a failed fetch or report.
    pub error_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            idle_delay: Duration::from_secs(1),
            error_delay: Duration::from_secs(5),
        }
    }
}

/// How an execution is watched once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorPolicy {
    /// Interval between status polls.
    pub poll_interval: Duration,

    /// Local give-up bound, measured from the start call.
    pub timeout: Duration,
}

impl Default for MonitorPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Task runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Name the worker reports when fetching work.
    pub worker_name: String,

    /// Execution monitor policy.
    pub monitor: MonitorPolicy,

    /// Worker backoff policy.
    pub backoff: BackoffPolicy,
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional:
    /// - `TASK_RUNNER_WORKER_NAME`
    /// - `TASK_RUNNER_POLL_INTERVAL_SECS` (default 2)
    /// - `TASK_RUNNER_TIMEOUT_SECS` (default 60)
    /// - `TASK_RUNNER_IDLE_DELAY_SECS` (default 1)
    /// - `TASK_RUNNER_ERROR_DELAY_SECS` (default 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let worker_name = std::env::var("TASK_RUNNER_WORKER_NAME")
            .unwrap_or(defaults.worker_name);

        let secs = |name: &str, fallback: Duration| {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            worker_name,
            monitor: MonitorPolicy {
                poll_interval: secs("TASK_RUNNER_POLL_INTERVAL_SECS", defaults.monitor.poll_interval),
                timeout: secs("TASK_RUNNER_TIMEOUT_SECS", defaults.monitor.timeout),
            },
            backoff: BackoffPolicy {
                idle_delay: secs("TASK_RUNNER_IDLE_DELAY_SECS", defaults.backoff.idle_delay),
                error_delay: secs("TASK_RUNNER_ERROR_DELAY_SECS", defaults.backoff.error_delay),
            },
        }
    }

    pub fn with_worker_name(mut self, worker_name: impl Into<String>) -> Self {
        self.worker_name = worker_name.into();
        self
    }

    pub fn with_monitor(mut self, monitor: MonitorPolicy) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Default worker name: `<hostname>-<uuid>`.
pub fn default_worker_name() -> String {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{}-{}", hostname, uuid::Uuid::new_v4())
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            worker_name: default_worker_name(),
            monitor: MonitorPolicy::default(),
            backoff: BackoffPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RunnerConfig::default();
        assert!(!config.worker_name.is_empty());
        assert_eq!(config.monitor.poll_interval, Duration::from_secs(2));
        assert_eq!(config.monitor.timeout, Duration::from_secs(60));
        assert_eq!(config.backoff.idle_delay, Duration::from_secs(1));
        assert_eq!(config.backoff.error_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_config_builders() {
        let config = RunnerConfig::default()
            .with_worker_name("worker-a")
            .with_monitor(MonitorPolicy {
                poll_interval: Duration::from_millis(10),
                timeout: Duration::from_millis(50),
            });
        assert_eq!(config.worker_name, "worker-a");
        assert_eq!(config.monitor.timeout, Duration::from_millis(50));
        assert_eq!(config.backoff, BackoffPolicy::default());
    }

    #[test]
    fn test_default_worker_names_are_unique() {
        assert_ne!(default_worker_name(), default_worker_name());
    }
}
