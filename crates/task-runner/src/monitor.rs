//! Execution monitor: start one execution and wait for a terminal status.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::MonitorPolicy;
use crate::error::MonitorError;
use crate::service::{ExecutionHandle, ExecutionStatus, WorkflowService};

/// How a monitoring attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorOutcome {
    /// The service reported a terminal status.
    Completed {
        handle: ExecutionHandle,
        status: ExecutionStatus,
        output: Option<serde_json::Value>,
    },

    /// The local timeout elapsed first. The remote execution may still be
    /// running.
    TimedOutLocally {
        handle: ExecutionHandle,
        elapsed: Duration,
        polls: u32,
    },
}

impl MonitorOutcome {
    pub fn handle(&self) -> &ExecutionHandle {
        match self {
            MonitorOutcome::Completed { handle, .. } => handle,
            MonitorOutcome::TimedOutLocally { handle, .. } => handle,
        }
    }

    /// Terminal status, or `None` for a local timeout.
    pub fn status(&self) -> Option<ExecutionStatus> {
        match self {
            MonitorOutcome::Completed { status, .. } => Some(*status),
            MonitorOutcome::TimedOutLocally { .. } => None,
        }
    }
}

/// Starts an execution and polls it until terminal or timed out.
pub struct ExecutionMonitor {
    service: Arc<dyn WorkflowService>,
    policy: MonitorPolicy,
}

impl ExecutionMonitor {
    pub fn new(service: Arc<dyn WorkflowService>, policy: MonitorPolicy) -> Self {
        Self { service, policy }
    }

    /// Start `workflow_id` with `input` and wait for it.
    ///
    /// A start failure returns immediately without polling. A describe
    /// failure ends the attempt; the execution is not stopped.
    pub async fn run(
        &self,
        workflow_id: &str,
        input: &serde_json::Value,
    ) -> Result<MonitorOutcome, MonitorError> {
        let started = Instant::now();

        let handle = self
            .service
            .start_execution(workflow_id, input)
            .await
            .map_err(|source| MonitorError::Start {
                workflow: workflow_id.to_string(),
                source,
            })?;

        tracing::info!(workflow = %workflow_id, execution = %handle, "Started execution");

        let mut polls = 0u32;
        loop {
            let elapsed = started.elapsed();
            if elapsed >= self.policy.timeout {
                tracing::warn!(
                    execution = %handle,
                    elapsed_ms = elapsed.as_millis() as u64,
                    polls,
                    "Execution timed out locally"
                );
                return Ok(MonitorOutcome::TimedOutLocally {
                    handle,
                    elapsed,
                    polls,
                });
            }

            let description = self
                .service
                .describe_execution(&handle)
                .await
                .map_err(|source| MonitorError::Describe {
                    execution: handle.to_string(),
                    source,
                })?;
            polls += 1;

            tracing::debug!(execution = %handle, status = %description.status, polls, "Polled execution");

            if description.status.is_terminal() {
                tracing::info!(
                    execution = %handle,
                    status = %description.status,
                    "Execution completed"
                );
                if let Some(output) = &description.output {
                    tracing::info!(execution = %handle, output = %output, "Execution output");
                }
                return Ok(MonitorOutcome::Completed {
                    handle,
                    status: description.status,
                    output: description.output,
                });
            }

            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }
}
