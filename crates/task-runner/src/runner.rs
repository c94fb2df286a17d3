//! Coordination of the worker loop and the execution monitor.

use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::config::RunnerConfig;
use crate::error::{MonitorError, RunnerError};
use crate::monitor::{ExecutionMonitor, MonitorOutcome};
use crate::service::WorkflowService;
use crate::worker::{ActivityHandler, ActivityWorker, WorkerStats};

/// Result of one coordinated run.
///
/// `worker` is reported separately so a teardown failure never hides the
/// monitoring result.
#[derive(Debug)]
pub struct RunReport {
    /// Outcome of the execution monitor.
    pub outcome: Result<MonitorOutcome, MonitorError>,

    /// Statistics from the stopped worker, or the teardown failure.
    pub worker: Result<WorkerStats, RunnerError>,
}

impl RunReport {
    /// True when the execution reached `SUCCEEDED` and the worker stopped cleanly.
    pub fn is_success(&self) -> bool {
        matches!(
            &self.outcome,
            Ok(MonitorOutcome::Completed { status, .. })
                if *status == crate::service::ExecutionStatus::Succeeded
        ) && self.worker.is_ok()
    }
}

/// Runs an execution while a background worker serves its activity.
pub struct TaskRunner {
    service: Arc<dyn WorkflowService>,
    config: RunnerConfig,
    shutdown: CancellationToken,
}

impl TaskRunner {
    pub fn new(service: Arc<dyn WorkflowService>, config: RunnerConfig) -> Self {
        Self {
            service,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Stop monitoring early when `shutdown` is cancelled.
    ///
    /// The worker is still cancelled and awaited before `run` returns, so a
    /// report already in flight completes.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Start a worker on `source`, run `workflow_id` with `input`, then stop
    /// the worker.
    ///
    /// The worker is cancelled and awaited on every path out of the monitor.
    /// If this future is dropped or the monitor panics, the drop guard still
    /// cancels the worker, though it is not awaited.
    pub async fn run(
        &self,
        source: &str,
        workflow_id: &str,
        input: &serde_json::Value,
        handler: Arc<dyn ActivityHandler>,
    ) -> RunReport {
        let cancel = self.shutdown.child_token();
        let worker = ActivityWorker::new(
            self.service.clone(),
            handler,
            source,
            self.config.worker_name.clone(),
            self.config.backoff,
            cancel.child_token(),
        );

        let handle = worker.spawn();
        let guard = cancel.drop_guard();
        tracing::debug!(source = %source, "Worker spawned, monitoring execution");

        let monitor = ExecutionMonitor::new(self.service.clone(), self.config.monitor);
        let outcome = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                tracing::warn!(workflow = %workflow_id, "Shutdown requested, abandoning execution monitor");
                Err(MonitorError::Interrupted)
            }
            outcome = monitor.run(workflow_id, input) => outcome,
        };

        match &outcome {
            Ok(MonitorOutcome::Completed { status, .. }) => {
                tracing::debug!(status = %status, "Monitor finished, cleaning up");
            }
            Ok(MonitorOutcome::TimedOutLocally { .. }) => {
                tracing::debug!("Monitor gave up, cleaning up");
            }
            Err(e) => {
                tracing::error!(error = %e, "Monitoring failed, cleaning up");
            }
        }

        let worker = shutdown(guard, handle).await;
        if let Err(e) = &worker {
            tracing::error!(error = %e, "Worker teardown failed");
        }

        RunReport { outcome, worker }
    }
}

/// Cancel the worker and wait for it to acknowledge.
async fn shutdown(
    guard: DropGuard,
    handle: JoinHandle<WorkerStats>,
) -> Result<WorkerStats, RunnerError> {
    guard.disarm().cancel();

    match handle.await {
        Ok(stats) => Ok(stats),
        Err(e) if e.is_cancelled() => {
            tracing::debug!("Worker task was aborted");
            Ok(WorkerStats::default())
        }
        Err(e) => Err(join_error(e)),
    }
}

fn join_error(e: JoinError) -> RunnerError {
    if e.is_panic() {
        let payload = e.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        RunnerError::WorkerPanicked(message)
    } else {
        RunnerError::WorkerFailed(e.to_string())
    }
}
