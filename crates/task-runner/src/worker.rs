//! Activity worker loop.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::BackoffPolicy;
use crate::error::{HandlerError, ServiceError};
use crate::service::WorkflowService;

/// The unit of work performed for each fetched item.
#[async_trait]
pub trait ActivityHandler: Send + Sync {
    async fn handle(&self, input: Option<&serde_json::Value>)
        -> Result<serde_json::Value, HandlerError>;
}

/// Ignores its input and answers with a fixed greeting.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloWorldHandler;

#[async_trait]
impl ActivityHandler for HelloWorldHandler {
    async fn handle(
        &self,
        _input: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, HandlerError> {
        tracing::info!("Executing Hello World activity");
        Ok(serde_json::json!({ "message": "Hello World!" }))
    }
}

/// Counters returned when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Fetch requests that returned, with or without work.
    pub polls: u64,

    /// Items reported successful.
    pub completed: u64,

    /// Items reported failed because the handler errored.
    pub failed: u64,

    /// Fetch or report calls that errored.
    pub errors: u64,
}

enum Iteration {
    Idle,
    Worked,
    Cancelled,
}

/// Polls one work source until cancelled.
pub struct ActivityWorker {
    service: Arc<dyn WorkflowService>,
    handler: Arc<dyn ActivityHandler>,
    source: String,
    worker_name: String,
    backoff: BackoffPolicy,
    cancel: CancellationToken,
}

impl ActivityWorker {
    /// Create a new worker.
    pub fn new(
        service: Arc<dyn WorkflowService>,
        handler: Arc<dyn ActivityHandler>,
        source: impl Into<String>,
        worker_name: impl Into<String>,
        backoff: BackoffPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            handler,
            source: source.into(),
            worker_name: worker_name.into(),
            backoff,
            cancel,
        }
    }

    /// Run the loop on a background task.
    pub fn spawn(self) -> JoinHandle<WorkerStats> {
        tokio::spawn(self.run())
    }

    /// Run the loop until the cancellation token fires.
    ///
    /// Errors from the service are logged and retried after
    /// `BackoffPolicy::error_delay`; they never end the loop.
    pub async fn run(self) -> WorkerStats {
        let mut stats = WorkerStats::default();

        tracing::info!(
            source = %self.source,
            worker_name = %self.worker_name,
            "Activity worker started"
        );

        while !self.cancel.is_cancelled() {
            let delay = match self.poll_once(&mut stats).await {
                Ok(Iteration::Cancelled) => break,
                Ok(Iteration::Idle) | Ok(Iteration::Worked) => self.backoff.idle_delay,
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!(
                        source = %self.source,
                        error = %e,
                        "Error in activity worker, backing off"
                    );
                    self.backoff.error_delay
                }
            };

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::info!(
            source = %self.source,
            polls = stats.polls,
            completed = stats.completed,
            failed = stats.failed,
            errors = stats.errors,
            "Activity worker stopped"
        );

        stats
    }

    /// Fetch one item and, if there is one, handle and report it.
    ///
    /// Only the fetch races cancellation. Once a token is held the report is
    /// driven to completion.
    async fn poll_once(&self, stats: &mut WorkerStats) -> Result<Iteration, ServiceError> {
        let item = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(Iteration::Cancelled),
            result = self.service.fetch_work(&self.source, &self.worker_name) => {
                stats.polls += 1;
                result?
            }
        };

        let Some(token) = item.token else {
            tracing::trace!(source = %self.source, "No work available");
            return Ok(Iteration::Idle);
        };

        match self.handler.handle(item.input.as_ref()).await {
            Ok(output) => {
                self.service.report_success(&token, &output).await?;
                stats.completed += 1;
                tracing::info!(source = %self.source, "Activity executed successfully");
            }
            Err(e) => {
                self.service.report_failure(&token, &e.error, &e.cause).await?;
                stats.failed += 1;
                tracing::warn!(source = %self.source, error = %e, "Activity reported as failed");
            }
        }

        Ok(Iteration::Worked)
    }
}
