//! Error types for the task runner.

use thiserror::Error;

/// Failure reported by a remote workflow service call.
///
/// The runner only cares whether a call succeeded, so the variants carry a
/// rendered message rather than the vendor error type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The remote call failed (transport, throttling, service-side error).
    #[error("Remote call failed: {0}")]
    Remote(String),

    /// The service answered but the response could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::InvalidResponse(e.to_string())
    }
}

/// Failure raised by an activity handler while processing a work item.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{error}: {cause}")]
pub struct HandlerError {
    /// Short error code reported to the service.
    pub error: String,

    /// Human readable cause reported to the service.
    pub cause: String,
}

impl HandlerError {
    pub fn new(error: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            cause: cause.into(),
        }
    }
}

/// Errors that end a monitoring attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonitorError {
    /// The execution could not be started; no polling happened.
    #[error("Failed to start execution of {workflow}: {source}")]
    Start {
        workflow: String,
        #[source]
        source: ServiceError,
    },

    /// A status poll failed after the execution was started.
    #[error("Failed to describe execution {execution}: {source}")]
    Describe {
        execution: String,
        #[source]
        source: ServiceError,
    },

    /// Shutdown was requested before the execution reached a terminal status.
    #[error("Monitoring interrupted by shutdown")]
    Interrupted,
}

/// Errors raised while tearing down the background worker.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The worker task panicked instead of acknowledging cancellation.
    #[error("Worker task panicked: {0}")]
    WorkerPanicked(String),

    /// The worker task ended in an unexpected way.
    #[error("Worker task failed: {0}")]
    WorkerFailed(String),
}
