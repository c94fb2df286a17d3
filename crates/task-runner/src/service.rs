//! Remote workflow service boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ServiceError;

/// Handle assigned by the service when an execution starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHandle(String);

impl ExecutionHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of one workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Nothing observed yet, or the service reported a status outside the
    /// known set.
    NotStarted,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Aborted,
}

impl ExecutionStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded
                | ExecutionStatus::Failed
                | ExecutionStatus::TimedOut
                | ExecutionStatus::Aborted
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::NotStarted => "NOT_STARTED",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Succeeded => "SUCCEEDED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::TimedOut => "TIMED_OUT",
            ExecutionStatus::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_STARTED" => Ok(ExecutionStatus::NotStarted),
            "RUNNING" => Ok(ExecutionStatus::Running),
            "SUCCEEDED" => Ok(ExecutionStatus::Succeeded),
            "FAILED" => Ok(ExecutionStatus::Failed),
            "TIMED_OUT" => Ok(ExecutionStatus::TimedOut),
            "ABORTED" => Ok(ExecutionStatus::Aborted),
            other => Err(ServiceError::InvalidResponse(format!(
                "unknown execution status: {}",
                other
            ))),
        }
    }
}

/// Snapshot returned by a describe call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionDescription {
    pub status: ExecutionStatus,

    /// Output payload, present once the execution succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

impl ExecutionDescription {
    pub fn running() -> Self {
        Self {
            status: ExecutionStatus::Running,
            output: None,
        }
    }
}

/// One poll result from a work source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Completion token; `None` when the poll found no work.
    #[serde(default)]
    pub token: Option<String>,

    /// Input payload handed to the worker.
    #[serde(default)]
    pub input: Option<serde_json::Value>,
}

impl WorkItem {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            token: Some(token.into()),
            input: Some(input),
        }
    }
}

/// Control plane of a remote workflow service, as seen by the runner.
///
/// Every method is one network call. Implementations own their own
/// transport retries and timeouts.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// Start one execution of `workflow_id` with `input`.
    async fn start_execution(
        &self,
        workflow_id: &str,
        input: &serde_json::Value,
    ) -> Result<ExecutionHandle, ServiceError>;

    /// Fetch the current status of an execution.
    async fn describe_execution(
        &self,
        handle: &ExecutionHandle,
    ) -> Result<ExecutionDescription, ServiceError>;

    /// Long-poll `source` for one work item.
    async fn fetch_work(&self, source: &str, worker_name: &str) -> Result<WorkItem, ServiceError>;

    /// Report a work item as completed.
    async fn report_success(
        &self,
        token: &str,
        output: &serde_json::Value,
    ) -> Result<(), ServiceError>;

    /// Report a work item as failed.
    async fn report_failure(&self, token: &str, error: &str, cause: &str)
        -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!ExecutionStatus::NotStarted.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Succeeded.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::TimedOut.is_terminal());
        assert!(ExecutionStatus::Aborted.is_terminal());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("TIMED_OUT".parse::<ExecutionStatus>().unwrap(), ExecutionStatus::TimedOut);
        assert_eq!(ExecutionStatus::Succeeded.to_string(), "SUCCEEDED");
        assert!("PENDING_REDRIVE".parse::<ExecutionStatus>().is_err());

        let json = serde_json::to_string(&ExecutionStatus::TimedOut).unwrap();
        assert_eq!(json, "\"TIMED_OUT\"");
    }

    #[test]
    fn test_work_item_deserialization() {
        let item: WorkItem = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(item, WorkItem::empty());

        let item: WorkItem = serde_json::from_value(serde_json::json!({
            "token": "tok-1",
            "input": {"data": "Hello World!"}
        }))
        .unwrap();
        assert_eq!(item.token.as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_execution_handle_display() {
        let handle = ExecutionHandle::new("exec-1");
        assert_eq!(handle.to_string(), "exec-1");
        assert_eq!(serde_json::to_string(&handle).unwrap(), "\"exec-1\"");
    }
}
