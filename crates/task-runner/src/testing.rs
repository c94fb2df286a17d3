//! Scripted in-memory workflow service for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::ServiceError;
use crate::service::{ExecutionDescription, ExecutionHandle, WorkItem, WorkflowService};

/// Everything the fake observed.
#[derive(Debug, Clone, Default)]
pub(crate) struct Calls {
    pub starts: Vec<(String, serde_json::Value)>,
    pub describes: usize,
    pub fetches: Vec<Instant>,
    pub report_attempts: Vec<String>,
    pub successes: Vec<(String, serde_json::Value)>,
    pub failures: Vec<(String, String)>,
}

/// Fake service replaying scripted responses.
///
/// Describe responses are consumed in order and the last one repeats.
/// Work responses are consumed in order, then every fetch finds no work.
pub(crate) struct FakeService {
    start: Result<ExecutionHandle, ServiceError>,
    describes: Mutex<VecDeque<Result<ExecutionDescription, ServiceError>>>,
    work: Mutex<VecDeque<Result<WorkItem, ServiceError>>>,
    failing_reports: Mutex<usize>,
    fetch_wait: Duration,
    report_wait: Duration,
    calls: Mutex<Calls>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            start: Ok(ExecutionHandle::new("exec-1")),
            describes: Mutex::new(VecDeque::new()),
            work: Mutex::new(VecDeque::new()),
            failing_reports: Mutex::new(0),
            fetch_wait: Duration::ZERO,
            report_wait: Duration::ZERO,
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn with_start_error(mut self, message: &str) -> Self {
        self.start = Err(ServiceError::Remote(message.to_string()));
        self
    }

    pub fn with_describes(self, describes: Vec<Result<ExecutionDescription, ServiceError>>) -> Self {
        *self.describes.lock().unwrap() = describes.into();
        self
    }

    pub fn with_work(self, work: Vec<Result<WorkItem, ServiceError>>) -> Self {
        *self.work.lock().unwrap() = work.into();
        self
    }

    pub fn with_failing_reports(self, count: usize) -> Self {
        *self.failing_reports.lock().unwrap() = count;
        self
    }

    /// Simulated long-poll duration for fetches that find no scripted work.
    pub fn with_fetch_wait(mut self, wait: Duration) -> Self {
        self.fetch_wait = wait;
        self
    }

    /// Time each report takes before it is recorded.
    pub fn with_report_wait(mut self, wait: Duration) -> Self {
        self.report_wait = wait;
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    async fn take_failing_report(&self, token: &str) -> Result<(), ServiceError> {
        if !self.report_wait.is_zero() {
            tokio::time::sleep(self.report_wait).await;
        }
        self.calls.lock().unwrap().report_attempts.push(token.to_string());
        let mut failing = self.failing_reports.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(ServiceError::Remote("report rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkflowService for FakeService {
    async fn start_execution(
        &self,
        workflow_id: &str,
        input: &serde_json::Value,
    ) -> Result<ExecutionHandle, ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .starts
            .push((workflow_id.to_string(), input.clone()));
        self.start.clone()
    }

    async fn describe_execution(
        &self,
        _handle: &ExecutionHandle,
    ) -> Result<ExecutionDescription, ServiceError> {
        self.calls.lock().unwrap().describes += 1;
        let mut describes = self.describes.lock().unwrap();
        match describes.len() {
            0 => Ok(ExecutionDescription::running()),
            1 => describes[0].clone(),
            _ => describes.pop_front().unwrap_or_else(|| Ok(ExecutionDescription::running())),
        }
    }

    async fn fetch_work(&self, _source: &str, _worker_name: &str) -> Result<WorkItem, ServiceError> {
        self.calls.lock().unwrap().fetches.push(Instant::now());
        let next = self.work.lock().unwrap().pop_front();
        match next {
            Some(item) => item,
            None => {
                if !self.fetch_wait.is_zero() {
                    tokio::time::sleep(self.fetch_wait).await;
                }
                Ok(WorkItem::empty())
            }
        }
    }

    async fn report_success(
        &self,
        token: &str,
        output: &serde_json::Value,
    ) -> Result<(), ServiceError> {
        self.take_failing_report(token).await?;
        self.calls
            .lock()
            .unwrap()
            .successes
            .push((token.to_string(), output.clone()));
        Ok(())
    }

    async fn report_failure(&self, token: &str, error: &str, _cause: &str) -> Result<(), ServiceError> {
        self.take_failing_report(token).await?;
        self.calls
            .lock()
            .unwrap()
            .failures
            .push((token.to_string(), error.to_string()));
        Ok(())
    }
}
