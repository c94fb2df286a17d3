//! Task Runner
//!
//! Runs one workflow execution against a remote orchestration service while a
//! background worker serves the activity tasks that execution schedules.
//!
//! This crate provides:
//! - `WorkflowService` trait describing the remote control plane boundary
//! - Activity worker loop with injected backoff and cooperative cancellation
//! - Execution monitor with a fixed poll interval and a local timeout
//! - `TaskRunner` coordinating both and guaranteeing worker teardown

pub mod config;
pub mod error;
pub mod monitor;
pub mod runner;
pub mod service;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{BackoffPolicy, MonitorPolicy, RunnerConfig};
pub use error::{HandlerError, MonitorError, RunnerError, ServiceError};
pub use monitor::{ExecutionMonitor, MonitorOutcome};
pub use runner::{RunReport, TaskRunner};
pub use service::{ExecutionDescription, ExecutionHandle, ExecutionStatus, WorkItem, WorkflowService};
pub use worker::{ActivityHandler, ActivityWorker, HelloWorldHandler, WorkerStats};
