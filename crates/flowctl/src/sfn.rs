//! Step Functions control plane client.

use async_trait::async_trait;
use aws_sdk_sfn::types::{ExecutionStatus as SfnStatus, StateMachineType};
use aws_sdk_sfn::Client;
use serde_json::Value;

use task_runner::{
    ExecutionDescription, ExecutionHandle, ExecutionStatus, ServiceError, WorkItem,
    WorkflowService,
};

use crate::admin::{ActivityDescription, WorkflowAdmin};
use crate::error::{sdk_error, AdminError};
use crate::resources::ResourceSummary;

/// Thin wrapper over the Step Functions SDK client.
#[derive(Debug, Clone)]
pub struct SfnClient {
    client: Client,
}

impl SfnClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl WorkflowAdmin for SfnClient {
    async fn create_state_machine(
        &self,
        name: &str,
        definition: &Value,
        role_arn: &str,
    ) -> Result<String, AdminError> {
        let result = self
            .client
            .create_state_machine()
            .name(name)
            .definition(definition.to_string())
            .role_arn(role_arn)
            .r#type(StateMachineType::Standard)
            .send()
            .await;

        match result {
            Ok(output) => {
                let arn = output.state_machine_arn().to_string();
                tracing::info!(name = %name, arn = %arn, "State machine created");
                Ok(arn)
            }
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_state_machine_already_exists())
                {
                    return Err(AdminError::AlreadyExists {
                        kind: "State machine",
                        name: name.to_string(),
                    });
                }
                Err(sdk_error("CreateStateMachine", err))
            }
        }
    }

    /// Fetch and parse the definition of a state machine.
    async fn describe_definition(&self, arn: &str) -> Result<Value, AdminError> {
        let output = self
            .client
            .describe_state_machine()
            .state_machine_arn(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeStateMachine", e))?;

        Ok(serde_json::from_str(output.definition())?)
    }

    /// Replace the definition of a state machine.
    async fn update_state_machine(
        &self,
        arn: &str,
        definition: &Value,
        role_arn: &str,
    ) -> Result<(), AdminError> {
        self.client
            .update_state_machine()
            .state_machine_arn(arn)
            .definition(definition.to_string())
            .role_arn(role_arn)
            .send()
            .await
            .map_err(|e| sdk_error("UpdateStateMachine", e))?;

        tracing::info!(arn = %arn, "State machine updated");
        Ok(())
    }

    async fn delete_state_machine(&self, arn: &str) -> Result<(), AdminError> {
        self.client
            .delete_state_machine()
            .state_machine_arn(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteStateMachine", e))?;

        tracing::info!(arn = %arn, "State machine deleted");
        Ok(())
    }

    /// List every state machine, following pagination.
    async fn list_state_machines(&self) -> Result<Vec<ResourceSummary>, AdminError> {
        let mut machines = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_state_machines()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListStateMachines", e))?;

            machines.extend(
                output
                    .state_machines()
                    .iter()
                    .map(|sm| ResourceSummary::new(sm.name(), sm.state_machine_arn())),
            );

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(machines)
    }

    async fn create_activity(&self, name: &str) -> Result<String, AdminError> {
        let output = self
            .client
            .create_activity()
            .name(name)
            .send()
            .await
            .map_err(|e| sdk_error("CreateActivity", e))?;

        let arn = output.activity_arn().to_string();
        tracing::info!(name = %name, arn = %arn, "Activity created");
        Ok(arn)
    }

    async fn describe_activity(&self, arn: &str) -> Result<ActivityDescription, AdminError> {
        let output = self
            .client
            .describe_activity()
            .activity_arn(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeActivity", e))?;

        Ok(ActivityDescription {
            name: output.name().to_string(),
            arn: output.activity_arn().to_string(),
            creation_date: chrono::DateTime::from_timestamp(output.creation_date().secs(), 0),
        })
    }

    /// List every activity, following pagination.
    async fn list_activities(&self) -> Result<Vec<ResourceSummary>, AdminError> {
        let mut activities = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_activities()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListActivities", e))?;

            activities.extend(
                output
                    .activities()
                    .iter()
                    .map(|a| ResourceSummary::new(a.name(), a.activity_arn())),
            );

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(activities)
    }

    async fn delete_activity(&self, arn: &str) -> Result<(), AdminError> {
        self.client
            .delete_activity()
            .activity_arn(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteActivity", e))?;

        tracing::info!(arn = %arn, "Activity deleted");
        Ok(())
    }

    async fn list_running_executions(&self, arn: &str) -> Result<Vec<String>, AdminError> {
        let mut executions = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_executions()
                .state_machine_arn(arn)
                .status_filter(SfnStatus::Running)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListExecutions", e))?;

            executions.extend(output.executions().iter().map(|e| e.execution_arn().to_string()));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(executions)
    }

    async fn stop_execution(&self, execution_arn: &str) -> Result<(), AdminError> {
        self.client
            .stop_execution()
            .execution_arn(execution_arn)
            .send()
            .await
            .map_err(|e| sdk_error("StopExecution", e))?;

        tracing::info!(execution = %execution_arn, "Execution stopped");
        Ok(())
    }
}

/// Map a Step Functions status onto the runner's status set.
fn map_status(status: &SfnStatus) -> ExecutionStatus {
    match status {
        SfnStatus::Running => ExecutionStatus::Running,
        SfnStatus::Succeeded => ExecutionStatus::Succeeded,
        SfnStatus::Failed => ExecutionStatus::Failed,
        SfnStatus::TimedOut => ExecutionStatus::TimedOut,
        SfnStatus::Aborted => ExecutionStatus::Aborted,
        other => {
            tracing::debug!(status = %other.as_str(), "Unrecognised execution status");
            ExecutionStatus::NotStarted
        }
    }
}

/// Payloads are JSON text; keep anything else as a plain string.
fn parse_output(output: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|_| Value::String(output.to_string()))
}

fn remote<E>(err: E) -> ServiceError
where
    E: std::error::Error + 'static,
{
    ServiceError::Remote(aws_sdk_sfn::error::DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl WorkflowService for SfnClient {
    async fn start_execution(
        &self,
        workflow_id: &str,
        input: &Value,
    ) -> Result<ExecutionHandle, ServiceError> {
        let output = self
            .client
            .start_execution()
            .state_machine_arn(workflow_id)
            .input(input.to_string())
            .send()
            .await
            .map_err(remote)?;

        Ok(ExecutionHandle::new(output.execution_arn()))
    }

    async fn describe_execution(
        &self,
        handle: &ExecutionHandle,
    ) -> Result<ExecutionDescription, ServiceError> {
        let output = self
            .client
            .describe_execution()
            .execution_arn(handle.as_str())
            .send()
            .await
            .map_err(remote)?;

        Ok(ExecutionDescription {
            status: map_status(output.status()),
            output: output.output().map(parse_output),
        })
    }

    async fn fetch_work(&self, source: &str, worker_name: &str) -> Result<WorkItem, ServiceError> {
        let output = self
            .client
            .get_activity_task()
            .activity_arn(source)
            .worker_name(worker_name)
            .send()
            .await
            .map_err(remote)?;

        // An empty long-poll answers with no token, or an empty one.
        let token = output.task_token().filter(|t| !t.is_empty());
        let Some(token) = token else {
            return Ok(WorkItem::empty());
        };

        Ok(WorkItem {
            token: Some(token.to_string()),
            input: output.input().map(parse_output),
        })
    }

    async fn report_success(&self, token: &str, output: &Value) -> Result<(), ServiceError> {
        self.client
            .send_task_success()
            .task_token(token)
            .output(output.to_string())
            .send()
            .await
            .map_err(remote)?;
        Ok(())
    }

    async fn report_failure(&self, token: &str, error: &str, cause: &str) -> Result<(), ServiceError> {
        self.client
            .send_task_failure()
            .task_token(token)
            .error(error)
            .cause(cause)
            .send()
            .await
            .map_err(remote)?;
        Ok(())
    }
}
