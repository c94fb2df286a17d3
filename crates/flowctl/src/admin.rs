//! Control plane boundaries used by the demos and the cleanup sweep.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::AdminError;
use crate::resources::ResourceSummary;

/// Description of one activity.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityDescription {
    pub name: String,
    pub arn: String,
    pub creation_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// State machines, activities and their executions.
#[async_trait]
pub trait WorkflowAdmin: Send + Sync {
    /// Create a STANDARD state machine and return its ARN.
    async fn create_state_machine(
        &self,
        name: &str,
        definition: &Value,
        role_arn: &str,
    ) -> Result<String, AdminError>;

    async fn describe_definition(&self, arn: &str) -> Result<Value, AdminError>;

    async fn update_state_machine(
        &self,
        arn: &str,
        definition: &Value,
        role_arn: &str,
    ) -> Result<(), AdminError>;

    async fn delete_state_machine(&self, arn: &str) -> Result<(), AdminError>;

    async fn list_state_machines(&self) -> Result<Vec<ResourceSummary>, AdminError>;

    async fn create_activity(&self, name: &str) -> Result<String, AdminError>;

    async fn describe_activity(&self, arn: &str) -> Result<ActivityDescription, AdminError>;

    async fn list_activities(&self) -> Result<Vec<ResourceSummary>, AdminError>;

    async fn delete_activity(&self, arn: &str) -> Result<(), AdminError>;

    /// ARNs of the RUNNING executions of a state machine.
    async fn list_running_executions(&self, arn: &str) -> Result<Vec<String>, AdminError>;

    async fn stop_execution(&self, execution_arn: &str) -> Result<(), AdminError>;

    /// Look an activity up by name.
    async fn find_activity(&self, name: &str) -> Result<Option<ActivityDescription>, AdminError> {
        let activities = self.list_activities().await?;
        match activities.iter().find(|a| a.name == name) {
            Some(activity) => Ok(Some(self.describe_activity(&activity.arn).await?)),
            None => Ok(None),
        }
    }
}

/// Event buses and the rules attached to them.
#[async_trait]
pub trait EventBusAdmin: Send + Sync {
    /// Create an event bus and return its ARN.
    async fn create_event_bus(&self, name: &str) -> Result<String, AdminError>;

    async fn list_event_buses(&self) -> Result<Vec<ResourceSummary>, AdminError>;

    async fn delete_event_bus(&self, name: &str) -> Result<(), AdminError>;

    /// Create or update a rule on `event_bus` and return its ARN.
    async fn put_rule(&self, name: &str, event_bus: &str, pattern: &Value)
        -> Result<String, AdminError>;

    async fn list_rules(&self, event_bus: &str) -> Result<Vec<ResourceSummary>, AdminError>;

    /// Delete a rule after detaching whatever targets it has.
    async fn delete_rule(&self, name: &str, event_bus: &str) -> Result<(), AdminError>;
}
