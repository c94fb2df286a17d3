//! EventBridge control plane client.

use async_trait::async_trait;
use aws_sdk_eventbridge::Client;
use serde_json::Value;

use crate::admin::EventBusAdmin;
use crate::error::{sdk_error, AdminError};
use crate::resources::ResourceSummary;

/// Thin wrapper over the EventBridge SDK client.
#[derive(Debug, Clone)]
pub struct EventsClient {
    client: Client,
}

impl EventsClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// IDs of the targets attached to a rule.
    async fn list_target_ids(&self, rule: &str, event_bus: &str) -> Result<Vec<String>, AdminError> {
        let mut ids = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_targets_by_rule()
                .rule(rule)
                .event_bus_name(event_bus)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListTargetsByRule", e))?;

            ids.extend(output.targets().iter().map(|t| t.id().to_string()));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(ids)
    }

    async fn remove_targets(
        &self,
        rule: &str,
        event_bus: &str,
        ids: Vec<String>,
    ) -> Result<(), AdminError> {
        if ids.is_empty() {
            return Ok(());
        }

        let count = ids.len();
        self.client
            .remove_targets()
            .rule(rule)
            .event_bus_name(event_bus)
            .set_ids(Some(ids))
            .send()
            .await
            .map_err(|e| sdk_error("RemoveTargets", e))?;

        tracing::debug!(rule = %rule, count, "Removed rule targets");
        Ok(())
    }
}

#[async_trait]
impl EventBusAdmin for EventsClient {
    async fn create_event_bus(&self, name: &str) -> Result<String, AdminError> {
        let output = self
            .client
            .create_event_bus()
            .name(name)
            .send()
            .await
            .map_err(|e| sdk_error("CreateEventBus", e))?;

        let arn = output
            .event_bus_arn()
            .ok_or(AdminError::MissingField("EventBusArn"))?
            .to_string();
        tracing::info!(name = %name, arn = %arn, "Event bus created");
        Ok(arn)
    }

    /// List every event bus, following pagination.
    async fn list_event_buses(&self) -> Result<Vec<ResourceSummary>, AdminError> {
        let mut buses = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_event_buses()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListEventBuses", e))?;

            buses.extend(output.event_buses().iter().map(|bus| {
                ResourceSummary::new(bus.name().unwrap_or_default(), bus.arn().unwrap_or_default())
            }));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(buses)
    }

    /// Delete an event bus by name.
    async fn delete_event_bus(&self, name: &str) -> Result<(), AdminError> {
        self.client
            .delete_event_bus()
            .name(name)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteEventBus", e))?;

        tracing::info!(name = %name, "Event bus deleted");
        Ok(())
    }

    async fn put_rule(
        &self,
        name: &str,
        event_bus: &str,
        pattern: &Value,
    ) -> Result<String, AdminError> {
        let output = self
            .client
            .put_rule()
            .name(name)
            .event_bus_name(event_bus)
            .event_pattern(pattern.to_string())
            .send()
            .await
            .map_err(|e| sdk_error("PutRule", e))?;

        let arn = output
            .rule_arn()
            .ok_or(AdminError::MissingField("RuleArn"))?
            .to_string();
        tracing::info!(name = %name, event_bus = %event_bus, arn = %arn, "Event rule created");
        Ok(arn)
    }

    /// List the rules of `event_bus`, following pagination.
    async fn list_rules(&self, event_bus: &str) -> Result<Vec<ResourceSummary>, AdminError> {
        let mut rules = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_rules()
                .event_bus_name(event_bus)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListRules", e))?;

            rules.extend(output.rules().iter().map(|rule| {
                ResourceSummary::new(rule.name().unwrap_or_default(), rule.arn().unwrap_or_default())
            }));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(rules)
    }

    async fn delete_rule(&self, name: &str, event_bus: &str) -> Result<(), AdminError> {
        let ids = self.list_target_ids(name, event_bus).await?;
        self.remove_targets(name, event_bus, ids).await?;

        self.client
            .delete_rule()
            .name(name)
            .event_bus_name(event_bus)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteRule", e))?;

        tracing::info!(name = %name, event_bus = %event_bus, "Event rule deleted");
        Ok(())
    }
}
