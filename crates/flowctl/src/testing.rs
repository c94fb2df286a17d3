//! In-memory control plane for demo and cleanup tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::admin::{ActivityDescription, EventBusAdmin, WorkflowAdmin};
use crate::error::AdminError;
use crate::resources::ResourceSummary;

#[derive(Default)]
struct State {
    machines: Vec<ResourceSummary>,
    activities: Vec<ResourceSummary>,
    buses: Vec<ResourceSummary>,
    rules: Vec<(String, ResourceSummary)>,
    running: HashMap<String, Vec<String>>,
}

/// Fake admin backend holding resources in memory.
///
/// Every call is recorded as `Operation:target`. An operation fails when
/// either `Operation` or `Operation:target` was registered with `fail_on`.
#[derive(Default)]
pub(crate) struct FakeAdmin {
    state: Mutex<State>,
    failures: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

fn arn(kind: &str, name: &str) -> String {
    format!("arn:{}:{}", kind, name)
}

impl FakeAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, operation: &str) -> Self {
        self.failures.insert(operation.to_string());
        self
    }

    pub fn with_machine(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .machines
            .push(ResourceSummary::new(name, arn("stateMachine", name)));
        self
    }

    pub fn with_running_execution(self, machine: &str, execution: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .running
            .entry(arn("stateMachine", machine))
            .or_default()
            .push(execution.to_string());
        self
    }

    pub fn with_activity(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .activities
            .push(ResourceSummary::new(name, arn("activity", name)));
        self
    }

    pub fn with_bus(self, name: &str, rules: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.buses.push(ResourceSummary::new(name, arn("event-bus", name)));
            for rule in rules {
                state
                    .rules
                    .push((name.to_string(), ResourceSummary::new(*rule, arn("rule", rule))));
            }
        }
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn machine_names(&self) -> Vec<String> {
        names(&self.state.lock().unwrap().machines)
    }

    pub fn activity_names(&self) -> Vec<String> {
        names(&self.state.lock().unwrap().activities)
    }

    pub fn bus_names(&self) -> Vec<String> {
        names(&self.state.lock().unwrap().buses)
    }

    fn call(&self, operation: &'static str, target: &str) -> Result<(), AdminError> {
        let key = format!("{}:{}", operation, target);
        self.calls.lock().unwrap().push(key.clone());
        if self.failures.contains(operation) || self.failures.contains(&key) {
            return Err(AdminError::Sdk {
                operation,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

fn names(items: &[ResourceSummary]) -> Vec<String> {
    items.iter().map(|item| item.name.clone()).collect()
}

#[async_trait]
impl WorkflowAdmin for FakeAdmin {
    async fn create_state_machine(
        &self,
        name: &str,
        _definition: &Value,
        _role_arn: &str,
    ) -> Result<String, AdminError> {
        self.call("CreateStateMachine", name)?;
        let arn = arn("stateMachine", name);
        self.state
            .lock()
            .unwrap()
            .machines
            .push(ResourceSummary::new(name, arn.clone()));
        Ok(arn)
    }

    async fn describe_definition(&self, arn: &str) -> Result<Value, AdminError> {
        self.call("DescribeStateMachine", arn)?;
        Ok(serde_json::json!({"StartAt": "HelloWorld"}))
    }

    async fn update_state_machine(
        &self,
        arn: &str,
        _definition: &Value,
        _role_arn: &str,
    ) -> Result<(), AdminError> {
        self.call("UpdateStateMachine", arn)
    }

    async fn delete_state_machine(&self, arn: &str) -> Result<(), AdminError> {
        self.call("DeleteStateMachine", arn)?;
        self.state.lock().unwrap().machines.retain(|m| m.arn != arn);
        Ok(())
    }

    async fn list_state_machines(&self) -> Result<Vec<ResourceSummary>, AdminError> {
        self.call("ListStateMachines", "")?;
        Ok(self.state.lock().unwrap().machines.clone())
    }

    async fn create_activity(&self, name: &str) -> Result<String, AdminError> {
        self.call("CreateActivity", name)?;
        let arn = arn("activity", name);
        self.state
            .lock()
            .unwrap()
            .activities
            .push(ResourceSummary::new(name, arn.clone()));
        Ok(arn)
    }

    async fn describe_activity(&self, arn: &str) -> Result<ActivityDescription, AdminError> {
        self.call("DescribeActivity", arn)?;
        let state = self.state.lock().unwrap();
        let activity = state
            .activities
            .iter()
            .find(|a| a.arn == arn)
            .ok_or(AdminError::MissingField("activity"))?;
        Ok(ActivityDescription {
            name: activity.name.clone(),
            arn: activity.arn.clone(),
            creation_date: None,
        })
    }

    async fn list_activities(&self) -> Result<Vec<ResourceSummary>, AdminError> {
        self.call("ListActivities", "")?;
        Ok(self.state.lock().unwrap().activities.clone())
    }

    async fn delete_activity(&self, arn: &str) -> Result<(), AdminError> {
        self.call("DeleteActivity", arn)?;
        self.state.lock().unwrap().activities.retain(|a| a.arn != arn);
        Ok(())
    }

    async fn list_running_executions(&self, arn: &str) -> Result<Vec<String>, AdminError> {
        self.call("ListExecutions", arn)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .running
            .get(arn)
            .cloned()
            .unwrap_or_default())
    }

    async fn stop_execution(&self, execution_arn: &str) -> Result<(), AdminError> {
        self.call("StopExecution", execution_arn)?;
        for executions in self.state.lock().unwrap().running.values_mut() {
            executions.retain(|e| e != execution_arn);
        }
        Ok(())
    }
}

#[async_trait]
impl EventBusAdmin for FakeAdmin {
    async fn create_event_bus(&self, name: &str) -> Result<String, AdminError> {
        self.call("CreateEventBus", name)?;
        let arn = arn("event-bus", name);
        self.state
            .lock()
            .unwrap()
            .buses
            .push(ResourceSummary::new(name, arn.clone()));
        Ok(arn)
    }

    async fn list_event_buses(&self) -> Result<Vec<ResourceSummary>, AdminError> {
        self.call("ListEventBuses", "")?;
        Ok(self.state.lock().unwrap().buses.clone())
    }

    async fn delete_event_bus(&self, name: &str) -> Result<(), AdminError> {
        self.call("DeleteEventBus", name)?;
        self.state.lock().unwrap().buses.retain(|b| b.name != name);
        Ok(())
    }

    async fn put_rule(
        &self,
        name: &str,
        event_bus: &str,
        _pattern: &Value,
    ) -> Result<String, AdminError> {
        self.call("PutRule", name)?;
        let arn = arn("rule", name);
        self.state
            .lock()
            .unwrap()
            .rules
            .push((event_bus.to_string(), ResourceSummary::new(name, arn.clone())));
        Ok(arn)
    }

    async fn list_rules(&self, event_bus: &str) -> Result<Vec<ResourceSummary>, AdminError> {
        self.call("ListRules", event_bus)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .rules
            .iter()
            .filter(|(bus, _)| bus == event_bus)
            .map(|(_, rule)| rule.clone())
            .collect())
    }

    async fn delete_rule(&self, name: &str, event_bus: &str) -> Result<(), AdminError> {
        self.call("DeleteRule", name)?;
        self.state
            .lock()
            .unwrap()
            .rules
            .retain(|(bus, rule)| !(bus == event_bus && rule.name == name));
        Ok(())
    }
}
