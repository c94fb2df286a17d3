//! Prefix-based removal of demo resources.

use std::time::Duration;

use crate::admin::{EventBusAdmin, WorkflowAdmin};
use crate::resources::with_prefix;

/// Grace period after stopping executions before their machines are deleted.
const STOP_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// What one sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub executions_stopped: usize,
    pub state_machines: usize,
    pub activities: usize,
    pub rules: usize,
    pub event_buses: usize,
    pub errors: usize,
}

/// Delete every resource whose name starts with `prefix`.
///
/// A failure on one resource is logged and the sweep moves on.
pub async fn cleanup(
    sfn: &dyn WorkflowAdmin,
    events: &dyn EventBusAdmin,
    prefix: &str,
    stop_executions: bool,
) -> CleanupSummary {
    let mut summary = CleanupSummary::default();

    match sfn.list_state_machines().await {
        Ok(machines) => {
            let targets: Vec<_> = with_prefix(&machines, prefix).cloned().collect();

            if stop_executions {
                for machine in &targets {
                    stop_running(sfn, &machine.arn, &mut summary).await;
                }
                if summary.executions_stopped > 0 {
                    tokio::time::sleep(STOP_SETTLE_DELAY).await;
                }
            }

            for machine in &targets {
                match sfn.delete_state_machine(&machine.arn).await {
                    Ok(()) => {
                        summary.state_machines += 1;
                        println!("Deleted state machine: {}", machine.name);
                    }
                    Err(e) => {
                        summary.errors += 1;
                        tracing::error!(name = %machine.name, error = %e, "Failed to delete state machine");
                    }
                }
            }
        }
        Err(e) => {
            summary.errors += 1;
            tracing::error!(error = %e, "Failed to list state machines");
        }
    }

    match sfn.list_activities().await {
        Ok(activities) => {
            for activity in with_prefix(&activities, prefix) {
                match sfn.delete_activity(&activity.arn).await {
                    Ok(()) => {
                        summary.activities += 1;
                        println!("Deleted activity: {}", activity.name);
                    }
                    Err(e) => {
                        summary.errors += 1;
                        tracing::error!(name = %activity.name, error = %e, "Failed to delete activity");
                    }
                }
            }
        }
        Err(e) => {
            summary.errors += 1;
            tracing::error!(error = %e, "Failed to list activities");
        }
    }

    match events.list_event_buses().await {
        Ok(buses) => {
            for bus in with_prefix(&buses, prefix) {
                cleanup_bus(events, &bus.name, &mut summary).await;
            }
        }
        Err(e) => {
            summary.errors += 1;
            tracing::error!(error = %e, "Failed to list event buses");
        }
    }

    tracing::info!(
        state_machines = summary.state_machines,
        activities = summary.activities,
        rules = summary.rules,
        event_buses = summary.event_buses,
        errors = summary.errors,
        "Cleanup finished"
    );

    summary
}

async fn stop_running(sfn: &dyn WorkflowAdmin, machine_arn: &str, summary: &mut CleanupSummary) {
    let executions = match sfn.list_running_executions(machine_arn).await {
        Ok(executions) => executions,
        Err(e) => {
            summary.errors += 1;
            tracing::error!(machine = %machine_arn, error = %e, "Failed to list executions");
            return;
        }
    };

    for execution in executions {
        match sfn.stop_execution(&execution).await {
            Ok(()) => {
                summary.executions_stopped += 1;
                println!("Stopped execution: {}", execution);
            }
            Err(e) => {
                summary.errors += 1;
                tracing::error!(execution = %execution, error = %e, "Failed to stop execution");
            }
        }
    }
}

/// Rules first (each with its targets), then the bus itself.
async fn cleanup_bus(events: &dyn EventBusAdmin, bus: &str, summary: &mut CleanupSummary) {
    match events.list_rules(bus).await {
        Ok(rules) => {
            for rule in rules {
                match events.delete_rule(&rule.name, bus).await {
                    Ok(()) => {
                        summary.rules += 1;
                        println!("Deleted rule: {}", rule.name);
                    }
                    Err(e) => {
                        summary.errors += 1;
                        tracing::error!(rule = %rule.name, error = %e, "Failed to delete rule");
                    }
                }
            }
        }
        Err(e) => {
            summary.errors += 1;
            tracing::error!(event_bus = %bus, error = %e, "Failed to list rules");
        }
    }

    match events.delete_event_bus(bus).await {
        Ok(()) => {
            summary.event_buses += 1;
            println!("Deleted event bus: {}", bus);
        }
        Err(e) => {
            summary.errors += 1;
            tracing::error!(event_bus = %bus, error = %e, "Failed to delete event bus");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeAdmin;
    use tokio::time::Instant;

    fn demo_resources() -> FakeAdmin {
        FakeAdmin::new()
            .with_machine("demo-a")
            .with_machine("demo-b")
            .with_machine("HelloWorldStateMachine")
            .with_activity("demo-hello-world-activity")
            .with_activity("MySampleActivity")
            .with_bus("demo-bus", &["demo-rule", "other-rule"])
            .with_bus("default", &["keep-me"])
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_removes_prefixed_resources_only() {
        let admin = demo_resources();
        let started = Instant::now();

        let summary = cleanup(&admin, &admin, "demo-", false).await;

        assert_eq!(
            summary,
            CleanupSummary {
                executions_stopped: 0,
                state_machines: 2,
                activities: 1,
                rules: 2,
                event_buses: 1,
                errors: 0,
            }
        );
        assert_eq!(admin.machine_names(), vec!["HelloWorldStateMachine".to_string()]);
        assert_eq!(admin.activity_names(), vec!["MySampleActivity".to_string()]);
        assert_eq!(admin.bus_names(), vec!["default".to_string()]);
        // nothing was stopped, so no settle delay
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_continues_after_failed_delete() {
        let admin = demo_resources().fail_on("DeleteStateMachine:arn:stateMachine:demo-a");

        let summary = cleanup(&admin, &admin, "demo-", false).await;

        assert_eq!(summary.errors, 1);
        assert_eq!(summary.state_machines, 1);
        assert_eq!(summary.activities, 1);
        assert_eq!(summary.event_buses, 1);
        assert_eq!(
            admin.machine_names(),
            vec!["demo-a".to_string(), "HelloWorldStateMachine".to_string()]
        );
        assert!(admin
            .calls()
            .contains(&"DeleteStateMachine:arn:stateMachine:demo-b".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_continues_after_failed_listing() {
        let admin = demo_resources().fail_on("ListActivities").fail_on("ListRules");

        let summary = cleanup(&admin, &admin, "demo-", false).await;

        assert_eq!(summary.errors, 2);
        assert_eq!(summary.state_machines, 2);
        assert_eq!(summary.activities, 0);
        // the bus delete is still attempted after its rules could not be listed
        assert_eq!(summary.event_buses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_stops_executions_then_settles() {
        let admin = demo_resources()
            .with_running_execution("demo-a", "arn:execution:demo-a:1")
            .with_running_execution("demo-a", "arn:execution:demo-a:2")
            .with_running_execution("HelloWorldStateMachine", "arn:execution:keep:1");
        let started = Instant::now();

        let summary = cleanup(&admin, &admin, "demo-", true).await;

        assert_eq!(summary.executions_stopped, 2);
        assert_eq!(summary.errors, 0);
        assert!(started.elapsed() >= STOP_SETTLE_DELAY);

        let calls = admin.calls();
        let last_stop = calls
            .iter()
            .rposition(|c| c.starts_with("StopExecution:"))
            .unwrap();
        let first_delete = calls
            .iter()
            .position(|c| c.starts_with("DeleteStateMachine:"))
            .unwrap();
        assert!(last_stop < first_delete);
        assert!(!calls.contains(&"StopExecution:arn:execution:keep:1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_ignores_executions_without_flag() {
        let admin = demo_resources().with_running_execution("demo-a", "arn:execution:demo-a:1");

        let summary = cleanup(&admin, &admin, "demo-", false).await;

        assert_eq!(summary.executions_stopped, 0);
        assert!(!admin.calls().iter().any(|c| c.starts_with("ListExecutions:")));
    }
}
