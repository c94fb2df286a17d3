//! Canned end-to-end demonstrations.
//!
//! Each demo walks one resource type through create, inspect and delete.
//! The hello-world demo runs a real execution served by a local activity
//! worker.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use task_runner::{
    HelloWorldHandler, MonitorOutcome, RunReport, RunnerConfig, TaskRunner, WorkflowService,
};

use crate::admin::{EventBusAdmin, WorkflowAdmin};
use crate::definitions;
use crate::error::AdminError;
use crate::resources::{print_json, print_summaries, ResourceSummary};
use crate::sfn::SfnClient;

const DEMO_STATE_MACHINE: &str = "HelloWorldStateMachine";
const DEMO_EVENT_BUS: &str = "MyEventBus";
const DEMO_EVENT_RULE: &str = "MyEventRule";
const DEMO_ACTIVITY: &str = "MySampleActivity";

/// Print a listing. A failed listing is logged and the demo goes on.
fn show_listing(title: &str, listing: Result<Vec<ResourceSummary>, AdminError>, json: bool) {
    match listing {
        Ok(items) => print_summaries(title, &items, json),
        Err(e) => tracing::error!(listing = %title, error = %e, "Failed to list resources"),
    }
}

fn show_document<T: Serialize>(what: &str, document: Result<T, AdminError>) {
    match document {
        Ok(document) => print_json(&document),
        Err(e) => tracing::error!(document = %what, error = %e, "Failed to describe resource"),
    }
}

/// State machine lifecycle: create, list, describe, update, delete.
///
/// Once the machine exists it is always deleted; an update failure is
/// returned after the delete.
pub async fn state_machines(sfn: &dyn WorkflowAdmin, role_arn: &str, json: bool) -> Result<()> {
    let arn = sfn
        .create_state_machine(DEMO_STATE_MACHINE, &definitions::hello_world_pass(), role_arn)
        .await?;
    println!("State Machine created successfully: {}", arn);

    show_listing("Installed State Machines", sfn.list_state_machines().await, json);

    println!("\nRetrieving initial definition:");
    show_document("state machine definition", sfn.describe_definition(&arn).await);

    println!("\nUpdating state machine with new state:");
    let updated = sfn
        .update_state_machine(&arn, &definitions::hello_world_goodbye(), role_arn)
        .await;
    match &updated {
        Ok(()) => {
            println!("\nVerifying update - retrieving updated definition:");
            show_document("state machine definition", sfn.describe_definition(&arn).await);
        }
        Err(e) => tracing::error!(arn = %arn, error = %e, "Failed to update state machine"),
    }

    println!("\nDeleting state machine:");
    sfn.delete_state_machine(&arn).await?;

    println!("\nVerifying deletion - listing remaining state machines:");
    show_listing("Installed State Machines", sfn.list_state_machines().await, json);

    updated?;
    Ok(())
}

/// Event bus lifecycle: bus, rule, then teardown in reverse.
///
/// The bus is deleted even when the rule step failed.
pub async fn event_bridge(events: &dyn EventBusAdmin, json: bool) -> Result<()> {
    let bus_arn = events.create_event_bus(DEMO_EVENT_BUS).await?;
    println!("Event Bus created successfully: {}", bus_arn);

    show_listing("Installed Event Buses", events.list_event_buses().await, json);

    let rule_step = rule_lifecycle(events, json).await;

    println!("\nDeleting event bus:");
    events.delete_event_bus(DEMO_EVENT_BUS).await?;
    println!("\nVerifying event bus deletion:");
    show_listing("Installed Event Buses", events.list_event_buses().await, json);

    rule_step?;
    Ok(())
}

async fn rule_lifecycle(events: &dyn EventBusAdmin, json: bool) -> Result<(), AdminError> {
    let rule_arn = events
        .put_rule(DEMO_EVENT_RULE, DEMO_EVENT_BUS, &definitions::s3_cloudtrail_pattern())
        .await
        .inspect_err(|e| tracing::error!(rule = DEMO_EVENT_RULE, error = %e, "Failed to create event rule"))?;
    println!("Event Rule created successfully: {}", rule_arn);

    show_listing("Installed Event Rules", events.list_rules(DEMO_EVENT_BUS).await, json);

    println!("\nDeleting event rule:");
    events
        .delete_rule(DEMO_EVENT_RULE, DEMO_EVENT_BUS)
        .await
        .inspect_err(|e| tracing::error!(rule = DEMO_EVENT_RULE, error = %e, "Failed to delete event rule"))?;
    println!("\nVerifying event rule deletion:");
    show_listing("Installed Event Rules", events.list_rules(DEMO_EVENT_BUS).await, json);

    Ok(())
}

/// Activity lifecycle: create, list, describe, delete.
pub async fn activities(sfn: &dyn WorkflowAdmin, json: bool) -> Result<()> {
    let arn = sfn.create_activity(DEMO_ACTIVITY).await?;
    println!("Activity created successfully: {}", arn);

    show_listing("Installed Activities", sfn.list_activities().await, json);

    println!("\nActivity Description for {}:", arn);
    show_document("activity", sfn.describe_activity(&arn).await);

    println!("\nDeleting activity:");
    sfn.delete_activity(&arn).await?;
    println!("\nVerifying activity deletion:");
    show_listing("Installed Activities", sfn.list_activities().await, json);

    Ok(())
}

/// Create the hello-world activity and state machine, then run one
/// execution while serving the activity locally.
///
/// The created resources are left in place; `flowctl cleanup` removes them.
///
/// Cancelling `shutdown` stops monitoring early; the worker is still
/// stopped and awaited.
pub async fn hello_world(
    sfn: &SfnClient,
    role_arn: &str,
    config: RunnerConfig,
    shutdown: CancellationToken,
) -> Result<RunReport> {
    let activity_arn = sfn.create_activity(definitions::HELLO_ACTIVITY).await?;
    let machine_arn = sfn
        .create_state_machine(
            definitions::HELLO_MACHINE,
            &definitions::hello_world_activity(&activity_arn),
            role_arn,
        )
        .await?;
    println!("Hello World State Machine created: {}", machine_arn);

    let service: Arc<dyn WorkflowService> = Arc::new(sfn.clone());
    let runner = TaskRunner::new(service, config).with_shutdown(shutdown);
    let report = runner
        .run(
            &activity_arn,
            &machine_arn,
            &definitions::hello_world_input(),
            Arc::new(HelloWorldHandler),
        )
        .await;

    print_report(&report);
    Ok(report)
}

fn print_report(report: &RunReport) {
    match &report.outcome {
        Ok(MonitorOutcome::Completed { status, output, .. }) => {
            println!("Execution completed with status: {}", status);
            if let Some(output) = output {
                println!("Execution output: {}", output);
            }
        }
        Ok(MonitorOutcome::TimedOutLocally { handle, elapsed, .. }) => {
            println!(
                "Execution timed out after {}s (still running remotely: {})",
                elapsed.as_secs(),
                handle
            );
        }
        Err(e) => println!("Error in hello world demo: {}", e),
    }

    match &report.worker {
        Ok(stats) => println!(
            "Worker stopped after {} poll(s), {} task(s) completed",
            stats.polls, stats.completed
        ),
        Err(e) => println!("Worker did not stop cleanly: {}", e),
    }
}
