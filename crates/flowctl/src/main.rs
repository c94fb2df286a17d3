mod admin;
mod cleanup;
mod config;
mod definitions;
mod demo;
mod error;
mod events;
mod resources;
mod sfn;
#[cfg(test)]
mod testing;

use admin::{EventBusAdmin, WorkflowAdmin};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AppConfig;
use events::EventsClient;
use resources::{print_json, print_summaries};
use serde_json::Value;
use sfn::SfnClient;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "flowctl")]
#[command(version, about = "Step Functions and EventBridge admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// AWS region (overrides FLOWCTL_REGION and the AWS config chain)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Endpoint override, e.g. a local emulator
    #[arg(long, global = true)]
    endpoint_url: Option<String>,

    /// Emit listings as JSON
    #[arg(short, long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// State machine (workflow definition) management
    StateMachine {
        #[command(subcommand)]
        command: StateMachineCommand,
    },
    /// Activity management
    Activity {
        #[command(subcommand)]
        command: ActivityCommand,
    },
    /// Event bus management
    EventBus {
        #[command(subcommand)]
        command: EventBusCommand,
    },
    /// Event rule management
    Rule {
        #[command(subcommand)]
        command: RuleCommand,
    },
    /// Run the canned demos
    Demo {
        #[command(subcommand)]
        command: DemoCommand,
    },
    /// Delete every resource whose name starts with a prefix
    /// Examples:
    ///     flowctl cleanup
    ///     flowctl cleanup --prefix test- --stop-executions
    #[command(verbatim_doc_comment)]
    Cleanup {
        /// Name prefix of the resources to delete
        #[arg(long, default_value = "demo-")]
        prefix: String,

        /// Stop RUNNING executions before deleting their state machines
        #[arg(long)]
        stop_executions: bool,
    },
}

#[derive(Subcommand)]
enum StateMachineCommand {
    /// Create a STANDARD state machine
    Create {
        name: String,

        /// JSON definition file (default: a single Hello World Pass state)
        #[arg(short, long)]
        definition: Option<PathBuf>,

        /// Execution role (default: FLOWCTL_EXECUTOR_ROLE_ARN)
        #[arg(long)]
        role_arn: Option<String>,
    },
    /// List state machines
    List,
    /// Print the definition of a state machine
    Describe { arn: String },
    /// Replace the definition of a state machine
    Update {
        arn: String,

        /// JSON definition file (default: the Hello/Goodbye Pass chain)
        #[arg(short, long)]
        definition: Option<PathBuf>,

        /// Execution role (default: FLOWCTL_EXECUTOR_ROLE_ARN)
        #[arg(long)]
        role_arn: Option<String>,
    },
    /// Delete a state machine
    Delete { arn: String },
}

#[derive(Subcommand)]
enum ActivityCommand {
    /// Create an activity
    Create { name: String },
    /// List activities
    List,
    /// Describe an activity by ARN or by name
    Describe {
        #[arg(value_name = "ARN_OR_NAME")]
        target: String,
    },
    /// Delete an activity
    Delete { arn: String },
}

#[derive(Subcommand)]
enum EventBusCommand {
    /// Create an event bus
    Create { name: String },
    /// List event buses
    List,
    /// Delete an event bus
    Delete { name: String },
}

#[derive(Subcommand)]
enum RuleCommand {
    /// Create or update an event rule
    Create {
        name: String,

        #[arg(long, default_value = "default")]
        bus: String,

        /// Event pattern as JSON (default: S3 API calls via CloudTrail)
        #[arg(long, value_name = "JSON")]
        pattern: Option<String>,
    },
    /// List the rules of an event bus
    List {
        #[arg(long, default_value = "default")]
        bus: String,
    },
    /// Delete a rule and detach its targets
    Delete {
        name: String,

        #[arg(long, default_value = "default")]
        bus: String,
    },
}

#[derive(Subcommand)]
enum DemoCommand {
    /// Create, list, describe, update and delete a state machine
    StateMachines,
    /// Create and delete an event bus with one rule
    EventBridge,
    /// Create, list, describe and delete an activity
    Activities,
    /// Run a workflow backed by a locally polled activity worker
    HelloWorld,
    /// Run every demo in sequence
    All,
}

/// Initialize tracing/logging. Logs go to stderr so stdout stays parseable.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flowctl=debug,task_runner=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_definition(path: Option<&PathBuf>, fallback: fn() -> Value) -> Result<Value> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read definition {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Definition {} is not valid JSON", path.display()))
        }
        None => Ok(fallback()),
    }
}

fn role_arn<'a>(flag: Option<&'a str>, config: &'a AppConfig) -> Result<&'a str> {
    match flag {
        Some(arn) => Ok(arn),
        None => config.require_role_arn(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before the filter reads RUST_LOG
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Failed to load FLOWCTL_ configuration")?;
    if cli.region.is_some() {
        config.region = cli.region.clone();
    }
    if cli.endpoint_url.is_some() {
        config.endpoint_url = cli.endpoint_url.clone();
    }

    let sdk_config = config.load_sdk_config().await;
    let sfn = SfnClient::new(&sdk_config);
    let events = EventsClient::new(&sdk_config);
    let json = cli.json;

    match cli.command {
        Commands::StateMachine { command } => match command {
            StateMachineCommand::Create {
                name,
                definition,
                role_arn: role,
            } => {
                let definition = read_definition(definition.as_ref(), definitions::hello_world_pass)?;
                let role = role_arn(role.as_deref(), &config)?;
                let arn = sfn.create_state_machine(&name, &definition, role).await?;
                println!("State Machine created successfully: {}", arn);
            }
            StateMachineCommand::List => {
                print_summaries("Installed State Machines", &sfn.list_state_machines().await?, json);
            }
            StateMachineCommand::Describe { arn } => {
                print_json(&sfn.describe_definition(&arn).await?);
            }
            StateMachineCommand::Update {
                arn,
                definition,
                role_arn: role,
            } => {
                let definition =
                    read_definition(definition.as_ref(), definitions::hello_world_goodbye)?;
                let role = role_arn(role.as_deref(), &config)?;
                sfn.update_state_machine(&arn, &definition, role).await?;
                println!("State Machine updated successfully: {}", arn);
            }
            StateMachineCommand::Delete { arn } => {
                sfn.delete_state_machine(&arn).await?;
                println!("State Machine deleted successfully: {}", arn);
            }
        },
        Commands::Activity { command } => match command {
            ActivityCommand::Create { name } => {
                let arn = sfn.create_activity(&name).await?;
                println!("Activity created successfully: {}", arn);
            }
            ActivityCommand::List => {
                print_summaries("Installed Activities", &sfn.list_activities().await?, json);
            }
            ActivityCommand::Describe { target } => {
                if target.starts_with("arn:") {
                    print_json(&sfn.describe_activity(&target).await?);
                } else {
                    match sfn.find_activity(&target).await? {
                        Some(activity) => print_json(&activity),
                        None => anyhow::bail!("Activity '{}' not found", target),
                    }
                }
            }
            ActivityCommand::Delete { arn } => {
                sfn.delete_activity(&arn).await?;
                println!("Activity deleted successfully: {}", arn);
            }
        },
        Commands::EventBus { command } => match command {
            EventBusCommand::Create { name } => {
                let arn = events.create_event_bus(&name).await?;
                println!("Event Bus created successfully: {}", arn);
            }
            EventBusCommand::List => {
                print_summaries("Installed Event Buses", &events.list_event_buses().await?, json);
            }
            EventBusCommand::Delete { name } => {
                events.delete_event_bus(&name).await?;
                println!("Event Bus deleted successfully: {}", name);
            }
        },
        Commands::Rule { command } => match command {
            RuleCommand::Create { name, bus, pattern } => {
                let pattern = match pattern {
                    Some(text) => serde_json::from_str(&text).context("Invalid event pattern")?,
                    None => definitions::s3_cloudtrail_pattern(),
                };
                let arn = events.put_rule(&name, &bus, &pattern).await?;
                println!("Event Rule created successfully: {}", arn);
            }
            RuleCommand::List { bus } => {
                print_summaries("Installed Event Rules", &events.list_rules(&bus).await?, json);
            }
            RuleCommand::Delete { name, bus } => {
                events.delete_rule(&name, &bus).await?;
                println!("Event Rule deleted successfully: {}", name);
            }
        },
        Commands::Demo { command } => {
            let shutdown = CancellationToken::new();
            let signal = tokio::spawn(handle_ctrl_c(shutdown.clone()));

            let result = run_demo(command, &sfn, &events, &config, json, shutdown).await;
            signal.abort();
            result?;
        }
        Commands::Cleanup {
            prefix,
            stop_executions,
        } => {
            let summary = cleanup::cleanup(&sfn, &events, &prefix, stop_executions).await;
            if summary.errors > 0 {
                anyhow::bail!("Cleanup finished with {} error(s)", summary.errors);
            }
        }
    }

    Ok(())
}

/// First Ctrl+C asks the running demo to wind down; a second one exits.
async fn handle_ctrl_c(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        return;
    }
    tracing::info!("Shutdown signal received, stopping demo");
    shutdown.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("Second shutdown signal received, aborting");
        std::process::exit(130);
    }
}

async fn run_demo(
    command: DemoCommand,
    sfn: &SfnClient,
    events: &EventsClient,
    config: &AppConfig,
    json: bool,
    shutdown: CancellationToken,
) -> Result<()> {
    match command {
        DemoCommand::StateMachines => {
            demo::state_machines(sfn, config.require_role_arn()?, json).await
        }
        DemoCommand::EventBridge => demo::event_bridge(events, json).await,
        DemoCommand::Activities => demo::activities(sfn, json).await,
        DemoCommand::HelloWorld => {
            let report = demo::hello_world(
                sfn,
                config.require_role_arn()?,
                config.runner_config(),
                shutdown,
            )
            .await?;
            if !report.is_success() {
                anyhow::bail!("Hello world demo did not succeed");
            }
            Ok(())
        }
        DemoCommand::All => {
            let role = config.require_role_arn()?;

            println!("\nStarting Step Functions demo:");
            if let Err(e) = demo::state_machines(sfn, role, json).await {
                tracing::error!(error = %e, "Step Functions demo failed");
            }

            if shutdown.is_cancelled() {
                return Ok(());
            }
            println!("\nStarting EventBridge demo:");
            if let Err(e) = demo::event_bridge(events, json).await {
                tracing::error!(error = %e, "EventBridge demo failed");
            }

            if shutdown.is_cancelled() {
                return Ok(());
            }
            println!("\nStarting Activities demo:");
            if let Err(e) = demo::activities(sfn, json).await {
                tracing::error!(error = %e, "Activities demo failed");
            }

            if shutdown.is_cancelled() {
                return Ok(());
            }
            println!("\nStarting Hello World demo:");
            if let Err(e) = demo::hello_world(sfn, role, config.runner_config(), shutdown).await {
                tracing::error!(error = %e, "Hello World demo failed");
            }

            Ok(())
        }
    }
}
