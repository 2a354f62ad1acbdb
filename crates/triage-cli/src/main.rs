//! Command-line front-end for the triage demo
//!
//! Renders engine snapshots as they stream: `list` the scenarios, `run` one
//! in simulated or live mode, or `seed` the vector index.

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use triage_core::engine::{EnginePhase, WorkflowEngine};
use triage_core::types::{ExecutionMode, StepStatus};
use triage_core::{scenario, sla, RemoteWorkflow, StepId};
use triage_remote::config::WEBHOOK_URL_VAR;
use triage_remote::{run_seed, HttpRemoteClient, RemoteConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Command::new("triage")
        .version(triage_core::VERSION)
        .about("Incident triage workflow demo")
        .subcommand_required(true)
        .subcommand(Command::new("list").about("List available scenarios"))
        .subcommand(
            Command::new("run")
                .about("Run a scenario through the workflow engine")
                .arg(
                    Arg::new("scenario")
                        .long("scenario")
                        .short('s')
                        .default_value("auto-resolve")
                        .help("Scenario id (see `triage list`)"),
                )
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .short('m')
                        .default_value("simulated")
                        .value_parser(["simulated", "live"])
                        .help("Execution mode"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the final snapshot as JSON"),
                ),
        )
        .subcommand(
            Command::new("seed")
                .about("Seed the vector index with the historical incident corpus"),
        );

    match cli.get_matches().subcommand() {
        Some(("list", _)) => list_scenarios(),
        Some(("run", args)) => run_scenario(args).await?,
        Some(("seed", _)) => seed_index().await?,
        _ => unreachable!("subcommand required"),
    }

    Ok(())
}

fn list_scenarios() {
    println!("Available scenarios:");
    for scenario in scenario::scenarios() {
        println!(
            "  {:<14} {} [{} severity, {} / {}% / SLA {}m]",
            scenario.id,
            scenario.name,
            scenario.incident.severity,
            scenario.expected_path,
            scenario.expected_confidence,
            scenario.sla_minutes,
        );
        println!("  {:<14} {}", "", scenario.description);
    }
}

async fn run_scenario(args: &ArgMatches) -> anyhow::Result<()> {
    let scenario_id = args.get_one::<String>("scenario").expect("defaulted");
    let scenario = scenario::find(scenario_id)
        .with_context(|| format!("unknown scenario `{scenario_id}`, try `triage list`"))?;
    let mode = match args.get_one::<String>("mode").expect("defaulted").as_str() {
        "live" => ExecutionMode::Live,
        _ => ExecutionMode::Simulated,
    };

    let client = Arc::new(HttpRemoteClient::new(RemoteConfig::from_env()));
    if mode == ExecutionMode::Live && !client.live_available() {
        anyhow::bail!("live mode unavailable: set {WEBHOOK_URL_VAR} to enable it");
    }

    let engine = WorkflowEngine::new(client);
    let mut rx = engine.subscribe();

    println!("Scenario: {} ({})", scenario.name, scenario.id);
    println!(
        "Incident: {} - {}",
        scenario.incident.id, scenario.incident.title
    );
    println!(
        "SLA budget: {}",
        sla::format_clock(scenario.sla_budget_secs())
    );
    println!();

    engine.start(scenario, mode).await;

    let mut seen = vec![StepStatus::Pending; StepId::ALL.len()];
    let final_snapshot = loop {
        rx.changed().await?;
        let snapshot = rx.borrow_and_update().clone();
        for (index, step) in snapshot.steps.iter().enumerate() {
            if step.status == seen[index] {
                continue;
            }
            seen[index] = step.status;
            match step.status {
                StepStatus::Running => println!("> {} ...", step.name),
                StepStatus::Completed => {
                    let secs = step.duration_ms.unwrap_or(0) as f64 / 1000.0;
                    match &step.result {
                        Some(result) => {
                            println!("  {} ({secs:.1}s) - {}", step.name, result.message);
                        }
                        None => println!("  {} ({secs:.1}s)", step.name),
                    }
                }
                StepStatus::Failed => println!("  {} FAILED", step.name),
                StepStatus::Pending => {}
            }
        }
        if matches!(
            snapshot.phase,
            EnginePhase::Completed | EnginePhase::Failed | EnginePhase::Cancelled
        ) {
            break snapshot;
        }
    };

    let metrics = &final_snapshot.metrics;
    println!();
    println!(
        "Finished: {:?} in {:.1}s",
        final_snapshot.phase, metrics.total_duration_secs
    );
    println!("Confidence: {}%", metrics.confidence_score);
    if let Some(path) = metrics.resolution_path {
        println!("Resolution path: {path}");
    }
    println!(
        "SLA: {:?} ({} remaining)",
        metrics.sla_status,
        sla::format_clock(metrics.sla_remaining_secs)
    );
    println!("Saved: {} / {}", metrics.time_saved, metrics.cost_saved);

    if let Some(results) = &final_snapshot.results {
        println!();
        if let Some(jira) = &results.jira {
            match &jira.assignee {
                Some(assignee) => println!(
                    "Jira: {} [{}] assigned to {assignee}",
                    jira.ticket_id, jira.status
                ),
                None => println!("Jira: {} [{}]", jira.ticket_id, jira.status),
            }
        }
        if let Some(confluence) = &results.confluence {
            println!("Confluence: {}", confluence.page_url);
        }
        if let Some(slack) = &results.slack {
            println!("Slack: {} ({:?})", slack.channel, slack.message_type);
        }
        if let Some(email) = &results.email {
            println!("Email: {} - {}", email.to, email.subject);
        }
    }

    if args.get_flag("json") {
        println!();
        println!("{}", serde_json::to_string_pretty(&final_snapshot)?);
    }

    if final_snapshot.phase != EnginePhase::Completed {
        std::process::exit(1);
    }
    Ok(())
}

async fn seed_index() -> anyhow::Result<()> {
    let config = RemoteConfig::from_env();
    let http = reqwest::Client::new();
    let count = run_seed(&http, &config)
        .await
        .context("vector-index seeding failed")?;
    println!("Upserted {count} vectors");
    Ok(())
}
