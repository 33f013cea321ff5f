//! Tick Engine CLI
//!
//! Replays a JSON scenario against the engine and prints what every tick
//! did and what the clients were told.

mod scenario;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tick_engine_core_rs::orchestrator::Orchestrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scenario::Scenario;

#[derive(Debug, Parser)]
#[command(name = "tick-engine", version, about = "Drive the game tick engine from a scenario file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a scenario for a number of ticks
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Scenario JSON file
    #[arg(long, short = 's')]
    scenario: PathBuf,

    /// Number of ticks to run
    #[arg(long, short = 't', default_value = "40")]
    ticks: u64,

    /// Simulated milliseconds per tick
    #[arg(long, default_value = "50")]
    tick_ms: u64,

    /// Print delivered notifications as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut scenario = Scenario::load(&args.scenario)?;
    let world = scenario.build_world()?;
    let mut orchestrator = Orchestrator::new(scenario.config.clone(), world)?;

    scenario.requests.sort_by_key(|timed| timed.at_tick);
    let mut requests = scenario.requests.into_iter().peekable();
    let tick_length = Duration::from_millis(args.tick_ms);

    for tick in 0..args.ticks {
        while let Some(timed) = requests.next_if(|timed| timed.at_tick <= tick) {
            match orchestrator.handle(timed.request) {
                Ok(outcome) => tracing::info!(tick, ?outcome, "request handled"),
                Err(err) => tracing::warn!(tick, %err, "request rejected"),
            }
        }

        let result = orchestrator.tick(tick_length);
        let delivered = orchestrator.outbox().drain();
        if result.executed + result.faulted == 0 && delivered.is_empty() {
            continue;
        }

        println!(
            "tick {:>4} @ {:>6}ms  executed={} skipped={} faulted={} pending={}",
            result.tick,
            result.now.as_millis(),
            result.executed,
            result.skipped,
            result.faulted,
            result.pending
        );
        for (connection, payload) in delivered {
            if args.json {
                println!("  -> {} {}", connection.0, serde_json::to_string(&payload)?);
            } else {
                println!("  -> {} {:?}", connection.0, payload);
            }
        }
    }

    let remaining = requests.count();
    if remaining > 0 {
        tracing::warn!(remaining, "scenario ended before all requests were handled");
    }
    println!(
        "done: {} ticks, {} events pending, {} rules armed",
        orchestrator.current_tick(),
        orchestrator.scheduler().pending_count(),
        orchestrator.rules().len()
    );
    Ok(())
}
