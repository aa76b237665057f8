//! taskplan CLI - decide where simulation duties run.

mod scenario;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskplan_core::{PlacementDecision, PlacementError};
use taskplan_placement::{DecisionScope, PlacementResolver, ResolverConfig};
use tracing::{debug, Level};

use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "taskplan")]
#[command(about = "Decide which simulation duties run on the GPU", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log each resolved duty
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the placement for a scenario file
    Decide {
        /// Scenario file (JSON)
        scenario: PathBuf,
        /// Decision scope, overriding the scenario (global or rank)
        #[arg(long)]
        scope: Option<DecisionScope>,
        /// Emulate GPU nonbonded kernels on the CPU
        #[arg(long)]
        emulate_gpu: bool,
        /// Prefer the GPU for the update when its target is auto
        #[arg(long)]
        force_update_gpu: bool,
        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a sample scenario
    Sample,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Decide { scenario, scope, emulate_gpu, force_update_gpu, json } => {
            let loaded = Scenario::load(&scenario).await?;
            let scope = scope.unwrap_or(loaded.scope);

            let config = ResolverConfig::from_env().merge(
                ResolverConfig::new()
                    .with_emulate_gpu_nonbonded(emulate_gpu)
                    .with_force_update_default_gpu(force_update_gpu),
            );
            debug!("Resolver config: {:?}", config);

            let resolver = PlacementResolver::new().with_config(config);
            match resolver.decide(scope, &loaded.request, &loaded.facts) {
                Ok(decision) => print_decision(&decision, json)?,
                Err(err) => {
                    print_error(&err, json)?;
                    std::process::exit(1);
                }
            }
        }
        Commands::Sample => {
            println!("{}", serde_json::to_string_pretty(&Scenario::sample())?);
        }
    }

    Ok(())
}

fn print_decision(decision: &PlacementDecision, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(decision)?);
        return Ok(());
    }

    println!("Placement");
    for duty in taskplan_core::Duty::ALL {
        println!("  {:<7} {}", duty.name(), if decision.on_gpu(duty) { "GPU" } else { "CPU" });
    }
    Ok(())
}

fn print_error(err: &PlacementError, json: bool) -> Result<()> {
    if json {
        let report = serde_json::json!({
            "category": err.category(),
            "message": err.message(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("Error ({}):", err.category());
        eprintln!("{}", err.message());
    }
    Ok(())
}
