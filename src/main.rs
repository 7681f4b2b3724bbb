//! Equivalence batch driver.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use equiv::config::Config;
use equiv::driver::{BatchFile, run_batch};
use equiv::routing::{RoutingTable, UpdaterConfigurationRegistry};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Decide content equivalences from precomputed source scores.
#[derive(Parser)]
#[command(name = "equiv", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate every subject of a batch file and print the results as JSON.
    Run {
        /// Routing table (TOML). Defaults to EQUIV_ROUTING_PATH.
        #[arg(long)]
        routing: Option<PathBuf>,

        /// Batch file (JSON): catalogue plus per-source scores.
        #[arg(long)]
        batch: PathBuf,

        /// Pretty-print the output.
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a routing table without running anything.
    Check {
        /// Routing table (TOML). Defaults to EQUIV_ROUTING_PATH.
        #[arg(long)]
        routing: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.validate()?;

    match cli.command {
        Command::Run {
            routing,
            batch,
            pretty,
        } => {
            let registry = load_registry(routing, &config)?;
            let batch = BatchFile::load(&batch)
                .with_context(|| format!("loading batch {}", batch.display()))?;

            tracing::info!(
                contents = batch.contents.len(),
                batch_concurrency = config.batch_concurrency,
                extraction_concurrency = config.extraction_concurrency,
                "Equiv starting"
            );

            let output = run_batch(registry, batch, &config).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            println!("{}", json);

            if output.report.failed() > 0 {
                tracing::warn!(
                    failed = output.report.failed(),
                    "Some subjects failed, see report"
                );
            }
        }
        Command::Check { routing } => {
            let registry = load_registry(routing, &config)?;
            for publisher in registry.publishers() {
                println!("{}", publisher);
            }
            tracing::info!(
                pipelines = registry.table().pipelines.len(),
                "Routing table is valid"
            );
        }
    }

    Ok(())
}

fn load_registry(
    routing: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<UpdaterConfigurationRegistry> {
    let path = routing
        .or_else(|| config.routing_path.clone())
        .context("no routing table: pass --routing or set EQUIV_ROUTING_PATH")?;
    let table = RoutingTable::load(&path)
        .with_context(|| format!("loading routing table {}", path.display()))?;
    Ok(UpdaterConfigurationRegistry::new(table)?)
}
