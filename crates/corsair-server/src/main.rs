//! Corsair CLI
//!
//! Thin shell around the graph core:
//! - `corsair serve` keeps a snapshot loaded in memory and answers the
//!   JSON query API over HTTP.
//! - `corsair check` validates a snapshot file and prints summary stats.
//!
//! Everything with design content lives in `corsair-graph`; this binary
//! only parses arguments and routes requests.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use corsair_graph::{GraphStore, Label, Snapshot};

mod server;

#[derive(Parser)]
#[command(name = "corsair")]
#[command(author, version, about = "Corsair: read-only knowledge-graph explorer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the query API over HTTP from a snapshot file.
    Serve(server::ServeArgs),

    /// Load a snapshot, validate its invariants, and print summary stats.
    Check {
        /// Snapshot JSON file (defaults to $CORSAIR_SNAPSHOT).
        snapshot: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => server::cmd_serve(&args),
        Commands::Check { snapshot } => cmd_check(snapshot),
    }
}

fn cmd_check(snapshot: Option<PathBuf>) -> Result<()> {
    let path = server::resolve_snapshot_path(snapshot)?;
    let snapshot = Snapshot::from_json_file(&path)
        .map_err(|e| anyhow!("check: {e}"))?;
    let store = GraphStore::from_snapshot(snapshot).map_err(|e| anyhow!("check: {e}"))?;

    println!("{} {}", "snapshot ok:".green().bold(), path.display());
    for label in Label::ALL {
        let count = store.nodes_by_label(label).count();
        println!("  {:<10} {}", format!("{label}s"), count);
    }
    println!("  {:<10} {}", "edges", store.edge_count());
    Ok(())
}
