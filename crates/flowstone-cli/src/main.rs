//! Flowstone demonstration runner.
//!
//! Bundles a couple of classic queueing models so the engine can be
//! exercised from the command line:
//!
//! ```bash
//! # a single-server M/M/1 line
//! flowstone single-server --end-time 1000
//!
//! # the two-workshop routing model with gates and transfers
//! flowstone workshop --seed 42 --json
//!
//! # watch every transaction move (very chatty)
//! flowstone -vv single-server --end-time 20
//! ```

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

/// Flowstone - block-graph discrete-event simulation.
#[derive(Parser)]
#[command(name = "flowstone")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v: scheduler phases, -vv: every block).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One exponential arrival stream through a capacity-1 server.
    SingleServer {
        /// Simulated time to run for.
        #[arg(long, default_value_t = 1000.0)]
        end_time: f64,

        /// Base RNG seed; every sampler derives its own stream from it.
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Emit the report as JSON instead of the table.
        #[arg(long)]
        json: bool,
    },

    /// Two workshops fed by dedicated lines plus a shared line that routes
    /// by availability, with a gate, conditional and probabilistic
    /// transfers.
    Workshop {
        /// Simulated time to run for.
        #[arg(long, default_value_t = 2000.0)]
        end_time: f64,

        /// Base RNG seed; every sampler derives its own stream from it.
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Emit the report as JSON instead of the table.
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::SingleServer {
            end_time,
            seed,
            json,
        } => commands::single_server::run(end_time, seed, json),
        Commands::Workshop {
            end_time,
            seed,
            json,
        } => commands::workshop::run(end_time, seed, json),
    }
}
