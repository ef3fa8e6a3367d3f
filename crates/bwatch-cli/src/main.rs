//! # bwatch CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bwatch_cli::assess::{run_assess, AssessArgs};
use bwatch_cli::attest::{run_attest, AttestArgs};
use bwatch_cli::correlate::{run_link, run_loops, LinkArgs, LoopsArgs};
use bwatch_cli::verify::{run_verify, VerifyArgs};

/// Bridge Watch: cross-chain bridge monitoring.
///
/// Verifies bridge attestations against validator sets, scores transfer
/// risk, detects fund loops and links departures to arrivals.
#[derive(Parser, Debug)]
#[command(name = "bwatch", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a risk configuration file (JSON or YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify a signature blob against a protocol's validator set.
    Verify(VerifyArgs),

    /// Score transactions with the risk engine.
    Assess(AssessArgs),

    /// Detect value loops and rapid chains in a transaction set.
    Loops(LoopsArgs),

    /// Link a departure leg to an arrival leg.
    Link(LinkArgs),

    /// Sign a message with local keys to build a signature blob.
    Attest(AttestArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "bwatch starting");

    let result = match cli.command {
        Commands::Verify(args) => run_verify(&args),
        Commands::Assess(args) => run_assess(&args, cli.config.as_deref()),
        Commands::Loops(args) => run_loops(&args),
        Commands::Link(args) => run_link(&args),
        Commands::Attest(args) => run_attest(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
