//! # Assess Subcommand
//!
//! Scores one or more transactions with the risk engine. History and the
//! sanctions list are loaded into their in-memory adapters.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use bwatch_core::{Address, BridgeTransaction};
use bwatch_risk::{InMemoryHistory, RiskAssessment, RiskConfig, RiskScoringEngine, StaticSanctionsList};

/// Arguments for `bwatch assess`.
#[derive(Args, Debug)]
pub struct AssessArgs {
    /// Transactions to assess (JSON/YAML, one record or a list).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Prior transactions used for frequency and pattern signals.
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Sanctioned addresses (JSON/YAML list).
    #[arg(long)]
    pub sanctions: Option<PathBuf>,
}

/// Execute the assess subcommand.
pub fn run_assess(args: &AssessArgs, config: Option<&Path>) -> Result<u8> {
    let assessments = assess(args, config)?;
    crate::print_json(&assessments)?;
    Ok(0)
}

fn assess(args: &AssessArgs, config: Option<&Path>) -> Result<Vec<RiskAssessment>> {
    let config = match config {
        Some(path) => RiskConfig::from_file(path)
            .with_context(|| format!("failed to load risk configuration {}", path.display()))?,
        None => RiskConfig::default(),
    };

    let history = match &args.history {
        Some(path) => InMemoryHistory::from_transactions(crate::load_many(path)?),
        None => InMemoryHistory::new(),
    };
    let sanctions = match &args.sanctions {
        Some(path) => {
            let addresses: Vec<Address> = crate::load_many(path)?;
            StaticSanctionsList::new(addresses)
        }
        None => StaticSanctionsList::default(),
    };
    tracing::debug!(history = history.len(), sanctioned = sanctions.len(), "collaborators loaded");

    let engine = RiskScoringEngine::new(config, Arc::new(history), Arc::new(sanctions))
        .context("invalid risk configuration")?;
    let txs: Vec<BridgeTransaction> = crate::load_many(&args.file)?;
    Ok(engine.assess_batch(&txs))
}
