//! # Correlation Subcommands
//!
//! `bwatch loops` runs loop detection (and optionally rapid-chain detection)
//! over a transaction set. `bwatch link` scores a departure against an
//! arrival and records the mapping.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use bwatch_core::BridgeTransaction;
use bwatch_correlate::{CrossChainMapper, LinkConfig, LoopDescriptor, LoopDetector, RapidChain, TransactionLink};

/// Arguments for `bwatch loops`.
#[derive(Args, Debug)]
pub struct LoopsArgs {
    /// Transactions to analyze (JSON/YAML list).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Also report rapid forward chains.
    #[arg(long)]
    pub rapid: bool,
}

/// Arguments for `bwatch link`.
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Departure leg (JSON/YAML record).
    #[arg(long)]
    pub departure: PathBuf,

    /// Arrival leg (JSON/YAML record).
    #[arg(long)]
    pub arrival: PathBuf,
}

#[derive(Debug, Serialize)]
struct LoopReport {
    loops: Vec<LoopDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rapid_chains: Option<Vec<RapidChain>>,
}

/// Execute the loops subcommand.
pub fn run_loops(args: &LoopsArgs) -> Result<u8> {
    let report = loops(args)?;
    crate::print_json(&report)?;
    Ok(0)
}

fn loops(args: &LoopsArgs) -> Result<LoopReport> {
    let txs: Vec<BridgeTransaction> = crate::load_many(&args.file)?;
    let detector = LoopDetector::default();
    Ok(LoopReport {
        loops: detector.detect_loops(&txs),
        rapid_chains: args.rapid.then(|| detector.detect_rapid_chains(&txs)),
    })
}

/// Execute the link subcommand.
pub fn run_link(args: &LinkArgs) -> Result<u8> {
    let link = link(args)?;
    crate::print_json(&link)?;
    Ok(0)
}

fn link(args: &LinkArgs) -> Result<TransactionLink> {
    let departure = single(&args.departure)?;
    let arrival = single(&args.arrival)?;
    let mapper = CrossChainMapper::new(LinkConfig::default());
    Ok(mapper.create_or_update_mapping(&departure, &arrival, &[])?)
}

fn single(path: &std::path::Path) -> Result<BridgeTransaction> {
    let mut txs: Vec<BridgeTransaction> = crate::load_many(path)?;
    if txs.len() != 1 {
        bail!("expected exactly one transaction in {}, found {}", path.display(), txs.len());
    }
    Ok(txs.remove(0))
}
