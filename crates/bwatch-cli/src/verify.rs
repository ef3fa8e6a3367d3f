//! # Verify Subcommand
//!
//! Checks a hex signature blob against the validator set of a protocol and
//! prints the verdict. Validator sets come from a seed file when given,
//! otherwise from the bootstrap guardian and validator sets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use bwatch_core::BridgeProtocol;
use bwatch_verify::codec::parse_hex_blob;
use bwatch_verify::{
    BridgeSignatureVerifier, ProfileConfig, ProfileRegistry, ValidatorRegistry, ValidatorSetSeed,
    VerificationVerdict,
};

/// Arguments for `bwatch verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Bridge protocol name (e.g. "wormhole", "multichain").
    #[arg(long)]
    pub protocol: String,

    /// Message identifier: `0x`-prefixed hex body, or text.
    #[arg(long)]
    pub message_id: String,

    /// Signature blob as hex (optional `0x` prefix).
    #[arg(long)]
    pub signatures: String,

    /// Validator set seed file (JSON/YAML list of sets).
    #[arg(long)]
    pub validators: Option<PathBuf>,
}

/// Execute the verify subcommand.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let verdict = verify(args)?;
    crate::print_json(&verdict)?;
    Ok(if verdict.is_valid { 0 } else { crate::EXIT_NEGATIVE })
}

fn verify(args: &VerifyArgs) -> Result<VerificationVerdict> {
    let registry = match &args.validators {
        Some(path) => registry_from_file(path)?,
        None => ValidatorRegistry::with_production_sets()
            .context("failed to load bootstrap validator sets")?,
    };
    let verifier = BridgeSignatureVerifier::new(
        Arc::new(registry),
        Arc::new(ProfileRegistry::with_defaults(&ProfileConfig::default())),
    );

    // Invalid hex degrades to an empty blob, which verifies to zero signatures.
    let blob = parse_hex_blob(&args.signatures).unwrap_or_else(|| {
        tracing::warn!("signature blob is not valid hex; treating as empty");
        Vec::new()
    });
    let protocol = BridgeProtocol::parse(&args.protocol);
    Ok(verifier.verify(&protocol, &args.message_id, &blob))
}

fn registry_from_file(path: &Path) -> Result<ValidatorRegistry> {
    let seeds: Vec<ValidatorSetSeed> = crate::load_many(path)?;
    let registry = ValidatorRegistry::new();
    let loaded = registry
        .load_seeds(seeds)
        .with_context(|| format!("invalid validator set in {}", path.display()))?;
    tracing::info!(sets = loaded, path = %path.display(), "validator sets loaded");
    Ok(registry)
}
