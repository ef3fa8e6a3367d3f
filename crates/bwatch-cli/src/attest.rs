//! # Attest Subcommand
//!
//! Signs a bridge message with local secp256k1 keys and prints the encoded
//! signature blob in the protocol's layout. Intended for building fixtures
//! and exercising `bwatch verify` against a seed file; the signer addresses
//! are printed alongside the blob so a matching validator set can be written.
//!
//! Keys are given as 32-byte hex scalars (`--key`, repeatable) or generated
//! (`--generate N`). In the indexed layout, the i-th key signs as guardian i.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use bwatch_core::{BridgeProtocol, EthAddress};
use bwatch_crypto::SignerKeyPair;
use bwatch_verify::codec::encode;
use bwatch_verify::{message_bytes, ProfileConfig, ProfileRegistry, SignatureEntry, SignatureLayout, SignerRef};

/// Arguments for `bwatch attest`.
#[derive(Args, Debug)]
pub struct AttestArgs {
    /// Bridge protocol name.
    #[arg(long)]
    pub protocol: String,

    /// Message identifier: `0x`-prefixed hex body, or text.
    #[arg(long)]
    pub message_id: String,

    /// Private key as 32-byte hex. May be repeated.
    #[arg(long = "key", value_name = "HEX")]
    pub keys: Vec<String>,

    /// Number of fresh random keys to sign with.
    #[arg(long, default_value_t = 0)]
    pub generate: usize,
}

#[derive(Debug, Serialize)]
struct Attestation {
    protocol: BridgeProtocol,
    layout: SignatureLayout,
    signers: Vec<EthAddress>,
    signatures: String,
}

/// Execute the attest subcommand.
pub fn run_attest(args: &AttestArgs) -> Result<u8> {
    let attestation = attest(args)?;
    crate::print_json(&attestation)?;
    Ok(0)
}

fn attest(args: &AttestArgs) -> Result<Attestation> {
    let protocol = BridgeProtocol::parse(&args.protocol);
    let profile = ProfileRegistry::with_defaults(&ProfileConfig::default()).get(&protocol);
    let Some(layout) = profile.signature_layout() else {
        bail!("protocol {protocol} carries no signatures");
    };

    let mut keys = args
        .keys
        .iter()
        .map(|k| parse_key(k))
        .collect::<Result<Vec<_>>>()?;
    keys.extend((0..args.generate).map(|_| SignerKeyPair::generate()));
    if keys.is_empty() {
        bail!("no signing keys: pass --key or --generate");
    }
    if layout == SignatureLayout::Indexed && keys.len() > usize::from(u8::MAX) + 1 {
        bail!("indexed layout holds at most 256 signers, got {}", keys.len());
    }

    let hash = profile
        .message_hash(&message_bytes(&args.message_id))
        .context("cannot hash message")?;
    let mut entries = Vec::with_capacity(keys.len());
    for (i, kp) in keys.iter().enumerate() {
        let signer = match layout {
            SignatureLayout::Indexed => SignerRef::Index(i as u8),
            SignatureLayout::Addressed => SignerRef::Address(kp.address()),
        };
        entries.push(SignatureEntry {
            signer,
            signature: kp.sign_prehash(&hash)?,
        });
    }
    tracing::info!(%protocol, signers = entries.len(), "message attested");

    Ok(Attestation {
        protocol,
        layout,
        signers: keys.iter().map(SignerKeyPair::address).collect(),
        signatures: format!("0x{}", hex::encode(encode(layout, &entries))),
    })
}

fn parse_key(hex_key: &str) -> Result<SignerKeyPair> {
    let trimmed = hex_key.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).context("private key is not valid hex")?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow::anyhow!("private key must be 32 bytes, got {}", b.len()))?;
    Ok(SignerKeyPair::from_seed(&seed)?)
}
