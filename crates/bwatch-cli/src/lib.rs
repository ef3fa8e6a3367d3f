//! # bwatch-cli — Bridge Watch Command Line
//!
//! Provides the `bwatch` command-line interface over the verification, risk
//! and correlation crates. Inputs are JSON or YAML files (chosen by
//! extension); outputs are pretty-printed JSON on stdout.
//!
//! ## Subcommands
//!
//! - `bwatch verify`: check a signature blob against a validator set.
//! - `bwatch assess`: score transactions with the risk engine.
//! - `bwatch loops`: detect loops and rapid chains in a transaction set.
//! - `bwatch link`: link a departure to an arrival.
//! - `bwatch attest`: sign a message with a local key to build test blobs.
//!
//! ```bash
//! bwatch verify --protocol wormhole --message-id 0xabcd --signatures 0x00...
//! bwatch -v assess txs.json --history history.json --sanctions ofac.yaml
//! bwatch loops txs.json --rapid
//! ```
//!
//! ## Exit Codes
//!
//! `0` success, `1` error, `2` negative result (invalid attestation).

pub mod assess;
pub mod attest;
pub mod correlate;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Exit code for a negative but well-formed result.
pub const EXIT_NEGATIVE: u8 = 2;

/// Load a JSON or YAML document into `T`.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML at {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON at {}", path.display()))
    }
}

/// A document holding either one record or a list of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// Load one record or a list of records.
pub fn load_many<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    Ok(load_document::<OneOrMany<T>>(path)?.into_vec())
}

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{out}");
    Ok(())
}
