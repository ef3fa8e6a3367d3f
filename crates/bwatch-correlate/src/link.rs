//! # Departure/Arrival Linking
//!
//! Scores how likely it is that an arrival on the destination chain is the
//! same logical transfer as a departure on the source chain.
//!
//! ## Criteria
//!
//! | Criterion | Default weight | Match |
//! |---|---|---|
//! | protocol | 0.20 | same bridge protocol |
//! | nonce | 0.40 | both present and equal |
//! | token | 0.15 | same symbol (case-insensitive) or same token address |
//! | amount | 0.15 | equal after decimal scaling; half weight within tolerance |
//! | time window | 0.10 | arrival in `[departure, departure + max_arrival_delay]` |
//!
//! Confidence is the sum of the weights of matched criteria.

use bwatch_core::{BridgeProtocol, BridgeTransaction, ChainId, ContentDigest, DigestBuilder, EthAddress, Timestamp, TxHash};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MAPPING_DOMAIN: &str = "bwatch.mapping.v1";

fn default_protocol_weight() -> f64 {
    0.20
}
fn default_nonce_weight() -> f64 {
    0.40
}
fn default_token_weight() -> f64 {
    0.15
}
fn default_amount_weight() -> f64 {
    0.15
}
fn default_time_weight() -> f64 {
    0.10
}
fn default_amount_tolerance() -> Decimal {
    Decimal::new(5, 3)
}
fn default_max_arrival_delay_secs() -> i64 {
    6 * 3600
}

/// Link scoring weights and tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "default_protocol_weight")]
    pub protocol_weight: f64,
    #[serde(default = "default_nonce_weight")]
    pub nonce_weight: f64,
    #[serde(default = "default_token_weight")]
    pub token_weight: f64,
    #[serde(default = "default_amount_weight")]
    pub amount_weight: f64,
    #[serde(default = "default_time_weight")]
    pub time_weight: f64,
    /// Relative difference that still earns half the amount weight.
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: Decimal,
    #[serde(default = "default_max_arrival_delay_secs")]
    pub max_arrival_delay_secs: i64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            protocol_weight: default_protocol_weight(),
            nonce_weight: default_nonce_weight(),
            token_weight: default_token_weight(),
            amount_weight: default_amount_weight(),
            time_weight: default_time_weight(),
            amount_tolerance: default_amount_tolerance(),
            max_arrival_delay_secs: default_max_arrival_delay_secs(),
        }
    }
}

/// How the two legs' amounts compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountMatch {
    Exact,
    WithinTolerance,
    Mismatch,
}

/// Which criteria aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchCriteria {
    pub protocol: bool,
    pub nonce: bool,
    pub token: bool,
    pub amount: AmountMatch,
    pub time_window: bool,
}

impl MatchCriteria {
    /// Weighted confidence in `[0, 1]` for these criteria.
    pub fn confidence(&self, config: &LinkConfig) -> f64 {
        let mut score = 0.0;
        if self.protocol {
            score += config.protocol_weight;
        }
        if self.nonce {
            score += config.nonce_weight;
        }
        if self.token {
            score += config.token_weight;
        }
        score += match self.amount {
            AmountMatch::Exact => config.amount_weight,
            AmountMatch::WithinTolerance => config.amount_weight / 2.0,
            AmountMatch::Mismatch => 0.0,
        };
        if self.time_window {
            score += config.time_weight;
        }
        score.clamp(0.0, 1.0)
    }
}

/// A departure paired with the arrival believed to complete it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLink {
    /// Stable identity: protocol + nonce, or protocol + departure hash.
    pub mapping_id: ContentDigest,
    pub bridge_protocol: BridgeProtocol,
    pub departure_tx: TxHash,
    pub arrival_tx: TxHash,
    pub source_chain: ChainId,
    pub destination_chain: ChainId,
    pub nonce: Option<String>,
    pub confidence: f64,
    pub criteria: MatchCriteria,
    /// Signers that attested the bridge message, when verified.
    pub validators_involved: Vec<EthAddress>,
    /// Starts at 1; bumped each time the stored link changes.
    pub revision: u32,
    pub first_linked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionLink {
    /// Attach the signers that attested the message.
    pub fn with_validators(mut self, validators: Vec<EthAddress>) -> Self {
        self.validators_involved = validators;
        self
    }
}

/// Identity of the logical transfer `departure` starts.
pub fn mapping_id(departure: &BridgeTransaction) -> ContentDigest {
    let mut builder = DigestBuilder::new(MAPPING_DOMAIN);
    builder.str_field(departure.bridge_protocol.as_str());
    match departure.nonce.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(nonce) => builder.str_field("nonce").str_field(nonce),
        None => builder.str_field("tx").str_field(departure.tx_hash.as_str()),
    };
    builder.finish()
}

/// Evaluate the match criteria between two legs.
pub fn match_criteria(
    departure: &BridgeTransaction,
    arrival: &BridgeTransaction,
    config: &LinkConfig,
) -> MatchCriteria {
    MatchCriteria {
        protocol: departure.bridge_protocol == arrival.bridge_protocol,
        nonce: nonces_match(departure, arrival),
        token: tokens_match(departure, arrival),
        amount: compare_amounts(departure, arrival, config.amount_tolerance),
        time_window: within_window(&departure.timestamp, &arrival.timestamp, config.max_arrival_delay_secs),
    }
}

/// Link two legs with the default weights.
pub fn link_transactions(departure: &BridgeTransaction, arrival: &BridgeTransaction) -> TransactionLink {
    link_transactions_with(departure, arrival, &LinkConfig::default(), Utc::now())
}

/// Link two legs under `config` as of `now`.
pub fn link_transactions_with(
    departure: &BridgeTransaction,
    arrival: &BridgeTransaction,
    config: &LinkConfig,
    now: DateTime<Utc>,
) -> TransactionLink {
    let criteria = match_criteria(departure, arrival, config);
    TransactionLink {
        mapping_id: mapping_id(departure),
        bridge_protocol: departure.bridge_protocol.clone(),
        departure_tx: departure.tx_hash.clone(),
        arrival_tx: arrival.tx_hash.clone(),
        source_chain: departure.source_chain.clone(),
        destination_chain: arrival.destination_chain.clone(),
        nonce: departure.nonce.clone(),
        confidence: criteria.confidence(config),
        criteria,
        validators_involved: Vec::new(),
        revision: 1,
        first_linked_at: now,
        updated_at: now,
    }
}

fn nonces_match(departure: &BridgeTransaction, arrival: &BridgeTransaction) -> bool {
    match (departure.nonce.as_deref(), arrival.nonce.as_deref()) {
        (Some(a), Some(b)) => {
            let (a, b) = (a.trim(), b.trim());
            !a.is_empty() && a.eq_ignore_ascii_case(b)
        }
        _ => false,
    }
}

fn tokens_match(departure: &BridgeTransaction, arrival: &BridgeTransaction) -> bool {
    let symbols = !departure.token_symbol.trim().is_empty()
        && departure
            .token_symbol
            .trim()
            .eq_ignore_ascii_case(arrival.token_symbol.trim());
    let addresses = matches!(
        (&departure.token_address, &arrival.token_address),
        (Some(a), Some(b)) if a == b
    );
    symbols || addresses
}

fn compare_amounts(
    departure: &BridgeTransaction,
    arrival: &BridgeTransaction,
    tolerance: Decimal,
) -> AmountMatch {
    let (sent, received) = match (departure.token_amount(), arrival.token_amount()) {
        (Ok(s), Ok(r)) => (s, r),
        _ => return AmountMatch::Mismatch,
    };
    if sent == received {
        return AmountMatch::Exact;
    }
    if sent.is_zero() {
        return AmountMatch::Mismatch;
    }
    let diff = (sent - received).abs();
    match diff.checked_div(sent.abs()) {
        Some(relative) if relative <= tolerance => AmountMatch::WithinTolerance,
        _ => AmountMatch::Mismatch,
    }
}

fn within_window(departed: &Timestamp, arrived: &Timestamp, max_delay_secs: i64) -> bool {
    let delay = arrived.since(departed).num_seconds();
    (0..=max_delay_secs).contains(&delay)
}
