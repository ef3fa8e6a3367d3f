//! # Bridge Transactions
//!
//! [`BridgeTransaction`] is the immutable record of one observed cross-chain
//! transfer. It is produced by the ingestion layer and only ever borrowed by
//! the verification, risk and correlation components.
//!
//! Amounts stay in their original decimal-string form. Parsing happens on
//! demand through [`BridgeTransaction::amount_decimal()`], so a malformed
//! amount fails only the computation that needs it.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::{Address, ChainId, TxHash};
use crate::protocol::BridgeProtocol;
use crate::temporal::Timestamp;

/// Largest decimal precision representable by `rust_decimal`.
const MAX_DECIMALS: u8 = 28;

/// One observed bridge transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeTransaction {
    /// Transaction hash on the chain where this leg was observed.
    pub tx_hash: TxHash,
    /// Bridge protocol that carried the transfer.
    pub bridge_protocol: BridgeProtocol,
    /// Chain the funds leave.
    pub source_chain: ChainId,
    /// Chain the funds arrive on.
    pub destination_chain: ChainId,
    /// Sending account.
    pub source_address: Address,
    /// Receiving account.
    pub destination_address: Address,
    /// Token contract, absent for native assets.
    #[serde(default)]
    pub token_address: Option<Address>,
    /// Token ticker symbol (e.g. "USDC").
    pub token_symbol: String,
    /// Arbitrary-precision decimal amount.
    pub amount: String,
    /// Precision `amount` is expressed in. `None` means whole-token units;
    /// `Some(18)` means `amount` is in base units of an 18-decimal token.
    #[serde(default)]
    pub token_decimals: Option<u8>,
    /// Bridge message nonce / sequence, when the protocol exposes one.
    #[serde(default)]
    pub nonce: Option<String>,
    /// Block time of this leg.
    pub timestamp: Timestamp,
    /// Opaque bridge message payload (hex), if captured.
    #[serde(default)]
    pub raw_message: Option<String>,
}

impl BridgeTransaction {
    /// Parse `amount` as a decimal, exactly as given.
    pub fn amount_decimal(&self) -> Result<Decimal, CoreError> {
        Decimal::from_str(self.amount.trim()).map_err(|e| CoreError::InvalidAmount {
            value: self.amount.clone(),
            reason: e.to_string(),
        })
    }

    /// The amount in whole-token units, applying `token_decimals`.
    pub fn token_amount(&self) -> Result<Decimal, CoreError> {
        let raw = self.amount_decimal()?;
        match self.token_decimals {
            None | Some(0) => Ok(raw),
            Some(d) if d > MAX_DECIMALS => Err(CoreError::InvalidAmount {
                value: self.amount.clone(),
                reason: format!("token_decimals {d} exceeds {MAX_DECIMALS}"),
            }),
            Some(d) => raw
                .checked_mul(Decimal::new(1, u32::from(d)))
                .ok_or_else(|| CoreError::InvalidAmount {
                    value: self.amount.clone(),
                    reason: "overflow while scaling".into(),
                }),
        }
    }

    /// Source and destination addresses.
    pub fn endpoints(&self) -> [&Address; 2] {
        [&self.source_address, &self.destination_address]
    }

    /// Whether `address` is either endpoint of this transfer.
    pub fn involves(&self, address: &Address) -> bool {
        &self.source_address == address || &self.destination_address == address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BridgeTransaction {
        serde_json::from_value(serde_json::json!({
            "tx_hash": "0xAA01",
            "bridge_protocol": "wormhole",
            "source_chain": "ethereum",
            "destination_chain": "solana",
            "source_address": "0x1111111111111111111111111111111111111111",
            "destination_address": "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
            "token_symbol": "USDC",
            "amount": "2500000000",
            "token_decimals": 6,
            "nonce": "1337",
            "timestamp": "2026-01-14T14:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_with_defaults() {
        let tx = sample();
        assert_eq!(tx.bridge_protocol, BridgeProtocol::Wormhole);
        assert_eq!(tx.tx_hash.as_str(), "0xaa01");
        assert!(tx.token_address.is_none());
        assert!(tx.raw_message.is_none());
    }

    #[test]
    fn token_amount_applies_decimals() {
        let tx = sample();
        assert_eq!(tx.token_amount().unwrap(), Decimal::from(2500));
    }

    #[test]
    fn token_amount_without_decimals_is_raw() {
        let mut tx = sample();
        tx.token_decimals = None;
        tx.amount = "12.5".into();
        assert_eq!(tx.token_amount().unwrap(), Decimal::new(125, 1));
    }

    #[test]
    fn malformed_amount_is_an_error() {
        let mut tx = sample();
        tx.amount = "12,5".into();
        assert!(matches!(tx.amount_decimal(), Err(CoreError::InvalidAmount { .. })));
    }

    #[test]
    fn excessive_decimals_rejected() {
        let mut tx = sample();
        tx.token_decimals = Some(40);
        assert!(tx.token_amount().is_err());
    }

    #[test]
    fn involves_checks_both_endpoints() {
        let tx = sample();
        let src = Address::new("0x1111111111111111111111111111111111111111").unwrap();
        let other = Address::new("0x2222222222222222222222222222222222222222").unwrap();
        assert!(tx.involves(&src));
        assert!(!tx.involves(&other));
    }
}
