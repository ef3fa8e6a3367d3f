//! # Risk Signals
//!
//! Each signal scores one independent aspect of a transfer and returns a
//! [`SignalOutcome`]. Signals never panic and never return `Err`: anything
//! that goes wrong inside a signal becomes [`SignalOutcome::Failed`], which
//! the engine records without affecting sibling signals.

mod amount;
mod frequency;
mod pattern;
mod protocol;
mod sanctions;
mod timing;

pub use amount::AmountSignal;
pub use frequency::FrequencySignal;
pub use pattern::PatternSignal;
pub use protocol::ProtocolSignal;
pub use sanctions::SanctionsSignal;
pub use timing::TimingSignal;

use bwatch_core::{BridgeTransaction, Timestamp};
use bwatch_verify::ProfileRegistry;

use crate::assessment::{RiskCategory, SignalOutcome};
use crate::collaborators::{SanctionsList, TransactionHistory};
use crate::config::RiskConfig;

/// Everything a signal may consult.
pub struct SignalContext<'a> {
    pub config: &'a RiskConfig,
    pub history: &'a dyn TransactionHistory,
    pub sanctions: &'a dyn SanctionsList,
    pub profiles: &'a ProfileRegistry,
}

/// One independent risk component.
pub trait RiskSignal: Send + Sync {
    fn category(&self) -> RiskCategory;

    fn evaluate(&self, tx: &BridgeTransaction, ctx: &SignalContext<'_>) -> SignalOutcome;
}

/// The six signals in evaluation order.
pub fn default_signals() -> Vec<Box<dyn RiskSignal>> {
    vec![
        Box::new(AmountSignal),
        Box::new(FrequencySignal),
        Box::new(PatternSignal),
        Box::new(SanctionsSignal),
        Box::new(TimingSignal),
        Box::new(ProtocolSignal),
    ]
}

/// Prior transactions touching either endpoint of `tx` within the trailing
/// `window_secs`, excluding `tx` itself and anything after it.
pub(crate) fn prior_window(
    tx: &BridgeTransaction,
    history: &dyn TransactionHistory,
    window_secs: i64,
) -> Result<Vec<BridgeTransaction>, String> {
    let since: Timestamp = tx.timestamp.minus(chrono::Duration::seconds(window_secs));
    let addresses = [tx.source_address.clone(), tx.destination_address.clone()];
    let found = history
        .query_transactions(&addresses, since)
        .map_err(|e| e.to_string())?;
    Ok(found
        .into_iter()
        .filter(|h| h.tx_hash != tx.tx_hash && h.timestamp <= tx.timestamp && h.timestamp >= since)
        .collect())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use bwatch_core::{Address, BridgeProtocol, BridgeTransaction, ChainId, CollaboratorError, Timestamp, TxHash};

    use crate::collaborators::SanctionsList;

    /// A Wednesday, 14:00 UTC.
    pub const WEDNESDAY_AFTERNOON: i64 = 1_717_596_000;

    pub fn tx(hash: &str, from: &str, to: &str, amount: &str, at: i64) -> BridgeTransaction {
        BridgeTransaction {
            tx_hash: TxHash::new(hash).unwrap(),
            bridge_protocol: BridgeProtocol::Wormhole,
            source_chain: ChainId::new("ethereum").unwrap(),
            destination_chain: ChainId::new("arbitrum").unwrap(),
            source_address: Address::new(from).unwrap(),
            destination_address: Address::new(to).unwrap(),
            token_address: None,
            token_symbol: "USDC".into(),
            amount: amount.into(),
            token_decimals: None,
            nonce: None,
            timestamp: Timestamp::from_epoch_secs(at).unwrap(),
            raw_message: None,
        }
    }

    pub struct UnavailableSanctions;

    impl SanctionsList for UnavailableSanctions {
        fn is_sanctioned(&self, _address: &Address) -> Result<bool, CollaboratorError> {
            Err(CollaboratorError::unavailable("sanctions", "screening service down"))
        }
    }
}
