use bwatch_core::BridgeTransaction;

use super::{RiskSignal, SignalContext};
use crate::assessment::{RiskCategory, SignalOutcome};

/// Inherent protocol risk from the transaction's bridge profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolSignal;

impl RiskSignal for ProtocolSignal {
    fn category(&self) -> RiskCategory {
        RiskCategory::BridgeProtocol
    }

    fn evaluate(&self, tx: &BridgeTransaction, ctx: &SignalContext<'_>) -> SignalOutcome {
        let risk = ctx.profiles.risk_for(&tx.bridge_protocol);
        if risk.points == 0 {
            return SignalOutcome::quiet();
        }
        SignalOutcome::scored(f64::from(risk.points), risk.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{InMemoryHistory, StaticSanctionsList};
    use crate::config::RiskConfig;
    use crate::signals::fixtures::{tx, WEDNESDAY_AFTERNOON as T};
    use bwatch_core::BridgeProtocol;
    use bwatch_verify::ProfileRegistry;

    fn points_for(protocol: BridgeProtocol) -> f64 {
        let config = RiskConfig::default();
        let history = InMemoryHistory::new();
        let sanctions = StaticSanctionsList::default();
        let profiles = ProfileRegistry::with_defaults(&config.protocol);
        let ctx = SignalContext { config: &config, history: &history, sanctions: &sanctions, profiles: &profiles };
        let mut t = tx("0x01", "0xaa", "0xbb", "1", T);
        t.bridge_protocol = protocol;
        ProtocolSignal.evaluate(&t, &ctx).points()
    }

    #[test]
    fn lookup() {
        assert_eq!(points_for(BridgeProtocol::parse("railgun")), 25.0);
        assert_eq!(points_for(BridgeProtocol::Unknown), 10.0);
        assert_eq!(points_for(BridgeProtocol::Wormhole), 0.0);
        assert_eq!(points_for(BridgeProtocol::Stargate), 0.0);
    }
}
