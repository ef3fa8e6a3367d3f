use bwatch_core::BridgeTransaction;

use super::{RiskSignal, SignalContext};
use crate::assessment::{RiskCategory, SignalOutcome};

/// Sanctions screening of both endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanctionsSignal;

impl RiskSignal for SanctionsSignal {
    fn category(&self) -> RiskCategory {
        RiskCategory::Sanctions
    }

    fn evaluate(&self, tx: &BridgeTransaction, ctx: &SignalContext<'_>) -> SignalOutcome {
        let source = match ctx.sanctions.is_sanctioned(&tx.source_address) {
            Ok(hit) => hit,
            Err(e) => return SignalOutcome::failed(e.to_string()),
        };
        let destination = match ctx.sanctions.is_sanctioned(&tx.destination_address) {
            Ok(hit) => hit,
            Err(e) => return SignalOutcome::failed(e.to_string()),
        };
        let sides = match (source, destination) {
            (false, false) => return SignalOutcome::quiet(),
            (true, false) => format!("source {}", tx.source_address),
            (false, true) => format!("destination {}", tx.destination_address),
            (true, true) => format!(
                "source {} and destination {}",
                tx.source_address, tx.destination_address
            ),
        };
        SignalOutcome::scored(ctx.config.sanctions_points, format!("sanctioned address: {sides}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{InMemoryHistory, SanctionsList, StaticSanctionsList};
    use crate::config::RiskConfig;
    use crate::signals::fixtures::{tx, UnavailableSanctions, WEDNESDAY_AFTERNOON as T};
    use bwatch_core::Address;
    use bwatch_verify::ProfileRegistry;

    fn run(sanctions: &dyn SanctionsList) -> SignalOutcome {
        let config = RiskConfig::default();
        let history = InMemoryHistory::new();
        let profiles = ProfileRegistry::default();
        let ctx = SignalContext { config: &config, history: &history, sanctions, profiles: &profiles };
        SanctionsSignal.evaluate(&tx("0x01", "0xaa", "0xbb", "1", T), &ctx)
    }

    fn description(out: SignalOutcome) -> String {
        match out {
            SignalOutcome::Scored { description, .. } => description,
            SignalOutcome::Failed { reason } => panic!("failed: {reason}"),
        }
    }

    #[test]
    fn clean_endpoints() {
        assert_eq!(run(&StaticSanctionsList::default()), SignalOutcome::quiet());
    }

    #[test]
    fn names_the_matching_side() {
        let list = StaticSanctionsList::new([Address::new("0xbb").unwrap()]);
        let out = run(&list);
        assert_eq!(out.points(), 100.0);
        let desc = description(out);
        assert!(desc.contains("destination 0xbb"));
        assert!(!desc.contains("source"));
    }

    #[test]
    fn both_sides() {
        let list = StaticSanctionsList::new([Address::new("0xaa").unwrap(), Address::new("0xbb").unwrap()]);
        let out = run(&list);
        assert_eq!(out.points(), 100.0);
        assert!(description(out).contains("source 0xaa and destination 0xbb"));
    }

    #[test]
    fn lookup_failure_is_reported() {
        assert!(run(&UnavailableSanctions).is_failed());
    }
}
