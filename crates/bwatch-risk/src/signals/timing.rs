use bwatch_core::BridgeTransaction;

use super::{RiskSignal, SignalContext};
use crate::assessment::{RiskCategory, SignalOutcome};

/// Unusual hours, else weekend. Evaluated on the transaction's UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingSignal;

impl RiskSignal for TimingSignal {
    fn category(&self) -> RiskCategory {
        RiskCategory::Timing
    }

    fn evaluate(&self, tx: &BridgeTransaction, ctx: &SignalContext<'_>) -> SignalOutcome {
        let cfg = &ctx.config.timing;
        let hour = tx.timestamp.hour();
        if (cfg.unusual_start_hour..cfg.unusual_end_hour).contains(&hour) {
            return SignalOutcome::scored(
                cfg.unusual_points,
                format!("transaction at unusual hours ({hour:02}:00 UTC)"),
            );
        }
        if tx.timestamp.is_weekend() {
            return SignalOutcome::scored(cfg.weekend_points, "weekend transaction");
        }
        SignalOutcome::quiet()
    }
}
