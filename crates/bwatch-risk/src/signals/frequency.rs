use bwatch_core::BridgeTransaction;

use super::{prior_window, RiskSignal, SignalContext};
use crate::assessment::{RiskCategory, SignalOutcome};

/// Transaction count touching either endpoint over the trailing window.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencySignal;

impl RiskSignal for FrequencySignal {
    fn category(&self) -> RiskCategory {
        RiskCategory::Frequency
    }

    fn evaluate(&self, tx: &BridgeTransaction, ctx: &SignalContext<'_>) -> SignalOutcome {
        let cfg = &ctx.config.frequency;
        let recent = match prior_window(tx, ctx.history, cfg.window_secs) {
            Ok(recent) => recent,
            Err(reason) => return SignalOutcome::failed(reason),
        };
        let count = recent.len();
        if count <= cfg.threshold {
            return SignalOutcome::quiet();
        }
        let excess = count - cfg.threshold;
        let points = (cfg.points_per_excess * excess as f64).min(cfg.cap);
        SignalOutcome::scored(
            points,
            format!(
                "{count} transactions involving these addresses in the last {} minutes",
                cfg.window_secs / 60
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{InMemoryHistory, StaticSanctionsList};
    use crate::config::RiskConfig;
    use crate::signals::fixtures::{tx, WEDNESDAY_AFTERNOON};
    use bwatch_verify::ProfileRegistry;

    fn run(prior: usize) -> SignalOutcome {
        let history = InMemoryHistory::new();
        for i in 0..prior {
            history.record(tx(&format!("0xp{i}"), "0xaa", &format!("0x{i:02x}"), "1", WEDNESDAY_AFTERNOON - 60 * i as i64));
        }
        // Outside the window.
        history.record(tx("0xold", "0xaa", "0xbb", "1", WEDNESDAY_AFTERNOON - 7200));
        let config = RiskConfig::default();
        let sanctions = StaticSanctionsList::default();
        let profiles = ProfileRegistry::default();
        let ctx = SignalContext { config: &config, history: &history, sanctions: &sanctions, profiles: &profiles };
        FrequencySignal.evaluate(&tx("0xnow", "0xaa", "0xcc", "1", WEDNESDAY_AFTERNOON), &ctx)
    }

    #[test]
    fn at_threshold_is_quiet() {
        assert_eq!(run(10).points(), 0.0);
    }

    #[test]
    fn excess_scales_linearly() {
        assert_eq!(run(11).points(), 2.0);
        assert_eq!(run(15).points(), 10.0);
    }

    #[test]
    fn capped() {
        assert_eq!(run(40).points(), 25.0);
    }
}
