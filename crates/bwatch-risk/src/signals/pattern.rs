use std::collections::HashSet;

use bwatch_core::{Address, BridgeTransaction};

use super::{prior_window, RiskSignal, SignalContext};
use crate::assessment::{RiskCategory, SignalOutcome};

/// Circular return paths, then rapid movement. The first match wins.
///
/// Circular: within the trailing window, the destination already sent funds
/// to the source, or sent funds to someone who sent funds to the source.
/// Funds only moving the same way (A -> B again) are not circular.
/// Rapid: either endpoint appears in more than `rapid_threshold`
/// transactions within the short window.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSignal;

impl PatternSignal {
    fn is_circular(tx: &BridgeTransaction, prior: &[BridgeTransaction]) -> bool {
        let senders_to_source: HashSet<&Address> = prior
            .iter()
            .filter(|h| h.destination_address == tx.source_address)
            .map(|h| &h.source_address)
            .collect();
        if senders_to_source.contains(&tx.destination_address) {
            return true;
        }
        prior.iter().any(|h| {
            h.source_address == tx.destination_address
                && senders_to_source.contains(&h.destination_address)
        })
    }

    fn busiest_endpoint(tx: &BridgeTransaction, recent: &[&BridgeTransaction]) -> usize {
        tx.endpoints()
            .iter()
            .map(|a| recent.iter().filter(|h| h.involves(a)).count())
            .max()
            .unwrap_or(0)
    }
}

impl RiskSignal for PatternSignal {
    fn category(&self) -> RiskCategory {
        RiskCategory::Pattern
    }

    fn evaluate(&self, tx: &BridgeTransaction, ctx: &SignalContext<'_>) -> SignalOutcome {
        let cfg = &ctx.config.pattern;
        let window = cfg.circular_window_secs.max(cfg.rapid_window_secs);
        let prior = match prior_window(tx, ctx.history, window) {
            Ok(prior) => prior,
            Err(reason) => return SignalOutcome::failed(reason),
        };

        let circular_since = tx.timestamp.minus(chrono::Duration::seconds(cfg.circular_window_secs));
        let circular_window: Vec<BridgeTransaction> = prior
            .iter()
            .filter(|h| h.timestamp >= circular_since)
            .cloned()
            .collect();
        if Self::is_circular(tx, &circular_window) {
            return SignalOutcome::scored(
                cfg.circular_points,
                format!(
                    "funds return toward {} within {} hours",
                    tx.source_address,
                    cfg.circular_window_secs / 3600
                ),
            );
        }

        let rapid_since = tx.timestamp.minus(chrono::Duration::seconds(cfg.rapid_window_secs));
        let recent: Vec<&BridgeTransaction> =
            prior.iter().filter(|h| h.timestamp >= rapid_since).collect();
        let busiest = Self::busiest_endpoint(tx, &recent);
        if busiest > cfg.rapid_threshold {
            return SignalOutcome::scored(
                cfg.rapid_points,
                format!(
                    "rapid movement: {busiest} transactions in {} minutes",
                    cfg.rapid_window_secs / 60
                ),
            );
        }
        SignalOutcome::quiet()
    }
}
