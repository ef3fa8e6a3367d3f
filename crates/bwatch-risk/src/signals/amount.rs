use bwatch_core::BridgeTransaction;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::{RiskSignal, SignalContext};
use crate::assessment::{RiskCategory, SignalOutcome};
use crate::config::AmountBands;

/// Reference-value amount risk. Only the highest matching band fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountSignal;

impl AmountSignal {
    /// Score a reference value against `bands`.
    pub fn score_value(bands: &AmountBands, value: Decimal) -> SignalOutcome {
        let (points, flag, label) = if value >= bands.extreme {
            (bands.extreme_points, "amount_extreme", "extreme")
        } else if value >= bands.very_large {
            (bands.very_large_points, "amount_very_large", "very large")
        } else if value >= bands.large {
            (bands.large_points, "amount_large", "large")
        } else if value >= bands.high_value {
            let span = bands.large - bands.high_value;
            let fraction = ((value - bands.high_value) / span).to_f64().unwrap_or(1.0);
            let points = (bands.high_value_base + bands.high_value_slope * fraction)
                .min(bands.high_value_cap);
            (points, "amount_high_value", "high value")
        } else {
            return SignalOutcome::quiet();
        };
        SignalOutcome::Scored {
            points,
            description: format!("{label} transfer worth {} in reference value", value.round_dp(2)),
            sub_flags: vec![flag.to_string()],
        }
    }
}

impl RiskSignal for AmountSignal {
    fn category(&self) -> RiskCategory {
        RiskCategory::Amount
    }

    fn evaluate(&self, tx: &BridgeTransaction, ctx: &SignalContext<'_>) -> SignalOutcome {
        let amount = match tx.token_amount() {
            Ok(amount) => amount,
            Err(e) => return SignalOutcome::failed(e.to_string()),
        };
        let price = ctx.config.prices.price_of(&tx.token_symbol);
        match amount.checked_mul(price) {
            Some(value) => Self::score_value(&ctx.config.amount, value),
            None => SignalOutcome::failed(format!(
                "reference value of {amount} {} overflows",
                tx.token_symbol
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(v: i64) -> f64 {
        AmountSignal::score_value(&AmountBands::default(), Decimal::from(v)).points()
    }

    fn flag(v: i64) -> Option<String> {
        match AmountSignal::score_value(&AmountBands::default(), Decimal::from(v)) {
            SignalOutcome::Scored { sub_flags, .. } => sub_flags.into_iter().next(),
            SignalOutcome::Failed { .. } => None,
        }
    }

    #[test]
    fn bands() {
        assert_eq!(score(9_999), 0.0);
        assert_eq!(score(10_000), 5.0);
        assert_eq!(score(55_000), 10.0);
        assert!(score(99_999) <= 15.0);
        assert_eq!(score(100_000), 20.0);
        assert_eq!(score(1_000_000), 30.0);
        assert_eq!(score(10_000_000), 40.0);
        assert_eq!(score(i64::MAX), 40.0);
    }

    #[test]
    fn only_highest_band_flags() {
        assert_eq!(flag(5_000), None);
        assert_eq!(flag(20_000).as_deref(), Some("amount_high_value"));
        assert_eq!(flag(250_000).as_deref(), Some("amount_large"));
        assert_eq!(flag(2_000_000).as_deref(), Some("amount_very_large"));
        assert_eq!(flag(20_000_000).as_deref(), Some("amount_extreme"));
    }

    #[test]
    fn monotonic_across_boundaries() {
        let amounts = [0, 9_999, 10_000, 50_000, 99_999, 100_000, 999_999, 1_000_000, 9_999_999, 10_000_000];
        for pair in amounts.windows(2) {
            assert!(score(pair[0]) <= score(pair[1]), "{} vs {}", pair[0], pair[1]);
        }
    }
}
