//! # Risk Scoring and Correlation Flows
//!
//! Engine behavior across collaborators (monotone amounts, failure
//! isolation, history-driven signals) and the loop detector and mapper over
//! shared transaction fixtures.

use std::sync::Arc;

use bwatch_core::{
    Address, BridgeProtocol, BridgeTransaction, ChainId, CollaboratorError, Timestamp, TxHash,
};
use bwatch_correlate::{detect_loops, CrossChainMapper, LinkError, LoopKind};
use bwatch_risk::{
    InMemoryHistory, RiskCategory, RiskConfig, RiskScoringEngine, SanctionsList, StaticSanctionsList,
};
use chrono::Utc;
use proptest::prelude::*;

/// Wednesday 2024-06-05 14:00:00 UTC.
const T: i64 = 1_717_596_000;

fn tx(hash: &str, from: &str, to: &str, amount: &str, at: i64) -> BridgeTransaction {
    BridgeTransaction {
        tx_hash: TxHash::new(hash).unwrap(),
        bridge_protocol: BridgeProtocol::Wormhole,
        source_chain: ChainId::new("ethereum").unwrap(),
        destination_chain: ChainId::new("solana").unwrap(),
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

fn engine_with(history: Vec<BridgeTransaction>, sanctions: Arc<dyn SanctionsList>) -> RiskScoringEngine {
    RiskScoringEngine::new(
        RiskConfig::default(),
        Arc::new(InMemoryHistory::from_transactions(history)),
        sanctions,
    )
    .unwrap()
}

fn quiet_engine() -> RiskScoringEngine {
    engine_with(Vec::new(), Arc::new(StaticSanctionsList::default()))
}

#[derive(Debug)]
struct DownSanctions;

impl SanctionsList for DownSanctions {
    fn is_sanctioned(&self, _address: &Address) -> Result<bool, CollaboratorError> {
        Err(CollaboratorError::unavailable("sanctions", "connection refused"))
    }
}

// =========================================================================
// Risk engine
// =========================================================================

proptest! {
    #[test]
    fn amount_points_are_monotone(a in 0u64..50_000_000, b in 0u64..50_000_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let engine = quiet_engine();
        let low = engine.assess(&tx("0x01", "0xa", "0xb", &lo.to_string(), T));
        let high = engine.assess(&tx("0x02", "0xa", "0xb", &hi.to_string(), T));
        prop_assert!(
            low.points_for(RiskCategory::Amount) <= high.points_for(RiskCategory::Amount),
            "{} scored above {}", lo, hi
        );
        prop_assert!((0.0..=1.0).contains(&high.normalized_score));
    }
}

#[test]
fn sanctions_outage_does_not_sink_other_signals() {
    let engine = engine_with(Vec::new(), Arc::new(DownSanctions));
    let a = engine.assess(&tx("0x01", "0xa", "0xb", "20000000", T));

    assert!(a.failed(RiskCategory::Sanctions));
    assert_eq!(a.points_for(RiskCategory::Sanctions), 0.0);
    assert!(a.points_for(RiskCategory::Amount) > 0.0);
    assert_eq!(a.component_scores.len(), RiskCategory::ALL.len());
    assert!(a.flags.contains("amount"));
    assert!(!a.flags.contains("sanctions"));
}

#[test]
fn sanctioned_recipient_flags() {
    let sanctions = StaticSanctionsList::new([Address::new("0xB").unwrap()]);
    let engine = engine_with(Vec::new(), Arc::new(sanctions));
    let a = engine.assess(&tx("0x01", "0xa", "0xb", "1", T));
    assert_eq!(a.points_for(RiskCategory::Sanctions), 100.0);
    assert!(a.flags.contains("sanctions"));
}

#[test]
fn history_drives_frequency_and_pattern() {
    let mut history: Vec<_> = (0..15)
        .map(|i| tx(&format!("0xh{i}"), "0xa", &format!("0xc{i}"), "1", T - 60 * (i + 1)))
        .collect();
    history.push(tx("0xback", "0xb", "0xa", "1", T - 7200));
    let engine = engine_with(history, Arc::new(StaticSanctionsList::default()));

    let a = engine.assess(&tx("0x01", "0xa", "0xb", "1", T));
    assert!(a.points_for(RiskCategory::Frequency) > 0.0);
    assert!(a.points_for(RiskCategory::Pattern) > 0.0);
    assert!(a.flags.contains("frequency"));
    assert!(a.flags.contains("pattern"));
}

#[test]
fn history_ignores_later_transactions() {
    let later: Vec<_> = (0..20)
        .map(|i| tx(&format!("0xl{i}"), "0xa", "0xz", "1", T + 60 * (i + 1)))
        .collect();
    let engine = engine_with(later, Arc::new(StaticSanctionsList::default()));
    let a = engine.assess(&tx("0x01", "0xa", "0xb", "1", T));
    assert_eq!(a.points_for(RiskCategory::Frequency), 0.0);
}

// =========================================================================
// Loops and links
// =========================================================================

#[test]
fn triangle_is_a_loop_and_disjoint_legs_are_not() {
    let triangle = vec![
        tx("0x01", "0xa", "0xb", "5", T),
        tx("0x02", "0xb", "0xc", "5", T + 600),
        tx("0x03", "0xc", "0xa", "5", T + 1200),
    ];
    let loops = detect_loops(&triangle);
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].kind, LoopKind::Complex);
    assert_eq!(loops[0].hops, 3);
    assert_eq!(loops[0].origin, Address::new("0xa").unwrap());

    let disjoint = vec![
        tx("0x01", "0xa", "0xb", "5", T),
        tx("0x02", "0xc", "0xd", "5", T + 600),
        tx("0x03", "0xe", "0xf", "5", T + 1200),
    ];
    assert!(detect_loops(&disjoint).is_empty());
}

#[test]
fn loop_requires_forward_time() {
    let backwards = vec![
        tx("0x01", "0xa", "0xb", "5", T + 1200),
        tx("0x02", "0xb", "0xc", "5", T + 600),
        tx("0x03", "0xc", "0xa", "5", T),
    ];
    assert!(detect_loops(&backwards).is_empty());
}

#[test]
fn mapping_is_idempotent_and_rejects_replays() {
    let mapper = CrossChainMapper::default();
    let mut dep = tx("0xdep", "0xa", "0xb", "250", T);
    dep.nonce = Some("1234".into());
    let mut arr = tx("0xarr", "0xa", "0xb", "250", T + 900);
    arr.nonce = Some("1234".into());

    let now = Utc::now();
    let first = mapper.create_or_update_mapping_at(&dep, &arr, &[], now).unwrap();
    let again = mapper.create_or_update_mapping_at(&dep, &arr, &[], now).unwrap();
    assert_eq!(first, again);
    assert_eq!(mapper.len(), 1);
    assert!((first.confidence - 1.0).abs() < 1e-9);

    let mut replay = dep.clone();
    replay.tx_hash = TxHash::new("0xreplay").unwrap();
    assert!(matches!(
        mapper.create_or_update_mapping(&replay, &arr, &[]),
        Err(LinkError::ConflictingLeg { .. })
    ));
    assert_eq!(mapper.find_by_tx_hash(&arr.tx_hash).map(|l| l.departure_tx), Some(dep.tx_hash));
}
