//! # Loop Detection
//!
//! Finds fund paths that return to their origin address and fast forward
//! chains that hop through several addresses in quick succession.
//!
//! ## Design
//!
//! Transactions are sorted by `(timestamp, tx_hash)` and treated as directed
//! edges `source_address -> destination_address`. A path extends edge `i`
//! only with a later edge `j > i` whose source is the previous destination,
//! so every path is time-ordered and never reuses a transaction.
//!
//! A path that reaches its origin address is a loop:
//!
//! | Kind | Shape | Default points |
//! |---|---|---|
//! | [`LoopKind::Simple`] | 2 hops | 15 |
//! | [`LoopKind::Complex`] | 3–4 hops, or any intermediate address visited twice | 25 |
//! | [`LoopKind::Extended`] | 5 or more hops | 35 |
//!
//! A loop completed within `fast_completion_secs` earns `fast_bonus` extra
//! points. Self-transfers are ignored.
//!
//! ## Pruning
//!
//! Before searching from a start edge, a reverse pass over the sorted edges
//! records for each later edge the fewest hops back to the start's origin
//! inside the window. A branch is only followed when it can still close
//! within `max_hops`, so paths that never return cost nothing. The search
//! also stops, with a `warn`, after `max_results` loops or `max_visits`
//! partial paths.
//!
//! ## Determinism
//!
//! Output order follows the sorted transaction order of each loop's first
//! leg, then path discovery order. The same input always yields the same
//! descriptors.

use std::collections::{BTreeSet, HashMap, HashSet};

use bwatch_core::{Address, BridgeTransaction, ChainId, ContentDigest, DigestBuilder, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

const LOOP_DOMAIN: &str = "bwatch.loop.v1";

fn default_max_hops() -> usize {
    8
}
fn default_max_window_secs() -> i64 {
    7 * 24 * 3600
}
fn default_max_results() -> usize {
    1000
}
fn default_max_visits() -> usize {
    200_000
}
fn default_simple_points() -> u32 {
    15
}
fn default_complex_points() -> u32 {
    25
}
fn default_extended_points() -> u32 {
    35
}
fn default_fast_completion_secs() -> i64 {
    3600
}
fn default_fast_bonus() -> u32 {
    10
}
fn default_rapid_chain_min_hops() -> usize {
    3
}
fn default_rapid_chain_window_secs() -> i64 {
    1800
}

/// Loop and rapid-chain detection limits and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Longest path explored.
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
    /// A loop must close within this many seconds of its first leg.
    #[serde(default = "default_max_window_secs")]
    pub max_window_secs: i64,
    /// Stop searching after this many results.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Stop loop search after visiting this many partial paths.
    #[serde(default = "default_max_visits")]
    pub max_visits: usize,
    #[serde(default = "default_simple_points")]
    pub simple_points: u32,
    #[serde(default = "default_complex_points")]
    pub complex_points: u32,
    #[serde(default = "default_extended_points")]
    pub extended_points: u32,
    #[serde(default = "default_fast_completion_secs")]
    pub fast_completion_secs: i64,
    #[serde(default = "default_fast_bonus")]
    pub fast_bonus: u32,
    #[serde(default = "default_rapid_chain_min_hops")]
    pub rapid_chain_min_hops: usize,
    #[serde(default = "default_rapid_chain_window_secs")]
    pub rapid_chain_window_secs: i64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            max_window_secs: default_max_window_secs(),
            max_results: default_max_results(),
            max_visits: default_max_visits(),
            simple_points: default_simple_points(),
            complex_points: default_complex_points(),
            extended_points: default_extended_points(),
            fast_completion_secs: default_fast_completion_secs(),
            fast_bonus: default_fast_bonus(),
            rapid_chain_min_hops: default_rapid_chain_min_hops(),
            rapid_chain_window_secs: default_rapid_chain_window_secs(),
        }
    }
}

/// Shape of a detected loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    Simple,
    Complex,
    Extended,
}

/// A fund path that returns to its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopDescriptor {
    /// Digest of the ordered transaction hashes.
    pub loop_id: ContentDigest,
    pub kind: LoopKind,
    pub origin: Address,
    /// Addresses visited, starting and ending at `origin`.
    pub path: Vec<Address>,
    pub tx_hashes: Vec<TxHash>,
    /// Distinct chains touched, sorted.
    pub chains: Vec<ChainId>,
    pub hops: usize,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub duration_secs: i64,
    pub risk_points: u32,
}

/// A forward chain of hops completed within the rapid window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RapidChain {
    pub path: Vec<Address>,
    pub tx_hashes: Vec<TxHash>,
    pub hops: usize,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub duration_secs: i64,
}

/// Outcome of one step of the loop search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    ResultLimit,
    VisitLimit,
}

struct LoopSearch {
    found: Vec<LoopDescriptor>,
    seen: HashSet<ContentDigest>,
    visits: usize,
    /// Per sorted edge; refilled for each start edge.
    hops_home: Vec<Option<usize>>,
}

/// Stateless loop and rapid-chain detector.
#[derive(Debug, Clone, Default)]
pub struct LoopDetector {
    config: LoopConfig,
}

impl LoopDetector {
    pub fn new(config: LoopConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Every time-ordered cycle in `txs`.
    pub fn detect_loops(&self, txs: &[BridgeTransaction]) -> Vec<LoopDescriptor> {
        let sorted = sorted_edges(txs);
        let mut search = LoopSearch {
            found: Vec::new(),
            seen: HashSet::new(),
            visits: 0,
            hops_home: vec![None; sorted.len()],
        };
        for start in 0..sorted.len() {
            if is_self_transfer(sorted[start]) {
                continue;
            }
            self.fill_hops_home(&sorted, start, &mut search.hops_home);
            if !self.can_close(&search.hops_home, start, 0) {
                continue;
            }
            let mut path = vec![start];
            match self.extend_loop(&sorted, &mut path, &mut search) {
                Step::Continue => {}
                Step::ResultLimit => {
                    tracing::warn!(
                        limit = self.config.max_results,
                        "loop detection stopped at result limit"
                    );
                    break;
                }
                Step::VisitLimit => {
                    tracing::warn!(
                        limit = self.config.max_visits,
                        loops = search.found.len(),
                        "loop detection stopped at visit limit"
                    );
                    break;
                }
            }
        }
        tracing::debug!(
            transactions = txs.len(),
            loops = search.found.len(),
            visits = search.visits,
            "loop detection complete"
        );
        search.found
    }

    /// For every edge from `start` on, the fewest hops (counting the edge
    /// itself) that lead from it back to the origin of `start` inside the
    /// window. Filled by one reverse pass over the sorted edges.
    fn fill_hops_home(&self, sorted: &[&BridgeTransaction], start: usize, hops_home: &mut [Option<usize>]) {
        let origin = &sorted[start].source_address;
        let started = sorted[start].timestamp;
        let end = sorted[start..]
            .iter()
            .position(|tx| tx.timestamp.since(&started).num_seconds() > self.config.max_window_secs)
            .map_or(sorted.len(), |offset| start + offset);

        for slot in hops_home[start..].iter_mut() {
            *slot = None;
        }
        // Fewest hops home from an address, over edges later than the cursor.
        let mut from_address: HashMap<&Address, usize> = HashMap::new();
        for j in (start..end).rev() {
            let tx = sorted[j];
            if is_self_transfer(tx) {
                continue;
            }
            let hops = if &tx.destination_address == origin {
                Some(1)
            } else {
                from_address.get(&tx.destination_address).map(|h| h + 1)
            };
            hops_home[j] = hops;
            if let Some(h) = hops {
                let best = from_address.entry(&tx.source_address).or_insert(h);
                *best = (*best).min(h);
            }
        }
    }

    /// Whether taking edge `next` after `taken` edges can still close a loop
    /// within `max_hops`.
    fn can_close(&self, hops_home: &[Option<usize>], next: usize, taken: usize) -> bool {
        hops_home[next].is_some_and(|h| taken + h <= self.config.max_hops)
    }

    fn extend_loop(&self, sorted: &[&BridgeTransaction], path: &mut Vec<usize>, search: &mut LoopSearch) -> Step {
        let (first, last) = match (path.first(), path.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => return Step::Continue,
        };
        search.visits += 1;
        if search.visits > self.config.max_visits {
            return Step::VisitLimit;
        }
        let origin = &sorted[first].source_address;
        let head = &sorted[last].destination_address;

        if head == origin {
            if path.len() >= 2 {
                let descriptor = self.describe_loop(sorted, path);
                if search.seen.insert(descriptor.loop_id) {
                    search.found.push(descriptor);
                }
            }
            if search.found.len() >= self.config.max_results {
                return Step::ResultLimit;
            }
            return Step::Continue;
        }

        let started = sorted[first].timestamp;
        for next in (last + 1)..sorted.len() {
            let tx = sorted[next];
            if tx.timestamp.since(&started).num_seconds() > self.config.max_window_secs {
                break;
            }
            if &tx.source_address != head || !self.can_close(&search.hops_home, next, path.len()) {
                continue;
            }
            path.push(next);
            let step = self.extend_loop(sorted, path, search);
            path.pop();
            if step != Step::Continue {
                return step;
            }
        }
        Step::Continue
    }

    fn describe_loop(&self, sorted: &[&BridgeTransaction], path: &[usize]) -> LoopDescriptor {
        let legs: Vec<&BridgeTransaction> = path.iter().map(|&i| sorted[i]).collect();
        let (origin, addresses, started_at, completed_at, duration_secs) = summarize(&legs);
        let hops = legs.len();

        let intermediates = &addresses[1..addresses.len() - 1];
        let distinct: HashSet<&Address> = intermediates.iter().collect();
        let revisits = distinct.len() < intermediates.len() || intermediates.contains(&origin);

        let kind = if hops == 2 {
            LoopKind::Simple
        } else if revisits || hops <= 4 {
            LoopKind::Complex
        } else {
            LoopKind::Extended
        };
        let mut risk_points = match kind {
            LoopKind::Simple => self.config.simple_points,
            LoopKind::Complex => self.config.complex_points,
            LoopKind::Extended => self.config.extended_points,
        };
        if duration_secs <= self.config.fast_completion_secs {
            risk_points += self.config.fast_bonus;
        }

        let tx_hashes: Vec<TxHash> = legs.iter().map(|t| t.tx_hash.clone()).collect();
        LoopDescriptor {
            loop_id: sequence_digest(&tx_hashes),
            kind,
            origin,
            path: addresses,
            chains: chains_of(&legs),
            tx_hashes,
            hops,
            started_at,
            completed_at,
            duration_secs,
            risk_points,
        }
    }

    /// Maximal forward chains of at least `rapid_chain_min_hops` hops that
    /// complete within `rapid_chain_window_secs` and never return to their
    /// origin. Chains contained at the tail of a longer reported chain are
    /// dropped.
    pub fn detect_rapid_chains(&self, txs: &[BridgeTransaction]) -> Vec<RapidChain> {
        let sorted = sorted_edges(txs);
        let mut chains: Vec<Vec<usize>> = Vec::new();
        for start in 0..sorted.len() {
            if is_self_transfer(sorted[start]) {
                continue;
            }
            let mut path = vec![start];
            self.extend_chain(&sorted, &mut path, &mut chains);
            if chains.len() >= self.config.max_results {
                tracing::warn!(limit = self.config.max_results, "rapid chain detection stopped at result limit");
                break;
            }
        }

        let maximal: Vec<&Vec<usize>> = chains
            .iter()
            .filter(|c| {
                !chains
                    .iter()
                    .any(|other| other.len() > c.len() && other.ends_with(c))
            })
            .collect();

        maximal
            .into_iter()
            .map(|c| {
                let legs: Vec<&BridgeTransaction> = c.iter().map(|&i| sorted[i]).collect();
                let (_, path, started_at, completed_at, duration_secs) = summarize(&legs);
                RapidChain {
                    path,
                    tx_hashes: legs.iter().map(|t| t.tx_hash.clone()).collect(),
                    hops: legs.len(),
                    started_at,
                    completed_at,
                    duration_secs,
                }
            })
            .collect()
    }

    fn extend_chain(
        &self,
        sorted: &[&BridgeTransaction],
        path: &mut Vec<usize>,
        chains: &mut Vec<Vec<usize>>,
    ) {
        let (first, last) = match (path.first(), path.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => return,
        };
        let origin = &sorted[first].source_address;
        let head = &sorted[last].destination_address;
        let started = sorted[first].timestamp;

        let mut extended = false;
        if path.len() < self.config.max_hops {
            for next in (last + 1)..sorted.len() {
                let tx = sorted[next];
                if tx.timestamp.since(&started).num_seconds() > self.config.rapid_chain_window_secs {
                    break;
                }
                if &tx.source_address != head
                    || is_self_transfer(tx)
                    || &tx.destination_address == origin
                {
                    continue;
                }
                extended = true;
                path.push(next);
                self.extend_chain(sorted, path, chains);
                path.pop();
                if chains.len() >= self.config.max_results {
                    return;
                }
            }
        }
        if !extended && path.len() >= self.config.rapid_chain_min_hops {
            chains.push(path.clone());
        }
    }
}

/// Detect loops with the default configuration.
pub fn detect_loops(txs: &[BridgeTransaction]) -> Vec<LoopDescriptor> {
    LoopDetector::default().detect_loops(txs)
}

fn sorted_edges(txs: &[BridgeTransaction]) -> Vec<&BridgeTransaction> {
    let mut sorted: Vec<&BridgeTransaction> = txs.iter().collect();
    sorted.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.tx_hash.cmp(&b.tx_hash))
    });
    sorted
}

fn is_self_transfer(tx: &BridgeTransaction) -> bool {
    tx.source_address == tx.destination_address
}

fn summarize(legs: &[&BridgeTransaction]) -> (Address, Vec<Address>, Timestamp, Timestamp, i64) {
    let origin = legs[0].source_address.clone();
    let mut path = Vec::with_capacity(legs.len() + 1);
    path.push(origin.clone());
    path.extend(legs.iter().map(|t| t.destination_address.clone()));
    let started_at = legs[0].timestamp;
    let completed_at = legs[legs.len() - 1].timestamp;
    let duration_secs = completed_at.since(&started_at).num_seconds();
    (origin, path, started_at, completed_at, duration_secs)
}

fn chains_of(legs: &[&BridgeTransaction]) -> Vec<ChainId> {
    let chains: BTreeSet<ChainId> = legs
        .iter()
        .flat_map(|t| [t.source_chain.clone(), t.destination_chain.clone()])
        .collect();
    chains.into_iter().collect()
}

fn sequence_digest(hashes: &[TxHash]) -> ContentDigest {
    let mut builder = DigestBuilder::new(LOOP_DOMAIN);
    for hash in hashes {
        builder.str_field(hash.as_str());
    }
    builder.finish()
}
