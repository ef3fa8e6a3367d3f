//! Time-bounded verdict cache.
//!
//! Keyed by a domain-separated digest of `(protocol, message_id, blob)`.
//! Entries older than the TTL are never returned. Expired entries are swept
//! opportunistically on insert once occupancy crosses the eviction threshold.

use bwatch_core::{BridgeProtocol, ContentDigest, DigestBuilder};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::verifier::VerificationVerdict;

const CACHE_DOMAIN: &str = "bwatch.verdict-cache.v1";

fn default_ttl_secs() -> i64 {
    3600
}

fn default_eviction_threshold() -> usize {
    1024
}

/// Verdict cache tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a verdict stays valid.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
    /// Occupancy above which inserts sweep expired entries.
    #[serde(default = "default_eviction_threshold")]
    pub eviction_threshold: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            eviction_threshold: default_eviction_threshold(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedVerdict {
    verdict: VerificationVerdict,
    inserted_at: DateTime<Utc>,
}

/// Concurrent verdict cache with TTL expiry.
#[derive(Debug)]
pub struct VerdictCache {
    entries: DashMap<ContentDigest, CachedVerdict>,
    config: CacheConfig,
}

impl VerdictCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Cache key for a verification request.
    pub fn key(protocol: &BridgeProtocol, message_id: &str, blob: &[u8]) -> ContentDigest {
        let mut builder = DigestBuilder::new(CACHE_DOMAIN);
        builder
            .str_field(protocol.as_str())
            .str_field(message_id)
            .field(blob);
        builder.finish()
    }

    fn ttl(&self) -> Duration {
        Duration::seconds(self.config.ttl_secs)
    }

    fn is_fresh(&self, inserted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(inserted_at) < self.ttl()
    }

    /// The cached verdict for `key`, if one exists and has not expired at `now`.
    /// An expired entry is removed.
    pub fn get(&self, key: &ContentDigest, now: DateTime<Utc>) -> Option<VerificationVerdict> {
        let hit = self.entries.get(key).map(|e| (e.verdict.clone(), e.inserted_at));
        match hit {
            Some((verdict, inserted_at)) if self.is_fresh(inserted_at, now) => Some(verdict),
            Some(_) => {
                self.entries
                    .remove_if(key, |_, e| !self.is_fresh(e.inserted_at, now));
                None
            }
            None => None,
        }
    }

    /// Store `verdict` under `key` as of `now`.
    pub fn insert(&self, key: ContentDigest, verdict: VerificationVerdict, now: DateTime<Utc>) {
        if self.entries.len() >= self.config.eviction_threshold {
            let evicted = self.evict_expired(now);
            if evicted > 0 {
                tracing::debug!(evicted, remaining = self.entries.len(), "swept expired verdicts");
            }
        }
        self.entries.insert(
            key,
            CachedVerdict {
                verdict,
                inserted_at: now,
            },
        );
    }

    /// Remove every entry expired at `now`. Returns how many were removed.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| self.is_fresh(e.inserted_at, now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::VerdictStatus;

    fn verdict() -> VerificationVerdict {
        VerificationVerdict {
            is_valid: true,
            valid_signature_count: 13,
            required_threshold: 13,
            bridge_protocol: BridgeProtocol::Wormhole,
            valid_signers: Vec::new(),
            status: VerdictStatus::Verified,
            verified_at: Utc::now(),
        }
    }

    #[test]
    fn key_separates_fields() {
        let a = VerdictCache::key(&BridgeProtocol::Wormhole, "ab", b"c");
        let b = VerdictCache::key(&BridgeProtocol::Wormhole, "a", b"bc");
        assert_ne!(a, b);
        assert_eq!(a, VerdictCache::key(&BridgeProtocol::Wormhole, "ab", b"c"));
    }

    #[test]
    fn fresh_entry_returned() {
        let cache = VerdictCache::default();
        let now = Utc::now();
        let key = VerdictCache::key(&BridgeProtocol::Wormhole, "m", b"");
        cache.insert(key, verdict(), now);
        assert!(cache.get(&key, now + Duration::minutes(59)).is_some());
    }

    #[test]
    fn expired_entry_removed() {
        let cache = VerdictCache::default();
        let now = Utc::now();
        let key = VerdictCache::key(&BridgeProtocol::Wormhole, "m", b"");
        cache.insert(key, verdict(), now);
        assert!(cache.get(&key, now + Duration::hours(1)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn sweep_runs_past_threshold() {
        let cache = VerdictCache::new(CacheConfig {
            ttl_secs: 10,
            eviction_threshold: 4,
        });
        let start = Utc::now();
        for i in 0..4 {
            let key = VerdictCache::key(&BridgeProtocol::Wormhole, &i.to_string(), b"");
            cache.insert(key, verdict(), start);
        }
        assert_eq!(cache.len(), 4);
        let later = start + Duration::seconds(30);
        cache.insert(VerdictCache::key(&BridgeProtocol::Wormhole, "x", b""), verdict(), later);
        assert_eq!(cache.len(), 1);
    }
}
