//! # Content Digest — Stable Composite Keys
//!
//! Defines `ContentDigest`, a SHA-256 digest used wherever Bridge Watch needs
//! a fixed-size, collision-resistant identity for a tuple of fields: verdict
//! cache keys (protocol, message id, signature blob) and cross-chain mapping
//! ids (protocol, nonce).
//!
//! ## Encoding
//!
//! [`DigestBuilder`] writes a domain tag and then every field as a
//! big-endian `u64` length followed by the raw bytes. Length prefixes keep
//! `("ab", "c")` and `("a", "bc")` distinct.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering (64 chars, no prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Incremental builder for a length-prefixed, domain-separated digest.
pub struct DigestBuilder {
    hasher: Sha256,
}

impl DigestBuilder {
    /// Start a digest under the given domain tag.
    pub fn new(domain: &str) -> Self {
        let mut builder = Self {
            hasher: Sha256::new(),
        };
        builder.field(domain.as_bytes());
        builder
    }

    /// Append one length-prefixed field.
    pub fn field(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update((bytes.len() as u64).to_be_bytes());
        self.hasher.update(bytes);
        self
    }

    /// Append a string field.
    pub fn str_field(&mut self, s: &str) -> &mut Self {
        self.field(s.as_bytes())
    }

    /// Finish and return the digest.
    pub fn finish(self) -> ContentDigest {
        let hash = self.hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        ContentDigest(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn distinct_splits_never_collide(s in "[a-z0-9]{2,24}", cut in 1usize..24) {
            let cut = cut.min(s.len() - 1);
            let mut whole = DigestBuilder::new("split");
            whole.str_field(&s);
            let mut split = DigestBuilder::new("split");
            split.str_field(&s[..cut]).str_field(&s[cut..]);
            prop_assert_ne!(whole.finish(), split.finish());
        }
    }

    #[test]
    fn builder_is_deterministic() {
        let mut a = DigestBuilder::new("test");
        a.str_field("wormhole").str_field("42");
        let mut b = DigestBuilder::new("test");
        b.str_field("wormhole").str_field("42");
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn length_prefix_separates_fields() {
        let mut a = DigestBuilder::new("test");
        a.str_field("ab").str_field("c");
        let mut b = DigestBuilder::new("test");
        b.str_field("a").str_field("bc");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn domain_tag_separates_digests() {
        let mut a = DigestBuilder::new("cache");
        a.str_field("x");
        let mut b = DigestBuilder::new("mapping");
        b.str_field("x");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn display_has_algorithm_prefix() {
        let s = DigestBuilder::new("display").finish().to_string();
        assert!(s.starts_with("sha256:"));
        assert_eq!(s.len(), 7 + 64);
    }
}
