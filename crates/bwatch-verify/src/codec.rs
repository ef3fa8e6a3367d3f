//! # Signature Codec
//!
//! Parses bridge-specific signature blobs into `(signer reference,
//! signature)` entries. Each layout is a fixed-width record:
//!
//! ```text
//! Indexed    [index: u8][signature: 65]              stride 66
//! Addressed  [address: 20][signature: 65]            stride 85
//! ```
//!
//! ## Tolerance Policy
//!
//! A blob decodes to `floor(len / stride)` records. Trailing partial bytes
//! are dropped silently, and an empty or short blob decodes to nothing.
//! Decoding never fails: a malformed blob simply yields zero entries, and
//! verification then reports zero valid signatures.

use std::slice::ChunksExact;

use bwatch_core::EthAddress;
use bwatch_crypto::{RecoverableSignature, SIGNATURE_LEN};
use serde::{Deserialize, Serialize};

/// Record layout of a signature blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureLayout {
    /// 1-byte guardian index followed by a 65-byte signature.
    Indexed,
    /// 20-byte signer address followed by a 65-byte signature.
    Addressed,
}

impl SignatureLayout {
    /// Width of the signer reference prefix.
    pub const fn prefix_len(self) -> usize {
        match self {
            Self::Indexed => 1,
            Self::Addressed => 20,
        }
    }

    /// Width of one record.
    pub const fn stride(self) -> usize {
        self.prefix_len() + SIGNATURE_LEN
    }
}

/// The signer a signature claims to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignerRef {
    /// Zero-based position in the protocol's validator set.
    Index(u8),
    /// Literal signer address.
    Address(EthAddress),
}

/// One decoded `(signer, signature)` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEntry {
    /// Claimed signer.
    pub signer: SignerRef,
    /// The 65-byte recoverable signature.
    pub signature: RecoverableSignature,
}

/// Lazy iterator over the records of a blob.
///
/// Cloning restarts nothing and copies nothing but the cursor; calling
/// [`decode`] again on the same blob restarts from the first record.
#[derive(Debug, Clone)]
pub struct SignatureEntries<'a> {
    layout: SignatureLayout,
    chunks: ChunksExact<'a, u8>,
}

impl<'a> SignatureEntries<'a> {
    /// An iterator that yields nothing.
    pub fn empty(layout: SignatureLayout) -> Self {
        Self {
            layout,
            chunks: [].chunks_exact(layout.stride()),
        }
    }

    /// Layout being decoded.
    pub fn layout(&self) -> SignatureLayout {
        self.layout
    }

    fn parse_record(layout: SignatureLayout, record: &[u8]) -> SignatureEntry {
        let prefix = layout.prefix_len();
        let signer = match layout {
            SignatureLayout::Indexed => SignerRef::Index(record[0]),
            SignatureLayout::Addressed => {
                let mut addr = [0u8; 20];
                addr.copy_from_slice(&record[..prefix]);
                SignerRef::Address(EthAddress::from_bytes(addr))
            }
        };
        let mut sig = [0u8; SIGNATURE_LEN];
        sig.copy_from_slice(&record[prefix..prefix + SIGNATURE_LEN]);
        SignatureEntry {
            signer,
            signature: RecoverableSignature::from_bytes(sig),
        }
    }
}

impl Iterator for SignatureEntries<'_> {
    type Item = SignatureEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.chunks.next()?;
        Some(Self::parse_record(self.layout, record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for SignatureEntries<'_> {}

/// Decode `blob` lazily under `layout`.
pub fn decode(layout: SignatureLayout, blob: &[u8]) -> SignatureEntries<'_> {
    SignatureEntries {
        layout,
        chunks: blob.chunks_exact(layout.stride()),
    }
}

/// An owned, fully decoded signature blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEnvelope {
    pub layout: SignatureLayout,
    pub entries: Vec<SignatureEntry>,
}

impl SignatureEnvelope {
    /// Decode every record of `blob`.
    pub fn from_blob(layout: SignatureLayout, blob: &[u8]) -> Self {
        Self {
            layout,
            entries: decode(layout, blob).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode a hex blob (optional `0x` prefix). Invalid hex yields an empty
/// envelope.
pub fn decode_hex(layout: SignatureLayout, blob_hex: &str) -> SignatureEnvelope {
    match parse_hex_blob(blob_hex) {
        Some(bytes) => SignatureEnvelope::from_blob(layout, &bytes),
        None => {
            tracing::debug!(layout = ?layout, "signature blob is not valid hex; decoding to nothing");
            SignatureEnvelope {
                layout,
                entries: Vec::new(),
            }
        }
    }
}

/// Hex-decode a blob, tolerating a `0x` prefix and surrounding whitespace.
pub fn parse_hex_blob(blob_hex: &str) -> Option<Vec<u8>> {
    let s = blob_hex.trim();
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).ok()
}

/// Encode entries back into a blob. Index references under the `Addressed`
/// layout (and vice versa) are skipped.
pub fn encode(layout: SignatureLayout, entries: &[SignatureEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(entries.len() * layout.stride());
    for entry in entries {
        match (layout, entry.signer) {
            (SignatureLayout::Indexed, SignerRef::Index(i)) => out.push(i),
            (SignatureLayout::Addressed, SignerRef::Address(a)) => out.extend_from_slice(a.as_bytes()),
            _ => continue,
        }
        out.extend_from_slice(entry.signature.as_bytes());
    }
    out
}
