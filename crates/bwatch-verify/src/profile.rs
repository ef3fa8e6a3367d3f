//! # Bridge Profiles
//!
//! A [`BridgeProfile`] captures everything protocol-specific about a bridge:
//! how its signature blob is laid out, what hash its signers sign, how a
//! signer is recovered, and how much inherent risk the protocol carries.
//!
//! ## Profiles
//!
//! | Profile | Layout | Message hash |
//! |---|---|---|
//! | [`GuardianProfile`] | `Indexed` | `keccak256(keccak256(body))` |
//! | [`ValidatorProfile`] | `Addressed` | EIP-191 of `keccak256(body)` |
//! | [`RelayProfile`] | none | none (unsigned relay) |
//!
//! [`ProfileRegistry`] selects the profile for a protocol. Protocols without
//! a registered profile fall back to a [`RelayProfile`], which the verifier
//! treats as unverifiable.

use std::collections::HashMap;
use std::sync::Arc;

use bwatch_core::{BridgeProtocol, EthAddress};
use bwatch_crypto::{
    double_keccak256, eth_signed_message_hash, keccak256, recover_address, CryptoError,
    RecoverableSignature,
};
use serde::{Deserialize, Serialize};

use crate::codec::{self, SignatureEntries, SignatureLayout};

/// Inherent risk a protocol adds to every transfer it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolRisk {
    /// Points contributed to the risk sum.
    pub points: u32,
    /// Why, or empty when `points == 0`.
    pub reason: String,
}

impl ProtocolRisk {
    /// No inherent risk.
    pub fn none() -> Self {
        Self {
            points: 0,
            reason: String::new(),
        }
    }
}

/// Protocol-specific verification and risk behavior.
pub trait BridgeProfile: Send + Sync + std::fmt::Debug {
    /// The protocol this profile describes.
    fn protocol(&self) -> &BridgeProtocol;

    /// Record layout of the signature blob, or `None` when the protocol
    /// carries no signatures to verify.
    fn signature_layout(&self) -> Option<SignatureLayout>;

    /// Decode a raw signature blob.
    fn decode_signatures<'a>(&self, blob: &'a [u8]) -> SignatureEntries<'a> {
        match self.signature_layout() {
            Some(layout) => codec::decode(layout, blob),
            None => SignatureEntries::empty(SignatureLayout::Indexed),
        }
    }

    /// The 32-byte hash the protocol's signers sign over `message`.
    fn message_hash(&self, message: &[u8]) -> Result<[u8; 32], CryptoError>;

    /// Recover the signer of `hash`.
    fn recover_signer(
        &self,
        hash: &[u8; 32],
        signature: &RecoverableSignature,
    ) -> Result<EthAddress, CryptoError> {
        recover_address(hash, signature)
    }

    /// Inherent protocol risk.
    fn risk_contribution(&self) -> ProtocolRisk;
}

fn require_body(message: &[u8]) -> Result<(), CryptoError> {
    if message.is_empty() {
        return Err(CryptoError::MessageHash("message body is empty".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Guardian network with index-addressed signatures over a double Keccak hash.
#[derive(Debug, Clone)]
pub struct GuardianProfile {
    protocol: BridgeProtocol,
}

impl GuardianProfile {
    pub fn new(protocol: BridgeProtocol) -> Self {
        Self { protocol }
    }
}

impl BridgeProfile for GuardianProfile {
    fn protocol(&self) -> &BridgeProtocol {
        &self.protocol
    }

    fn signature_layout(&self) -> Option<SignatureLayout> {
        Some(SignatureLayout::Indexed)
    }

    fn message_hash(&self, message: &[u8]) -> Result<[u8; 32], CryptoError> {
        require_body(message)?;
        Ok(double_keccak256(message))
    }

    fn risk_contribution(&self) -> ProtocolRisk {
        ProtocolRisk::none()
    }
}

/// Validator set with address-addressed, EIP-191 framed signatures.
#[derive(Debug, Clone)]
pub struct ValidatorProfile {
    protocol: BridgeProtocol,
}

impl ValidatorProfile {
    pub fn new(protocol: BridgeProtocol) -> Self {
        Self { protocol }
    }
}

impl BridgeProfile for ValidatorProfile {
    fn protocol(&self) -> &BridgeProtocol {
        &self.protocol
    }

    fn signature_layout(&self) -> Option<SignatureLayout> {
        Some(SignatureLayout::Addressed)
    }

    fn message_hash(&self, message: &[u8]) -> Result<[u8; 32], CryptoError> {
        require_body(message)?;
        Ok(eth_signed_message_hash(&keccak256(message)))
    }

    fn risk_contribution(&self) -> ProtocolRisk {
        ProtocolRisk::none()
    }
}

/// Unsigned relay. Nothing to verify; may still carry protocol risk.
#[derive(Debug, Clone)]
pub struct RelayProfile {
    protocol: BridgeProtocol,
    risk: ProtocolRisk,
}

impl RelayProfile {
    pub fn new(protocol: BridgeProtocol, risk: ProtocolRisk) -> Self {
        Self { protocol, risk }
    }
}

impl BridgeProfile for RelayProfile {
    fn protocol(&self) -> &BridgeProtocol {
        &self.protocol
    }

    fn signature_layout(&self) -> Option<SignatureLayout> {
        None
    }

    fn message_hash(&self, _message: &[u8]) -> Result<[u8; 32], CryptoError> {
        Err(CryptoError::MessageHash(format!(
            "{} relays are not signed",
            self.protocol
        )))
    }

    fn risk_contribution(&self) -> ProtocolRisk {
        self.risk.clone()
    }
}

// ---------------------------------------------------------------------------
// ProfileRegistry
// ---------------------------------------------------------------------------

fn default_mixer_associated() -> Vec<String> {
    vec!["tornado".into(), "tornado_cash".into(), "railgun".into()]
}

fn default_mixer_points() -> u32 {
    25
}

fn default_unknown_points() -> u32 {
    10
}

/// Protocol-risk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Protocol names associated with mixing services (lowercase).
    #[serde(default = "default_mixer_associated")]
    pub mixer_associated: Vec<String>,
    /// Points for a mixer-associated protocol.
    #[serde(default = "default_mixer_points")]
    pub mixer_points: u32,
    /// Points for a transfer the ingestion layer labeled `unknown`.
    #[serde(default = "default_unknown_points")]
    pub unknown_points: u32,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            mixer_associated: default_mixer_associated(),
            mixer_points: default_mixer_points(),
            unknown_points: default_unknown_points(),
        }
    }
}

impl ProfileConfig {
    /// Inherent risk of `protocol` under this configuration.
    pub fn risk_for(&self, protocol: &BridgeProtocol) -> ProtocolRisk {
        let name = protocol.as_str();
        if self.mixer_associated.iter().any(|m| m.eq_ignore_ascii_case(name)) {
            return ProtocolRisk {
                points: self.mixer_points,
                reason: format!("{name} is associated with mixing services"),
            };
        }
        if *protocol == BridgeProtocol::Unknown {
            return ProtocolRisk {
                points: self.unknown_points,
                reason: "bridge protocol could not be identified".into(),
            };
        }
        ProtocolRisk::none()
    }
}

/// Profile lookup keyed by protocol.
#[derive(Debug)]
pub struct ProfileRegistry {
    profiles: HashMap<BridgeProtocol, Arc<dyn BridgeProfile>>,
    config: ProfileConfig,
}

impl ProfileRegistry {
    /// A registry with no signed profiles. Every protocol resolves to a relay.
    pub fn empty(config: ProfileConfig) -> Self {
        Self {
            profiles: HashMap::new(),
            config,
        }
    }

    /// Guardian profile for Wormhole, validator profile for Multichain.
    pub fn with_defaults(config: &ProfileConfig) -> Self {
        let mut registry = Self::empty(config.clone());
        registry.register(Arc::new(GuardianProfile::new(BridgeProtocol::Wormhole)));
        registry.register(Arc::new(ValidatorProfile::new(BridgeProtocol::Multichain)));
        registry
    }

    /// Register or replace the profile for its protocol.
    pub fn register(&mut self, profile: Arc<dyn BridgeProfile>) {
        self.profiles.insert(profile.protocol().clone(), profile);
    }

    /// The profile for `protocol`, falling back to an unsigned relay.
    pub fn get(&self, protocol: &BridgeProtocol) -> Arc<dyn BridgeProfile> {
        match self.profiles.get(protocol) {
            Some(profile) => Arc::clone(profile),
            None => Arc::new(RelayProfile::new(
                protocol.clone(),
                self.config.risk_for(protocol),
            )),
        }
    }

    /// Inherent risk of `protocol`.
    pub fn risk_for(&self, protocol: &BridgeProtocol) -> ProtocolRisk {
        self.get(protocol).risk_contribution()
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::with_defaults(&ProfileConfig::default())
    }
}
