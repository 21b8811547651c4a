//! Puzzle artifact format
//!
//! An artifact is everything a player needs and nothing more: the crypto
//! configuration (salt, scrypt cost, hasher, spices) and the encrypted chain.
//! Answers never appear in it. Serialized as JSON with base64 byte fields.

use pzl_core::{EncryptedLink, PlaintextLink};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::encode;
use crate::params::CryptoConfig;
use crate::ARTIFACT_VERSION;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleArtifact {
    /// Artifact format version
    pub version: u32,
    pub crypto: CryptoConfig,
    pub chain: EncryptedLink,
}

impl PuzzleArtifact {
    /// Encrypt `chain` under `crypto`.
    pub fn build(chain: PlaintextLink, crypto: CryptoConfig) -> anyhow::Result<Self> {
        crypto.validate()?;
        let links = chain.len();
        let chain = encode(chain, &crypto)?;
        info!(links, variant = crypto.variant.name(), "built puzzle");
        Ok(Self {
            version: ARTIFACT_VERSION,
            crypto,
            chain,
        })
    }

    /// Fold a flat question/answer list and encrypt it.
    pub fn from_list<S: AsRef<str>>(items: &[S], crypto: CryptoConfig) -> anyhow::Result<Self> {
        Self::build(PlaintextLink::from_list(items)?, crypto)
    }

    /// Serialize to pretty-printed JSON bytes
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| anyhow::anyhow!("artifact serialization: {e}"))
    }

    /// Deserialize from JSON bytes, rejecting unknown versions and invalid parameters
    pub fn from_bytes(data: &[u8]) -> anyhow::Result<Self> {
        let artifact: Self = serde_json::from_slice(data)
            .map_err(|e| anyhow::anyhow!("artifact deserialization: {e}"))?;
        if artifact.version != ARTIFACT_VERSION {
            anyhow::bail!(
                "unsupported artifact version {} (expected {ARTIFACT_VERSION})",
                artifact.version
            );
        }
        artifact.crypto.validate()?;
        artifact.chain.lock()?;
        Ok(artifact)
    }
}
