//! Resolved, validated crypto configuration embedded with every puzzle

use pzl_core::config::{ByteSetting, EncryptionVariant, PuzzleSettings};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{AuthParams, HasherKind, HasherSpec};
use crate::kdf::KdfParams;
use crate::{SALT_SIZE, SPICE_SIZE};

/// Encryption variant with its spice lists.
///
/// Link `d` (outermost = 0) uses `process_spices[d % len]` to perturb its key
/// stream and `signature_spices[d % len]` inside its tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Variant {
    Plain,
    Spiced {
        #[serde(with = "pzl_core::b64::list")]
        process_spices: Vec<Vec<u8>>,
        #[serde(with = "pzl_core::b64::list")]
        signature_spices: Vec<Vec<u8>>,
    },
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Plain => "plain",
            Variant::Spiced { .. } => "spiced",
        }
    }
}

/// Everything needed to reproduce a puzzle's derivations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    pub kdf: KdfParams,
    pub auth: AuthParams,
    pub variant: Variant,
}

impl CryptoConfig {
    /// Resolve settings into a complete configuration.
    ///
    /// `rng` supplies the salt and spices the settings leave unset; nothing
    /// else is random, so a fully specified settings file resolves the same
    /// way every time.
    pub fn resolve<R: RngCore + ?Sized>(
        settings: &PuzzleSettings,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        let cost = settings.scrypt.cost();
        let salt = match &settings.scrypt.salt {
            Some(salt) => salt.to_bytes()?,
            None => random_bytes(rng, SALT_SIZE),
        };
        let kdf = KdfParams {
            salt,
            n: cost.n,
            r: cost.r,
            p: cost.p,
            maxmem: settings
                .scrypt
                .maxmem
                .unwrap_or_else(|| KdfParams::default_maxmem(cost.n, cost.r, cost.p)),
        };

        let hasher_settings = &settings.signature.hasher;
        let name: HasherKind = hasher_settings.name.parse()?;
        let digest_length = resolve_digest_length(
            name,
            hasher_settings.digest_size,
            settings.signature.digest.length,
        )?;
        let init = match &hasher_settings.data {
            Some(data) => data.to_bytes()?,
            None => Vec::new(),
        };
        let auth = AuthParams {
            hasher: HasherSpec { name, init },
            digest_length,
        };

        let variant = match settings.encryption {
            EncryptionVariant::Plain => Variant::Plain,
            EncryptionVariant::Spiced => Variant::Spiced {
                process_spices: resolve_spices(settings.proc_spices.as_deref(), rng)?,
                signature_spices: resolve_spices(settings.signature_spices.as_deref(), rng)?,
            },
        };

        let config = Self { kdf, auth, variant };
        config.validate()?;
        debug!(
            variant = config.variant.name(),
            hasher = %config.auth.hasher.name,
            digest_length = config.auth.digest_length,
            n = config.kdf.n,
            r = config.kdf.r,
            p = config.kdf.p,
            "resolved crypto config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.kdf.validate()?;
        self.auth.validate()?;
        if let Variant::Spiced {
            process_spices,
            signature_spices,
        } = &self.variant
        {
            check_spices("process", process_spices)?;
            check_spices("signature", signature_spices)?;
        }
        Ok(())
    }

    /// Spice XORed into the key stream of the link at `depth`.
    pub fn process_spice(&self, depth: usize) -> &[u8] {
        match &self.variant {
            Variant::Plain => &[],
            Variant::Spiced { process_spices, .. } => pick(process_spices, depth),
        }
    }

    /// Spice mixed into the tag of the link at `depth`.
    pub fn signature_spice(&self, depth: usize) -> &[u8] {
        match &self.variant {
            Variant::Plain => &[],
            Variant::Spiced {
                signature_spices, ..
            } => pick(signature_spices, depth),
        }
    }
}

fn pick(spices: &[Vec<u8>], depth: usize) -> &[u8] {
    if spices.is_empty() {
        return &[];
    }
    &spices[depth % spices.len()]
}

fn check_spices(kind: &str, spices: &[Vec<u8>]) -> anyhow::Result<()> {
    if spices.is_empty() {
        anyhow::bail!("spiced variant needs at least one {kind} spice");
    }
    if spices.iter().any(|s| s.is_empty()) {
        anyhow::bail!("{kind} spices must not be empty byte strings");
    }
    Ok(())
}

fn resolve_digest_length(
    name: HasherKind,
    digest_size: Option<usize>,
    length: Option<usize>,
) -> anyhow::Result<usize> {
    if digest_size.is_some() && name.max_length().is_none() {
        anyhow::bail!("{name}: `digest_size` only applies to blake2b and blake2s");
    }
    let len = match (digest_size, length) {
        (Some(a), Some(b)) if a != b => {
            anyhow::bail!("{name}: digest_size {a} and digest length {b} disagree")
        }
        (Some(a), _) | (None, Some(a)) => a,
        (None, None) => name
            .default_length()
            .ok_or_else(|| anyhow::anyhow!("{name}: digest length is required"))?,
    };
    name.check_length(len)?;
    Ok(len)
}

fn resolve_spices<R: RngCore + ?Sized>(
    configured: Option<&[ByteSetting]>,
    rng: &mut R,
) -> anyhow::Result<Vec<Vec<u8>>> {
    match configured {
        Some(list) => list
            .iter()
            .map(|s| s.to_bytes().map_err(anyhow::Error::from))
            .collect(),
        None => Ok(vec![random_bytes(rng, SPICE_SIZE)]),
    }
}

fn random_bytes<R: RngCore + ?Sized>(rng: &mut R, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    bytes
}
