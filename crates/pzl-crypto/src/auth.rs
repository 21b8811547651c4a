//! Keyed authentication tags over `key || ciphertext`
//!
//! The hasher is chosen per puzzle from a fixed catalogue. Extendable-output
//! hashers (shake128, shake256, blake3) and the variable-size blake2
//! functions produce the configured digest length directly.

use blake2::{Blake2bVar, Blake2sVar};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use sha3::digest::{Digest, ExtendableOutput, Update, VariableOutput};
use sha3::{Sha3_256, Sha3_384, Sha3_512, Shake128, Shake256};

/// Supported authentication hash functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HasherKind {
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "sha384")]
    Sha384,
    #[serde(rename = "sha512")]
    Sha512,
    #[serde(rename = "sha3_256")]
    Sha3_256,
    #[serde(rename = "sha3_384")]
    Sha3_384,
    #[serde(rename = "sha3_512")]
    Sha3_512,
    #[serde(rename = "blake2b")]
    Blake2b,
    #[serde(rename = "blake2s")]
    Blake2s,
    #[serde(rename = "shake128")]
    Shake128,
    #[serde(rename = "shake256")]
    Shake256,
    #[serde(rename = "blake3")]
    Blake3,
}

impl HasherKind {
    pub const ALL: [HasherKind; 11] = [
        HasherKind::Sha256,
        HasherKind::Sha384,
        HasherKind::Sha512,
        HasherKind::Sha3_256,
        HasherKind::Sha3_384,
        HasherKind::Sha3_512,
        HasherKind::Blake2b,
        HasherKind::Blake2s,
        HasherKind::Shake128,
        HasherKind::Shake256,
        HasherKind::Blake3,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HasherKind::Sha256 => "sha256",
            HasherKind::Sha384 => "sha384",
            HasherKind::Sha512 => "sha512",
            HasherKind::Sha3_256 => "sha3_256",
            HasherKind::Sha3_384 => "sha3_384",
            HasherKind::Sha3_512 => "sha3_512",
            HasherKind::Blake2b => "blake2b",
            HasherKind::Blake2s => "blake2s",
            HasherKind::Shake128 => "shake128",
            HasherKind::Shake256 => "shake256",
            HasherKind::Blake3 => "blake3",
        }
    }

    /// Output size of fixed-length hashers.
    pub fn fixed_length(self) -> Option<usize> {
        match self {
            HasherKind::Sha256 | HasherKind::Sha3_256 => Some(32),
            HasherKind::Sha384 | HasherKind::Sha3_384 => Some(48),
            HasherKind::Sha512 | HasherKind::Sha3_512 => Some(64),
            _ => None,
        }
    }

    /// Largest output of the variable-size blake2 functions.
    pub fn max_length(self) -> Option<usize> {
        match self {
            HasherKind::Blake2b => Some(64),
            HasherKind::Blake2s => Some(32),
            _ => None,
        }
    }

    pub fn is_xof(self) -> bool {
        matches!(
            self,
            HasherKind::Shake128 | HasherKind::Shake256 | HasherKind::Blake3
        )
    }

    /// Length used when nothing is configured; `None` means a length is required.
    pub fn default_length(self) -> Option<usize> {
        match self {
            HasherKind::Shake128 | HasherKind::Shake256 => None,
            HasherKind::Blake3 => Some(blake3::OUT_LEN),
            other => other.fixed_length().or(other.max_length()),
        }
    }

    /// Check that `len` is a valid digest length for this hasher.
    pub fn check_length(self, len: usize) -> anyhow::Result<()> {
        if len == 0 {
            anyhow::bail!("{}: digest length must be positive", self.name());
        }
        if let Some(fixed) = self.fixed_length() {
            if len != fixed {
                anyhow::bail!(
                    "{}: digest length is fixed at {fixed} bytes (got {len})",
                    self.name()
                );
            }
        }
        if let Some(max) = self.max_length() {
            if len > max {
                anyhow::bail!(
                    "{}: digest length must be at most {max} bytes (got {len})",
                    self.name()
                );
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for HasherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for HasherKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        HasherKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unsupported hasher: {s}"))
    }
}

/// A hasher choice plus its initialisation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasherSpec {
    pub name: HasherKind,
    /// Bytes fed to the hasher before anything else
    #[serde(default, with = "pzl_core::b64::bytes", skip_serializing_if = "Vec::is_empty")]
    pub init: Vec<u8>,
}

/// Authentication parameters embedded with the puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    pub hasher: HasherSpec,
    pub digest_length: usize,
}

impl AuthParams {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.hasher.name.check_length(self.digest_length)
    }
}

/// Compute the tag for one link.
///
/// Input order: hasher init data, `signature_spice` (empty for the plain
/// variant), key, ciphertext.
pub fn authenticate(
    key: &[u8],
    ciphertext: &[u8],
    auth: &AuthParams,
    signature_spice: &[u8],
) -> anyhow::Result<Vec<u8>> {
    let parts: [&[u8]; 4] = [&auth.hasher.init, signature_spice, key, ciphertext];
    digest_parts(auth.hasher.name, auth.digest_length, &parts)
}

fn digest_parts(kind: HasherKind, len: usize, parts: &[&[u8]]) -> anyhow::Result<Vec<u8>> {
    kind.check_length(len)?;
    let tag = match kind {
        HasherKind::Sha256 => fixed::<Sha256>(parts),
        HasherKind::Sha384 => fixed::<Sha384>(parts),
        HasherKind::Sha512 => fixed::<Sha512>(parts),
        HasherKind::Sha3_256 => fixed::<Sha3_256>(parts),
        HasherKind::Sha3_384 => fixed::<Sha3_384>(parts),
        HasherKind::Sha3_512 => fixed::<Sha3_512>(parts),
        HasherKind::Blake2b => {
            let hasher = Blake2bVar::new(len)
                .map_err(|e| anyhow::anyhow!("blake2b output size {len}: {e}"))?;
            variable(hasher, len, parts)?
        }
        HasherKind::Blake2s => {
            let hasher = Blake2sVar::new(len)
                .map_err(|e| anyhow::anyhow!("blake2s output size {len}: {e}"))?;
            variable(hasher, len, parts)?
        }
        HasherKind::Shake128 => xof::<Shake128>(len, parts),
        HasherKind::Shake256 => xof::<Shake256>(len, parts),
        HasherKind::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            for part in parts {
                hasher.update(part);
            }
            let mut out = vec![0u8; len];
            hasher.finalize_xof().fill(&mut out);
            out
        }
    };
    Ok(tag)
}

fn fixed<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for part in parts {
        Digest::update(&mut hasher, part);
    }
    hasher.finalize().to_vec()
}

fn variable<H: Update + VariableOutput>(
    mut hasher: H,
    len: usize,
    parts: &[&[u8]],
) -> anyhow::Result<Vec<u8>> {
    for part in parts {
        Update::update(&mut hasher, part);
    }
    let mut out = vec![0u8; len];
    hasher
        .finalize_variable(&mut out)
        .map_err(|e| anyhow::anyhow!("variable digest finalize: {e}"))?;
    Ok(out)
}

fn xof<H: Default + Update + ExtendableOutput>(len: usize, parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = H::default();
    for part in parts {
        Update::update(&mut hasher, part);
    }
    let mut out = vec![0u8; len];
    hasher.finalize_xof_into(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(name: HasherKind, digest_length: usize) -> AuthParams {
        AuthParams {
            hasher: HasherSpec {
                name,
                init: Vec::new(),
            },
            digest_length,
        }
    }

    #[test]
    fn test_sha256_matches_plain_digest() {
        let tag = authenticate(b"key", b"ciphertext", &params(HasherKind::Sha256, 32), b"").unwrap();
        let expected = Sha256::digest(b"keyciphertext").to_vec();
        assert_eq!(tag, expected);
    }

    #[test]
    fn test_every_hasher_produces_requested_length() {
        for kind in HasherKind::ALL {
            let len = kind.default_length().unwrap_or(91);
            let tag = authenticate(b"k", b"c", &params(kind, len), b"").unwrap();
            assert_eq!(tag.len(), len, "{kind}");
        }
    }

    #[test]
    fn test_variable_lengths() {
        for (kind, len) in [
            (HasherKind::Blake2b, 17),
            (HasherKind::Blake2s, 5),
            (HasherKind::Shake128, 5),
            (HasherKind::Shake256, 91),
            (HasherKind::Blake3, 100),
        ] {
            let tag = authenticate(b"k", b"c", &params(kind, len), b"").unwrap();
            assert_eq!(tag.len(), len, "{kind}");
        }
    }

    #[test]
    fn test_fixed_hasher_rejects_other_length() {
        assert!(authenticate(b"k", b"c", &params(HasherKind::Sha512, 32), b"").is_err());
        assert!(authenticate(b"k", b"c", &params(HasherKind::Blake2s, 33), b"").is_err());
        assert!(authenticate(b"k", b"c", &params(HasherKind::Shake256, 0), b"").is_err());
    }

    #[test]
    fn test_init_data_changes_tag() {
        let plain = params(HasherKind::Shake256, 32);
        let mut seeded = plain.clone();
        seeded.hasher.init = b"init".to_vec();

        let a = authenticate(b"k", b"c", &plain, b"").unwrap();
        let b = authenticate(b"k", b"c", &seeded, b"").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_signature_spice_changes_tag() {
        let auth = params(HasherKind::Sha3_256, 32);
        let a = authenticate(b"k", b"c", &auth, b"").unwrap();
        let b = authenticate(b"k", b"c", &auth, b"\x08").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_changes_tag() {
        let auth = params(HasherKind::Sha512, 64);
        let a = authenticate(b"key-a", b"c", &auth, b"").unwrap();
        let b = authenticate(b"key-b", b"c", &auth, b"").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hasher_names_parse() {
        for kind in HasherKind::ALL {
            assert_eq!(kind.name().parse::<HasherKind>().unwrap(), kind);
        }
        assert_eq!("SHA3-384".parse::<HasherKind>().unwrap(), HasherKind::Sha3_384);
        assert!("md5".parse::<HasherKind>().is_err());
    }

    #[test]
    fn test_hasher_serde_names() {
        let json = serde_json::to_string(&HasherKind::Sha3_256).unwrap();
        assert_eq!(json, r#""sha3_256""#);
    }
}
