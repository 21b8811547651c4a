//! Key derivation: scrypt answer → per-link key stream

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Key bytes derived for a single link, exactly as long as its payload.
///
/// Zeroized on drop; never persisted.
pub struct KeyMaterial {
    bytes: Vec<u8>,
}

impl KeyMaterial {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// scrypt parameters, fixed when the puzzle is built and embedded with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    #[serde(with = "pzl_core::b64::bytes")]
    pub salt: Vec<u8>,
    /// CPU/memory cost (power of two)
    pub n: u64,
    /// Block size
    pub r: u32,
    /// Parallelism
    pub p: u32,
    /// Upper bound on scrypt working memory in bytes
    pub maxmem: u64,
}

impl KdfParams {
    /// `maxmem` used when the settings leave it unset.
    pub fn default_maxmem(n: u64, r: u32, p: u32) -> u64 {
        228u64
            .saturating_mul(n)
            .saturating_mul(u64::from(r))
            .saturating_mul(u64::from(p))
    }

    /// Bytes of working memory scrypt needs for these parameters.
    pub fn memory_estimate(&self) -> u64 {
        128u64
            .saturating_mul(u64::from(self.r))
            .saturating_mul(self.n.saturating_add(u64::from(self.p)).saturating_add(2))
    }

    pub fn log_n(&self) -> anyhow::Result<u8> {
        if self.n < 2 || !self.n.is_power_of_two() {
            anyhow::bail!("scrypt n must be a power of two greater than 1 (got {})", self.n);
        }
        Ok(self.n.trailing_zeros() as u8)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.log_n()?;
        if self.r == 0 || self.p == 0 {
            anyhow::bail!("scrypt r and p must be positive (r={}, p={})", self.r, self.p);
        }
        let needed = self.memory_estimate();
        if needed > self.maxmem {
            anyhow::bail!(
                "scrypt needs {needed} bytes but maxmem is {} (n={}, r={}, p={})",
                self.maxmem,
                self.n,
                self.r,
                self.p
            );
        }
        Ok(())
    }

    fn to_scrypt(&self) -> anyhow::Result<scrypt::Params> {
        self.validate()?;
        scrypt::Params::new(self.log_n()?, self.r, self.p, scrypt::Params::RECOMMENDED_LEN)
            .map_err(|e| anyhow::anyhow!("invalid scrypt params: {e}"))
    }
}

/// Derive `len` key bytes from an answer.
///
/// The KDF is asked for exactly `len` bytes rather than a fixed-size key, so
/// the XOR stream covers the payload with no reuse. Deterministic for the same
/// `(answer, params, len)`.
pub fn derive_key(
    answer: &SecretString,
    params: &KdfParams,
    len: usize,
) -> anyhow::Result<KeyMaterial> {
    let scrypt_params = params.to_scrypt()?;

    let mut bytes = vec![0u8; len];
    if len > 0 {
        scrypt::scrypt(
            answer.expose_secret().as_bytes(),
            &params.salt,
            &scrypt_params,
            &mut bytes,
        )
        .map_err(|e| anyhow::anyhow!("scrypt KDF failed: {e}"))?;
    }

    Ok(KeyMaterial::from_bytes(bytes))
}

#[cfg(test)]
pub(crate) fn test_params() -> KdfParams {
    KdfParams {
        salt: b"pzl-test-salt".to_vec(),
        n: 16,
        r: 8,
        p: 1,
        maxmem: KdfParams::default_maxmem(16, 8, 1),
    }
}
