use serde::{Deserialize, Serialize};

use crate::error::{PzlError, PzlResult};

/// Puzzle construction settings (loaded from a pzl.toml file).
///
/// Everything here is optional; `pzl-crypto` resolves these settings into a
/// fully specified `CryptoConfig` that is embedded next to the chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleSettings {
    /// Encryption variant: "plain" (alias "simple") or "spiced"
    pub encryption: EncryptionVariant,
    pub scrypt: ScryptSettings,
    pub signature: SignatureSettings,
    /// Spices XORed into the derived key, one per link (cycled)
    pub proc_spices: Option<Vec<ByteSetting>>,
    /// Spices mixed into the authentication digest, one per link (cycled)
    pub signature_spices: Option<Vec<ByteSetting>>,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionVariant {
    #[default]
    #[serde(alias = "simple")]
    Plain,
    Spiced,
}

/// Named scrypt cost presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfPreset {
    /// n=2^4: for tests and throwaway puzzles only
    Fast,
    /// n=2^14, r=8, p=1
    #[default]
    Default,
    /// n=2^17, r=8, p=1
    Strong,
}

/// scrypt cost triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptCost {
    pub n: u64,
    pub r: u32,
    pub p: u32,
}

impl KdfPreset {
    pub fn cost(self) -> ScryptCost {
        match self {
            KdfPreset::Fast => ScryptCost { n: 1 << 4, r: 8, p: 1 },
            KdfPreset::Default => ScryptCost { n: 1 << 14, r: 8, p: 1 },
            KdfPreset::Strong => ScryptCost { n: 1 << 17, r: 8, p: 1 },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScryptSettings {
    /// Cost preset; `n`, `r` and `p` override it individually
    pub preset: KdfPreset,
    pub n: Option<u64>,
    pub r: Option<u32>,
    pub p: Option<u32>,
    /// Memory bound in bytes (default: 228 * n * r * p)
    pub maxmem: Option<u64>,
    /// Fixed salt (default: 16 random bytes chosen at build time)
    pub salt: Option<ByteSetting>,
}

impl ScryptSettings {
    /// Preset cost with explicit overrides applied.
    pub fn cost(&self) -> ScryptCost {
        let base = self.preset.cost();
        ScryptCost {
            n: self.n.unwrap_or(base.n),
            r: self.r.unwrap_or(base.r),
            p: self.p.unwrap_or(base.p),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureSettings {
    pub hasher: HasherSettings,
    pub digest: DigestSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherSettings {
    /// Hash function name (default: sha512)
    pub name: String,
    /// Output size for blake2b / blake2s
    pub digest_size: Option<usize>,
    /// Initialisation data fed to the hasher before anything else
    pub data: Option<ByteSetting>,
}

impl Default for HasherSettings {
    fn default() -> Self {
        Self {
            name: "sha512".into(),
            digest_size: None,
            data: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestSettings {
    /// Digest length in bytes (required for shake128 / shake256)
    pub length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

/// A byte string in a settings file: plain UTF-8 text or `{ base64 = "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ByteSetting {
    Text(String),
    Base64 { base64: String },
}

impl ByteSetting {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => ByteSetting::Text(text.to_string()),
            Err(_) => ByteSetting::Base64 {
                base64: crate::b64::encode(bytes),
            },
        }
    }

    pub fn to_bytes(&self) -> PzlResult<Vec<u8>> {
        match self {
            ByteSetting::Text(text) => Ok(text.as_bytes().to_vec()),
            ByteSetting::Base64 { base64 } => crate::b64::decode(base64)
                .map_err(|e| PzlError::Config(format!("invalid base64 byte setting: {e}"))),
        }
    }
}

impl PuzzleSettings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> PzlResult<Self> {
        toml::from_str(text).map_err(|e| PzlError::Config(format!("parsing settings: {e}")))
    }

    pub fn to_toml(&self) -> PzlResult<String> {
        toml::to_string(self).map_err(|e| PzlError::Config(format!("serializing settings: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
encryption = "spiced"
proc_spices = ["\u0001"]
signature_spices = [{ base64 = "AA==" }, { base64 = "CA==" }]

[scrypt]
preset = "fast"
n = 32
r = 16
maxmem = 100000
salt = "testSalt!!!"

[signature.hasher]
name = "sha3_256"
data = "00000"

[signature.digest]
length = 32

[log]
level = "debug"
format = "json"
"#;
        let settings = PuzzleSettings::from_toml(toml_str).unwrap();

        assert_eq!(settings.encryption, EncryptionVariant::Spiced);
        assert_eq!(settings.scrypt.preset, KdfPreset::Fast);
        assert_eq!(settings.scrypt.cost(), ScryptCost { n: 32, r: 16, p: 1 });
        assert_eq!(settings.scrypt.maxmem, Some(100000));
        assert_eq!(
            settings.scrypt.salt.as_ref().unwrap().to_bytes().unwrap(),
            b"testSalt!!!"
        );
        assert_eq!(settings.signature.hasher.name, "sha3_256");
        assert_eq!(
            settings.signature.hasher.data,
            Some(ByteSetting::Text("00000".into()))
        );
        assert_eq!(settings.signature.digest.length, Some(32));

        let proc: Vec<Vec<u8>> = settings
            .proc_spices
            .unwrap()
            .iter()
            .map(|s| s.to_bytes().unwrap())
            .collect();
        assert_eq!(proc, vec![vec![1u8]]);
        let sig: Vec<Vec<u8>> = settings
            .signature_spices
            .unwrap()
            .iter()
            .map(|s| s.to_bytes().unwrap())
            .collect();
        assert_eq!(sig, vec![vec![0u8], vec![8u8]]);

        assert_eq!(settings.log.level, "debug");
        assert_eq!(settings.log.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let settings = PuzzleSettings::from_toml("").unwrap();

        assert_eq!(settings.encryption, EncryptionVariant::Plain);
        assert_eq!(settings.scrypt.preset, KdfPreset::Default);
        assert_eq!(settings.scrypt.cost(), ScryptCost { n: 16384, r: 8, p: 1 });
        assert!(settings.scrypt.maxmem.is_none());
        assert!(settings.scrypt.salt.is_none());
        assert_eq!(settings.signature.hasher.name, "sha512");
        assert!(settings.signature.digest.length.is_none());
        assert!(settings.proc_spices.is_none());
        assert_eq!(settings.log.level, "warn");
    }

    #[test]
    fn test_simple_is_alias_for_plain() {
        let settings = PuzzleSettings::from_toml(r#"encryption = "simple""#).unwrap();
        assert_eq!(settings.encryption, EncryptionVariant::Plain);
    }

    #[test]
    fn test_override_single_cost_parameter() {
        let toml_str = r#"
[scrypt]
preset = "strong"
p = 2
"#;
        let settings = PuzzleSettings::from_toml(toml_str).unwrap();
        assert_eq!(settings.scrypt.cost(), ScryptCost { n: 1 << 17, r: 8, p: 2 });
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let result = PuzzleSettings::from_toml(r#"encryption = "salted""#);
        assert!(matches!(result, Err(PzlError::Config(_))));
    }

    #[test]
    fn test_byte_setting_from_bytes() {
        assert_eq!(
            ByteSetting::from_bytes(b"init"),
            ByteSetting::Text("init".into())
        );
        let binary = ByteSetting::from_bytes(&[0xff, 0x10]);
        assert!(matches!(binary, ByteSetting::Base64 { .. }));
        assert_eq!(binary.to_bytes().unwrap(), vec![0xff, 0x10]);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut settings = PuzzleSettings::default();
        settings.encryption = EncryptionVariant::Spiced;
        settings.scrypt.salt = Some(ByteSetting::from_bytes(&[0u8, 200, 3]));
        settings.signature_spices = Some(vec![ByteSetting::Text("x".into())]);

        let toml_str = settings.to_toml().unwrap();
        let parsed = PuzzleSettings::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, settings);
    }
}
