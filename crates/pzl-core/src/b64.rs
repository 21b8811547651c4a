//! Serde helpers that store byte fields as standard base64 strings.
//!
//! JSON has no byte type, and a lossy text encoding would corrupt ciphertext,
//! so every persisted byte field goes through one of these modules via
//! `#[serde(with = "...")]`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode(s: &str) -> anyhow::Result<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| anyhow::anyhow!("base64 decode: {e}"))
}

/// `Vec<u8>` as a base64 string.
pub mod bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        super::decode(&encoded).map_err(serde::de::Error::custom)
    }
}

/// `Option<Vec<u8>>` as an optional base64 string.
pub mod option {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&super::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|s| super::decode(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// `Vec<Vec<u8>>` as a list of base64 strings.
pub mod list {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(value.len()))?;
        for item in value {
            seq.serialize_element(&super::encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let encoded: Vec<String> = Vec::deserialize(d)?;
        encoded
            .iter()
            .map(|s| super::decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
