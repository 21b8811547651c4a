//! pzl-crypto: answer-locked onion encryption for chained puzzles
//!
//! Each link of a puzzle hides the serialized next link behind the answer to
//! its own question:
//!
//! ```text
//! key        = scrypt(answer, salt, n, r, p, len = |payload|)
//! ciphertext = payload XOR (key XOR process_spice)
//! tag        = H(hasher_init || signature_spice || key || ciphertext)
//! locked     = ciphertext || tag
//! ```
//!
//! Encoding runs innermost first, so the payload of every layer is the
//! already-final encrypted form of the layer below it.

pub mod artifact;
pub mod auth;
pub mod blob;
pub mod chain;
pub mod cipher;
pub mod kdf;
pub mod params;

pub use artifact::PuzzleArtifact;
pub use auth::{authenticate, AuthParams, HasherKind, HasherSpec};
pub use blob::{combine, split};
pub use chain::{decode_one, encode, open_link, Decoded, LinkCipher};
pub use cipher::{encipher, xor_bytes};
pub use kdf::{derive_key, KdfParams, KeyMaterial};
pub use params::{CryptoConfig, Variant};

/// Size of a generated scrypt salt
pub const SALT_SIZE: usize = 16;

/// Size of a generated spice value
pub const SPICE_SIZE: usize = 16;

/// Current puzzle artifact format version
pub const ARTIFACT_VERSION: u32 = 1;
