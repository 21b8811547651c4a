//! XOR stream enciphering
//!
//! The key stream comes straight from the KDF and is exactly as long as the
//! payload, so enciphering and deciphering are the same operation.

use zeroize::Zeroizing;

use crate::kdf::KeyMaterial;

/// Byte-wise XOR of two equal-length slices.
pub fn xor_bytes(data: &[u8], key: &[u8]) -> anyhow::Result<Vec<u8>> {
    if data.len() != key.len() {
        anyhow::bail!(
            "key stream length {} does not match data length {}",
            key.len(),
            data.len()
        );
    }
    Ok(data.iter().zip(key).map(|(d, k)| d ^ k).collect())
}

/// XOR `spice` into `key`, repeating the spice over the key length.
///
/// An empty spice leaves the key unchanged.
pub fn spice_key(key: &[u8], spice: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut spiced = Zeroizing::new(key.to_vec());
    if !spice.is_empty() {
        for (byte, s) in spiced.iter_mut().zip(spice.iter().cycle()) {
            *byte ^= s;
        }
    }
    spiced
}

/// Encipher (or decipher) `data` with a link key and the link's process spice.
pub fn encipher(data: &[u8], key: &KeyMaterial, process_spice: &[u8]) -> anyhow::Result<Vec<u8>> {
    let stream = spice_key(key.as_bytes(), process_spice);
    xor_bytes(data, &stream)
}
