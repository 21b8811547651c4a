//! Onion encoding of puzzle chains
//!
//! `encode` walks the plaintext chain innermost first: the final message is
//! stored as-is, and every earlier link enciphers the serialized, already
//! encrypted form of the link after it. `decode_one` peels a single layer.

use pzl_core::{EncryptedLink, PlaintextLink};
use secrecy::SecretString;
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroizing;

use crate::auth::authenticate;
use crate::blob::{combine, split};
use crate::cipher::encipher;
use crate::kdf::derive_key;
use crate::params::CryptoConfig;

/// Per-link lock/unlock scheme used by the codec.
pub trait LinkCipher {
    /// Length of the tag appended to every locked blob.
    fn tag_length(&self) -> usize;

    /// Encipher `payload` under `answer`, returning `(ciphertext, tag)`.
    fn seal(
        &self,
        payload: &[u8],
        answer: &SecretString,
        depth: usize,
    ) -> anyhow::Result<(Vec<u8>, Vec<u8>)>;

    /// Recompute the tag for `ciphertext` under `answer` and, if it equals
    /// `tag`, return the deciphered payload. `None` means the tag did not
    /// authenticate.
    fn open(
        &self,
        ciphertext: &[u8],
        tag: &[u8],
        answer: &SecretString,
        depth: usize,
    ) -> anyhow::Result<Option<Zeroizing<Vec<u8>>>>;
}

impl LinkCipher for CryptoConfig {
    fn tag_length(&self) -> usize {
        self.auth.digest_length
    }

    fn seal(
        &self,
        payload: &[u8],
        answer: &SecretString,
        depth: usize,
    ) -> anyhow::Result<(Vec<u8>, Vec<u8>)> {
        let key = derive_key(answer, &self.kdf, payload.len())?;
        let ciphertext = encipher(payload, &key, self.process_spice(depth))?;
        let tag = authenticate(
            key.as_bytes(),
            &ciphertext,
            &self.auth,
            self.signature_spice(depth),
        )?;
        Ok((ciphertext, tag))
    }

    fn open(
        &self,
        ciphertext: &[u8],
        tag: &[u8],
        answer: &SecretString,
        depth: usize,
    ) -> anyhow::Result<Option<Zeroizing<Vec<u8>>>> {
        let key = derive_key(answer, &self.kdf, ciphertext.len())?;
        let expected = authenticate(
            key.as_bytes(),
            ciphertext,
            &self.auth,
            self.signature_spice(depth),
        )?;
        if !bool::from(expected.ct_eq(tag)) {
            return Ok(None);
        }
        let payload = encipher(ciphertext, &key, self.process_spice(depth))?;
        Ok(Some(Zeroizing::new(payload)))
    }
}

/// Result of trying one answer against one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The answer was right; here is the next link.
    Next(EncryptedLink),
    /// Wrong answer or corrupted data. The two are deliberately not told apart.
    Failure,
}

/// Encrypt a whole plaintext chain.
pub fn encode<C: LinkCipher + ?Sized>(
    chain: PlaintextLink,
    cipher: &C,
) -> anyhow::Result<EncryptedLink> {
    encode_at(chain, cipher, 0)
}

fn encode_at<C: LinkCipher + ?Sized>(
    link: PlaintextLink,
    cipher: &C,
    depth: usize,
) -> anyhow::Result<EncryptedLink> {
    let PlaintextLink { message, next } = link;
    let Some((answer, next)) = next else {
        return Ok(EncryptedLink::terminal(message));
    };

    let inner = encode_at(*next, cipher, depth + 1)?;
    let payload = Zeroizing::new(inner.to_bytes()?);
    let answer = SecretString::from(answer);
    let (ciphertext, tag) = cipher.seal(&payload, &answer, depth)?;
    if tag.len() != cipher.tag_length() {
        anyhow::bail!(
            "cipher produced a {}-byte tag, expected {}",
            tag.len(),
            cipher.tag_length()
        );
    }
    debug!(depth, payload_len = payload.len(), "sealed link");

    Ok(EncryptedLink {
        message,
        locked: Some(combine(&ciphertext, &tag)),
        tag: Some(tag),
    })
}

/// Try `answer` against one locked link.
///
/// The tag check runs before anything looks at the deciphered bytes. Once the
/// tag matches, a payload that is not a valid link means the artifact itself
/// is broken, which is an error rather than a `Failure`.
pub fn decode_one<C: LinkCipher + ?Sized>(
    locked: &[u8],
    tag: &[u8],
    answer: &SecretString,
    cipher: &C,
    depth: usize,
) -> anyhow::Result<Decoded> {
    let (ciphertext, embedded_tag) = split(locked, cipher.tag_length())?;

    // A blob whose trailing tag disagrees with the stored one fails the same
    // way a wrong answer does.
    let consistent = bool::from(embedded_tag.ct_eq(tag));
    let payload = cipher.open(ciphertext, tag, answer, depth)?;

    match payload {
        Some(payload) if consistent => {
            let next = EncryptedLink::from_bytes(&payload)
                .map_err(|e| anyhow::anyhow!("authenticated payload at depth {depth}: {e}"))?;
            debug!(depth, "opened link");
            Ok(Decoded::Next(next))
        }
        _ => {
            debug!(depth, "link did not authenticate");
            Ok(Decoded::Failure)
        }
    }
}

/// Try `answer` against `link`, which must not be terminal.
pub fn open_link<C: LinkCipher + ?Sized>(
    link: &EncryptedLink,
    answer: &SecretString,
    cipher: &C,
    depth: usize,
) -> anyhow::Result<Decoded> {
    match link.lock()? {
        Some((locked, tag)) => decode_one(locked, tag, answer, cipher, depth),
        None => anyhow::bail!("link at depth {depth} is terminal and has nothing to open"),
    }
}
