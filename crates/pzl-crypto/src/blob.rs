//! Locked blob layout
//!
//! ```text
//! [N bytes: ciphertext][digest_length bytes: tag]
//! ```

/// Append `tag` to `ciphertext`.
pub fn combine(ciphertext: &[u8], tag: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(ciphertext.len() + tag.len());
    blob.extend_from_slice(ciphertext);
    blob.extend_from_slice(tag);
    blob
}

/// Split a locked blob into `(ciphertext, tag)`.
///
/// A blob shorter than the digest length cannot have come from `combine`
/// with these parameters, so it is reported as a malformed artifact rather
/// than as a wrong answer.
pub fn split(blob: &[u8], digest_length: usize) -> anyhow::Result<(&[u8], &[u8])> {
    if blob.len() < digest_length {
        anyhow::bail!(
            "locked blob too short: {} bytes (digest length {})",
            blob.len(),
            digest_length
        );
    }
    Ok(blob.split_at(blob.len() - digest_length))
}
