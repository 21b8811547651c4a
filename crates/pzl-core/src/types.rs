use serde::{Deserialize, Serialize};

use crate::error::{PzlError, PzlResult};

/// One link of a puzzle chain before encryption.
///
/// The answer and the link it unlocks travel together, so a link either has
/// both or neither. The last link of a chain is the final message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaintextLink {
    pub message: String,
    /// Answer to `message` and the link it unlocks (`None` for the final message)
    pub next: Option<(String, Box<PlaintextLink>)>,
}

impl PlaintextLink {
    /// A final message with nothing behind it.
    pub fn terminal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            next: None,
        }
    }

    /// A question whose `answer` unlocks `next`.
    pub fn locked(message: impl Into<String>, answer: impl Into<String>, next: PlaintextLink) -> Self {
        Self {
            message: message.into(),
            next: Some((answer.into(), Box::new(next))),
        }
    }

    /// Fold a flat `[m0, a0, m1, a1, ..., mN]` list into a chain.
    ///
    /// The list must have odd length: every question is followed by its
    /// answer and the list ends with the final message.
    pub fn from_list<S: AsRef<str>>(items: &[S]) -> PzlResult<Self> {
        if items.len() % 2 == 0 {
            return Err(PzlError::InvalidChainLength(items.len()));
        }
        let (last, rest) = items
            .split_last()
            .ok_or(PzlError::InvalidChainLength(0))?;

        let mut link = Self::terminal(last.as_ref());
        for pair in rest.rchunks_exact(2) {
            link = Self::locked(pair[0].as_ref(), pair[1].as_ref(), link);
        }
        Ok(link)
    }

    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }

    pub fn answer(&self) -> Option<&str> {
        self.next.as_ref().map(|(answer, _)| answer.as_str())
    }

    /// Number of links, final message included.
    pub fn len(&self) -> usize {
        let mut count = 1;
        let mut cur = self;
        while let Some((_, next)) = &cur.next {
            count += 1;
            cur = next;
        }
        count
    }

    /// Always false: a chain holds at least its final message.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// One link of an encrypted chain, as persisted in a puzzle artifact.
///
/// `locked` holds the enciphered serialization of the next link followed by
/// its authentication tag; `tag` repeats that tag. A link without `locked`
/// is terminal and its message is readable without any answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedLink {
    pub message: String,
    #[serde(default, with = "crate::b64::option", skip_serializing_if = "Option::is_none")]
    pub locked: Option<Vec<u8>>,
    #[serde(default, with = "crate::b64::option", skip_serializing_if = "Option::is_none")]
    pub tag: Option<Vec<u8>>,
}

impl EncryptedLink {
    pub fn terminal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locked: None,
            tag: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.locked.is_none() && self.tag.is_none()
    }

    /// The `(locked, tag)` pair guarding the next link, if any.
    ///
    /// A link carrying only one of the two fields is malformed.
    pub fn lock(&self) -> PzlResult<Option<(&[u8], &[u8])>> {
        match (&self.locked, &self.tag) {
            (Some(locked), Some(tag)) => Ok(Some((locked, tag))),
            (None, None) => Ok(None),
            _ => Err(PzlError::Artifact(
                "link has only one of `locked` and `tag`".into(),
            )),
        }
    }

    /// Serialize to JSON bytes (the form that gets enciphered by the outer link)
    pub fn to_bytes(&self) -> PzlResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| PzlError::Artifact(format!("link serialization: {e}")))
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(data: &[u8]) -> PzlResult<Self> {
        serde_json::from_slice(data)
            .map_err(|e| PzlError::Artifact(format!("link deserialization: {e}")))
    }
}
