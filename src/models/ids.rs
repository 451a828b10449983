//! Record identifiers and content fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Player identifier.
pub type PlayerId = i64;

/// Match identifier. Assigned in creation order, so it doubles as the final
/// chronological tie-break.
pub type MatchId = i64;

/// Tournament identifier.
pub type TournamentId = i64;

/// SHA256 digest of a derived document's content.
///
/// Two recalculations over the same inputs produce the same fingerprint,
/// which lets a sweep tell drifted caches from up-to-date ones.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash a sequence of byte fields. Each field is prefixed with its
    /// length, so no two different field lists share an encoding.
    pub fn generate(fields: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for field in fields {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Fingerprint of a serializable value's canonical JSON encoding.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self::generate(&[&bytes]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}
