//! Outcome identity digest
//!
//! A published outcome carries a Blake3 digest of its own canonical JSON
//! form. Two publishes from identical inputs produce identical digests,
//! which is how republish idempotence is checked without field-by-field
//! comparison.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// Blake3 digest of an outcome's canonical JSON form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutcomeDigest([u8; 32]);

impl OutcomeDigest {
    /// Digest a serializable value through its canonical JSON encoding
    ///
    /// Canonical means: map fields are `BTreeMap`-backed (sorted keys) and
    /// the encoding is compact. Callers are responsible for using ordered
    /// map types in the hashed structure.
    ///
    /// # Errors
    /// Returns [`DigestError`] if serialization fails.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, DigestError> {
        let canonical = serde_json::to_vec(value)?;
        Ok(Self(*blake3::hash(&canonical).as_bytes()))
    }

    /// Raw digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex form for logs (first 8 bytes)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for OutcomeDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl serde::Serialize for OutcomeDigest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for OutcomeDigest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("digest must be 32 bytes"))?;
        Ok(Self(arr))
    }
}

/// Errors raised while computing a digest
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// Value could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn digest_is_deterministic() {
        let value = BTreeMap::from([("b", 2), ("a", 1)]);
        let first = OutcomeDigest::of(&value).unwrap();
        let second = OutcomeDigest::of(&value).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn digest_changes_with_content() {
        let a = OutcomeDigest::of(&"one").unwrap();
        let b = OutcomeDigest::of(&"two").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn digest_hex_display() {
        let digest = OutcomeDigest::of(&42).unwrap();
        assert_eq!(digest.to_string().len(), 64);
        assert_eq!(digest.short().len(), 16);
        assert!(digest.to_string().starts_with(&digest.short()));
    }

    #[test]
    fn digest_serde_round_trip() {
        let digest = OutcomeDigest::of(&"payload").unwrap();
        let json = serde_json::to_string(&digest).unwrap();
        let decoded: OutcomeDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, digest);
    }

    #[test]
    fn digest_rejects_bad_hex() {
        assert!(serde_json::from_str::<OutcomeDigest>("\"zz\"").is_err());
        assert!(serde_json::from_str::<OutcomeDigest>("\"abcd\"").is_err());
    }
}
