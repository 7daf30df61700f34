//! Blob fingerprints
//!
//! Provides [`BlobDigest`], a 32-byte Blake3 digest identifying the exact
//! bytes behind an emitted array. Reported next to every artifact so a
//! firmware build can be traced back to the model file it embeds.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte Blake3 digest of a blob
///
/// Immutable and cheap to clone (Copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobDigest([u8; 32]);

impl BlobDigest {
    /// Wrap raw digest bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest the given bytes
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from a byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DigestError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| DigestError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Short form used in log lines (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for BlobDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for BlobDigest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

// Reports carry the digest as a hex string
impl serde::Serialize for BlobDigest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for BlobDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing a digest
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// Invalid digest length
    #[error("invalid digest length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex decoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let a = BlobDigest::compute(b"TFL3 model bytes");
        let b = BlobDigest::compute(b"TFL3 model bytes");
        assert_eq!(a, b);
        assert_ne!(a, BlobDigest::compute(b"TFL3 model bytez"));
    }

    #[test]
    fn digest_display_and_parse() {
        let digest = BlobDigest::compute(&[0x00, 0x01, 0xfe, 0xff]);
        let parsed: BlobDigest = digest.to_string().parse().unwrap();
        assert_eq!(digest, parsed);
    }

    #[test]
    fn digest_from_slice_rejects_wrong_length() {
        let result = BlobDigest::from_slice(&[0u8; 31]);
        assert!(matches!(
            result,
            Err(DigestError::InvalidLength { expected: 32, actual: 31 })
        ));
    }

    #[test]
    fn digest_short_is_prefix() {
        let digest = BlobDigest::compute(b"");
        let short = digest.short();
        assert_eq!(short.len(), 16);
        assert!(digest.to_string().starts_with(&short));
    }

    #[test]
    fn digest_serde_json_is_hex_string() {
        let digest = BlobDigest::compute(b"weights");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{digest}\""));
        let back: BlobDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }
}
