//! Binary blobs
//!
//! The opaque byte buffer handed over by a model compiler. The codec never
//! looks inside it beyond the optional flatbuffer file identifier, which is
//! only used for diagnostics.

use crate::digest::BlobDigest;

/// Offset of the flatbuffer file identifier (after the root table offset)
const FILE_IDENTIFIER_OFFSET: usize = 4;

/// Immutable, ordered sequence of bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryBlob(Vec<u8>);

impl BinaryBlob {
    /// Create from byte vector
    #[inline]
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Get reference to bytes
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to bytes (consumes self)
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Get blob length
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Blake3 digest of the contents
    #[inline]
    #[must_use]
    pub fn digest(&self) -> BlobDigest {
        BlobDigest::compute(&self.0)
    }

    /// Flatbuffer file identifier, if the blob looks like one
    ///
    /// TFLite models carry `TFL3` at bytes 4..8. Returns `None` when the
    /// blob is too short or the four bytes are not printable ASCII.
    #[must_use]
    pub fn file_identifier(&self) -> Option<&str> {
        let ident = self
            .0
            .get(FILE_IDENTIFIER_OFFSET..FILE_IDENTIFIER_OFFSET + 4)?;
        if ident.iter().all(u8::is_ascii_graphic) {
            std::str::from_utf8(ident).ok()
        } else {
            None
        }
    }
}

impl AsRef<[u8]> for BinaryBlob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for BinaryBlob {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for BinaryBlob {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for BinaryBlob {
    fn from(data: [u8; N]) -> Self {
        Self::new(data.to_vec())
    }
}
