//! Emitted artifacts
//!
//! An [`EmittedArtifact`] is the rendered source text for one blob, bound to
//! the file it is meant for. It can only be produced by
//! [`ArrayCodec`](crate::ArrayCodec), so holding one proves its [`ArraySpec`](crate::ArraySpec) was
//! validated before any file is touched.

use crate::digest::BlobDigest;
use crate::symbol::SymbolName;
use std::path::{Path, PathBuf};

/// Rendered array source bound to a destination
///
/// # Invariants
/// - `declared_len` equals the length of the rendered blob
/// - `digest` is the Blake3 digest of the rendered blob
/// - Immutable after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedArtifact {
    symbol: SymbolName,
    source_text: String,
    declared_len: u64,
    digest: BlobDigest,
    destination: PathBuf,
}

impl EmittedArtifact {
    pub(crate) fn new(
        symbol: SymbolName,
        source_text: String,
        declared_len: u64,
        digest: BlobDigest,
        destination: PathBuf,
    ) -> Self {
        Self {
            symbol,
            source_text,
            declared_len,
            digest,
            destination,
        }
    }

    /// Array symbol
    #[inline]
    #[must_use]
    pub fn symbol(&self) -> &SymbolName {
        &self.symbol
    }

    /// Rendered declaration text
    #[inline]
    #[must_use]
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Blob length written into the `_len` constant
    #[inline]
    #[must_use]
    pub fn declared_len(&self) -> u64 {
        self.declared_len
    }

    /// Digest of the blob behind the array
    #[inline]
    #[must_use]
    pub fn digest(&self) -> BlobDigest {
        self.digest
    }

    /// Where the artifact is to be written
    #[inline]
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Same artifact bound to another destination
    #[must_use]
    pub fn retarget(self, destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            ..self
        }
    }
}
