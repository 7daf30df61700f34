//! Error types for emission
//!
//! Provides error handling for:
//! - Reading model blobs (ingress)
//! - Writing rendered arrays and headers (egress)
//! - Loading and validating emission manifests

use blobarray_artifact::{CodecError, SpecError};
use std::path::PathBuf;

/// Errors while emitting one artifact
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// Rendering failed (invalid spec, unreadable stream, oversized blob)
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// IO error reading the model blob
    #[error("io error reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destination could not be written; any previous file is untouched
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Batch was cancelled before the destination was opened
    #[error("cancelled before writing {path}")]
    Cancelled { path: PathBuf },
}

impl EmitError {
    /// Create read error for path
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create write error for path
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// True when the caller supplied an unusable spec
    #[must_use]
    pub fn is_invalid_spec(&self) -> bool {
        matches!(self, Self::Codec(e) if e.is_invalid_spec())
    }
}

impl From<SpecError> for EmitError {
    fn from(err: SpecError) -> Self {
        Self::Codec(CodecError::InvalidSpec(err))
    }
}

/// Errors while loading an emission manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// IO error reading the manifest
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid TOML or has unknown fields
    #[error("invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A target's spec failed validation
    #[error("target #{index} ('{symbol}'): {source}")]
    InvalidTarget {
        index: usize,
        symbol: String,
        #[source]
        source: SpecError,
    },

    /// Header guard is not an identifier
    #[error("invalid header guard: {0}")]
    InvalidGuard(#[source] SpecError),

    /// Group title would not fit on one comment line
    #[error("target #{index}: group title {title:?} must be a single line")]
    InvalidGroup { index: usize, title: String },

    /// Two targets declare the same symbol, counting `_len` constants
    #[error("symbol '{0}' is declared by more than one target")]
    DuplicateSymbol(String),

    /// Two outputs (targets or header) share a destination
    #[error("destination {0} is written by more than one output")]
    DuplicateDestination(PathBuf),

    /// Manifest lists no targets
    #[error("manifest declares no targets")]
    NoTargets,
}
