//! blobarray artifact codec
//!
//! Turns an opaque model blob into a host-language constant array that a
//! firmware build can link in directly.
//!
//! # Core Concepts
//!
//! - [`BinaryBlob`]: Immutable byte buffer produced by a model compiler
//! - [`ArraySpec`]: Validated symbol, alignment, line width and dialect
//! - [`ArrayCodec`]: Pure, deterministic renderer
//! - [`EmittedArtifact`]: Rendered text bound to its destination file
//! - [`decode`]: Strict parser used to verify emitted files
//!
//! # Example
//!
//! ```rust
//! use blobarray_artifact::{ArrayCodec, ArraySpec, BinaryBlob};
//!
//! let blob = BinaryBlob::new(vec![0x00, 0x01, 0xfe, 0xff]);
//! let spec = ArraySpec::new("g_model")?;
//! let artifact = ArrayCodec::emit(&blob, &spec, "model.cpp")?;
//!
//! assert!(artifact.source_text().contains("    0x00, 0x01, 0xfe, 0xff,\n"));
//! assert!(artifact.source_text().ends_with("const int g_model_len = 4;\n"));
//! # Ok::<(), blobarray_artifact::CodecError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod artifact;
mod blob;
mod codec;
mod decode;
mod digest;
mod error;
mod spec;
mod symbol;

// Re-exports
pub use artifact::EmittedArtifact;
pub use blob::BinaryBlob;
pub use codec::{ArrayCodec, BODY_INDENT, MAX_BLOB_LEN};
pub use decode::{decode, DecodedArray, Mismatch};
pub use digest::{BlobDigest, DigestError};
pub use error::{CodecError, CodecResult, SpecError};
pub use spec::{
    Alignment, ArraySpec, HostDialect, DEFAULT_ALIGNMENT, DEFAULT_BYTES_PER_LINE, MAX_ALIGNMENT,
};
pub use symbol::{SymbolName, LEN_SUFFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
