//! blobarray emission layer
//!
//! The boundary between rendered arrays and the file system.
//!
//! # Core Operations
//!
//! - **Write**: persist an [`EmittedArtifact`](blobarray_artifact::EmittedArtifact)
//!   atomically, preceded by an optional [`Preamble`]
//! - **Header**: render and persist the shared [`HeaderFile`]
//! - **Batch**: plan a TOML [`Manifest`] and run it with [`BatchRunner`]
//!
//! # Architecture
//!
//! ```text
//! Manifest → plan (validate all specs) → BatchRunner
//!                                           ├─ read blob → ArrayCodec → EmissionWriter → file
//!                                           └─ HeaderFile → EmissionWriter → header
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use blobarray_artifact::{ArraySpec, BinaryBlob};
//! use blobarray_emit::{EmissionWriter, Preamble};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let blob = BinaryBlob::new(std::fs::read("sine_model.tflite")?);
//! let spec = ArraySpec::new("g_model")?;
//! let report = EmissionWriter::new()
//!     .with_preamble(Preamble::include("model.h"))
//!     .emit(&blob, &spec, "model.cpp")?;
//! println!("{} bytes written to {}", report.bytes_written, report.path.display());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod batch;
pub mod error;
pub mod header;
pub mod manifest;
pub mod writer;

// Re-exports for convenience
pub use batch::{
    BatchPolicy, BatchReport, BatchRunner, BatchSummary, CancelToken, Execution, HeaderOutcome,
    TargetOutcome,
};
pub use error::{EmitError, ManifestError};
pub use header::HeaderFile;
pub use manifest::{EmissionPlan, Manifest, PlannedTarget};
pub use writer::{EmissionReport, EmissionWriter, Preamble, WriteReceipt};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
