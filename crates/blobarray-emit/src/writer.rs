//! Emission writer
//!
//! Persists rendered text with write-then-rename: the content goes to a
//! temporary file in the destination's directory, is synced, and only then
//! replaces the destination. A failed write leaves any previous file intact
//! and the temporary file is removed when its handle drops.

use crate::batch::CancelToken;
use crate::error::EmitError;
use crate::header::HeaderFile;
use blobarray_artifact::{
    ArrayCodec, ArraySpec, BinaryBlob, BlobDigest, EmittedArtifact, SymbolName,
};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Text written ahead of the rendered array
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Preamble {
    /// Nothing before the declaration
    #[default]
    None,
    /// `#include "<header>"` followed by a blank line
    Include(String),
    /// Caller-supplied text, written verbatim
    Raw(String),
}

impl Preamble {
    /// Include line for a shared header
    #[must_use]
    pub fn include(header: impl Into<String>) -> Self {
        Self::Include(header.into())
    }

    /// Verbatim text
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    /// Rendered preamble text
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::None => Cow::Borrowed(""),
            Self::Include(header) => Cow::Owned(format!("#include \"{header}\"\n\n")),
            Self::Raw(text) => Cow::Borrowed(text),
        }
    }
}

/// Outcome of writing one array artifact
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EmissionReport {
    /// Array symbol
    pub symbol: SymbolName,
    /// Destination that now holds the artifact
    pub path: PathBuf,
    /// Bytes of source text written, preamble included
    pub bytes_written: u64,
    /// Length of the embedded blob
    pub blob_len: u64,
    /// Digest of the embedded blob
    pub digest: BlobDigest,
}

/// Outcome of writing a plain text file such as a shared header
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WriteReceipt {
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// Writes artifacts to their destinations
#[derive(Debug, Clone, Default)]
pub struct EmissionWriter {
    preamble: Preamble,
}

impl EmissionWriter {
    /// Writer without preamble
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preamble written before every artifact
    #[must_use]
    pub fn with_preamble(mut self, preamble: Preamble) -> Self {
        self.preamble = preamble;
        self
    }

    /// Current preamble
    #[must_use]
    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    /// Persist an artifact to its destination
    ///
    /// # Errors
    /// Returns [`EmitError::Write`] if the destination cannot be replaced
    pub fn write(&self, artifact: &EmittedArtifact) -> Result<EmissionReport, EmitError> {
        let preamble = self.preamble.text();
        let receipt = write_atomic(
            artifact.destination(),
            &[preamble.as_ref(), artifact.source_text()],
        )?;

        tracing::info!(
            symbol = %artifact.symbol(),
            path = %receipt.path.display(),
            bytes_written = receipt.bytes_written,
            blob_len = artifact.declared_len(),
            digest = %artifact.digest().short(),
            "emitted array"
        );
        Ok(EmissionReport {
            symbol: artifact.symbol().clone(),
            path: receipt.path,
            bytes_written: receipt.bytes_written,
            blob_len: artifact.declared_len(),
            digest: artifact.digest(),
        })
    }

    /// Persist an artifact unless `cancel` has been raised
    ///
    /// The token is checked once, right before the destination is opened. A
    /// write that has started always runs to completion.
    ///
    /// # Errors
    /// - [`EmitError::Cancelled`] with the destination untouched
    /// - otherwise as [`EmissionWriter::write`]
    pub fn write_unless_cancelled(
        &self,
        artifact: &EmittedArtifact,
        cancel: &CancelToken,
    ) -> Result<EmissionReport, EmitError> {
        if cancel.is_cancelled() {
            return Err(EmitError::Cancelled {
                path: artifact.destination().to_path_buf(),
            });
        }
        self.write(artifact)
    }

    /// Render a materialized blob and write it
    ///
    /// # Errors
    /// Codec errors are returned before any file is opened
    pub fn emit(
        &self,
        blob: &BinaryBlob,
        spec: &ArraySpec,
        destination: impl Into<PathBuf>,
    ) -> Result<EmissionReport, EmitError> {
        let artifact = ArrayCodec::emit(blob, spec, destination)?;
        self.write(&artifact)
    }

    /// Stream a model file through the codec and write the result
    ///
    /// The input is rendered completely before the destination is touched,
    /// so a truncated or unreadable input never replaces an existing file.
    ///
    /// # Errors
    /// - [`EmitError::Read`] if the input cannot be opened
    /// - [`EmitError::Codec`] if it cannot be read to completion
    /// - [`EmitError::Write`] if the destination cannot be replaced
    pub fn emit_file(
        &self,
        input: &Path,
        spec: &ArraySpec,
        destination: impl Into<PathBuf>,
    ) -> Result<EmissionReport, EmitError> {
        let file = File::open(input).map_err(|e| EmitError::read_error(input, e))?;
        let metadata = file
            .metadata()
            .map_err(|e| EmitError::read_error(input, e))?;
        // pipes, character devices and procfs entries report a length of 0
        let expected_len = metadata.is_file().then(|| metadata.len());
        let artifact =
            ArrayCodec::emit_reader(BufReader::new(file), expected_len, spec, destination)?;
        self.write(&artifact)
    }

    /// Persist a shared header; the preamble does not apply
    ///
    /// # Errors
    /// Returns [`EmitError::Write`] if the header cannot be replaced
    pub fn write_header(&self, header: &HeaderFile) -> Result<WriteReceipt, EmitError> {
        let text = header.render();
        let receipt = write_atomic(header.path(), &[text.as_str()])?;
        tracing::info!(
            path = %receipt.path.display(),
            symbols = header.len(),
            "emitted header"
        );
        Ok(receipt)
    }
}

/// Write `parts` to `path` through a synced temporary sibling
fn write_atomic(path: &Path, parts: &[&str]) -> Result<WriteReceipt, EmitError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let fail = |e: std::io::Error| EmitError::write_error(path, e);

    let mut tmp = tempfile::Builder::new()
        .prefix(".blobarray-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(fail)?;

    let mut bytes_written = 0u64;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        for part in parts {
            out.write_all(part.as_bytes()).map_err(fail)?;
            bytes_written += part.len() as u64;
        }
        out.flush().map_err(fail)?;
    }
    tmp.as_file().sync_all().map_err(fail)?;
    publish_permissions(tmp.path(), path).map_err(fail)?;

    tmp.persist(path).map_err(|e| fail(e.error))?;
    tracing::debug!(path = %path.display(), bytes_written, "replaced destination");

    Ok(WriteReceipt {
        path: path.to_path_buf(),
        bytes_written,
    })
}

/// Temporary files are created owner-only; give the result normal source permissions
#[cfg(unix)]
fn publish_permissions(tmp: &Path, destination: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = match fs::metadata(destination) {
        Ok(meta) if meta.is_file() => meta.permissions(),
        _ => fs::Permissions::from_mode(0o644),
    };
    fs::set_permissions(tmp, permissions)
}

#[cfg(not(unix))]
fn publish_permissions(_tmp: &Path, _destination: &Path) -> std::io::Result<()> {
    Ok(())
}
