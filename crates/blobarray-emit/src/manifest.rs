//! Emission manifests
//!
//! A manifest describes a batch of arrays in TOML, typically the float32
//! and int8 variants of several models plus the header declaring them:
//!
//! ```toml
//! [defaults]
//! alignment = 8
//! bytes_per_line = 12
//!
//! [header]
//! path = "model.h"
//!
//! [[target]]
//! symbol = "g_sine_model_int8"
//! input = "sine_model_int8.tflite"
//! output = "sine_model_int8.cpp"
//! group = "Sine models"
//! ```
//!
//! [`Manifest::plan`] validates everything up front; no file is read or
//! written for a manifest that does not plan cleanly.

use crate::error::ManifestError;
use crate::header::HeaderFile;
use crate::writer::Preamble;
use blobarray_artifact::{ArraySpec, HostDialect, SpecError, SymbolName};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Raw manifest document
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub defaults: TargetDefaults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderSection>,
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetEntry>,
}

/// Settings applied to every target unless overridden
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDefaults {
    pub alignment: Option<u64>,
    pub bytes_per_line: Option<usize>,
    pub dialect: Option<HostDialect>,
    /// Header to `#include`; empty string means no preamble
    pub include: Option<String>,
}

/// Shared header to generate
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderSection {
    pub path: PathBuf,
    pub guard: Option<String>,
}

/// One blob to render
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetEntry {
    pub symbol: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub group: Option<String>,
    pub alignment: Option<u64>,
    pub bytes_per_line: Option<usize>,
    pub dialect: Option<HostDialect>,
    pub include: Option<String>,
}

/// Validated target with resolved paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTarget {
    pub spec: ArraySpec,
    pub input: PathBuf,
    pub output: PathBuf,
    pub preamble: Preamble,
    pub group: Option<String>,
}

/// Validated batch, ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionPlan {
    targets: Vec<PlannedTarget>,
    header: Option<HeaderFile>,
}

impl EmissionPlan {
    /// Targets in manifest order
    #[must_use]
    pub fn targets(&self) -> &[PlannedTarget] {
        &self.targets
    }

    /// Header declaring every target, if requested
    #[must_use]
    pub fn header(&self) -> Option<&HeaderFile> {
        self.header.as_ref()
    }
}

impl Manifest {
    /// Parse manifest text
    ///
    /// `origin` is only used in error messages.
    ///
    /// # Errors
    /// Returns [`ManifestError::Parse`] on invalid TOML or unknown fields
    pub fn parse(text: &str, origin: &Path) -> Result<Self, ManifestError> {
        toml::from_str(text).map_err(|source| ManifestError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read, parse and plan a manifest file
    ///
    /// Relative paths resolve against the manifest's directory.
    ///
    /// # Errors
    /// Any [`ManifestError`]
    pub fn load(path: &Path) -> Result<EmissionPlan, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, path)?.plan(base)
    }

    /// Validate every target and resolve paths against `base_dir`
    ///
    /// # Errors
    /// - [`ManifestError::InvalidTarget`] for the first target whose spec is rejected
    /// - [`ManifestError::DuplicateSymbol`] / [`ManifestError::DuplicateDestination`]
    /// - [`ManifestError::NoTargets`] for an empty manifest
    pub fn plan(&self, base_dir: &Path) -> Result<EmissionPlan, ManifestError> {
        if self.targets.is_empty() {
            return Err(ManifestError::NoTargets);
        }

        let mut header = match &self.header {
            Some(section) => {
                let header = HeaderFile::new(normalize(&base_dir.join(&section.path)));
                Some(match &section.guard {
                    Some(guard) => header.with_guard(guard).map_err(ManifestError::InvalidGuard)?,
                    None => header,
                })
            }
            None => None,
        };
        let default_include = self.defaults.include.clone().or_else(|| {
            self.header
                .as_ref()
                .and_then(|h| h.path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
        });

        let mut symbols = HashSet::new();
        let mut destinations = HashSet::new();
        if let Some(header) = &header {
            destinations.insert(header.path().to_path_buf());
        }

        let mut targets = Vec::with_capacity(self.targets.len());
        for (index, entry) in self.targets.iter().enumerate() {
            let spec = self
                .target_spec(entry)
                .map_err(|source| ManifestError::InvalidTarget {
                    index,
                    symbol: entry.symbol.clone(),
                    source,
                })?;
            // an array and a length constant may not share a name either
            for name in [spec.symbol().to_string(), spec.symbol().len_symbol()] {
                if !symbols.insert(name.clone()) {
                    return Err(ManifestError::DuplicateSymbol(name));
                }
            }
            if let Some(title) = entry.group.as_deref().filter(|t| t.contains(['\n', '\r'])) {
                return Err(ManifestError::InvalidGroup {
                    index,
                    title: title.to_string(),
                });
            }
            let output = normalize(&base_dir.join(&entry.output));
            if !destinations.insert(output.clone()) {
                return Err(ManifestError::DuplicateDestination(output));
            }

            let preamble = match entry.include.as_ref().or(default_include.as_ref()) {
                Some(include) if !include.is_empty() => Preamble::include(include.clone()),
                _ => Preamble::None,
            };
            if let Some(header) = header.as_mut() {
                header.declare(entry.group.as_deref(), spec.symbol().clone());
            }
            targets.push(PlannedTarget {
                spec,
                input: normalize(&base_dir.join(&entry.input)),
                output,
                preamble,
                group: entry.group.clone(),
            });
        }

        Ok(EmissionPlan { targets, header })
    }

    fn target_spec(&self, entry: &TargetEntry) -> Result<ArraySpec, SpecError> {
        let mut spec = ArraySpec::from_symbol(SymbolName::new(entry.symbol.as_str())?);
        if let Some(alignment) = entry.alignment.or(self.defaults.alignment) {
            spec = spec.with_alignment(alignment)?;
        }
        if let Some(width) = entry.bytes_per_line.or(self.defaults.bytes_per_line) {
            spec = spec.with_bytes_per_line(width)?;
        }
        if let Some(dialect) = entry.dialect.or(self.defaults.dialect) {
            spec = spec.with_dialect(dialect);
        }
        Ok(spec)
    }
}

/// Lexically drop `.` components and fold `dir/..` pairs
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}
