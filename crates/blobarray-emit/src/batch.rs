//! Batch emission
//!
//! Runs every target of an [`EmissionPlan`] and then the shared header.
//! Targets touch distinct files, so they may run on the rayon pool; a
//! [`CancelToken`] lets a failure stop targets that have not opened their
//! destination yet.

use crate::error::EmitError;
use crate::manifest::{EmissionPlan, PlannedTarget};
use crate::writer::{EmissionReport, EmissionWriter, WriteReceipt};
use blobarray_artifact::{ArrayCodec, BinaryBlob, SymbolName};
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What to do after a target fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Skip every target that has not started writing
    #[default]
    AbortOnError,
    /// Attempt every target regardless
    Continue,
}

/// How targets are scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Execution {
    #[default]
    Sequential,
    /// One target per rayon task
    Parallel,
}

/// Shared flag checked before each destination is opened
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one target
#[derive(Debug)]
pub enum TargetOutcome {
    Written(EmissionReport),
    Failed {
        symbol: SymbolName,
        output: PathBuf,
        error: EmitError,
    },
    Skipped {
        symbol: SymbolName,
        output: PathBuf,
    },
}

impl TargetOutcome {
    #[must_use]
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }

    #[must_use]
    pub fn symbol(&self) -> &SymbolName {
        match self {
            Self::Written(report) => &report.symbol,
            Self::Failed { symbol, .. } | Self::Skipped { symbol, .. } => symbol,
        }
    }
}

/// Result of the shared header step
#[derive(Debug)]
pub enum HeaderOutcome {
    /// Plan has no header
    NotRequested,
    Written(WriteReceipt),
    Failed(EmitError),
    /// Not written because a target did not succeed
    Skipped,
}

/// Everything a batch did
#[derive(Debug)]
pub struct BatchReport {
    pub targets: Vec<TargetOutcome>,
    pub header: HeaderOutcome,
}

impl BatchReport {
    /// True when every target and the header (if any) were written
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.targets.iter().all(TargetOutcome::is_written)
            && matches!(
                self.header,
                HeaderOutcome::NotRequested | HeaderOutcome::Written(_)
            )
    }

    /// Failed targets and their errors
    pub fn failures(&self) -> impl Iterator<Item = (&SymbolName, &EmitError)> {
        self.targets.iter().filter_map(|outcome| match outcome {
            TargetOutcome::Failed { symbol, error, .. } => Some((symbol, error)),
            _ => None,
        })
    }

    /// Serializable summary for machine-readable output
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        let targets = self
            .targets
            .iter()
            .map(|outcome| match outcome {
                TargetOutcome::Written(report) => TargetSummary {
                    symbol: report.symbol.to_string(),
                    output: report.path.clone(),
                    status: "written",
                    bytes_written: Some(report.bytes_written),
                    blob_len: Some(report.blob_len),
                    digest: Some(report.digest.to_string()),
                    error: None,
                },
                TargetOutcome::Failed {
                    symbol,
                    output,
                    error,
                } => TargetSummary {
                    symbol: symbol.to_string(),
                    output: output.clone(),
                    status: "failed",
                    bytes_written: None,
                    blob_len: None,
                    digest: None,
                    error: Some(error.to_string()),
                },
                TargetOutcome::Skipped { symbol, output } => TargetSummary {
                    symbol: symbol.to_string(),
                    output: output.clone(),
                    status: "skipped",
                    bytes_written: None,
                    blob_len: None,
                    digest: None,
                    error: None,
                },
            })
            .collect();
        let header = match &self.header {
            HeaderOutcome::NotRequested => None,
            HeaderOutcome::Written(receipt) => Some(HeaderSummary {
                status: "written",
                path: Some(receipt.path.clone()),
                error: None,
            }),
            HeaderOutcome::Failed(error) => Some(HeaderSummary {
                status: "failed",
                path: None,
                error: Some(error.to_string()),
            }),
            HeaderOutcome::Skipped => Some(HeaderSummary {
                status: "skipped",
                path: None,
                error: None,
            }),
        };
        BatchSummary {
            succeeded: self.succeeded(),
            targets,
            header,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchSummary {
    pub succeeded: bool,
    pub targets: Vec<TargetSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderSummary>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TargetSummary {
    pub symbol: String,
    pub output: PathBuf,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_written: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_len: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HeaderSummary {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs emission plans
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    policy: BatchPolicy,
    execution: Execution,
    cancel: CancelToken,
}

impl BatchRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Share an externally controlled cancellation flag
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for cancelling the batch from elsewhere
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Emit every target, then the header if all targets were written
    pub fn run(&self, plan: &EmissionPlan) -> BatchReport {
        tracing::info!(
            targets = plan.targets().len(),
            policy = ?self.policy,
            execution = ?self.execution,
            "starting batch"
        );

        let targets: Vec<TargetOutcome> = match self.execution {
            Execution::Sequential => plan
                .targets()
                .iter()
                .map(|target| self.run_target(target))
                .collect(),
            Execution::Parallel => plan
                .targets()
                .par_iter()
                .map(|target| self.run_target(target))
                .collect(),
        };

        let header = match plan.header() {
            None => HeaderOutcome::NotRequested,
            Some(_) if !targets.iter().all(TargetOutcome::is_written) => {
                tracing::warn!("header not written because targets failed");
                HeaderOutcome::Skipped
            }
            Some(header) => match EmissionWriter::new().write_header(header) {
                Ok(receipt) => HeaderOutcome::Written(receipt),
                Err(error) => {
                    tracing::warn!(%error, "header failed");
                    HeaderOutcome::Failed(error)
                }
            },
        };

        let report = BatchReport { targets, header };
        tracing::info!(succeeded = report.succeeded(), "batch finished");
        report
    }

    fn run_target(&self, target: &PlannedTarget) -> TargetOutcome {
        let symbol = target.spec.symbol().clone();
        let skipped = || {
            tracing::warn!(%symbol, "skipped, batch cancelled");
            TargetOutcome::Skipped {
                symbol: symbol.clone(),
                output: target.output.clone(),
            }
        };

        if self.cancel.is_cancelled() {
            return skipped();
        }

        let blob = match fs::read(&target.input) {
            Ok(bytes) => BinaryBlob::new(bytes),
            Err(e) => return self.fail(target, EmitError::read_error(&target.input, e)),
        };
        match blob.file_identifier() {
            Some(ident) => tracing::debug!(%symbol, ident, len = blob.len(), "loaded model"),
            None => tracing::debug!(%symbol, len = blob.len(), "loaded blob without file identifier"),
        }

        let artifact = match ArrayCodec::emit(&blob, &target.spec, &target.output) {
            Ok(artifact) => artifact,
            Err(e) => return self.fail(target, e.into()),
        };

        let writer = EmissionWriter::new().with_preamble(target.preamble.clone());
        match writer.write_unless_cancelled(&artifact, &self.cancel) {
            Ok(report) => TargetOutcome::Written(report),
            Err(EmitError::Cancelled { .. }) => skipped(),
            Err(e) => self.fail(target, e),
        }
    }

    fn fail(&self, target: &PlannedTarget, error: EmitError) -> TargetOutcome {
        tracing::warn!(symbol = %target.spec.symbol(), %error, "target failed");
        if self.policy == BatchPolicy::AbortOnError {
            self.cancel.cancel();
        }
        TargetOutcome::Failed {
            symbol: target.spec.symbol().clone(),
            output: target.output.clone(),
            error,
        }
    }
}
