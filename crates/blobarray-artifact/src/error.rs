//! Error types for the array codec
//!
//! - [`SpecError`]: an [`ArraySpec`](crate::ArraySpec) that cannot be honoured
//! - [`CodecError`]: rendering or decoding failures

/// Reasons an array spec is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    /// Symbol name is empty
    #[error("symbol name is empty")]
    EmptySymbol,

    /// Symbol name is not a C/C++ identifier
    #[error("symbol name '{0}' is not a valid identifier")]
    InvalidSymbol(String),

    /// Symbol name is a reserved keyword
    #[error("symbol name '{0}' is a reserved keyword")]
    ReservedSymbol(String),

    /// Alignment is zero, not a power of two, or above the supported bound
    #[error("alignment {value} must be a power of two between 1 and {max}")]
    InvalidAlignment { value: u64, max: u32 },

    /// Line width of zero
    #[error("bytes per line must be at least 1, got {0}")]
    InvalidLineWidth(usize),

    /// Unknown host dialect name
    #[error("unknown host dialect '{0}' (expected cpp, c11 or gnu)")]
    UnknownDialect(String),
}

/// Errors raised while rendering or decoding an array
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Spec failed validation; nothing was rendered
    #[error("invalid array spec: {0}")]
    InvalidSpec(#[from] SpecError),

    /// Streaming source could not be read to completion
    #[error("encoding failed after {read} bytes: {source}")]
    Encoding {
        read: u64,
        #[source]
        source: std::io::Error,
    },

    /// Blob length does not fit the `int` length constant
    #[error("blob of {len} bytes exceeds the {max} byte limit of the length constant")]
    BlobTooLarge { len: u64, max: u64 },

    /// Source text is not a well-formed emitted array
    #[error("malformed array source at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

impl CodecError {
    /// Create encoding error for a stream that failed after `read` bytes
    pub fn encoding(read: u64, source: std::io::Error) -> Self {
        Self::Encoding { read, source }
    }

    /// Create malformed-source error for a 1-based line number
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }

    /// True for caller errors that must be fixed rather than retried
    #[must_use]
    pub fn is_invalid_spec(&self) -> bool {
        matches!(self, Self::InvalidSpec(_))
    }
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
