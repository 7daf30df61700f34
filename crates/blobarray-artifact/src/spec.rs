//! Array rendering configuration
//!
//! [`ArraySpec`] replaces the literals the export scripts used to repeat
//! (symbol, `alignas(8)`, 12 bytes per line). Every setter validates, so a
//! constructed spec is always renderable.

use crate::error::SpecError;
use crate::symbol::SymbolName;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Default array alignment in bytes
pub const DEFAULT_ALIGNMENT: u32 = 8;

/// Largest accepted alignment in bytes
pub const MAX_ALIGNMENT: u32 = 64;

/// Default number of byte literals per body line
pub const DEFAULT_BYTES_PER_LINE: usize = 12;

/// Power-of-two alignment in `1..=MAX_ALIGNMENT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alignment(u32);

impl Alignment {
    /// Validate an alignment value
    ///
    /// # Errors
    /// Returns [`SpecError::InvalidAlignment`] for zero, non powers of two,
    /// or values above [`MAX_ALIGNMENT`]
    pub fn new(value: u64) -> Result<Self, SpecError> {
        if !value.is_power_of_two() || value > u64::from(MAX_ALIGNMENT) {
            return Err(SpecError::InvalidAlignment {
                value,
                max: MAX_ALIGNMENT,
            });
        }
        // bounded by MAX_ALIGNMENT above
        Ok(Self(value as u32))
    }

    /// Alignment in bytes
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self(DEFAULT_ALIGNMENT)
    }
}

impl Display for Alignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the alignment is attached to the array declaration
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HostDialect {
    /// `alignas(N) const unsigned char NAME[] = {`
    #[default]
    Cpp,
    /// `_Alignas(N) const unsigned char NAME[] = {`
    C11,
    /// `const unsigned char NAME[] __attribute__((aligned(N))) = {`
    Gnu,
}

impl HostDialect {
    /// All dialects, in CLI listing order
    pub const ALL: [Self; 3] = [Self::Cpp, Self::C11, Self::Gnu];

    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpp => "cpp",
            Self::C11 => "c11",
            Self::Gnu => "gnu",
        }
    }

    /// Opening line of the array declaration
    #[must_use]
    pub fn declaration(self, symbol: &SymbolName, alignment: Alignment) -> String {
        match self {
            Self::Cpp => format!("alignas({alignment}) const unsigned char {symbol}[] = {{"),
            Self::C11 => format!("_Alignas({alignment}) const unsigned char {symbol}[] = {{"),
            Self::Gnu => format!(
                "const unsigned char {symbol}[] __attribute__((aligned({alignment}))) = {{"
            ),
        }
    }
}

impl Display for HostDialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostDialect {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SpecError::UnknownDialect(s.to_string()))
    }
}

/// Validated rendering parameters for one array
///
/// # Example
/// ```
/// use blobarray_artifact::ArraySpec;
///
/// let spec = ArraySpec::new("g_model")?
///     .with_alignment(16)?
///     .with_bytes_per_line(16)?;
/// assert_eq!(spec.alignment().get(), 16);
/// # Ok::<(), blobarray_artifact::SpecError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArraySpec {
    symbol: SymbolName,
    alignment: Alignment,
    bytes_per_line: usize,
    dialect: HostDialect,
}

impl ArraySpec {
    /// Spec with default alignment (8), line width (12) and C++ dialect
    ///
    /// # Errors
    /// Returns error if `symbol` is not a valid identifier
    pub fn new(symbol: impl Into<String>) -> Result<Self, SpecError> {
        Ok(Self::from_symbol(SymbolName::new(symbol)?))
    }

    /// Spec with defaults for an already validated symbol
    #[must_use]
    pub fn from_symbol(symbol: SymbolName) -> Self {
        Self {
            symbol,
            alignment: Alignment::default(),
            bytes_per_line: DEFAULT_BYTES_PER_LINE,
            dialect: HostDialect::default(),
        }
    }

    /// Set alignment in bytes
    ///
    /// # Errors
    /// Returns error if `alignment` is not a power of two in `1..=64`
    pub fn with_alignment(mut self, alignment: u64) -> Result<Self, SpecError> {
        self.alignment = Alignment::new(alignment)?;
        Ok(self)
    }

    /// Set number of byte literals per line
    ///
    /// # Errors
    /// Returns error if `bytes_per_line` is zero
    pub fn with_bytes_per_line(mut self, bytes_per_line: usize) -> Result<Self, SpecError> {
        if bytes_per_line == 0 {
            return Err(SpecError::InvalidLineWidth(bytes_per_line));
        }
        self.bytes_per_line = bytes_per_line;
        Ok(self)
    }

    /// Set host dialect
    #[must_use]
    pub fn with_dialect(mut self, dialect: HostDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Array symbol
    #[inline]
    #[must_use]
    pub fn symbol(&self) -> &SymbolName {
        &self.symbol
    }

    /// Array alignment
    #[inline]
    #[must_use]
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Byte literals per body line
    #[inline]
    #[must_use]
    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    /// Host dialect
    #[inline]
    #[must_use]
    pub fn dialect(&self) -> HostDialect {
        self.dialect
    }
}
