//! Shared declarations header
//!
//! Renders the header every emitted source file includes:
//!
//! ```text
//! #ifndef MODEL_H_
//! #define MODEL_H_
//!
//! // Sine models
//! extern const unsigned char g_sine_model_int8[];
//! extern const int g_sine_model_int8_len;
//!
//! #endif  // MODEL_H_
//! ```

use blobarray_artifact::{SpecError, SymbolName};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderGroup {
    title: Option<String>,
    symbols: Vec<SymbolName>,
}

/// Header declaring emitted arrays, grouped in first-appearance order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFile {
    path: PathBuf,
    guard: String,
    groups: Vec<HeaderGroup>,
}

impl HeaderFile {
    /// Empty header at `path` with a guard derived from the file name
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let guard = default_guard(&path);
        Self {
            path,
            guard,
            groups: Vec::new(),
        }
    }

    /// Override the include guard
    ///
    /// # Errors
    /// Returns error if `guard` is not a valid identifier
    pub fn with_guard(mut self, guard: impl Into<String>) -> Result<Self, SpecError> {
        let guard = guard.into();
        SymbolName::validate(&guard)?;
        self.guard = guard;
        Ok(self)
    }

    /// Declare a symbol under an optional group title
    ///
    /// Symbols already declared are ignored.
    pub fn declare(&mut self, group: Option<&str>, symbol: SymbolName) {
        if self.contains(&symbol) {
            return;
        }
        match self
            .groups
            .iter_mut()
            .find(|g| g.title.as_deref() == group)
        {
            Some(existing) => existing.symbols.push(symbol),
            None => self.groups.push(HeaderGroup {
                title: group.map(str::to_string),
                symbols: vec![symbol],
            }),
        }
    }

    /// Check whether a symbol is declared
    #[must_use]
    pub fn contains(&self, symbol: &SymbolName) -> bool {
        self.groups.iter().any(|g| g.symbols.contains(symbol))
    }

    /// Destination of the header
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Include guard macro
    #[must_use]
    pub fn guard(&self) -> &str {
        &self.guard
    }

    /// Number of declared symbols
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.symbols.len()).sum()
    }

    /// True when nothing is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Header source text
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("#ifndef {0}\n#define {0}\n\n", self.guard);
        for group in &self.groups {
            if let Some(title) = &group.title {
                out.push_str("// ");
                out.push_str(title);
                out.push('\n');
            }
            for symbol in &group.symbols {
                out.push_str(&format!(
                    "extern const unsigned char {symbol}[];\nextern const int {};\n\n",
                    symbol.len_symbol()
                ));
            }
        }
        out.push_str(&format!("#endif  // {}\n", self.guard));
        out
    }
}

/// `model.h` becomes `MODEL_H_`
fn default_guard(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut guard: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if guard.starts_with(|c: char| c.is_ascii_digit()) {
        guard.insert(0, '_');
    }
    guard.push('_');
    guard
}
