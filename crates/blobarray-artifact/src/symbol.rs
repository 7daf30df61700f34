//! Host-language symbol names
//!
//! Provides [`SymbolName`], an identifier that is valid in both C and C++
//! and therefore safe to use for the emitted array and its `_len` constant.

use crate::error::SpecError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Suffix of the companion length constant
pub const LEN_SUFFIX: &str = "_len";

/// Keywords reserved in C11 or C++17 that cannot name a variable
const RESERVED: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char16_t", "char32_t", "class", "compl", "const", "const_cast",
    "constexpr", "continue", "decltype", "default", "delete", "do", "double", "dynamic_cast",
    "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
    "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
    "nullptr", "operator", "or", "or_eq", "private", "protected", "public", "register",
    "reinterpret_cast", "restrict", "return", "short", "signed", "sizeof", "static",
    "static_assert", "static_cast", "struct", "switch", "template", "this", "thread_local",
    "throw", "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
    "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq", "_Alignas", "_Alignof",
    "_Atomic", "_Bool", "_Complex", "_Generic", "_Imaginary", "_Noreturn", "_Static_assert",
    "_Thread_local",
];

/// Identifier naming an emitted array
///
/// # Invariants
/// - Non-empty
/// - First character is an ASCII letter or `_`
/// - Remaining characters are ASCII alphanumerics or `_`
/// - Not a C or C++ keyword
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolName(String);

impl SymbolName {
    /// Validate and wrap an identifier
    ///
    /// # Errors
    /// Returns [`SpecError::EmptySymbol`], [`SpecError::InvalidSymbol`] or
    /// [`SpecError::ReservedSymbol`]
    pub fn new(name: impl Into<String>) -> Result<Self, SpecError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Check identifier rules without allocating
    ///
    /// # Errors
    /// Same conditions as [`SymbolName::new`]
    pub fn validate(name: &str) -> Result<(), SpecError> {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(SpecError::EmptySymbol);
        };
        if !(first.is_ascii_alphabetic() || first == '_')
            || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SpecError::InvalidSymbol(name.to_string()));
        }
        if RESERVED.contains(&name) {
            return Err(SpecError::ReservedSymbol(name.to_string()));
        }
        Ok(())
    }

    /// Identifier as written in source
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the companion length constant (`<name>_len`)
    #[inline]
    #[must_use]
    pub fn len_symbol(&self) -> String {
        format!("{}{LEN_SUFFIX}", self.0)
    }
}

impl Display for SymbolName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SymbolName {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SymbolName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for SymbolName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for SymbolName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
