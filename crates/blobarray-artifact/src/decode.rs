//! Array decoder
//!
//! Parses emitted source back into bytes so a generated file can be checked
//! against the model it was produced from. The parser is strict: it accepts
//! exactly what [`ArrayCodec`](crate::ArrayCodec) writes, after an arbitrary
//! preamble.

use crate::codec::BODY_INDENT;
use crate::error::{CodecError, CodecResult};
use crate::spec::{Alignment, HostDialect};
use crate::symbol::{SymbolName, LEN_SUFFIX};
use once_cell::sync::Lazy;
use regex::Regex;

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:alignas\((?P<cpp>\d+)\) |_Alignas\((?P<c11>\d+)\) )?const unsigned char (?P<name>[A-Za-z_][A-Za-z0-9_]*)\[\](?: __attribute__\(\(aligned\((?P<gnu>\d+)\)\)\))? = \{$",
    )
    .expect("declaration pattern is valid")
});

static LENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^const int (?P<name>[A-Za-z_][A-Za-z0-9_]*) = (?P<len>\d+);$")
        .expect("length pattern is valid")
});

/// Array recovered from emitted source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedArray {
    symbol: SymbolName,
    dialect: HostDialect,
    alignment: Alignment,
    bytes: Vec<u8>,
    line_widths: Vec<usize>,
}

/// First difference between decoded and expected bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Byte offset of the difference
    pub offset: usize,
    /// Byte in the expected blob, `None` past its end
    pub expected: Option<u8>,
    /// Byte in the decoded array, `None` past its end
    pub found: Option<u8>,
}

impl DecodedArray {
    /// Array symbol
    #[must_use]
    pub fn symbol(&self) -> &SymbolName {
        &self.symbol
    }

    /// Dialect the declaration was written in
    #[must_use]
    pub fn dialect(&self) -> HostDialect {
        self.dialect
    }

    /// Declared alignment
    #[must_use]
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Decoded bytes, in declaration order
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into the decoded bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of literals on each body line
    #[must_use]
    pub fn line_widths(&self) -> &[usize] {
        &self.line_widths
    }

    /// Width of the first body line, i.e. the bytes-per-line used to emit
    #[must_use]
    pub fn bytes_per_line(&self) -> Option<usize> {
        self.line_widths.first().copied()
    }

    /// Compare against the blob the array should contain
    #[must_use]
    pub fn first_mismatch(&self, expected: &[u8]) -> Option<Mismatch> {
        let longest = self.bytes.len().max(expected.len());
        (0..longest).find_map(|offset| {
            let found = self.bytes.get(offset).copied();
            let want = expected.get(offset).copied();
            (found != want).then_some(Mismatch {
                offset,
                expected: want,
                found,
            })
        })
    }
}

/// Parse emitted source text back into an array
///
/// Lines before the array declaration (include lines, comments) are ignored.
///
/// # Errors
/// Returns [`CodecError::Malformed`] naming the offending line when the text
/// deviates from the emitted format or `_len` disagrees with the element count
pub fn decode(text: &str) -> CodecResult<DecodedArray> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    let (symbol, dialect, alignment) = loop {
        let Some((number, line)) = lines.next() else {
            return Err(CodecError::malformed(
                text.lines().count().max(1),
                "no array declaration found",
            ));
        };
        if let Some(caps) = DECLARATION.captures(line) {
            let (dialect, raw) = match (caps.name("cpp"), caps.name("c11"), caps.name("gnu")) {
                (Some(m), None, None) => (HostDialect::Cpp, m.as_str()),
                (None, Some(m), None) => (HostDialect::C11, m.as_str()),
                (None, None, Some(m)) => (HostDialect::Gnu, m.as_str()),
                _ => {
                    return Err(CodecError::malformed(
                        number,
                        "declaration must carry exactly one alignment",
                    ))
                }
            };
            let alignment = raw
                .parse::<u64>()
                .map_err(|e| CodecError::malformed(number, e.to_string()))
                .and_then(|v| {
                    Alignment::new(v).map_err(|e| CodecError::malformed(number, e.to_string()))
                })?;
            let symbol = SymbolName::new(&caps["name"])
                .map_err(|e| CodecError::malformed(number, e.to_string()))?;
            break (symbol, dialect, alignment);
        }
    };

    let mut bytes = Vec::new();
    let mut line_widths = Vec::new();
    loop {
        let Some((number, line)) = lines.next() else {
            return Err(CodecError::malformed(
                text.lines().count(),
                "array is not closed with '};'",
            ));
        };
        if line == "};" {
            break;
        }
        let width = decode_body_line(number, line, &mut bytes)?;
        line_widths.push(width);
    }

    let (number, line) = lines
        .by_ref()
        .find(|(_, l)| !l.trim().is_empty())
        .ok_or_else(|| {
            CodecError::malformed(text.lines().count(), "missing length constant")
        })?;
    let caps = LENGTH
        .captures(line)
        .ok_or_else(|| CodecError::malformed(number, "expected 'const int <symbol>_len = N;'"))?;
    let expected_name = format!("{symbol}{LEN_SUFFIX}");
    if caps["name"] != expected_name {
        return Err(CodecError::malformed(
            number,
            format!("length constant '{}' does not match '{expected_name}'", &caps["name"]),
        ));
    }
    let declared: u64 = caps["len"]
        .parse()
        .map_err(|e: std::num::ParseIntError| CodecError::malformed(number, e.to_string()))?;
    if declared != bytes.len() as u64 {
        return Err(CodecError::malformed(
            number,
            format!(
                "length constant {declared} disagrees with {} array elements",
                bytes.len()
            ),
        ));
    }

    if let Some((number, _)) = lines.find(|(_, l)| !l.trim().is_empty()) {
        return Err(CodecError::malformed(
            number,
            "unexpected content after length constant",
        ));
    }

    Ok(DecodedArray {
        symbol,
        dialect,
        alignment,
        bytes,
        line_widths,
    })
}

/// Decode one `    0xNN, 0xNN,` line, returning its element count
fn decode_body_line(number: usize, line: &str, bytes: &mut Vec<u8>) -> CodecResult<usize> {
    let items = line
        .strip_prefix(BODY_INDENT)
        .ok_or_else(|| CodecError::malformed(number, "body line must be indented four spaces"))?
        .strip_suffix(',')
        .ok_or_else(|| CodecError::malformed(number, "body line must end with a comma"))?;

    let mut width = 0;
    for literal in items.split(", ") {
        let byte = parse_literal(literal).ok_or_else(|| {
            CodecError::malformed(number, format!("invalid byte literal '{literal}'"))
        })?;
        bytes.push(byte);
        width += 1;
    }
    Ok(width)
}

/// `0x` followed by exactly two lowercase hex digits
fn parse_literal(literal: &str) -> Option<u8> {
    let digits = literal.strip_prefix("0x")?;
    if digits.len() != 2
        || !digits
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArrayCodec, ArraySpec};

    fn render(bytes: &[u8], spec: &ArraySpec) -> String {
        ArrayCodec::render(bytes, spec).unwrap()
    }

    #[test]
    fn decodes_rendered_array_after_preamble() {
        let spec = ArraySpec::new("g_model").unwrap();
        let text = format!(
            "#include \"model.h\"\n\n{}",
            render(&[0x00, 0x01, 0xfe, 0xff], &spec)
        );
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded.symbol().as_str(), "g_model");
        assert_eq!(decoded.dialect(), HostDialect::Cpp);
        assert_eq!(decoded.alignment().get(), 8);
        assert_eq!(decoded.bytes(), &[0x00, 0x01, 0xfe, 0xff]);
        assert_eq!(decoded.line_widths(), &[4]);
    }

    #[test]
    fn decodes_every_dialect() {
        for dialect in HostDialect::ALL {
            let spec = ArraySpec::new("g_model")
                .unwrap()
                .with_alignment(32)
                .unwrap()
                .with_dialect(dialect);
            let decoded = decode(&render(&[7; 30], &spec)).unwrap();
            assert_eq!(decoded.dialect(), dialect);
            assert_eq!(decoded.alignment().get(), 32);
            assert_eq!(decoded.bytes_per_line(), Some(12));
            assert_eq!(decoded.line_widths(), &[12, 12, 6]);
        }
    }

    #[test]
    fn decodes_empty_array() {
        let spec = ArraySpec::new("g_empty").unwrap();
        let decoded = decode(&render(&[], &spec)).unwrap();
        assert!(decoded.bytes().is_empty());
        assert_eq!(decoded.bytes_per_line(), None);
    }

    #[test]
    fn rejects_uppercase_literals() {
        let text = "alignas(8) const unsigned char g[] = {\n    0xFF,\n};\n\nconst int g_len = 1;\n";
        let err = decode(text).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { line: 2, .. }));
    }

    #[test]
    fn rejects_missing_trailing_comma() {
        let text = "alignas(8) const unsigned char g[] = {\n    0x01, 0x02\n};\n\nconst int g_len = 2;\n";
        assert!(matches!(
            decode(text),
            Err(CodecError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn rejects_length_disagreement() {
        let text = "alignas(8) const unsigned char g[] = {\n    0x01,\n};\n\nconst int g_len = 2;\n";
        assert!(matches!(
            decode(text),
            Err(CodecError::Malformed { line: 5, .. })
        ));
    }

    #[test]
    fn rejects_foreign_length_symbol() {
        let text = "alignas(8) const unsigned char g[] = {\n};\n\nconst int h_len = 0;\n";
        assert!(decode(text).is_err());
    }

    #[test]
    fn rejects_unterminated_array() {
        let text = "alignas(8) const unsigned char g[] = {\n    0x01,\n";
        assert!(decode(text).is_err());
    }

    #[test]
    fn rejects_text_without_declaration() {
        assert!(matches!(
            decode("int main() { return 0; }\n"),
            Err(CodecError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn first_mismatch_reports_offset() {
        let spec = ArraySpec::new("g_model").unwrap();
        let decoded = decode(&render(&[1, 2, 3], &spec)).unwrap();
        assert_eq!(decoded.first_mismatch(&[1, 2, 3]), None);
        assert_eq!(
            decoded.first_mismatch(&[1, 9, 3]),
            Some(Mismatch {
                offset: 1,
                expected: Some(9),
                found: Some(2)
            })
        );
        assert_eq!(
            decoded.first_mismatch(&[1, 2, 3, 4]),
            Some(Mismatch {
                offset: 3,
                expected: Some(4),
                found: None
            })
        );
    }
}
