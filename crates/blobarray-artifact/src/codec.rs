//! Array codec
//!
//! Renders a blob as
//!
//! ```text
//! alignas(8) const unsigned char g_model[] = {
//!     0x00, 0x01, 0xfe, 0xff,
//! };
//!
//! const int g_model_len = 4;
//! ```
//!
//! Output depends only on the bytes and the [`ArraySpec`]: no locale,
//! timestamps or platform formatting are involved.

use crate::artifact::EmittedArtifact;
use crate::blob::BinaryBlob;
use crate::digest::BlobDigest;
use crate::error::{CodecError, CodecResult};
use crate::spec::ArraySpec;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;

/// Indentation of every body line
pub const BODY_INDENT: &str = "    ";

/// Largest blob whose length fits the `const int` constant
pub const MAX_BLOB_LEN: u64 = i32::MAX as u64;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

const READ_CHUNK: usize = 8 * 1024;

const MAX_STREAM_RESERVE: usize = 64 * 1024 * 1024;

/// Appends byte literals to the output, breaking lines every `per_line`
struct BodyWriter<'a> {
    out: &'a mut String,
    per_line: usize,
    column: usize,
}

impl<'a> BodyWriter<'a> {
    fn new(out: &'a mut String, per_line: usize) -> Self {
        Self {
            out,
            per_line,
            column: 0,
        }
    }

    fn push_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    fn push(&mut self, byte: u8) {
        if self.column == 0 {
            self.out.push_str(BODY_INDENT);
        } else {
            self.out.push_str(", ");
        }
        self.out.push_str("0x");
        self.out.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
        self.out.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
        self.column += 1;
        if self.column == self.per_line {
            self.out.push_str(",\n");
            self.column = 0;
        }
    }

    /// Terminate a partial last line
    fn finish(self) {
        if self.column > 0 {
            self.out.push_str(",\n");
        }
    }
}

/// Stateless blob-to-array renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayCodec;

impl ArrayCodec {
    /// Render `bytes` as an array declaration plus length constant
    ///
    /// # Errors
    /// Returns [`CodecError::BlobTooLarge`] if the length does not fit an `int`
    pub fn render(bytes: &[u8], spec: &ArraySpec) -> CodecResult<String> {
        let len = bytes.len() as u64;
        check_len(len)?;

        let mut out = String::with_capacity(estimated_size(bytes.len(), spec));
        push_header(&mut out, spec);
        let mut body = BodyWriter::new(&mut out, spec.bytes_per_line());
        body.push_all(bytes);
        body.finish();
        push_trailer(&mut out, spec, len);

        tracing::debug!(
            symbol = %spec.symbol(),
            len,
            text_len = out.len(),
            "rendered array"
        );
        Ok(out)
    }

    /// Render a materialized blob into an artifact bound for `destination`
    ///
    /// # Errors
    /// Same as [`ArrayCodec::render`]
    pub fn emit(
        blob: &BinaryBlob,
        spec: &ArraySpec,
        destination: impl Into<PathBuf>,
    ) -> CodecResult<EmittedArtifact> {
        let source_text = Self::render(blob.as_bytes(), spec)?;
        Ok(EmittedArtifact::new(
            spec.symbol().clone(),
            source_text,
            blob.len() as u64,
            blob.digest(),
            destination.into(),
        ))
    }

    /// Render from a streaming source without materializing the blob
    ///
    /// When `expected_len` is given, a stream that ends early or runs long
    /// is an encoding failure.
    ///
    /// # Errors
    /// - [`CodecError::Encoding`] on read failure or length disagreement
    /// - [`CodecError::BlobTooLarge`] if the stream exceeds [`MAX_BLOB_LEN`]
    pub fn emit_reader<R: Read>(
        mut reader: R,
        expected_len: Option<u64>,
        spec: &ArraySpec,
        destination: impl Into<PathBuf>,
    ) -> CodecResult<EmittedArtifact> {
        if let Some(len) = expected_len {
            check_len(len)?;
        }

        // declared lengths are untrusted, cap the up-front reservation
        let mut out = String::with_capacity(expected_len.map_or(0, |len| {
            estimated_size(len as usize, spec).min(MAX_STREAM_RESERVE)
        }));
        push_header(&mut out, spec);

        let mut hasher = blake3::Hasher::new();
        let mut read: u64 = 0;
        let mut chunk = vec![0u8; READ_CHUNK];
        let mut body = BodyWriter::new(&mut out, spec.bytes_per_line());
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CodecError::encoding(read, e)),
            };
            read += n as u64;
            check_len(read)?;
            if expected_len.is_some_and(|len| read > len) {
                return Err(CodecError::encoding(
                    read,
                    std::io::Error::new(
                        ErrorKind::InvalidData,
                        "stream is longer than its declared length",
                    ),
                ));
            }
            hasher.update(&chunk[..n]);
            body.push_all(&chunk[..n]);
        }
        body.finish();

        if let Some(len) = expected_len {
            if read < len {
                return Err(CodecError::encoding(
                    read,
                    std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("stream ended {} bytes short", len - read),
                    ),
                ));
            }
        }
        push_trailer(&mut out, spec, read);

        tracing::debug!(symbol = %spec.symbol(), len = read, "rendered streamed array");
        Ok(EmittedArtifact::new(
            spec.symbol().clone(),
            out,
            read,
            BlobDigest::new(*hasher.finalize().as_bytes()),
            destination.into(),
        ))
    }
}

fn check_len(len: u64) -> CodecResult<()> {
    if len > MAX_BLOB_LEN {
        return Err(CodecError::BlobTooLarge {
            len,
            max: MAX_BLOB_LEN,
        });
    }
    Ok(())
}

/// Six characters per literal plus one indent and newline per line
fn estimated_size(len: usize, spec: &ArraySpec) -> usize {
    let lines = len.div_ceil(spec.bytes_per_line());
    128 + 2 * spec.symbol().as_str().len() + len * 6 + lines * (BODY_INDENT.len() + 1)
}

fn push_header(out: &mut String, spec: &ArraySpec) {
    out.push_str(&spec.dialect().declaration(spec.symbol(), spec.alignment()));
    out.push('\n');
}

fn push_trailer(out: &mut String, spec: &ArraySpec, len: u64) {
    out.push_str("};\n\n");
    out.push_str("const int ");
    out.push_str(&spec.symbol().len_symbol());
    out.push_str(" = ");
    out.push_str(&len.to_string());
    out.push_str(";\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::HostDialect;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn spec(name: &str) -> ArraySpec {
        ArraySpec::new(name).unwrap()
    }

    #[test]
    fn renders_four_bytes() {
        let text = ArrayCodec::render(&[0x00, 0x01, 0xfe, 0xff], &spec("g_model")).unwrap();
        assert_eq!(
            text,
            "alignas(8) const unsigned char g_model[] = {\n\
             \x20   0x00, 0x01, 0xfe, 0xff,\n\
             };\n\
             \n\
             const int g_model_len = 4;\n"
        );
    }

    #[test]
    fn renders_empty_blob() {
        let text = ArrayCodec::render(&[], &spec("g_empty")).unwrap();
        assert_eq!(
            text,
            "alignas(8) const unsigned char g_empty[] = {\n};\n\nconst int g_empty_len = 0;\n"
        );
    }

    #[test]
    fn full_line_then_remainder() {
        let bytes: Vec<u8> = (0..14).collect();
        let text = ArrayCodec::render(&bytes, &spec("g_model")).unwrap();
        let body: Vec<&str> = text.lines().skip(1).take_while(|l| *l != "};").collect();
        assert_eq!(
            body,
            vec![
                "    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,",
                "    0x0c, 0x0d,",
            ]
        );
    }

    #[test]
    fn exact_multiple_has_no_extra_line() {
        let bytes = [0xabu8; 24];
        let text = ArrayCodec::render(&bytes, &spec("g_model")).unwrap();
        let body_lines = text.lines().skip(1).take_while(|l| *l != "};").count();
        assert_eq!(body_lines, 2);
    }

    #[test]
    fn honours_line_width_and_alignment() {
        let spec = spec("g_model")
            .with_bytes_per_line(1)
            .unwrap()
            .with_alignment(16)
            .unwrap()
            .with_dialect(HostDialect::Gnu);
        let text = ArrayCodec::render(&[0x10, 0x20], &spec).unwrap();
        assert_eq!(
            text,
            "const unsigned char g_model[] __attribute__((aligned(16))) = {\n\
             \x20   0x10,\n\
             \x20   0x20,\n\
             };\n\
             \n\
             const int g_model_len = 2;\n"
        );
    }

    #[test]
    fn emit_carries_length_and_digest() {
        let blob = BinaryBlob::new(vec![1, 2, 3]);
        let artifact = ArrayCodec::emit(&blob, &spec("g_model"), "model.cpp").unwrap();
        assert_eq!(artifact.declared_len(), 3);
        assert_eq!(artifact.digest(), blob.digest());
        assert_eq!(artifact.destination(), std::path::Path::new("model.cpp"));
        assert_eq!(artifact.symbol().as_str(), "g_model");
    }

    #[test]
    fn streamed_output_matches_materialized() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(READ_CHUNK * 2 + 7).collect();
        let spec = spec("g_stream");
        let expected = ArrayCodec::render(&bytes, &spec).unwrap();

        let artifact =
            ArrayCodec::emit_reader(Cursor::new(&bytes), Some(bytes.len() as u64), &spec, "s.cpp")
                .unwrap();
        assert_eq!(artifact.source_text(), expected);
        assert_eq!(artifact.digest(), BlobDigest::compute(&bytes));

        let unsized_artifact =
            ArrayCodec::emit_reader(Cursor::new(&bytes), None, &spec, "s.cpp").unwrap();
        assert_eq!(unsized_artifact.source_text(), expected);
    }

    #[test]
    fn truncated_stream_is_encoding_error() {
        let result =
            ArrayCodec::emit_reader(Cursor::new(vec![0u8; 10]), Some(16), &spec("g_m"), "m.cpp");
        match result {
            Err(CodecError::Encoding { read, source }) => {
                assert_eq!(read, 10);
                assert_eq!(source.kind(), ErrorKind::UnexpectedEof);
            }
            other => panic!("expected encoding error, got {other:?}"),
        }
    }

    #[test]
    fn overlong_stream_is_encoding_error() {
        let result =
            ArrayCodec::emit_reader(Cursor::new(vec![0u8; 10]), Some(4), &spec("g_m"), "m.cpp");
        assert!(matches!(result, Err(CodecError::Encoding { .. })));
    }

    #[test]
    fn failing_reader_is_encoding_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(ErrorKind::Other, "device gone"))
            }
        }

        let result = ArrayCodec::emit_reader(Broken, None, &spec("g_m"), "m.cpp");
        assert!(matches!(result, Err(CodecError::Encoding { read: 0, .. })));
    }

    #[test]
    fn declared_length_over_int_limit_rejected() {
        let result = ArrayCodec::emit_reader(
            Cursor::new(Vec::new()),
            Some(MAX_BLOB_LEN + 1),
            &spec("g_m"),
            "m.cpp",
        );
        assert!(matches!(result, Err(CodecError::BlobTooLarge { .. })));
    }
}
