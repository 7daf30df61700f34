//! Property tests for the array codec.
//!
//! Each property is a guarantee firmware builds depend on: decoding the
//! emitted literals gives back the model bytes, output never varies between
//! runs, and line grouping is exactly `bytes_per_line`.

use blobarray_artifact::{decode, ArrayCodec, ArraySpec, HostDialect, SpecError};
use proptest::prelude::*;

fn dialect() -> impl Strategy<Value = HostDialect> {
    prop_oneof![
        Just(HostDialect::Cpp),
        Just(HostDialect::C11),
        Just(HostDialect::Gnu),
    ]
}

fn spec_strategy() -> impl Strategy<Value = ArraySpec> {
    (
        "[A-Za-z_][A-Za-z0-9_]{0,16}",
        0u32..=6,
        1usize..=40,
        dialect(),
    )
        .prop_filter_map("reserved keyword", |(name, shift, width, dialect)| {
            Some(
                ArraySpec::new(name)
                    .ok()?
                    .with_alignment(1u64 << shift)
                    .ok()?
                    .with_bytes_per_line(width)
                    .ok()?
                    .with_dialect(dialect),
            )
        })
}

/// Body lines between the declaration and `};`
fn body_lines(text: &str) -> Vec<&str> {
    text.lines()
        .skip(1)
        .take_while(|line| *line != "};")
        .collect()
}

proptest! {
    #[test]
    fn prop_decode_reproduces_blob(
        bytes in proptest::collection::vec(any::<u8>(), 0..600),
        spec in spec_strategy(),
    ) {
        let text = ArrayCodec::render(&bytes, &spec).unwrap();
        let decoded = decode(&text).unwrap();

        prop_assert_eq!(decoded.bytes(), bytes.as_slice());
        prop_assert_eq!(decoded.symbol(), spec.symbol());
        prop_assert_eq!(decoded.alignment(), spec.alignment());
        prop_assert_eq!(decoded.dialect(), spec.dialect());

        let trailer = format!("const int {}_len = {};\n", spec.symbol(), bytes.len());
        prop_assert!(text.ends_with(&trailer));
    }

    #[test]
    fn prop_render_is_deterministic(
        bytes in proptest::collection::vec(any::<u8>(), 0..300),
        spec in spec_strategy(),
    ) {
        let first = ArrayCodec::render(&bytes, &spec).unwrap();
        let second = ArrayCodec::render(&bytes, &spec.clone()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_line_grouping(
        bytes in proptest::collection::vec(any::<u8>(), 1..600),
        width in 1usize..=40,
    ) {
        let spec = ArraySpec::new("g_model").unwrap().with_bytes_per_line(width).unwrap();
        let text = ArrayCodec::render(&bytes, &spec).unwrap();
        let lines = body_lines(&text);

        prop_assert_eq!(lines.len(), bytes.len().div_ceil(width));
        for (i, line) in lines.iter().enumerate() {
            prop_assert!(line.starts_with("    0x"));
            prop_assert!(line.ends_with(','));
            let count = line.matches("0x").count();
            if i + 1 < lines.len() {
                prop_assert_eq!(count, width);
            } else {
                prop_assert_eq!(count, bytes.len() - width * (lines.len() - 1));
            }
        }
    }

    #[test]
    fn prop_literals_are_lowercase_two_digit(bytes in proptest::collection::vec(any::<u8>(), 1..200)) {
        let spec = ArraySpec::new("g_model").unwrap();
        let text = ArrayCodec::render(&bytes, &spec).unwrap();
        for line in body_lines(&text) {
            for literal in line.trim_start().trim_end_matches(',').split(", ") {
                prop_assert_eq!(literal.len(), 4);
                prop_assert!(literal[2..].chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
            }
        }
    }

    #[test]
    fn prop_non_power_of_two_alignment_rejected(value in 0u64..10_000) {
        let result = ArraySpec::new("g_model").unwrap().with_alignment(value);
        if value.is_power_of_two() && value <= 64 {
            prop_assert!(result.is_ok());
        } else {
            let is_alignment_error = matches!(result, Err(SpecError::InvalidAlignment { .. }));
            prop_assert!(is_alignment_error);
        }
    }
}

#[test]
fn four_byte_example() {
    let spec = ArraySpec::new("g_model").unwrap();
    let text = ArrayCodec::render(&[0x00, 0x01, 0xfe, 0xff], &spec).unwrap();
    assert_eq!(body_lines(&text), vec!["    0x00, 0x01, 0xfe, 0xff,"]);
    assert!(text.ends_with("const int g_model_len = 4;\n"));
}

#[test]
fn fourteen_bytes_wrap_after_twelve() {
    let spec = ArraySpec::new("g_model").unwrap();
    let text = ArrayCodec::render(&[0x55; 14], &spec).unwrap();
    let lines = body_lines(&text);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].matches("0x").count(), 12);
    assert_eq!(lines[1], "    0x55, 0x55,");
}

#[test]
fn empty_blob_is_not_an_error() {
    let spec = ArraySpec::new("g_model").unwrap();
    let text = ArrayCodec::render(&[], &spec).unwrap();
    assert!(body_lines(&text).is_empty());
    assert!(text.contains("};\n\nconst int g_model_len = 0;\n"));
}
