//! Testing utilities for blobarray workspace
//!
//! Shared fixtures: model-shaped blobs, scratch directories and a minimal
//! body-line reader for asserting on emitted files.

#![allow(missing_docs)]

use blobarray_artifact::BinaryBlob;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Deterministic blob of `len` bytes that starts like a TFLite flatbuffer
///
/// Bytes 4..8 hold `TFL3` when `len >= 8`; the rest is a fixed pattern so
/// fixtures are reproducible across runs.
pub fn tflite_like_blob(len: usize) -> BinaryBlob {
    let mut bytes: Vec<u8> = (0..len)
        .map(|i| (i.wrapping_mul(31).wrapping_add(7) % 251) as u8)
        .collect();
    if len >= 8 {
        bytes[..4].copy_from_slice(&[0x1c, 0x00, 0x00, 0x00]);
        bytes[4..8].copy_from_slice(b"TFL3");
    }
    BinaryBlob::new(bytes)
}

pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Write `blob` to `dir/name` and return the path
pub fn write_model_file(dir: &Path, name: &str, blob: &BinaryBlob) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, blob.as_bytes()).unwrap();
    path
}

/// Body lines (between the declaration and `};`) of an emitted file
pub fn body_lines(text: &str) -> Vec<String> {
    text.lines()
        .skip_while(|line| !line.ends_with("= {"))
        .skip(1)
        .take_while(|line| *line != "};")
        .map(str::to_string)
        .collect()
}

/// Hex literals of an emitted file, concatenated in order
pub fn literal_bytes(text: &str) -> Vec<u8> {
    body_lines(text)
        .iter()
        .flat_map(|line| {
            line.trim()
                .trim_end_matches(',')
                .split(", ")
                .map(|lit| u8::from_str_radix(lit.trim_start_matches("0x"), 16).unwrap())
                .collect::<Vec<_>>()
        })
        .collect()
}
