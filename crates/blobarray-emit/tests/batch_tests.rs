//! Functional tests for manifest-driven batches.
//!
//! Each scenario mirrors the export workflow: several model variants, one
//! generated source file per variant, and a shared header declaring them.

use blobarray_emit::{
    BatchPolicy, BatchRunner, Execution, HeaderOutcome, Manifest, ManifestError, TargetOutcome,
};
use blobarray_test_utils::{
    body_lines, literal_bytes, scratch_dir, tflite_like_blob, write_model_file,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

const MANIFEST: &str = r#"
[defaults]
alignment = 8
bytes_per_line = 12

[header]
path = "model.h"

[[target]]
symbol = "g_sine_model_float32"
input = "sine_model_float32.tflite"
output = "sine_model_float32.cpp"
group = "Sine models"

[[target]]
symbol = "g_sine_model_int8"
input = "sine_model_int8.tflite"
output = "sine_model_int8.cpp"
group = "Sine models"

[[target]]
symbol = "g_cnn_model_int8"
input = "cnn_model_int8.tflite"
output = "cnn_model_int8.cpp"
group = "CNN models"
"#;

/// Write the manifest and every model it references except `missing`
fn setup(dir: &Path, missing: Option<&str>) -> std::path::PathBuf {
    for (name, len) in [
        ("sine_model_float32.tflite", 3_164),
        ("sine_model_int8.tflite", 2_704),
        ("cnn_model_int8.tflite", 14),
    ] {
        if Some(name) != missing {
            write_model_file(dir, name, &tflite_like_blob(len));
        }
    }
    let manifest = dir.join("models.toml");
    fs::write(&manifest, MANIFEST).unwrap();
    manifest
}

#[test]
fn batch_writes_sources_and_header() {
    let dir = scratch_dir();
    let plan = Manifest::load(&setup(dir.path(), None)).unwrap();

    let report = BatchRunner::new().run(&plan);
    assert!(report.succeeded());
    assert!(matches!(report.header, HeaderOutcome::Written(_)));

    let cnn = fs::read_to_string(dir.path().join("cnn_model_int8.cpp")).unwrap();
    assert!(cnn.starts_with(
        "#include \"model.h\"\n\nalignas(8) const unsigned char g_cnn_model_int8[] = {\n"
    ));
    assert!(cnn.ends_with("};\n\nconst int g_cnn_model_int8_len = 14;\n"));
    let lines = body_lines(&cnn);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].matches("0x").count(), 2);

    let sine = fs::read_to_string(dir.path().join("sine_model_int8.cpp")).unwrap();
    assert_eq!(literal_bytes(&sine), tflite_like_blob(2_704).as_bytes());

    let header = fs::read_to_string(dir.path().join("model.h")).unwrap();
    assert_eq!(
        header,
        "#ifndef MODEL_H_\n\
         #define MODEL_H_\n\
         \n\
         // Sine models\n\
         extern const unsigned char g_sine_model_float32[];\n\
         extern const int g_sine_model_float32_len;\n\
         \n\
         extern const unsigned char g_sine_model_int8[];\n\
         extern const int g_sine_model_int8_len;\n\
         \n\
         // CNN models\n\
         extern const unsigned char g_cnn_model_int8[];\n\
         extern const int g_cnn_model_int8_len;\n\
         \n\
         #endif  // MODEL_H_\n"
    );

    let summary = serde_json::to_value(report.summary()).unwrap();
    assert_eq!(summary["succeeded"], true);
    assert_eq!(summary["targets"][2]["blob_len"], 14);
    assert_eq!(summary["header"]["status"], "written");
}

#[test]
fn parallel_batch_matches_sequential() {
    let seq_dir = scratch_dir();
    let par_dir = scratch_dir();
    let seq = BatchRunner::new().run(&Manifest::load(&setup(seq_dir.path(), None)).unwrap());
    let par = BatchRunner::new()
        .with_execution(Execution::Parallel)
        .run(&Manifest::load(&setup(par_dir.path(), None)).unwrap());

    assert!(seq.succeeded() && par.succeeded());
    for name in ["sine_model_float32.cpp", "sine_model_int8.cpp", "cnn_model_int8.cpp", "model.h"] {
        assert_eq!(
            fs::read(seq_dir.path().join(name)).unwrap(),
            fs::read(par_dir.path().join(name)).unwrap(),
            "{name} differs"
        );
    }
    let symbols: Vec<_> = par.targets.iter().map(|t| t.symbol().to_string()).collect();
    assert_eq!(
        symbols,
        vec!["g_sine_model_float32", "g_sine_model_int8", "g_cnn_model_int8"]
    );
}

#[test]
fn abort_policy_skips_remaining_targets() {
    let dir = scratch_dir();
    let plan = Manifest::load(&setup(dir.path(), Some("sine_model_float32.tflite"))).unwrap();

    let report = BatchRunner::new().run(&plan);
    assert!(!report.succeeded());
    assert!(matches!(report.targets[0], TargetOutcome::Failed { .. }));
    assert!(matches!(report.targets[1], TargetOutcome::Skipped { .. }));
    assert!(matches!(report.targets[2], TargetOutcome::Skipped { .. }));
    assert!(matches!(report.header, HeaderOutcome::Skipped));
    assert_eq!(report.failures().count(), 1);

    assert!(!dir.path().join("sine_model_int8.cpp").exists());
    assert!(!dir.path().join("model.h").exists());
}

#[test]
fn continue_policy_attempts_every_target() {
    let dir = scratch_dir();
    let plan = Manifest::load(&setup(dir.path(), Some("sine_model_int8.tflite"))).unwrap();

    let report = BatchRunner::new()
        .with_policy(BatchPolicy::Continue)
        .run(&plan);
    assert!(report.targets[0].is_written());
    assert!(matches!(report.targets[1], TargetOutcome::Failed { .. }));
    assert!(report.targets[2].is_written());
    assert!(matches!(report.header, HeaderOutcome::Skipped));

    let summary = report.summary();
    assert_eq!(summary.targets[1].status, "failed");
    assert!(summary.targets[1].error.as_deref().unwrap().contains("sine_model_int8.tflite"));
}

#[test]
fn cancelled_batch_opens_nothing() {
    let dir = scratch_dir();
    let plan = Manifest::load(&setup(dir.path(), None)).unwrap();

    let runner = BatchRunner::new();
    runner.cancel_token().cancel();
    let report = runner.run(&plan);

    assert!(report
        .targets
        .iter()
        .all(|t| matches!(t, TargetOutcome::Skipped { .. })));
    assert!(!dir.path().join("sine_model_float32.cpp").exists());
}

#[test]
fn invalid_manifest_touches_no_files() {
    let dir = scratch_dir();
    let manifest = setup(dir.path(), None);
    fs::write(&manifest, MANIFEST.replace("\"g_cnn_model_int8\"", "\"\"")).unwrap();

    let err = Manifest::load(&manifest).unwrap_err();
    assert!(matches!(err, ManifestError::InvalidTarget { index: 2, .. }));
    assert!(!dir.path().join("sine_model_float32.cpp").exists());
    assert!(!dir.path().join("model.h").exists());
}
