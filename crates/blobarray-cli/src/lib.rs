//! blobarray command line
//!
//! Argument parsing and command dispatch for the `blobarray` binary. The
//! binary only installs logging and maps [`Status`] to the process exit
//! code; everything else lives here so it can be driven from tests.
//!
//! ```text
//! blobarray emit   --input BIN --symbol NAME --output PATH [options]
//! blobarray batch  --manifest FILE [--parallel] [--keep-going] [--json]
//! blobarray verify --source FILE [--input BIN]
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use anyhow::Context;
use blobarray_artifact::{
    decode, ArraySpec, BlobDigest, HostDialect, DEFAULT_ALIGNMENT, DEFAULT_BYTES_PER_LINE,
};
use blobarray_emit::{
    BatchPolicy, BatchRunner, EmissionWriter, Execution, HeaderOutcome, Manifest, Preamble,
    TargetOutcome,
};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command result that is not an error but still fails the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// Batch had failures or verification found a difference
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::FAILURE,
        }
    }
}

/// Log output format selected with `--log-format`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Format requested on the command line
    #[must_use]
    pub fn from_matches(matches: &ArgMatches) -> Self {
        match matches.get_one::<String>("log-format").map(String::as_str) {
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Command definition
#[must_use]
pub fn cli() -> Command {
    Command::new("blobarray")
        .version(VERSION)
        .about("Emit binary model blobs as aligned C/C++ constant arrays")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Format of diagnostic output on stderr"),
        )
        .subcommand(
            Command::new("emit")
                .about("Render one binary file as a source array")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .short('i')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Binary file to embed"),
                )
                .arg(
                    Arg::new("symbol")
                        .long("symbol")
                        .short('s')
                        .required(true)
                        .help("Array identifier; the length constant is <symbol>_len"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Source file to write"),
                )
                .arg(
                    Arg::new("align")
                        .long("align")
                        .value_parser(value_parser!(u64))
                        .help(format!(
                            "Byte alignment of the array, a power of two [default: {DEFAULT_ALIGNMENT}]"
                        )),
                )
                .arg(
                    Arg::new("bytes-per-line")
                        .long("bytes-per-line")
                        .value_parser(value_parser!(usize))
                        .help(format!(
                            "Hex literals per body line [default: {DEFAULT_BYTES_PER_LINE}]"
                        )),
                )
                .arg(
                    Arg::new("dialect")
                        .long("dialect")
                        .default_value(HostDialect::default().as_str())
                        .value_parser(HostDialect::ALL.map(HostDialect::as_str))
                        .help("How the alignment requirement is spelled"),
                )
                .arg(
                    Arg::new("include")
                        .long("include")
                        .help("Header to #include ahead of the array"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the emission report as JSON"),
                ),
        )
        .subcommand(
            Command::new("batch")
                .about("Emit every target of a TOML manifest")
                .arg(
                    Arg::new("manifest")
                        .long("manifest")
                        .short('m')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Manifest file"),
                )
                .arg(
                    Arg::new("parallel")
                        .long("parallel")
                        .action(ArgAction::SetTrue)
                        .help("Emit targets concurrently"),
                )
                .arg(
                    Arg::new("keep-going")
                        .long("keep-going")
                        .action(ArgAction::SetTrue)
                        .help("Attempt every target even after a failure"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the batch summary as JSON"),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Decode an emitted source file and optionally compare it with a blob")
                .arg(
                    Arg::new("source")
                        .long("source")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Emitted source file"),
                )
                .arg(
                    Arg::new("input")
                        .long("input")
                        .value_parser(value_parser!(PathBuf))
                        .help("Binary file the array should match"),
                ),
        )
}

/// Dispatch a parsed command line, writing results to `out`
///
/// # Errors
/// Invalid arguments, unreadable files, failed writes and undecodable
/// sources. A batch with failed targets or a verification mismatch is
/// reported through [`Status::Failure`] instead.
pub fn run(matches: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<Status> {
    match matches.subcommand() {
        Some(("emit", args)) => emit(args, out),
        Some(("batch", args)) => batch(args, out),
        Some(("verify", args)) => verify(args, out),
        Some((other, _)) => anyhow::bail!("unknown command '{other}'"),
        None => anyhow::bail!("no command given"),
    }
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing --{name}"))
}

fn emit(args: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<Status> {
    let input = path_arg(args, "input")?;
    let output = path_arg(args, "output")?;
    let symbol = args
        .get_one::<String>("symbol")
        .context("missing --symbol")?;

    // the whole spec is validated before the input is opened
    let mut spec = ArraySpec::new(symbol.as_str())?;
    if let Some(&align) = args.get_one::<u64>("align") {
        spec = spec.with_alignment(align)?;
    }
    if let Some(&width) = args.get_one::<usize>("bytes-per-line") {
        spec = spec.with_bytes_per_line(width)?;
    }
    if let Some(dialect) = args.get_one::<String>("dialect") {
        spec = spec.with_dialect(dialect.parse()?);
    }
    let preamble = match args.get_one::<String>("include") {
        Some(header) if !header.is_empty() => Preamble::include(header.as_str()),
        _ => Preamble::None,
    };

    let report = EmissionWriter::new()
        .with_preamble(preamble)
        .emit_file(input, &spec, output)
        .with_context(|| format!("failed to emit {}", input.display()))?;

    if args.get_flag("json") {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        writeln!(
            out,
            "{}: {} bytes -> {} ({} bytes, blake3 {})",
            report.symbol,
            report.blob_len,
            report.path.display(),
            report.bytes_written,
            report.digest.short()
        )?;
    }
    Ok(Status::Success)
}

fn batch(args: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<Status> {
    let manifest = path_arg(args, "manifest")?;
    let plan = Manifest::load(manifest)
        .with_context(|| format!("failed to load manifest {}", manifest.display()))?;

    let runner = BatchRunner::new()
        .with_policy(if args.get_flag("keep-going") {
            BatchPolicy::Continue
        } else {
            BatchPolicy::AbortOnError
        })
        .with_execution(if args.get_flag("parallel") {
            Execution::Parallel
        } else {
            Execution::Sequential
        });
    let report = runner.run(&plan);

    if args.get_flag("json") {
        writeln!(out, "{}", serde_json::to_string_pretty(&report.summary())?)?;
    } else {
        for outcome in &report.targets {
            match outcome {
                TargetOutcome::Written(r) => writeln!(
                    out,
                    "written  {} -> {} ({} bytes)",
                    r.symbol,
                    r.path.display(),
                    r.bytes_written
                )?,
                TargetOutcome::Failed { symbol, error, .. } => {
                    writeln!(out, "failed   {symbol}: {error}")?;
                }
                TargetOutcome::Skipped { symbol, .. } => writeln!(out, "skipped  {symbol}")?,
            }
        }
        match &report.header {
            HeaderOutcome::NotRequested => {}
            HeaderOutcome::Written(receipt) => {
                writeln!(out, "written  header -> {}", receipt.path.display())?;
            }
            HeaderOutcome::Failed(error) => writeln!(out, "failed   header: {error}")?,
            HeaderOutcome::Skipped => writeln!(out, "skipped  header")?,
        }
    }

    Ok(if report.succeeded() {
        Status::Success
    } else {
        Status::Failure
    })
}

fn verify(args: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<Status> {
    let source = path_arg(args, "source")?;
    let text = fs::read_to_string(source)
        .with_context(|| format!("failed to read {}", source.display()))?;
    let decoded =
        decode(&text).with_context(|| format!("failed to decode {}", source.display()))?;

    writeln!(
        out,
        "{}: {} bytes, {} alignment {}, blake3 {}",
        decoded.symbol(),
        decoded.bytes().len(),
        decoded.dialect().as_str(),
        decoded.alignment().get(),
        BlobDigest::compute(decoded.bytes()).short()
    )?;

    let Some(input) = args.get_one::<PathBuf>("input") else {
        return Ok(Status::Success);
    };
    let expected =
        fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    match decoded.first_mismatch(&expected) {
        None => {
            writeln!(out, "matches {}", input.display())?;
            Ok(Status::Success)
        }
        Some(mismatch) => {
            let show = |b: Option<u8>| b.map_or_else(|| "end".to_string(), |b| format!("0x{b:02x}"));
            tracing::warn!(offset = mismatch.offset, "array differs from input");
            writeln!(
                out,
                "mismatch at offset {}: expected {}, found {}",
                mismatch.offset,
                show(mismatch.expected),
                show(mismatch.found)
            )?;
            Ok(Status::Failure)
        }
    }
}
