use blobarray_cli::{cli, run, LogFormat};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(LogFormat::from_matches(&matches));

    let mut stdout = std::io::stdout().lock();
    match run(&matches, &mut stdout) {
        Ok(status) => status.into(),
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
