//! Shared plumbing for the `nw` transfer tool.
//!
//! - [`error`]: the error taxonomy every operation returns
//! - [`diagnostics`]: the logging collaborator passed into operations
//! - [`config`]: runtime, output and tracing configuration
//! - [`run`]: builds the tokio runtime and tracing subscriber, then drives an operation
//!
//! Logging always goes to stderr (or a log file), never stdout: stdout may be the
//! destination of the transferred bytes.

use anyhow::{Context, anyhow};
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod diagnostics;
pub mod error;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use config::{OutputConfig, RuntimeConfig, TracingConfig};
pub use diagnostics::{Diagnostics, NoDiagnostics, Role, SessionState, TracingDiagnostics};
pub use error::Error;

fn open_log_file(path: &std::path::Path, mode: u32) -> anyhow::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .mode(mode)
        .open(path)
        .with_context(|| format!("failed to open log file {path:?}"))
}

fn init_tracing(output: &OutputConfig, tracing: &TracingConfig) -> anyhow::Result<()> {
    let default_level = if output.quiet && tracing.log_file.is_none() {
        "off"
    } else {
        output.level()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let res = if let Some(path) = &tracing.log_file {
        let file = open_log_file(path, tracing.log_file_mode)?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .try_init()
    } else {
        builder.with_writer(std::io::stderr).try_init()
    };
    res.map_err(|err| anyhow!("failed to initialize tracing: {err}"))
}

fn build_runtime(runtime: &RuntimeConfig) -> anyhow::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if runtime.max_workers > 0 {
        builder.worker_threads(runtime.max_workers);
    }
    builder.build().context("failed to build tokio runtime")
}

/// Runs `func` to completion on a fresh tokio runtime.
///
/// Returns `None` if setup or the operation failed; the error has already been logged
/// and, unless quiet, printed to stderr.
pub fn run<Fut, Summary, E>(
    output: OutputConfig,
    runtime: RuntimeConfig,
    tracing: TracingConfig,
    func: impl FnOnce() -> Fut,
) -> Option<Summary>
where
    Fut: std::future::Future<Output = Result<Summary, E>>,
    Summary: std::fmt::Display,
    E: std::fmt::Display,
{
    if let Err(error) = init_tracing(&output, &tracing) {
        eprintln!("{error:#}");
        return None;
    }
    let runtime = match build_runtime(&runtime) {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!("{:#}", &error);
            if !output.quiet {
                eprintln!("{error:#}");
            }
            return None;
        }
    };
    match runtime.block_on(func()) {
        Ok(summary) => {
            if output.print_summary || output.verbose > 0 {
                eprintln!("{summary}");
            }
            Some(summary)
        }
        Err(error) => {
            tracing::error!("{}", &error);
            if !output.quiet {
                eprintln!("{error}");
            }
            None
        }
    }
}
