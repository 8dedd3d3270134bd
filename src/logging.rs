//! File-backed structured logging.
//!
//! stdout/stdin belong to the child shell's raw-mode session, so diagnostics
//! go to a rolling file instead.

use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;

/// Must be kept alive for the duration of the process; dropping it stops
/// the non-blocking writer from flushing.
pub struct LogGuard(#[allow(dead_code)] WorkerGuard);

pub fn init(log_path: &Path) -> Result<LogGuard> {
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = log_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "consolemux.log".to_string());

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok();

    Ok(LogGuard(guard))
}
