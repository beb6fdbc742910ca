use std::io;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{config::AppConfig, infrastructure::directories::ResolvedPaths};

const LOG_FILE_PREFIX: &str = "monitor";
const LOG_FILE_SUFFIX: &str = "log";
const RETAINED_LOG_FILES: usize = 14;

/// Dependencies that log every request or parse step at info and below.
const QUIET_TARGETS: &[&str] = &["hyper_util", "reqwest", "html5ever", "selectors"];

static GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// `RUST_LOG` when set, otherwise `level` with chatty dependencies held at
/// warn. An unparseable level falls back to info.
fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let quiet: String = QUIET_TARGETS
        .iter()
        .map(|target| format!(",{target}=warn"))
        .collect();
    EnvFilter::try_new(format!("{}{quiet}", level.trim()))
        .unwrap_or_else(|_| EnvFilter::new(format!("info{quiet}")))
}

/// Console plus a daily `monitor.*.log` in the logs directory, keeping two
/// weeks of files. Later calls are no-ops.
pub fn init_tracing(config: &AppConfig, paths: &ResolvedPaths) -> Result<()> {
    if GUARD.get().is_some() {
        return Ok(());
    }

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(RETAINED_LOG_FILES)
        .build(&paths.logs_dir)
        .with_context(|| format!("failed to open log file in {}", paths.logs_dir.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(build_filter(&config.logging.level))
        .with(fmt::layer().with_writer(io::stdout).with_target(true))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_ansi(false),
        )
        .try_init()
        .context("a global tracing subscriber is already installed")?;
    let _ = GUARD.set(guard);

    tracing::info!(
        logs = %paths.logs_dir.display(),
        reports = %paths.reports_dir.display(),
        level = %config.logging.level,
        "tracing initialized"
    );
    Ok(())
}
