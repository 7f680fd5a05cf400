//! Logging setup.
//!
//! Human-readable logs go to stderr. When a log file or directory is
//! configured, events are also written there as JSON lines through a
//! non-blocking writer; the returned guard must live until exit so the
//! writer flushes.
//!
//! Filter precedence: `RUST_LOG`, then `-q`/`-v`, then config `log_level`.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const ENV_LOG_PATH: &str = "SNIPPET_LINT_LOG_PATH";
const ENV_LOG_DIR: &str = "SNIPPET_LINT_LOG_DIR";
const LOG_FILE_PREFIX: &str = "snippet-lint.jsonl";

/// Where file logs go, if anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Explicit log file (appended to).
    pub log_path: Option<PathBuf>,
    /// Directory for daily-rotated log files.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Read `SNIPPET_LINT_LOG_PATH` / `SNIPPET_LINT_LOG_DIR`, falling back to
    /// the config file's `log_dir`.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        Self {
            log_path: std::env::var_os(ENV_LOG_PATH).map(PathBuf::from),
            log_dir: std::env::var_os(ENV_LOG_DIR)
                .map(PathBuf::from)
                .or(config_log_dir),
        }
    }
}

/// Build the event filter.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => default_level,
            1 => "debug",
            _ => "trace",
        }
    };
    EnvFilter::new(level)
}

/// Install the global subscriber.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match file_writer(config)? {
        Some((writer, guard)) => (
            Some(fmt::layer().json().with_writer(writer)),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

fn file_writer(config: &ObservabilityConfig) -> anyhow::Result<Option<(NonBlocking, WorkerGuard)>> {
    if let Some(ref path) = config.log_path {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        return Ok(Some(tracing_appender::non_blocking(file)));
    }

    if let Some(ref dir) = config.log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        return Ok(Some(tracing_appender::non_blocking(appender)));
    }

    Ok(None)
}
