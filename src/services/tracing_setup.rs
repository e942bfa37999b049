//! Tracing subscriber setup
//!
//! Shared tracing configuration for the `dfs` binary and tests. Facade log
//! records carry structured `op`, `path` and `error` fields; the filter comes
//! from `RUST_LOG` with a per-caller default level.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Where log records go
pub enum LogTarget {
    Stderr,
    File(File),
}

/// Initialize the global tracing subscriber.
///
/// Logs go to `log_file_path` when given (the file is truncated), otherwise
/// to stderr. Fails if the file cannot be created or a global subscriber is
/// already installed.
pub fn init_global(log_file_path: Option<&Path>, default_level: Level) -> io::Result<()> {
    let target = match log_file_path {
        Some(path) => LogTarget::File(File::create(path)?),
        None => LogTarget::Stderr,
    };
    build_subscriber(target, default_level)
        .try_init()
        .map_err(io::Error::other)
}

/// Build a subscriber writing to `target`, filtered by `RUST_LOG` or
/// `default_level` when unset
pub fn build_subscriber(
    target: LogTarget,
    default_level: Level,
) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level).into())
        .from_env_lossy();

    let fmt_layer = match target {
        LogTarget::File(file) => fmt::layer()
            .with_writer(BoxMakeWriter::new(Arc::new(file)))
            .with_ansi(false),
        LogTarget::Stderr => fmt::layer().with_writer(BoxMakeWriter::new(io::stderr)),
    };

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
