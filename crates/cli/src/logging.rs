//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Everything goes to stderr in the compact single-line format, leaving stdout
//! for the path of the written workbook. `RUST_LOG` overrides the default
//! filter.
//!
//! - `warn`: uploads skipped because no marker column matched
//! - `info`: identified uploads, report summary, output path
//! - `debug`: per-domain row counts before and after classification

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for the workspace crates; everything else stays at `warn`.
    pub level: Level,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_ansi: io::stderr().is_terminal(),
        }
    }
}

/// Install the global subscriber. Call once, at startup.
pub fn init_logging(config: &LogConfig) {
    init_logging_with_writer(config, io::stderr);
}

pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .compact()
        .with_writer(writer)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .init();
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

fn default_directives(level: Level) -> String {
    format!(
        "warn,monthend={level},monthend_recon={level},monthend_io={level}",
        level = level.as_str().to_lowercase()
    )
}
