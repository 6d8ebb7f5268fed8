// monthend - month-end warehouse settlement, headless
// Reads shipping/return/receiving exports and writes 정산요약_<yymmdd>_<HHMM>.xlsx

mod exit_codes;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use monthend_recon::report::suggested_filename;
use monthend_recon::{RunOutcome, SettlementConfig, Upload};

use exit_codes::{settle_exit_code, EXIT_CONFIG, EXIT_PROCESSING, EXIT_SUCCESS, EXIT_UPLOAD_READ, EXIT_USAGE};

/// Environment variable naming the settlement config file.
const CONFIG_ENV: &str = "MONTHEND_CONFIG";
const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Parser)]
#[command(name = "monthend")]
#[command(about = "Settle last month's warehouse shipping, return and receiving exports into one workbook")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Warehouse exports (.xlsx, .xlsm, .xls, .xlsb, .ods, .csv), in any order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("MONTHEND_COMMIT"), ")",
        "\nengine:  monthend-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("MONTHEND_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::from(EXIT_SUCCESS)
            };
        }
    };

    logging::init_logging(&logging::LogConfig::default());

    match cmd_settle(&cli.files) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(CliError { code, kind, error }) => {
            eprintln!("error: [{kind}] {error}");
            eprintln!("---");
            eprintln!("{error:?}");
            ExitCode::from(code)
        }
    }
}

/// Failure reported to the operator: exit code, error kind, and the full cause chain.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub kind: &'static str,
    pub error: anyhow::Error,
}

impl CliError {
    fn new(code: u8, kind: &'static str, error: anyhow::Error) -> Self {
        Self { code, kind, error }
    }

    fn settle(err: monthend_recon::SettleError) -> Self {
        Self::new(settle_exit_code(&err), err.kind(), err.into())
    }
}

fn cmd_settle(files: &[PathBuf]) -> Result<PathBuf, CliError> {
    let config = load_config(&config_path())?;

    let uploads = files
        .iter()
        .map(|path| read_upload(path))
        .collect::<Result<Vec<_>, _>>()?;

    let now = Local::now().naive_local();
    let outcome = monthend_recon::run(&config, uploads, now.date()).map_err(CliError::settle)?;
    report_identification(&outcome);

    let path = PathBuf::from(suggested_filename(now));
    let result = monthend_io::write_report(&outcome.report, &path)
        .with_context(|| format!("writing {}", path.display()))
        .map_err(|e| CliError::new(EXIT_PROCESSING, "WriteReport", e))?;

    tracing::info!(
        period = %outcome.report.period,
        path = %path.display(),
        "{}",
        result.summary()
    );
    Ok(path)
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

/// Load the settlement config; `.json` files use the legacy JSON layout.
fn load_config(path: &Path) -> Result<SettlementConfig, CliError> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {} (set {CONFIG_ENV} to override)", path.display()))
        .map_err(|e| CliError::new(EXIT_CONFIG, "ConfigRead", e))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        SettlementConfig::from_json(&input)
    } else {
        SettlementConfig::from_toml(&input)
    };
    let config = parsed.map_err(CliError::settle)?;

    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

fn read_upload(path: &Path) -> Result<Upload, CliError> {
    monthend_io::read_upload(path)
        .with_context(|| format!("reading {}", path.display()))
        .map_err(|e| CliError::new(EXIT_UPLOAD_READ, "UploadRead", e))
}

fn report_identification(outcome: &RunOutcome) {
    if outcome.identified.is_empty() {
        tracing::warn!(
            skipped = outcome.skipped.len(),
            "no file matched a marker column; the workbook only holds the validation sheet"
        );
    }
    for (name, domain) in &outcome.identified {
        eprintln!("✓ {domain}: {name}");
    }
    for name in &outcome.skipped {
        eprintln!("⚠ unidentified, skipped: {name}");
    }
}
