//! apkanalyzer CLI - Command-line utility for inspecting Android application
//! packages and zip-like archives.

mod cli;
mod commands;
mod dispatch;
mod error;

use apkanalyzer_core::ArchiveManager;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::debug;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = dispatch::report_parse_error(&err, &mut io::stdout(), &mut io::stderr())
                .unwrap_or(dispatch::FAILURE);
            return ExitCode::from(code);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(cli.log_level().into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut manager = ArchiveManager::new();
    let code = dispatch::run(
        &cli,
        &manager,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )
    .unwrap_or_else(|e| {
        debug!(error = %e, "failed to write to the terminal");
        dispatch::FAILURE
    });

    let report = manager.close();
    if report.is_clean() {
        debug!(
            archives = report.archives_closed,
            temp_dirs = report.temp_dirs_removed,
            "cleanup complete"
        );
    } else {
        warn!(failures = report.failures.len(), "cleanup incomplete");
    }

    ExitCode::from(code)
}
