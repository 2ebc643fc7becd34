//! Entry point for the `routecycle` binary.
//!
//! Parses arguments, points the logging layer at stderr with the requested
//! level, dispatches to the solve command (or the hidden worker mode), and
//! maps failures to stable exit codes: 0 = success (including "no cycle"),
//! 1 = runtime failure, 2 = configuration/input failure.
mod cli;
mod cmd;
mod error;

use clap::Parser as _;

use crate::cli::{Cli, LogLevel};
use crate::error::CliError;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    if let Err(e) = run(&cli) {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    match (&cli.process_worker, &cli.input_file) {
        (Some(work_dir), _) => cmd::worker::run(work_dir),
        (None, Some(input_file)) => cmd::solve::run(input_file, cli.buckets),
        // clap's required_unless_present enforces this; kept as an error
        // rather than a panic for embedding callers.
        (None, None) => Err(CliError::InputRequired),
    }
}

/// Diagnostics go to stderr only; stdout carries nothing but the result.
fn init_logging(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_max_level(level.as_tracing_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
