//! # Datashift command line
//!
//! ```bash
//! datashift inspect sales.csv report.xlsx
//! datashift convert sales.csv --to xlsx --dedup --fill-mean --columns id,amount --out-dir out
//! ```
//!
//! Every file is attempted. The exit status is non-zero when any of them
//! failed.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Command output goes to stdout

mod cli;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use datashift::config::Settings;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();

    let settings = Settings::resolve(cli.config.as_deref()).context("Failed to load settings")?;
    let log_dir = cli.log_dir.as_deref().or(settings.log_dir.as_deref());
    datashift::logging::init(&settings.log_level, log_dir)?;

    let succeeded = cli::run_command(&cli.command, &settings)?;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
