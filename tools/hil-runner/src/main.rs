//! # hil-runner
//!
//! Entry point for the hardware-in-the-loop scenario suite.

mod cli;
mod logging;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, CliHandler};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::initialize_logging(cli.log_format, "info")?;

    let handler = CliHandler::new(cli.config.as_deref())?;
    let passed = handler.handle_command(cli.command)?;

    if passed {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!("One or more scenarios did not pass");
        Ok(ExitCode::FAILURE)
    }
}
