//! # toyc
//!
//! A fast, lightweight toy container system. Namespace and mount setup is
//! delegated to an external isolation primitive.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match commands::execute(cli) {
        Ok(code) => code,
        Err(e) => {
            commands::report(&format!("{e:#}"));
            commands::exit_code(toyc_common::constants::EXIT_FAILURE)
        }
    }
}
