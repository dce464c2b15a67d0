//! CLI command definitions and dispatch.

pub mod exec;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use toyc_common::config::ToycConfig;
use toyc_common::constants::{
    APP_NAME, DEFAULT_ISOLATOR, DEFAULT_UNPERSISTER, ENV_ISOLATOR, ENV_UNPERSISTER,
};

/// toyc is a fast, lightweight toy container system.
///
/// Options go before the subcommand; nothing after a container name is
/// parsed as a toyc option.
#[derive(Parser, Debug)]
#[command(name = "toyc", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    pub verbose: bool,

    /// State directory. Defaults to `$XDG_STATE_HOME`, then `$HOME/.local/state`.
    #[arg(long)]
    pub state_home: Option<PathBuf>,

    /// Isolation primitive used to start and join containers.
    #[arg(long, env = ENV_ISOLATOR, default_value = DEFAULT_ISOLATOR)]
    pub isolator: String,

    /// Teardown primitive run when a container's init exits.
    #[arg(long, env = ENV_UNPERSISTER, default_value = DEFAULT_UNPERSISTER)]
    pub unpersister: String,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a program in the named container.
    Exec(exec::ExecArgs),
}

impl Cli {
    /// Resolves the runtime configuration from flags and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no state home can be determined.
    pub fn config(&self) -> anyhow::Result<ToycConfig> {
        let mut config = match &self.state_home {
            Some(dir) => ToycConfig::new(dir),
            None => ToycConfig::from_env()?,
        };
        config.isolator.clone_from(&self.isolator);
        config.unpersister.clone_from(&self.unpersister);
        Ok(config)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error for fatal conditions; the caller exits with status 1.
pub fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.config()?;
    tracing::debug!(?config, "configuration resolved");
    match cli.command {
        Command::Exec(args) => exec::execute(args, &config),
    }
}

/// Prints a diagnostic prefixed with the program name.
#[allow(clippy::print_stderr)]
pub fn report(message: &str) {
    eprintln!("{APP_NAME}: {message}");
}

/// Converts a numeric exit status into an [`ExitCode`].
pub fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}
