//! `toyc exec`: execute a program in the named container.
//!
//! The first invocation for a container becomes its init and starts it;
//! later ones join it while it runs.

use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use toyc_common::config::ToycConfig;
use toyc_common::error::ToycError;
use toyc_runtime::{descriptor, lifecycle};
use toyc_runtime::supervisor::Termination;

/// Arguments for the `exec` command.
///
/// The container name and the program share one positional so that option
/// parsing stops at the name: every word after it, flags included, belongs
/// to the program.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Container name, then the program and its arguments.
    #[arg(
        value_names = ["NAME", "PROGRAM"],
        num_args = 2..,
        trailing_var_arg = true,
        required = true
    )]
    argv: Vec<String>,
}

impl ExecArgs {
    /// Container name.
    pub fn name(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// Program and arguments to run in the container.
    pub fn command(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    /// Splits into the container name and the command.
    fn into_parts(self) -> anyhow::Result<(String, Vec<String>)> {
        let mut argv = self.argv.into_iter();
        let name = argv.next().context("missing container name")?;
        Ok((name, argv.collect()))
    }
}

/// Executes the `exec` command.
///
/// # Errors
///
/// Returns an error if the container cannot be loaded or prepared, or the
/// isolation primitive cannot be started.
pub fn execute(args: ExecArgs, config: &ToycConfig) -> anyhow::Result<ExitCode> {
    let label = format!("exec {} {}", args.name(), args.command().join(" "));
    let (name, command) = args.into_parts()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .with_context(|| format!("{label}: starting async runtime"))?;

    let mut descriptor = descriptor::load(config, &name)
        .with_context(|| format!("{label}: loading container"))?;
    descriptor.override_argv(command);

    let report = runtime
        .block_on(lifecycle::launch(config, &descriptor))
        .map_err(|e| {
            let stage = stage(&e);
            anyhow::Error::new(e).context(format!("{label}: {stage}"))
        })?;

    for e in &report.teardown_errors {
        super::report(&format!("cleanup: {e}"));
    }

    let code = report.exit_code();
    if let Termination::FailedToStart(e) = report.termination {
        return Err(anyhow::Error::new(e).context(format!("{label}: running command")));
    }
    Ok(super::exit_code(code))
}

/// Names the launch stage an error came from.
const fn stage(err: &ToycError) -> &'static str {
    match err {
        ToycError::InvalidMount { .. } => "preparing command",
        ToycError::Io { .. } => "claiming runtime path",
        _ => "running command",
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::commands::{Cli, Command};

    fn parse(argv: &[&str]) -> ExecArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Exec(args) => args,
        }
    }

    #[test]
    fn flags_after_name_pass_through() {
        let args = parse(&["toyc", "exec", "c1", "ls", "-l", "--color=never"]);
        assert_eq!(args.name(), "c1");
        assert_eq!(args.command(), ["ls", "-l", "--color=never"]);
    }

    #[test]
    fn toyc_flag_right_after_name_belongs_to_command() {
        let cli = Cli::try_parse_from(["toyc", "exec", "c1", "-v", "ls"]).unwrap();
        assert!(!cli.verbose);
        let Command::Exec(args) = cli.command;
        assert_eq!(args.name(), "c1");
        assert_eq!(args.command(), ["-v", "ls"]);
    }

    #[test]
    fn isolator_flag_after_name_does_not_switch_primitive() {
        let cli = Cli::try_parse_from(["toyc", "exec", "c1", "--isolator", "x", "sh"]).unwrap();
        assert_ne!(cli.isolator, "x");
        let Command::Exec(args) = cli.command;
        assert_eq!(args.command(), ["--isolator", "x", "sh"]);
    }

    #[test]
    fn help_flag_after_name_belongs_to_command() {
        let args = parse(&["toyc", "exec", "c1", "--help"]);
        assert_eq!(args.command(), ["--help"]);
    }

    #[test]
    fn toyc_flags_are_rejected_after_subcommand() {
        let err = Cli::try_parse_from(["toyc", "exec", "--isolator", "x", "c1", "sh"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn invalid_mount_reports_prepare_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ToycConfig::new(tmp.path());
        let dir = config.container_dir("c1");
        std::fs::create_dir_all(&dir).unwrap();
        let runtime = tmp.path().join("run");
        std::fs::write(
            dir.join("container.json"),
            format!(
                r#"{{"Root": "/", "RuntimePath": "{}", "Mounts": [{{"Source": "/x"}}]}}"#,
                runtime.display()
            ),
        )
        .unwrap();
        let args = parse(&["toyc", "exec", "c1", "true"]);

        let err = execute(args, &config).unwrap_err();
        assert!(format!("{err:#}").starts_with("exec c1 true: preparing command: mount entry 0"));
        assert!(!runtime.exists());
    }

    #[test]
    fn command_is_required() {
        let err = Cli::try_parse_from(["toyc", "exec", "c1"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_container_reports_load_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ToycConfig::new(tmp.path());
        let args = parse(&["toyc", "exec", "ghost", "true"]);

        let err = execute(args, &config).unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            "exec ghost true: loading container: container not found: ghost"
        );
    }
}
