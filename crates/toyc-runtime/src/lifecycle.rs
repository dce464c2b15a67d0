//! Container lifecycle coordination.
//!
//! One invocation manages one container: claim the init role or join, run
//! the isolation primitive under signal-driven cancellation, and, if init,
//! tear the runtime path down once the child has been reaped.

use std::io::ErrorKind;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;
use std::process::Stdio;

use nix::sys::signal::Signal;
use tokio::process::Command;
use tokio::signal::unix::{SignalKind, signal};
use toyc_common::config::ToycConfig;
use toyc_common::constants::RUNTIME_DIR_MODE;
use toyc_common::error::{Result, ToycError};

use crate::descriptor::ContainerDescriptor;
use crate::invocation::{self, Role};
use crate::supervisor::{self, Termination};

/// Result of one container run.
#[derive(Debug)]
pub struct RunReport {
    /// Role this invocation held.
    pub role: Role,
    /// How the isolation primitive ended.
    pub termination: Termination,
    /// Cleanup failures. These never affect [`RunReport::exit_code`].
    pub teardown_errors: Vec<ToycError>,
}

impl RunReport {
    /// Exit status for this invocation.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.termination.exit_code()
    }
}

/// Runs a resolved descriptor's `argv` in its container.
///
/// Signal handlers are installed before the runtime path is claimed, so a
/// termination signal can never leave a claimed path behind.
///
/// # Errors
///
/// Returns an error if a mount entry is invalid, signal handlers cannot be
/// installed, or the runtime path cannot be probed or created. Nothing has
/// been claimed in any of these cases. Child failures, including a
/// primitive that cannot be started, are reported through the
/// [`RunReport`] instead.
pub async fn launch(config: &ToycConfig, descriptor: &ContainerDescriptor) -> Result<RunReport> {
    invocation::validate(descriptor)?;
    let signals = TerminationSignals::install()?;

    let role = claim_role(&descriptor.runtime_path)?;
    tracing::info!(
        name = %descriptor.name,
        %role,
        runtime = %descriptor.runtime_path.display(),
        "role determined"
    );

    let termination = supervise(config, descriptor, role, signals).await;

    let teardown_errors = if role.is_init() {
        teardown(config, &descriptor.runtime_path).await
    } else {
        Vec::new()
    };

    Ok(RunReport {
        role,
        termination,
        teardown_errors,
    })
}

/// Claims the init role by creating `runtime_path` exclusively.
///
/// If the directory already exists some other invocation is init and this
/// one joins; nothing is created or removed in that case.
///
/// # Errors
///
/// Returns [`ToycError::Io`] if the path cannot be created for any reason
/// other than already existing.
pub fn claim_role(runtime_path: &Path) -> Result<Role> {
    if let Some(parent) = runtime_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ToycError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    match std::fs::DirBuilder::new()
        .mode(RUNTIME_DIR_MODE)
        .create(runtime_path)
    {
        Ok(()) => Ok(Role::Init),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(Role::Joiner),
        Err(e) => Err(ToycError::Io {
            path: runtime_path.to_path_buf(),
            source: e,
        }),
    }
}

/// Runs the isolation primitive and races it against termination signals.
///
/// A signal is forwarded to the child, after which the child is still
/// awaited to completion.
async fn supervise(
    config: &ToycConfig,
    descriptor: &ContainerDescriptor,
    role: Role,
    mut signals: TerminationSignals,
) -> Termination {
    let args = match invocation::build_args(descriptor, role, &descriptor.argv) {
        Ok(args) => args,
        Err(e) => return Termination::FailedToStart(e),
    };

    let child = match supervisor::spawn(&config.isolator, &args) {
        Ok(child) => child,
        Err(e) => return Termination::FailedToStart(e),
    };
    let pid = child.pid();
    let cancel = child.cancel_handle();
    let wait = child.wait();
    tokio::pin!(wait);

    tokio::select! {
        termination = &mut wait => termination,
        Some(signal) = signals.recv() => {
            tracing::warn!(%signal, pid, "termination signal received, cancelling container");
            cancel.request(signal);
            wait.await
        }
    }
}

/// Runs the teardown primitive against `runtime_path`, then removes it.
///
/// Both steps are attempted once; failures are returned, not raised.
async fn teardown(config: &ToycConfig, runtime_path: &Path) -> Vec<ToycError> {
    let mut errors = Vec::new();

    if let Err(message) = unpersist(&config.unpersister, runtime_path).await {
        errors.push(ToycError::Teardown {
            step: config.unpersister.clone(),
            path: runtime_path.to_path_buf(),
            message,
        });
    }

    if let Err(e) = std::fs::remove_dir(runtime_path) {
        errors.push(ToycError::Teardown {
            step: "rmdir".into(),
            path: runtime_path.to_path_buf(),
            message: e.to_string(),
        });
    }

    for e in &errors {
        tracing::warn!(error = %e, "cleanup failed");
    }
    if errors.is_empty() {
        tracing::info!(runtime = %runtime_path.display(), "runtime path torn down");
    }
    errors
}

async fn unpersist(program: &str, runtime_path: &Path) -> std::result::Result<(), String> {
    let status = Command::new(program)
        .arg(runtime_path)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| e.to_string())?;
    if status.success() {
        Ok(())
    } else {
        Err(status.to_string())
    }
}

/// Hangup, interrupt, terminate, and quit, merged into one stream.
struct TerminationSignals {
    hangup: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

impl TerminationSignals {
    fn install() -> Result<Self> {
        let listen = |kind: SignalKind| {
            signal(kind).map_err(|e| ToycError::Spawn {
                program: "signal handler".into(),
                message: e.to_string(),
            })
        };
        Ok(Self {
            hangup: listen(SignalKind::hangup())?,
            interrupt: listen(SignalKind::interrupt())?,
            terminate: listen(SignalKind::terminate())?,
            quit: listen(SignalKind::quit())?,
        })
    }

    /// Waits for the next termination signal.
    async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            Some(()) = self.hangup.recv() => Some(Signal::SIGHUP),
            Some(()) = self.interrupt.recv() => Some(Signal::SIGINT),
            Some(()) = self.terminate.recv() => Some(Signal::SIGTERM),
            Some(()) = self.quit.recv() => Some(Signal::SIGQUIT),
            else => None,
        }
    }
}
