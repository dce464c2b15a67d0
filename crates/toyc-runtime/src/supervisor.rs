//! Child process supervision.
//!
//! The child runs on its own task, which owns the process handle and is the
//! only place it is waited for. Callers get a [`ChildHandle`] to await the
//! outcome and a [`CancelHandle`] to request termination.

use std::ffi::{OsStr, OsString};
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use toyc_common::constants::{CHILD_PATH, ENV_TERM, EXIT_FAILURE, SIGNAL_EXIT_BASE};
use toyc_common::error::{Result, ToycError};

/// How a supervised child ended.
#[derive(Debug)]
pub enum Termination {
    /// The child exited normally with this code.
    Exited(i32),
    /// The child was killed by this signal number.
    Signaled(i32),
    /// The child could not be started, or could not be waited for.
    FailedToStart(ToycError),
}

impl Termination {
    /// Decodes a platform exit status.
    #[must_use]
    pub fn from_status(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => Self::Exited(code),
            (None, Some(signal)) => Self::Signaled(signal),
            (None, None) => Self::FailedToStart(ToycError::Spawn {
                program: String::new(),
                message: format!("undecodable exit status {status}"),
            }),
        }
    }

    /// Maps the termination onto this process's own exit status.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Exited(code) => *code,
            Self::Signaled(signal) => SIGNAL_EXIT_BASE + *signal,
            Self::FailedToStart(_) => EXIT_FAILURE,
        }
    }
}

/// Requests termination of a supervised child.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: mpsc::UnboundedSender<Signal>,
}

impl CancelHandle {
    /// Asks the child to terminate by delivering `signal`.
    ///
    /// Best-effort: a child that already exited is left alone.
    pub fn request(&self, signal: Signal) {
        if self.tx.send(signal).is_err() {
            tracing::debug!(%signal, "child already reaped, cancellation dropped");
        }
    }
}

/// A running child. Awaiting it yields its [`Termination`].
#[derive(Debug)]
pub struct ChildHandle {
    pid: u32,
    cancel: CancelHandle,
    done: oneshot::Receiver<Termination>,
}

impl ChildHandle {
    /// PID of the child.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns a handle that can request cancellation while the child is awaited.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Waits for the child to be reaped.
    pub async fn wait(self) -> Termination {
        self.done.await.unwrap_or_else(|_| {
            Termination::FailedToStart(ToycError::Spawn {
                program: String::new(),
                message: "supervisor task ended without reporting".into(),
            })
        })
    }
}

/// Starts `program` with inherited standard streams and a restricted
/// environment: `TERM` is passed through and `PATH` is fixed.
///
/// `program` is looked up on the caller's `PATH`, not the child's.
///
/// # Errors
///
/// Returns [`ToycError::Spawn`] if the program cannot be found or started.
pub fn spawn(program: &str, args: &[OsString]) -> Result<ChildHandle> {
    let path = which::which(program).map_err(|e| ToycError::Spawn {
        program: program.to_owned(),
        message: e.to_string(),
    })?;
    let term = std::env::var_os(ENV_TERM).unwrap_or_default();

    let mut child = Command::new(&path)
        .args(args)
        .env_clear()
        .env(ENV_TERM, term)
        .env("PATH", OsStr::new(CHILD_PATH))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| ToycError::Spawn {
            program: program.to_owned(),
            message: e.to_string(),
        })?;

    let pid = child.id().unwrap_or_default();
    tracing::info!(program = %path.display(), pid, "child started");

    let (cancel_tx, mut cancel_rx) = mpsc::unbounded_channel::<Signal>();
    let (done_tx, done_rx) = oneshot::channel();

    let _ = tokio::spawn(async move {
        let termination = loop {
            tokio::select! {
                status = child.wait() => {
                    break match status {
                        Ok(status) => Termination::from_status(status),
                        Err(e) => Termination::FailedToStart(ToycError::Spawn {
                            program: path.display().to_string(),
                            message: format!("waiting for child: {e}"),
                        }),
                    };
                }
                Some(signal) = cancel_rx.recv() => {
                    if let Some(id) = child.id() {
                        deliver(id, signal);
                    }
                }
            }
        };
        tracing::info!(pid, ?termination, "child reaped");
        let _ = done_tx.send(termination);
    });

    Ok(ChildHandle {
        pid,
        cancel: CancelHandle { tx: cancel_tx },
        done: done_rx,
    })
}

fn deliver(id: u32, signal: Signal) {
    let Ok(raw) = i32::try_from(id) else {
        return;
    };
    match kill(Pid::from_raw(raw), signal) {
        Ok(()) => tracing::info!(pid = id, %signal, "forwarded signal to child"),
        Err(e) => tracing::warn!(pid = id, %signal, error = %e, "failed to signal child"),
    }
}
