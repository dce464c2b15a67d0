//! A termination signal arriving right after the runtime path is claimed.
//!
//! Own test binary for the same reason as `signal_test.rs`: it sends SIGINT
//! to the test process.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::time::Duration;

use common::Fixture;
use nix::sys::signal::{Signal, kill};
use nix::unistd::getpid;
use toyc_runtime::invocation::Role;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn interrupt_once_runtime_path_exists_is_handled() {
    let fx = Fixture::new("exec sleep 30");

    // Watch from a plain thread so the signal lands as soon as the path
    // appears, independent of where the runtime is polling.
    let runtime = fx.runtime.clone();
    let watcher = std::thread::spawn(move || {
        for _ in 0..10_000 {
            if runtime.exists() {
                kill(getpid(), Signal::SIGINT).unwrap();
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    });

    let report = fx.exec("c1", Vec::new()).await.unwrap();
    assert!(watcher.join().unwrap(), "runtime path never appeared");

    assert_eq!(report.role, Role::Init);
    assert_eq!(report.exit_code(), 130);
    assert_eq!(fx.unpersist_args(), Some(vec![fx.runtime.display().to_string()]));
    assert!(!fx.runtime.exists());
}
