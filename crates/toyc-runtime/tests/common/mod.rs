//! Shared fixtures: a state home with one container and stand-in
//! isolation/teardown primitives that record how they were called.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use toyc_common::config::ToycConfig;
use toyc_common::error::Result;
use toyc_runtime::descriptor;
use toyc_runtime::lifecycle::{self, RunReport};

/// Serializes fixture setup and child spawning so no script is exec'd while
/// another test still holds it open for writing.
pub static SPAWN_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

pub struct Fixture {
    pub tmp: TempDir,
    pub config: ToycConfig,
    pub runtime: PathBuf,
}

impl Fixture {
    /// A state home holding container `c1`, whose runtime path lives under
    /// the temp dir and does not exist yet.
    pub fn new(isolator_body: &str) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let runtime = tmp.path().join("run").join("c1");
        let mut config = ToycConfig::new(tmp.path().join("state"));

        config.isolator = write_script(tmp.path(), "isolator", isolator_body);
        config.unpersister = write_script(
            tmp.path(),
            "unpersister",
            r#"printf '%s\n' "$@" > "${0%/*}/unpersist.args""#,
        );

        let fixture = Self { tmp, config, runtime };
        fixture.write_descriptor("[]");
        fixture
    }

    /// Loads container `name` and runs `command` in it, the way `toyc exec` does.
    pub async fn exec(&self, name: &str, command: Vec<String>) -> Result<RunReport> {
        let mut descriptor = descriptor::load(&self.config, name)?;
        descriptor.override_argv(command);
        lifecycle::launch(&self.config, &descriptor).await
    }

    /// Replaces the unpersister with a script running `body`.
    pub fn set_unpersister(&mut self, body: &str) {
        self.config.unpersister = write_script(self.tmp.path(), "unpersister", body);
    }

    /// Replaces the isolator with a script running `body`.
    pub fn set_isolator(&mut self, body: &str) {
        self.config.isolator = write_script(self.tmp.path(), "isolator", body);
    }

    pub fn write_descriptor(&self, mounts_json: &str) {
        let dir = self.config.container_dir("c1");
        std::fs::create_dir_all(&dir).unwrap();
        let json = format!(
            r#"{{"Root": "rootfs", "Argv": ["/bin/true"], "Mounts": {mounts_json}, "RuntimePath": "{}"}}"#,
            self.runtime.display()
        );
        std::fs::write(dir.join("container.json"), json).unwrap();
    }

    pub fn rootfs(&self) -> PathBuf {
        self.config.container_dir("c1").join("rootfs")
    }

    /// Arguments the isolator recorded, one per line.
    pub fn isolator_args(&self) -> Option<Vec<String>> {
        read_lines(&self.tmp.path().join("isolator.args"))
    }

    pub fn unpersist_args(&self) -> Option<Vec<String>> {
        read_lines(&self.tmp.path().join("unpersist.args"))
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.tmp.path().join(name)
    }
}

/// Isolator body that records its arguments, then exits with `code`.
pub fn recording_isolator(code: i32) -> String {
    format!(r#"printf '%s\n' "$@" > "${{0%/*}}/isolator.args"; exit {code}"#)
}

fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

fn read_lines(path: &Path) -> Option<Vec<String>> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.lines().map(str::to_owned).collect())
}
