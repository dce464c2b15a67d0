//! Container descriptors: the user-authored `container.json` files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use toyc_common::config::ToycConfig;
use toyc_common::error::{Result, ToycError};

/// Persistent definition of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerDescriptor {
    /// Container name. Always taken from the lookup, never from the file.
    pub name: String,
    /// Root filesystem seen by the isolated process.
    pub root: PathBuf,
    /// Default entrypoint.
    pub argv: Vec<String>,
    /// Mounts performed when the container's init starts.
    pub mounts: Vec<MountEntry>,
    /// Runtime path. Its existence marks the container as running.
    pub runtime_path: PathBuf,
}

/// One filesystem mount performed at container init.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MountEntry {
    /// Host path or type-specific source. Empty means `none`.
    pub source: String,
    /// Mount point, relative to the container root. Required.
    pub target: String,
    /// Mount type. Empty means `none`.
    #[serde(rename = "Type")]
    pub fs_type: String,
    /// Mount options, comma-joined on the command line.
    pub options: Vec<String>,
}

impl ContainerDescriptor {
    /// Makes `root` and `runtime_path` absolute by joining relative values
    /// onto `base`.
    pub fn absolutize(&mut self, base: &Path) {
        self.root = absolute_from(base, &self.root);
        self.runtime_path = absolute_from(base, &self.runtime_path);
    }
}

impl ContainerDescriptor {
    /// Replaces the entrypoint with `command`, unless it is empty.
    pub fn override_argv(&mut self, command: Vec<String>) {
        if !command.is_empty() {
            self.argv = command;
        }
    }
}

fn absolute_from(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Loads the named container's descriptor from the state home.
///
/// # Errors
///
/// Returns [`ToycError::NotFound`] if the descriptor file does not exist,
/// [`ToycError::Malformed`] if it cannot be decoded, and [`ToycError::Io`]
/// for any other read failure.
pub fn load(config: &ToycConfig, name: &str) -> Result<ContainerDescriptor> {
    load_from(&config.container_dir(name), name)
}

/// Loads a descriptor from an explicit container directory.
///
/// # Errors
///
/// See [`load`].
pub fn load_from(dir: &Path, name: &str) -> Result<ContainerDescriptor> {
    let path = dir.join(toyc_common::constants::DESCRIPTOR_FILE);
    tracing::debug!(path = %path.display(), "loading container descriptor");

    let content = match std::fs::read(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ToycError::NotFound {
                kind: "container",
                id: name.to_owned(),
            });
        }
        Err(e) => return Err(ToycError::Io { path, source: e }),
    };

    let mut descriptor: ContainerDescriptor =
        serde_json::from_slice(&content).map_err(|e| ToycError::Malformed { path, source: e })?;

    descriptor.name = name.to_owned();
    descriptor.absolutize(dir);
    Ok(descriptor)
}
