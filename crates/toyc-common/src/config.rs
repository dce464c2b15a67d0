//! Runtime configuration: where container state lives and which external
//! primitives do the isolation work.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::constants::{
    APP_NAME, CONTAINERS_DIR, DEFAULT_ISOLATOR, DEFAULT_UNPERSISTER, DESCRIPTOR_FILE, ENV_HOME,
    ENV_STATE_HOME, HOME_STATE_SUFFIX,
};
use crate::error::{Result, ToycError};

/// Root configuration for one toyc invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToycConfig {
    /// Per-user state directory.
    pub state_home: PathBuf,
    /// Isolation primitive, as a program name or path.
    pub isolator: String,
    /// Teardown primitive, as a program name or path.
    pub unpersister: String,
}

impl ToycConfig {
    /// Creates a configuration rooted at `state_home` using the default primitives.
    #[must_use]
    pub fn new(state_home: impl Into<PathBuf>) -> Self {
        Self {
            state_home: state_home.into(),
            isolator: DEFAULT_ISOLATOR.to_owned(),
            unpersister: DEFAULT_UNPERSISTER.to_owned(),
        }
    }

    /// Creates a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ToycError::Config`] if neither `XDG_STATE_HOME` nor `HOME` is set.
    pub fn from_env() -> Result<Self> {
        let xdg = std::env::var_os(ENV_STATE_HOME);
        let home = std::env::var_os(ENV_HOME);
        resolve_state_home(xdg.as_deref(), home.as_deref()).map(Self::new)
    }

    /// Directory holding the named container's descriptor.
    #[must_use]
    pub fn container_dir(&self, name: &str) -> PathBuf {
        self.state_home
            .join(APP_NAME)
            .join(CONTAINERS_DIR)
            .join(name)
    }

    /// Path of the named container's descriptor file.
    #[must_use]
    pub fn descriptor_path(&self, name: &str) -> PathBuf {
        self.container_dir(name).join(DESCRIPTOR_FILE)
    }
}

/// Resolves the state home from the values of `XDG_STATE_HOME` and `HOME`.
///
/// Empty values count as unset.
///
/// # Errors
///
/// Returns [`ToycError::Config`] when both are unset.
pub fn resolve_state_home(
    xdg_state_home: Option<&OsStr>,
    home: Option<&OsStr>,
) -> Result<PathBuf> {
    if let Some(dir) = xdg_state_home.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(home) = home.filter(|v| !v.is_empty()) {
        return Ok(Path::new(home).join(HOME_STATE_SUFFIX));
    }
    Err(ToycError::Config {
        message: format!(
            "no state home configured -- set the {ENV_STATE_HOME} or {ENV_HOME} environment variable"
        ),
    })
}
