//! Program names, environment variables, and on-disk layout.

/// Application name, also the directory created beneath the state home.
pub const APP_NAME: &str = "toyc";

/// Directory beneath `<state-home>/toyc` that holds one subdirectory per container.
pub const CONTAINERS_DIR: &str = "containers";

/// File name of the container descriptor inside a container directory.
pub const DESCRIPTOR_FILE: &str = "container.json";

/// Default isolation primitive.
pub const DEFAULT_ISOLATOR: &str = "bst";

/// Default teardown primitive, run against the runtime path by init.
pub const DEFAULT_UNPERSISTER: &str = "bst-unpersist";

/// Primary state-home variable.
pub const ENV_STATE_HOME: &str = "XDG_STATE_HOME";

/// Fallback used to derive the state home when [`ENV_STATE_HOME`] is unset.
pub const ENV_HOME: &str = "HOME";

/// Terminal type, the only variable passed through to the child.
pub const ENV_TERM: &str = "TERM";

/// Overrides the isolation primitive.
pub const ENV_ISOLATOR: &str = "TOYC_ISOLATOR";

/// Overrides the teardown primitive.
pub const ENV_UNPERSISTER: &str = "TOYC_UNPERSIST";

/// State home relative to `$HOME` when `XDG_STATE_HOME` is unset.
pub const HOME_STATE_SUFFIX: &str = ".local/state";

/// Fixed binary search path given to the child process.
pub const CHILD_PATH: &str = "/bin:/usr/bin:/sbin:/usr/sbin";

/// Working directory inside the container.
pub const CONTAINER_WORKDIR: &str = "/";

/// Exit status base for children terminated by a signal.
pub const SIGNAL_EXIT_BASE: i32 = 128;

/// Exit status for configuration, load, and start failures.
pub const EXIT_FAILURE: i32 = 1;

/// Permission bits of a freshly created runtime directory, before umask.
pub const RUNTIME_DIR_MODE: u32 = 0o777;
