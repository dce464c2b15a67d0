//! Argument construction for the external isolation primitive.
//!
//! Init starts the container:
//!
//! ```text
//! -r <root> --persist <runtime> [--mount <spec>]... --workdir / -- <command>...
//! ```
//!
//! A joiner attaches to the namespaces persisted at the runtime path:
//!
//! ```text
//! --share <runtime> --workdir / -- <command>...
//! ```

use std::ffi::OsString;
use std::fmt;

use toyc_common::constants::CONTAINER_WORKDIR;
use toyc_common::error::{Result, ToycError};

use crate::descriptor::{ContainerDescriptor, MountEntry};

/// Placeholder for an empty mount source or type.
const NONE: &str = "none";

/// Which side of the container lifecycle an invocation is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// First process of the container. Owns the runtime path.
    Init,
    /// Attaches to a container some other invocation started.
    Joiner,
}

impl Role {
    /// Returns `true` for [`Role::Init`].
    #[must_use]
    pub const fn is_init(self) -> bool {
        matches!(self, Self::Init)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Joiner => write!(f, "joiner"),
        }
    }
}

/// Serializes a mount entry as `source=S,target=T,type=TY,OPT1,OPT2`.
///
/// # Errors
///
/// Returns [`ToycError::InvalidMount`] if the entry has no target.
pub fn mount_spec(index: usize, mount: &MountEntry) -> Result<String> {
    if mount.target.is_empty() {
        return Err(ToycError::InvalidMount {
            index,
            message: "mount entry must have a non-empty target".into(),
        });
    }
    let source = if mount.source.is_empty() { NONE } else { &mount.source };
    let fs_type = if mount.fs_type.is_empty() { NONE } else { &mount.fs_type };
    Ok(format!(
        "source={source},target={},type={fs_type},{}",
        mount.target,
        mount.options.join(",")
    ))
}

/// Checks that every mount entry can be serialized.
///
/// # Errors
///
/// Returns [`ToycError::InvalidMount`] for the first entry with an empty target.
pub fn validate(descriptor: &ContainerDescriptor) -> Result<()> {
    descriptor
        .mounts
        .iter()
        .enumerate()
        .try_for_each(|(i, m)| mount_spec(i, m).map(drop))
}

/// Builds the isolation primitive's argument vector.
///
/// Mounts are only emitted for [`Role::Init`], but every entry is
/// validated regardless of role, before any argument is produced.
///
/// # Errors
///
/// Returns [`ToycError::InvalidMount`] if any mount entry has an empty target.
pub fn build_args(
    descriptor: &ContainerDescriptor,
    role: Role,
    command: &[String],
) -> Result<Vec<OsString>> {
    let specs = descriptor
        .mounts
        .iter()
        .enumerate()
        .map(|(i, m)| mount_spec(i, m))
        .collect::<Result<Vec<_>>>()?;

    let mut args: Vec<OsString> = Vec::with_capacity(8 + 2 * specs.len() + command.len());
    match role {
        Role::Init => {
            args.push("-r".into());
            args.push(descriptor.root.clone().into_os_string());
            args.push("--persist".into());
            args.push(descriptor.runtime_path.clone().into_os_string());
            for spec in specs {
                args.push("--mount".into());
                args.push(spec.into());
            }
        }
        Role::Joiner => {
            args.push("--share".into());
            args.push(descriptor.runtime_path.clone().into_os_string());
        }
    }

    args.push("--workdir".into());
    args.push(CONTAINER_WORKDIR.into());
    args.push("--".into());
    args.extend(command.iter().map(OsString::from));

    tracing::debug!(%role, ?args, "built isolation primitive arguments");
    Ok(args)
}
