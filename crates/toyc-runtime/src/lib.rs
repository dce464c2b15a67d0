//! Container lifecycle coordination for toyc.
//!
//! Namespace and mount setup is delegated to an external isolation
//! primitive; this crate decides whether an invocation is the container's
//! init or a joiner, builds the primitive's argument vector, supervises it
//! under signal-driven cancellation, and tears down runtime state when init
//! exits.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod descriptor;
pub mod invocation;
pub mod lifecycle;
pub mod supervisor;
