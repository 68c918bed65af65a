//! Declarative dotfile linker.
//!
//! Converges destinations to a declared state: each `create` declaration
//! makes a path a symlink to, or a copy of, a local file or URL; each
//! `filecontent` declaration keeps a text fragment present inside an existing
//! file. Runs are idempotent, dry-runnable and can report unified diffs.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: decode and validate the YAML/TOML/JSON declaration file
//! - **[`resources`]**: the reconcilers and the primitives they share
//!   (probing, backups, diffs, path resolution)
//! - **[`tasks`]**: resolved actions and the runner that executes them
//! - **[`commands`]**: top-level subcommand orchestration (`apply`, `validate`, …)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod logging;
pub mod operations;
pub mod platform;
pub mod resources;
pub mod tasks;

/// Version string: `DOTLINK_VERSION` at build time, else the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOTLINK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}
