//! File-system helpers: staged replacement, parent creation, hashing.
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ActionError;
use crate::operations::FileSystemOps;
use crate::tasks::Context;

/// Run a mutating step unless this is a dry run.
///
/// `what` describes the step ("create link /a -> /b"); dry runs log it as a
/// would-be change, real runs log it at debug level before running `op`.
///
/// # Errors
///
/// Propagates the error returned by `op`.
pub fn perform(
    ctx: &Context,
    what: &str,
    op: impl FnOnce() -> Result<(), ActionError>,
) -> Result<(), ActionError> {
    if ctx.dry_run {
        ctx.log.dry_run(&format!("would {what}"));
        return Ok(());
    }
    ctx.log.debug(what);
    op()
}

/// Sibling path used to stage a replacement for `dest`.
///
/// Staying in the same directory keeps the final rename on one filesystem.
#[must_use]
pub fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map_or_else(|| "dotlink".into(), |n| n.to_string_lossy().into_owned());
    dest.with_file_name(format!(".{name}.dotlink-tmp"))
}

/// Create the parent directory of `path` (and any ancestors).
///
/// # Errors
///
/// Returns [`ActionError::Filesystem`] if the directory cannot be created.
pub fn ensure_parent_dir(ops: &dyn FileSystemOps, path: &Path) -> Result<(), ActionError> {
    if let Some(parent) = path.parent() {
        ops.create_dir_all(parent)
            .map_err(ActionError::fs("mkdir", parent))?;
    }
    Ok(())
}

/// Remove a stale staging entry left behind by an interrupted run.
fn clear_staging(ops: &dyn FileSystemOps, staging: &Path) -> Result<(), ActionError> {
    if ops
        .entry_kind(staging)
        .map_err(ActionError::fs("stat", staging))?
        .is_some()
    {
        ops.remove_file(staging)
            .map_err(ActionError::fs("unlink", staging))?;
    }
    Ok(())
}

/// Run `stage`, then rename the staging entry over `dest`; on failure the
/// staging entry is removed and the destination is left untouched.
fn swap_into_place(
    ops: &dyn FileSystemOps,
    dest: &Path,
    stage: impl FnOnce(&Path) -> Result<(), ActionError>,
) -> Result<(), ActionError> {
    let staging = staging_path(dest);
    clear_staging(ops, &staging)?;

    let result = stage(&staging).and_then(|()| {
        ops.rename(&staging, dest)
            .map_err(ActionError::fs("rename", dest))
    });
    if result.is_err()
        && let Err(e) = ops.remove_file(&staging)
    {
        tracing::debug!("could not remove staging entry {}: {e}", staging.display());
    }
    result
}

/// Atomically replace whatever is at `dest` with a regular file holding
/// `contents`, optionally with permission bits `mode`.
///
/// # Errors
///
/// Returns [`ActionError::Filesystem`] if staging, permission setting or
/// the final rename fails.
pub fn replace_file(
    ops: &dyn FileSystemOps,
    dest: &Path,
    contents: &[u8],
    mode: Option<u32>,
) -> Result<(), ActionError> {
    swap_into_place(ops, dest, |staging| {
        ops.write(staging, contents)
            .map_err(ActionError::fs("write", staging))?;
        if let Some(mode) = mode {
            ops.set_mode(staging, mode)
                .map_err(ActionError::fs("chmod", staging))?;
        }
        Ok(())
    })
}

/// Atomically replace whatever is at `dest` with a symlink to `source`.
///
/// # Errors
///
/// Returns [`ActionError::Filesystem`] if the link cannot be staged or
/// renamed into place.
pub fn replace_with_link(
    ops: &dyn FileSystemOps,
    source: &Path,
    dest: &Path,
) -> Result<(), ActionError> {
    swap_into_place(ops, dest, |staging| {
        ops.symlink(source, staging)
            .map_err(ActionError::fs("symlink", staging))
    })
}

/// Current content of `path` for diffing, following links.
///
/// Absent paths, dangling links and directories read as empty.
///
/// # Errors
///
/// Returns [`ActionError::Filesystem`] for any other read failure.
pub fn read_for_diff(ops: &dyn FileSystemOps, path: &Path) -> Result<Vec<u8>, ActionError> {
    match ops.read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::IsADirectory) => {
            Ok(Vec::new())
        }
        Err(e) => Err(ActionError::fs("read", path)(e)),
    }
}

/// Compute the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for b in &result {
        // write! to a String is infallible; unwrap_or(()) makes that explicit.
        write!(hex, "{b:02x}").unwrap_or(());
    }
    hex
}
