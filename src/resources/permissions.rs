//! Permission-bit enforcement after a destination has been materialised.
use std::path::Path;

use super::{Applied, Severity};
use super::helpers::fs::perform;
use crate::config::link::FileMode;
use crate::error::ActionError;
use crate::tasks::Context;

/// Bring the mode of `dest` (following links) to `wanted`.
///
/// Does nothing when no mode is wanted or `dest` does not exist (as after a
/// dry run that only planned its creation). A dry run that planned a change
/// skips the probe too, since `dest` still holds the old entry. A mode change
/// turns an "already exists" outcome into its "mode changed" counterpart;
/// other outcomes are kept.
///
/// # Errors
///
/// Returns [`ActionError::Filesystem`] if the mode cannot be read or set.
pub fn sync_mode(
    ctx: &Context,
    dest: &Path,
    wanted: Option<FileMode>,
    applied: Applied,
) -> Result<Applied, ActionError> {
    let Some(wanted) = wanted else {
        return Ok(applied);
    };
    if ctx.dry_run && applied.outcome.severity() == Severity::Changed {
        return Ok(applied);
    }
    let ops = ctx.fs_ops.as_ref();
    if !ops.exists(dest) {
        return Ok(applied);
    }

    let current = ops.mode(dest).map_err(ActionError::fs("stat", dest))?;
    if current == wanted.bits() {
        return Ok(applied);
    }

    perform(
        ctx,
        &format!("chmod {current:03o} -> {wanted} {}", dest.display()),
        || {
            ops.set_mode(dest, wanted.bits())
                .map_err(ActionError::fs("chmod", dest))
        },
    )?;
    Ok(Applied {
        outcome: applied.outcome.with_mode_changed(),
        ..applied
    })
}
