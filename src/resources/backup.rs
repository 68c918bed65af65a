//! Timestamped backups of files about to be replaced.
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::ActionError;
use crate::operations::FileSystemOps;

/// `strftime` format of the suffix appended to backup names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Moves files aside before destructive replacement.
///
/// Without a root, `/etc/hosts` is renamed to `/etc/hosts.20240101120000`.
/// With a root `/backups`, it becomes `/backups/etc/hosts.20240101120000`.
/// If that name is taken, `.1`, `.2`, … is appended.
#[derive(Debug, Clone, Default)]
pub struct BackupManager {
    root: Option<PathBuf>,
}

impl BackupManager {
    /// Backups beside the original (`None`) or mirrored under `root`.
    #[must_use]
    pub const fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// The dedicated backup root, if any.
    #[cfg(test)]
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Pick a free backup path for `original` using the current local time.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Filesystem`] if a candidate cannot be probed.
    pub fn plan(&self, ops: &dyn FileSystemOps, original: &Path) -> Result<PathBuf, ActionError> {
        let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.plan_at(ops, original, &stamp)
    }

    /// Pick a free backup path for `original` using `stamp` as the suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Filesystem`] if a candidate cannot be probed.
    pub fn plan_at(
        &self,
        ops: &dyn FileSystemOps,
        original: &Path,
        stamp: &str,
    ) -> Result<PathBuf, ActionError> {
        let file_name = original
            .file_name()
            .map_or_else(|| "backup".into(), |n| n.to_string_lossy().into_owned());
        let name = format!("{file_name}.{stamp}");
        let parent = original.parent().unwrap_or_else(|| Path::new(""));

        let dir = self.root.as_ref().map_or_else(
            || parent.to_path_buf(),
            |root| {
                parent
                    .components()
                    .filter(|c| matches!(c, Component::Normal(_)))
                    .fold(root.clone(), |acc, c| acc.join(c))
            },
        );

        let mut candidate = dir.join(&name);
        let mut n = 0u32;
        while ops
            .entry_kind(&candidate)
            .map_err(ActionError::fs("stat", &candidate))?
            .is_some()
        {
            n += 1;
            candidate = dir.join(format!("{name}.{n}"));
        }
        Ok(candidate)
    }

    /// Move `original` to `backup`, creating the backup directory when a
    /// dedicated root is used.
    ///
    /// Falls back to copy-then-remove when the backup root is on another
    /// filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Filesystem`] if the directory cannot be
    /// created or the file cannot be moved.
    pub fn move_aside(
        &self,
        ops: &dyn FileSystemOps,
        original: &Path,
        backup: &Path,
    ) -> Result<(), ActionError> {
        if self.root.is_some()
            && let Some(parent) = backup.parent()
        {
            ops.create_dir_all(parent)
                .map_err(ActionError::fs("mkdir", parent))?;
        }

        match ops.rename(original, backup) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                ops.copy(original, backup)
                    .map_err(ActionError::fs("copy", original))?;
                ops.remove_file(original)
                    .map_err(ActionError::fs("unlink", original))
            }
            Err(e) => Err(ActionError::fs("rename", original)(e)),
        }
    }

    /// Plan a backup for `original` and move it there.
    ///
    /// # Errors
    ///
    /// See [`plan`](Self::plan) and [`move_aside`](Self::move_aside).
    pub fn back_up(&self, ops: &dyn FileSystemOps, original: &Path) -> Result<PathBuf, ActionError> {
        let backup = self.plan(ops, original)?;
        self.move_aside(ops, original, &backup)?;
        tracing::debug!("backed up {} to {}", original.display(), backup.display());
        Ok(backup)
    }
}
