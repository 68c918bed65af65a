//! Classification of whatever currently sits at a destination path.
use std::path::{Path, PathBuf};

use super::paths::normalize;
use crate::error::ActionError;
use crate::operations::{EntryKind, FileSystemOps};

/// Current state of a destination, recomputed on every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationState {
    /// Nothing exists at the path.
    Absent,
    /// A symlink whose target does not exist; holds the stored target.
    BrokenLink(PathBuf),
    /// A symlink to something that exists; holds the stored target.
    Link(PathBuf),
    /// A regular file.
    RegularFile,
    /// A directory, socket, FIFO or device.
    OtherType,
}

impl DestinationState {
    /// Probe `path` without following a final symlink.
    ///
    /// A dangling link is reported as [`BrokenLink`](Self::BrokenLink)
    /// rather than as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Filesystem`] if the metadata or link target
    /// cannot be read.
    pub fn probe(ops: &dyn FileSystemOps, path: &Path) -> Result<Self, ActionError> {
        let kind = ops
            .entry_kind(path)
            .map_err(ActionError::fs("stat", path))?;
        let state = match kind {
            None => Self::Absent,
            Some(EntryKind::Symlink) => {
                let target = ops
                    .read_link(path)
                    .map_err(ActionError::fs("readlink", path))?;
                if ops.exists(path) {
                    Self::Link(target)
                } else {
                    Self::BrokenLink(target)
                }
            }
            Some(EntryKind::File) => Self::RegularFile,
            Some(EntryKind::Dir | EntryKind::Other) => Self::OtherType,
        };
        tracing::trace!("{} is {state:?}", path.display());
        Ok(state)
    }
}

/// Absolute, normalised form of `target` as stored in the link at `link`.
///
/// Relative targets are interpreted from the link's own directory, the way
/// the kernel resolves them.
#[must_use]
pub fn absolute_target(link: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        normalize(target)
    } else {
        let dir = link.parent().unwrap_or_else(|| Path::new("/"));
        normalize(&dir.join(target))
    }
}

/// Whether the link at `link` storing `target` points at `source`.
#[must_use]
pub fn links_to(link: &Path, target: &Path, source: &Path) -> bool {
    paths_equal(&absolute_target(link, target), &normalize(source))
}

/// Compare two paths for equality, handling UNC prefix normalization on Windows.
fn paths_equal(a: &Path, b: &Path) -> bool {
    let strip = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.to_path_buf()
    };

    strip(a) == strip(b)
}
