//! Path expansion and resolution for declaration fields.
use std::path::{Component, Path, PathBuf};

use crate::config::link::DestType;
use crate::error::ConfigError;

/// Characters that make a file name a glob pattern.
const GLOB_METACHARACTERS: &[char] = &['*', '?', '[', ']'];

/// Turns the strings written in a declaration file into absolute paths.
///
/// `~` and `$VAR`/`${VAR}` are expanded first; relative results are joined
/// onto the directory holding the declaration file and lexically normalised.
/// Unknown variables are left as written.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base_dir: PathBuf,
    home: Option<String>,
}

impl PathResolver {
    /// Resolver for paths relative to `base_dir`, using the current user's
    /// home directory.
    #[must_use]
    pub fn new(base_dir: PathBuf) -> Self {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok();
        Self { base_dir, home }
    }

    /// Resolver with an explicit home directory (`None` leaves `~` unexpanded).
    #[must_use]
    pub fn with_home(base_dir: PathBuf, home: Option<&Path>) -> Self {
        Self {
            base_dir,
            home: home.map(|h| h.to_string_lossy().into_owned()),
        }
    }

    /// Expand `~` and environment variables in `raw`.
    #[must_use]
    pub fn expand(&self, raw: &str) -> String {
        let expanded = shellexpand::full_with_context_no_errors(
            raw,
            || self.home.as_deref(),
            |var: &str| std::env::var(var).ok(),
        )
        .into_owned();
        if expanded != raw {
            tracing::trace!("expanded {raw} to {expanded}");
        }
        expanded
    }

    /// Expand `raw` and make it absolute.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let expanded = PathBuf::from(self.expand(raw));
        if expanded.is_absolute() {
            normalize(&expanded)
        } else {
            normalize(&self.base_dir.join(expanded))
        }
    }

    /// Resolve a destination according to its [`DestType`].
    ///
    /// For [`DestType::GlobSingle`] the parent directory is a glob pattern
    /// that must match exactly one existing directory; the file name is
    /// taken literally and may not contain glob metacharacters.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the pattern is malformed, the file name
    /// contains metacharacters, or the pattern matches zero or several
    /// directories.
    pub fn resolve_destination(&self, raw: &str, dest_type: DestType) -> Result<PathBuf, ConfigError> {
        let path = self.resolve(raw);
        if dest_type == DestType::Normal {
            return Ok(path);
        }

        let (Some(parent), Some(leaf)) = (path.parent(), path.file_name()) else {
            return Err(ConfigError::InvalidGlob {
                pattern: raw.to_string(),
                message: "destination has no file name".into(),
            });
        };
        if leaf.to_string_lossy().contains(GLOB_METACHARACTERS) {
            return Err(ConfigError::GlobInFileName(raw.to_string()));
        }

        let pattern = parent.to_string_lossy().into_owned();
        let entries = glob::glob(&pattern).map_err(|e| ConfigError::InvalidGlob {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        let mut matches: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        matches.sort();

        match matches.as_slice() {
            [] => Err(ConfigError::NoGlobMatch(pattern)),
            [only] => {
                tracing::debug!("{raw} resolved to directory {}", only.display());
                Ok(only.join(leaf))
            }
            _ => Err(ConfigError::MultipleGlobMatches { pattern, matches }),
        }
    }
}

/// Lexically normalise `path`: drop `.` components and fold `..` into the
/// preceding component without touching the filesystem.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
