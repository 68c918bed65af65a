//! Domain-specific error types for dotlink.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Declaration loading returns [`ConfigError`]; executing a single action
//! returns [`ActionError`].  Command handlers at the CLI boundary convert
//! both to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ConfigError             fatal, the run aborts before any action executes
//! ActionError             isolated to one action, the run continues
//! ├── Source              missing local source, failed fetch
//! ├── Policy              relink/replace forbidden by policy
//! ├── Filesystem          wrapped OS error (operation + path)
//! └── UnsupportedState    destination is neither file nor link
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors detected while loading declarations or resolving them into actions.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The declaration file could not be read.
    #[error("cannot read declaration file {}: {source}", path.display())]
    Read {
        /// Path of the declaration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The declaration file is not valid YAML, TOML or JSON, or does not
    /// match the declaration schema.
    #[error("invalid declaration file {}: {message}", path.display())]
    Parse {
        /// Path of the declaration file.
        path: PathBuf,
        /// Decoder message, including the location when available.
        message: String,
    },

    /// The declaration file extension is not one of `yml`, `yaml`, `toml`, `json`.
    #[error("unsupported declaration file format: {} (expected .yml, .yaml, .toml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    /// An action group does not name exactly one action kind.
    #[error("action group #{index}: {reason}")]
    InvalidGroup {
        /// One-based position of the group in the declaration list.
        index: usize,
        /// What is wrong with the group.
        reason: String,
    },

    /// A `create` declaration gives both or neither of `src` and `url`.
    #[error("create '{dest}': exactly one of 'src' or 'url' must be given")]
    SourceConflict {
        /// Destination of the offending declaration.
        dest: String,
    },

    /// A URL source was declared with `type: link`.
    #[error("create '{dest}': cannot link to a URL source ({url}), use type 'copy' or 'auto'")]
    UrlWithLink {
        /// Destination of the offending declaration.
        dest: String,
        /// The declared URL.
        url: String,
    },

    /// A regular expression failed to compile.
    #[error("invalid {field} regex '{pattern}': {source}")]
    InvalidRegex {
        /// Declaration field holding the pattern (`regex` or `after`).
        field: &'static str,
        /// The pattern as written.
        pattern: String,
        /// Compiler error.
        source: regex::Error,
    },

    /// The `content` of a `filecontent` declaration does not match its own `regex`.
    #[error("filecontent '{dest}': content does not match regex '{pattern}'")]
    ContentMismatch {
        /// Destination of the offending declaration.
        dest: String,
        /// The declared `regex`.
        pattern: String,
    },

    /// `file_permissions` is not a 3 or 4 digit octal mode.
    #[error("invalid file mode '{0}': expected 3 or 4 octal digits")]
    InvalidMode(String),

    /// A `glob_single` destination has glob characters in its file name.
    #[error("glob patterns are not supported in the file name: {0}")]
    GlobInFileName(String),

    /// A `glob_single` directory pattern is malformed.
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob {
        /// The directory pattern.
        pattern: String,
        /// Parser message.
        message: String,
    },

    /// A `glob_single` directory pattern matched no directory.
    #[error("no directory matched glob pattern: {0}")]
    NoGlobMatch(String),

    /// A `glob_single` directory pattern matched more than one directory.
    #[error("multiple matches for glob_single pattern {pattern}: {}", format_paths(matches))]
    MultipleGlobMatches {
        /// The directory pattern.
        pattern: String,
        /// Every matched directory.
        matches: Vec<PathBuf>,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure category of an [`ActionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Declared source is unavailable.
    Source,
    /// The current state is forbidden from being changed by policy.
    Policy,
    /// An operating-system call failed.
    Filesystem,
    /// The destination is of a type the action cannot handle.
    UnsupportedState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Policy => write!(f, "policy"),
            Self::Filesystem => write!(f, "filesystem"),
            Self::UnsupportedState => write!(f, "unsupported state"),
        }
    }
}

/// Errors that abort a single action.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The local source file does not exist.
    #[error("source file does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    /// The remote source could not be retrieved.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Fetcher error chain.
        message: String,
    },

    /// The destination links somewhere else and relinking is not permitted.
    #[error("link exists with wrong source: {} -> {} instead of {}", dest.display(), current.display(), expected.display())]
    WrongLinkSource {
        /// Destination path.
        dest: PathBuf,
        /// Where the link currently points.
        current: PathBuf,
        /// Where it should point.
        expected: PathBuf,
    },

    /// The destination is a broken link and replacing it is not permitted.
    #[error("broken link exists: {} -> {}", dest.display(), current.display())]
    BrokenLink {
        /// Destination path.
        dest: PathBuf,
        /// Missing target of the link.
        current: PathBuf,
    },

    /// The destination is a regular file and replacing it is not permitted.
    #[error("destination file exists: {}", .0.display())]
    DestinationFileExists(PathBuf),

    /// A copy was requested but the destination is a link and replacing it is not permitted.
    #[error("destination exists as link: {} -> {}", dest.display(), current.display())]
    DestinationIsLink {
        /// Destination path.
        dest: PathBuf,
        /// Where the link currently points.
        current: PathBuf,
    },

    /// The destination's parent directory is missing and `create_dirs` is off.
    #[error("directory does not exist: {}", .0.display())]
    DirectoryMissing(PathBuf),

    /// The destination exists but is neither a regular file nor a symlink.
    #[error("destination exists but is not a file or link, not replacing: {}", .0.display())]
    NotFileOrLink(PathBuf),

    /// A `filecontent` destination does not exist.
    #[error("destination file does not exist: {}", .0.display())]
    DestinationMissing(PathBuf),

    /// A `filecontent` destination is not a regular file.
    #[error("destination path is not a regular file: {}", .0.display())]
    NotRegularFile(PathBuf),

    /// A `filecontent` destination is not UTF-8 text.
    #[error("destination file is not valid UTF-8 text: {}", .0.display())]
    NotText(PathBuf),

    /// An operating-system call failed.
    #[error("{operation} failed for {}: {source}", path.display())]
    Filesystem {
        /// Attempted operation (e.g. `"symlink"`, `"rename"`).
        operation: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl ActionError {
    /// Build a closure that wraps an [`io::Error`] as [`ActionError::Filesystem`].
    ///
    /// Intended for `map_err`: `ops.rename(a, b).map_err(ActionError::fs("rename", a))`.
    pub fn fs(operation: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self + use<> {
        let path = path.to_path_buf();
        move |source| Self::Filesystem {
            operation,
            path,
            source,
        }
    }

    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceMissing(_) | Self::Fetch { .. } => ErrorKind::Source,
            Self::WrongLinkSource { .. }
            | Self::BrokenLink { .. }
            | Self::DestinationFileExists(_)
            | Self::DestinationIsLink { .. }
            | Self::DirectoryMissing(_) => ErrorKind::Policy,
            Self::Filesystem { .. } => ErrorKind::Filesystem,
            Self::NotFileOrLink(_)
            | Self::DestinationMissing(_)
            | Self::NotRegularFile(_)
            | Self::NotText(_) => ErrorKind::UnsupportedState,
        }
    }
}
