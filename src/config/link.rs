//! `create` declarations: link or copy a source to a destination.
use std::fmt;

use serde::Deserialize;

use super::{ActionSpec, Declaration, default_true};
use crate::error::ConfigError;

/// Minimum length for octal mode strings.
const OCTAL_MODE_MIN_LEN: usize = 3;

/// Maximum length for octal mode strings.
const OCTAL_MODE_MAX_LEN: usize = 4;

/// How the destination should be materialised, as declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Symlink the destination to the source.
    Link,
    /// Write a copy of the source content.
    Copy,
    /// Copy for URL or `sudo` declarations, link otherwise.
    #[default]
    Auto,
}

/// How the destination is materialised, after resolving [`LinkMode::Auto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Symlink.
    Link,
    /// Regular file with the source's bytes.
    Copy,
}

/// Whether an existing destination may be replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Only when the run was started with `--force`.
    #[default]
    Allow,
    /// Unconditionally.
    Always,
    /// Never, even with `--force`.
    Never,
}

impl Policy {
    /// Whether this policy permits the change given the run-wide `force` flag.
    #[must_use]
    pub const fn permits(self, force: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Allow => force,
        }
    }
}

/// How the `dest` string is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestType {
    /// A plain path.
    #[default]
    Normal,
    /// The parent directory is a glob that must match exactly one directory.
    GlobSingle,
}

/// Octal permission bits requested for a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMode(u32);

impl FileMode {
    /// Parse a 3 or 4 digit octal mode such as `"600"` or `"0755"`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMode`] for anything else.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let len = text.len();
        let well_formed = (OCTAL_MODE_MIN_LEN..=OCTAL_MODE_MAX_LEN).contains(&len)
            && text.chars().all(|c| ('0'..='7').contains(&c));
        if !well_formed {
            return Err(ConfigError::InvalidMode(text.to_string()));
        }
        u32::from_str_radix(text, 8)
            .map(Self)
            .map_err(|_| ConfigError::InvalidMode(text.to_string()))
    }

    /// The permission bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03o}", self.0)
    }
}

/// Where the desired content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A local path, relative to the declaration file unless absolute.
    Path(String),
    /// A remote URL; only copies are possible.
    Url(String),
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{p}"),
            Self::Url(u) => write!(f, "{u}"),
        }
    }
}

/// A validated `create` declaration.
#[derive(Debug, Clone)]
pub struct LinkSpec {
    /// Source of the desired content.
    pub source: SourceSpec,
    /// Destination as written (still unexpanded).
    pub dest: String,
    /// Resolved materialisation mode.
    pub mode: CreateMode,
    /// Whether an existing wrong or broken link may be replaced.
    pub relink: Policy,
    /// Whether an existing file (or, for copies, link) may be replaced.
    pub replace: Policy,
    /// Rename replaced files to a timestamped backup.
    pub backup: bool,
    /// Create missing parent directories.
    pub create_dirs: bool,
    /// Interpretation of `dest`.
    pub dest_type: DestType,
    /// Permission bits to enforce after materialising.
    pub file_permissions: Option<FileMode>,
}

/// `file_permissions` as written: `"600"` or a bare `600`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModeValue {
    /// Quoted form.
    Text(String),
    /// Unquoted form; the decimal digits are read as octal.
    Number(u64),
}

impl ModeValue {
    fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// One record of a `create` group, exactly as decoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkDeclaration {
    /// Local source path.
    #[serde(default)]
    pub src: Option<String>,
    /// Remote source URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Destination path.
    pub dest: String,
    /// Declared mode.
    #[serde(default, rename = "type")]
    pub mode: LinkMode,
    /// Relink policy.
    #[serde(default)]
    pub relink: Policy,
    /// Replace policy.
    #[serde(default)]
    pub replace: Policy,
    /// Back up replaced files.
    #[serde(default = "default_true")]
    pub backup: bool,
    /// Create missing parent directories.
    #[serde(default)]
    pub create_dirs: bool,
    /// Destination interpretation.
    #[serde(default)]
    pub dest_type: DestType,
    /// Permission bits to enforce.
    #[serde(default)]
    pub file_permissions: Option<ModeValue>,
    /// Requires elevated privileges.
    #[serde(default)]
    pub sudo: bool,
}

impl LinkDeclaration {
    /// Check the record's invariants and resolve its mode.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when both or neither of `src`/`url` are set,
    /// when a URL is combined with `type: link`, or when `file_permissions`
    /// is not an octal mode.
    pub fn into_declaration(self) -> Result<Declaration, ConfigError> {
        let source = match (self.src, self.url) {
            (Some(path), None) => SourceSpec::Path(path),
            (None, Some(url)) => SourceSpec::Url(url),
            _ => return Err(ConfigError::SourceConflict { dest: self.dest }),
        };

        let mode = match (self.mode, &source) {
            (LinkMode::Link, SourceSpec::Url(url)) => {
                return Err(ConfigError::UrlWithLink {
                    dest: self.dest,
                    url: url.clone(),
                });
            }
            (LinkMode::Link, SourceSpec::Path(_)) => CreateMode::Link,
            (LinkMode::Copy, _) | (LinkMode::Auto, SourceSpec::Url(_)) => CreateMode::Copy,
            (LinkMode::Auto, SourceSpec::Path(_)) if self.sudo => CreateMode::Copy,
            (LinkMode::Auto, SourceSpec::Path(_)) => CreateMode::Link,
        };

        let file_permissions = self
            .file_permissions
            .map(|value| FileMode::parse(&value.as_text()))
            .transpose()?;

        Ok(Declaration {
            sudo: self.sudo,
            spec: ActionSpec::Create(LinkSpec {
                source,
                dest: self.dest,
                mode,
                relink: self.relink,
                replace: self.replace,
                backup: self.backup,
                create_dirs: self.create_dirs,
                dest_type: self.dest_type,
                file_permissions,
            }),
        })
    }
}
