//! Declaration file loading.
//!
//! A declaration file lists action groups; each group holds records of one
//! kind (`create` or `filecontent`).  Loading decodes the file, checks every
//! record's invariants and flattens the groups into [`Declaration`]s in file
//! order.  Paths inside records stay unexpanded until the actions are built.
pub mod content;
pub mod link;
pub mod loader;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub use content::ContentSpec;
pub use link::LinkSpec;

/// Serde default for `backup` fields.
pub(crate) const fn default_true() -> bool {
    true
}

/// What a declaration asks for.
#[derive(Debug, Clone)]
pub enum ActionSpec {
    /// Link or copy a source to a destination.
    Create(LinkSpec),
    /// Keep a fragment present inside a file.
    FileContent(ContentSpec),
}

/// One validated record from a declaration file.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Requires elevated privileges.
    pub sudo: bool,
    /// The requested action.
    pub spec: ActionSpec,
}

impl Declaration {
    /// The destination as written in the file.
    #[must_use]
    pub fn dest(&self) -> &str {
        match &self.spec {
            ActionSpec::Create(spec) => &spec.dest,
            ActionSpec::FileContent(spec) => &spec.dest,
        }
    }
}

/// A loaded declaration file.
#[derive(Debug)]
pub struct Config {
    /// The file that was read.
    pub path: PathBuf,
    /// Directory relative paths in records are resolved against.
    pub base_dir: PathBuf,
    /// Records in file order.
    pub declarations: Vec<Declaration>,
}

impl Config {
    /// Read and validate the declaration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, is not a
    /// supported format, fails to decode, or contains an invalid record.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let base_dir = dunce::canonicalize(parent).map_err(|source| ConfigError::Read {
            path: parent.to_path_buf(),
            source,
        })?;
        let config = Self::parse(path, &text, base_dir)?;
        tracing::debug!(
            "loaded {} declaration(s) from {}",
            config.declarations.len(),
            path.display()
        );
        Ok(config)
    }

    /// Validate declaration `text` as if it had been read from `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any decoding or record error.
    pub fn parse(path: &Path, text: &str, base_dir: PathBuf) -> Result<Self, ConfigError> {
        let groups = loader::decode_groups(path, text)?;
        let mut declarations = Vec::new();

        for (i, group) in groups.into_iter().enumerate() {
            let index = i + 1;
            match (group.create, group.filecontent) {
                (Some(records), None) => {
                    for record in records {
                        declarations.push(record.into_declaration()?);
                    }
                }
                (None, Some(records)) => {
                    for record in records {
                        declarations.push(record.into_declaration()?);
                    }
                }
                (Some(_), Some(_)) => {
                    return Err(ConfigError::InvalidGroup {
                        index,
                        reason: "a group holds either 'create' or 'filecontent', not both".into(),
                    });
                }
                (None, None) => {
                    return Err(ConfigError::InvalidGroup {
                        index,
                        reason: "expected a 'create' or 'filecontent' list".into(),
                    });
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            base_dir,
            declarations,
        })
    }
}
