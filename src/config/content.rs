//! `filecontent` declarations: keep a fragment present inside a file.
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use super::{ActionSpec, Declaration, default_true};
use crate::error::ConfigError;

/// One record of a `filecontent` group, exactly as decoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentDeclaration {
    /// File to patch.
    pub dest: String,
    /// Fragment that must be present.
    pub content: String,
    /// Pattern locating the fragment to replace.
    #[serde(default)]
    pub regex: Option<String>,
    /// Pattern whose last match bounds where the fragment may live.
    #[serde(default)]
    pub after: Option<String>,
    /// Back up the file before rewriting it.
    #[serde(default = "default_true")]
    pub backup: bool,
    /// Requires elevated privileges.
    #[serde(default)]
    pub sudo: bool,
}

/// A validated `filecontent` declaration with compiled patterns.
#[derive(Debug, Clone)]
pub struct ContentSpec {
    /// Destination as written (still unexpanded).
    pub dest: String,
    /// Fragment that must be present.
    pub content: String,
    /// Multi-line pattern locating the fragment.
    pub regex: Option<Regex>,
    /// Multi-line pattern bounding the search region.
    pub after: Option<Regex>,
    /// Back up the file before rewriting it.
    pub backup: bool,
}

/// Compile `pattern` with `^`/`$` matching at line boundaries.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidRegex`] naming `field` if the pattern is
/// not a valid regular expression.
pub fn compile(field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|source| ConfigError::InvalidRegex {
            field,
            pattern: pattern.to_string(),
            source,
        })
}

impl ContentDeclaration {
    /// Compile the patterns and check that `content` is found by `regex`.
    ///
    /// `content` must match `regex` starting at its first character, otherwise
    /// a second run would not recognise the fragment it just wrote.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either pattern fails to compile or the
    /// content does not match.
    pub fn into_declaration(self) -> Result<Declaration, ConfigError> {
        let regex = self
            .regex
            .as_deref()
            .map(|p| compile("regex", p))
            .transpose()?;
        let after = self
            .after
            .as_deref()
            .map(|p| compile("after", p))
            .transpose()?;

        if let Some(re) = &regex
            && !re.find(&self.content).is_some_and(|m| m.start() == 0)
        {
            return Err(ConfigError::ContentMismatch {
                dest: self.dest,
                pattern: re.as_str().to_string(),
            });
        }

        Ok(Declaration {
            sudo: self.sudo,
            spec: ActionSpec::FileContent(ContentSpec {
                dest: self.dest,
                content: self.content,
                regex,
                after,
                backup: self.backup,
            }),
        })
    }
}
