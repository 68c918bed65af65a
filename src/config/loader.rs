//! Declaration file decoding.
//!
//! A declaration file is a list of action groups.  YAML and JSON files hold
//! the list at the root; TOML has no root arrays, so the list lives under an
//! `actions` key:
//!
//! ```toml
//! [[actions]]
//! create = [{ src = "bashrc", dest = "~/.bashrc" }]
//! ```
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::content::ContentDeclaration;
use super::link::LinkDeclaration;
use crate::error::ConfigError;

/// On-disk format of a declaration file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.yml` / `.yaml`
    Yaml,
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl Format {
    /// Pick the format for `path` from its extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yml" | "yaml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// A single-key mapping naming the kind of every record inside it.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionGroup {
    /// Link or copy records.
    #[serde(default)]
    pub create: Option<Vec<LinkDeclaration>>,
    /// Fragment records.
    #[serde(default)]
    pub filecontent: Option<Vec<ContentDeclaration>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlDocument {
    #[serde(default)]
    actions: Vec<ActionGroup>,
}

/// Decode the groups in `text`, read from `path`.
///
/// Blank files decode to no groups.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the text is not a well-formed list of
/// groups for the file's format.
pub fn decode_groups(path: &Path, text: &str) -> Result<Vec<ActionGroup>, ConfigError> {
    let format = Format::from_path(path)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parse_error = |message: String| ConfigError::Parse {
        path: PathBuf::from(path),
        message,
    };
    match format {
        Format::Yaml => serde_yaml::from_str::<Option<Vec<ActionGroup>>>(text)
            .map(Option::unwrap_or_default)
            .map_err(|e| parse_error(e.to_string())),
        Format::Json => {
            serde_json::from_str::<Vec<ActionGroup>>(text).map_err(|e| parse_error(e.to_string()))
        }
        Format::Toml => toml::from_str::<TomlDocument>(text)
            .map(|doc| doc.actions)
            .map_err(|e| parse_error(e.message().to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.yml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.YAML")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(Format::from_path(Path::new("a.json")).unwrap(), Format::Json);
        assert!(matches!(
            Format::from_path(Path::new("a.ini")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn yaml_groups_decode() {
        let groups = decode_groups(
            Path::new("c.yml"),
            "- create:\n    - src: a\n      dest: b\n- filecontent:\n    - dest: f\n      content: x\n",
        )
        .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].create.as_ref().map(Vec::len), Some(1));
        assert_eq!(groups[1].filecontent.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn toml_groups_live_under_actions() {
        let groups = decode_groups(
            Path::new("c.toml"),
            "[[actions]]\ncreate = [{ src = \"a\", dest = \"b\", file_permissions = 600 }]\n",
        )
        .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].create.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn json_groups_decode() {
        let groups = decode_groups(
            Path::new("c.json"),
            r#"[{"filecontent": [{"dest": "f", "content": "x", "regex": "^x$"}]}]"#,
        )
        .unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn blank_file_has_no_groups() {
        assert!(decode_groups(Path::new("c.yml"), "\n  \n").unwrap().is_empty());
        assert!(decode_groups(Path::new("c.toml"), "").unwrap().is_empty());
    }

    #[test]
    fn comment_only_yaml_has_no_groups() {
        assert!(
            decode_groups(Path::new("c.yaml"), "# nothing yet\n")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn unknown_group_key_is_a_parse_error() {
        let err = decode_groups(Path::new("c.yml"), "- link:\n    - src: a\n      dest: b\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
