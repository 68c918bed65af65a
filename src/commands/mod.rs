//! Top-level subcommand orchestration.
pub mod apply;
pub mod completions;
pub mod validate;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::config::validation::{ValidationWarning, validate_actions};
use crate::logging::Log;
use crate::tasks::{self, Action};

/// Environment variable naming the declaration file.
pub const CONFIG_ENV: &str = "DOTLINK_CONFIG";

/// Shared state produced by the common command setup sequence.
///
/// Loads the declaration file, resolves every declaration into an action and
/// runs the validators, so each command does not repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// The loaded declaration file.
    pub config: Config,
    /// Resolved actions, in declaration order.
    pub actions: Vec<Action>,
    /// Non-fatal findings about the actions.
    pub warnings: Vec<ValidationWarning>,
}

impl CommandSetup {
    /// Load, resolve and validate the declaration file chosen by `global`.
    ///
    /// # Errors
    ///
    /// Returns an error if no declaration file can be located, it fails to
    /// load, or any declaration fails to resolve.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        let path = resolve_config_path(global.config_file.as_deref())?;
        Self::load(&path, log)
    }

    /// Load, resolve and validate the declaration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file fails to load or any declaration fails
    /// to resolve.
    pub fn load(path: &Path, log: &dyn Log) -> Result<Self> {
        log.stage("Loading declarations");
        let config = Config::load(path)?;
        let actions = tasks::build_actions(&config)?;
        log.info(&format!(
            "loaded {} action(s) from {}",
            actions.len(),
            config.path.display()
        ));
        log.debug(&format!("base directory: {}", config.base_dir.display()));

        let warnings = validate_actions(&actions);
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!("  {warning}"));
            }
        }

        Ok(Self {
            config,
            actions,
            warnings,
        })
    }
}

/// Pick the declaration file: the explicit path, `$DOTLINK_CONFIG`, or
/// `~/dotfiles/config.yml`.
///
/// # Errors
///
/// Returns an error if none is given and the home directory is unknown.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .context("cannot locate the declaration file: use --config-file or set DOTLINK_CONFIG")?;
    Ok(PathBuf::from(home).join("dotfiles").join("config.yml"))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::test_helpers::write_temp_config;
    use crate::tasks::test_helpers::RecordingLog;

    #[test]
    fn explicit_config_path_wins() {
        let path = resolve_config_path(Some(Path::new("/etc/dotlink.yml"))).unwrap();
        assert_eq!(path, PathBuf::from("/etc/dotlink.yml"));
    }

    #[test]
    fn load_reports_warnings() {
        let file = write_temp_config(
            "yml",
            "- create:\n    - {src: missing.txt, dest: /tmp/dotlink-x}\n",
        );
        let log = RecordingLog::default();

        let setup = CommandSetup::load(file.path(), &log).unwrap();

        assert_eq!(setup.actions.len(), 1);
        assert_eq!(setup.warnings.len(), 1);
        assert!(log.contains("1 configuration warning(s)"));
        assert!(log.contains("missing.txt"));
    }

    #[test]
    fn load_propagates_config_errors() {
        let file = write_temp_config("yml", "- bogus: []\n");
        let err = CommandSetup::load(file.path(), &RecordingLog::default()).unwrap_err();
        assert!(err.to_string().contains("invalid declaration file"));
    }
}
