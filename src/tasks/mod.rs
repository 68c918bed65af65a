//! Resolved actions and the runner that executes them in order.
mod context;
pub mod runner;

pub use context::{Context, RunOptions};

use std::path::Path;

use crate::config::{ActionSpec, Config, Declaration};
use crate::error::{ActionError, ConfigError};
use crate::resources::create::CreateResource;
use crate::resources::file_content::FileContentResource;
use crate::resources::paths::PathResolver;
use crate::resources::{Applicable, Applied};

/// The reconciler behind an [`Action`].
#[derive(Debug, Clone)]
pub enum ActionKind {
    /// Link or copy a source to a destination.
    Create(CreateResource),
    /// Keep a fragment present inside a file.
    FileContent(FileContentResource),
}

/// A declaration with every path resolved, ready to execute.
#[derive(Debug, Clone)]
pub struct Action {
    /// Requires elevated privileges.
    pub sudo: bool,
    /// What to reconcile.
    pub kind: ActionKind,
}

impl Action {
    /// Resolve the paths of `decl`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a `glob_single` destination does not
    /// match exactly one directory.
    pub fn from_declaration(decl: &Declaration, resolver: &PathResolver) -> Result<Self, ConfigError> {
        let kind = match &decl.spec {
            ActionSpec::Create(spec) => ActionKind::Create(CreateResource::from_spec(spec, resolver)?),
            ActionSpec::FileContent(spec) => {
                ActionKind::FileContent(FileContentResource::from_spec(spec, resolver))
            }
        };
        Ok(Self {
            sudo: decl.sudo,
            kind,
        })
    }

    fn resource(&self) -> &dyn Applicable {
        match &self.kind {
            ActionKind::Create(r) => r,
            ActionKind::FileContent(r) => r,
        }
    }

    /// One-line description used in progress output and the summary.
    #[must_use]
    pub fn description(&self) -> String {
        self.resource().description()
    }

    /// Absolute destination path.
    #[must_use]
    pub fn destination(&self) -> &Path {
        match &self.kind {
            ActionKind::Create(r) => &r.dest,
            ActionKind::FileContent(r) => &r.dest,
        }
    }

    /// Local source file read by this action, if any.
    #[must_use]
    pub fn local_source(&self) -> Option<&Path> {
        match &self.kind {
            ActionKind::Create(r) => r.local_source(),
            ActionKind::FileContent(_) => None,
        }
    }

    /// Converge the destination.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionError`] of the underlying reconciler.
    pub fn execute(&self, ctx: &Context) -> Result<Applied, ActionError> {
        self.resource().apply(ctx)
    }
}

/// Resolve every declaration of `config` into an [`Action`], in file order.
///
/// # Errors
///
/// Returns the first [`ConfigError`] encountered; no action is built when
/// any declaration fails to resolve.
pub fn build_actions(config: &Config) -> Result<Vec<Action>, ConfigError> {
    let resolver = PathResolver::new(config.base_dir.clone());
    config
        .declarations
        .iter()
        .map(|decl| Action::from_declaration(decl, &resolver))
        .collect()
}


#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::link::Policy;
    use crate::resources::create::Desired;

    fn config(text: &str) -> Config {
        Config::parse(Path::new("dotlink.yml"), text, PathBuf::from("/repo")).unwrap()
    }

    #[test]
    fn build_actions_resolves_against_base_dir() {
        let actions = build_actions(&config(
            "- create:\n    - {src: vim/vimrc, dest: /home/u/.vimrc, relink: always}\n",
        ))
        .unwrap();

        assert_eq!(actions.len(), 1);
        let ActionKind::Create(r) = &actions[0].kind else {
            panic!("expected a create action");
        };
        assert_eq!(r.desired, Desired::Link(PathBuf::from("/repo/vim/vimrc")));
        assert_eq!(r.relink, Policy::Always);
        assert_eq!(actions[0].destination(), Path::new("/home/u/.vimrc"));
        assert_eq!(actions[0].local_source(), Some(Path::new("/repo/vim/vimrc")));
    }

    #[test]
    fn sudo_flag_is_carried() {
        let actions = build_actions(&config(
            "- filecontent:\n    - {dest: /etc/hosts, content: x, sudo: true}\n",
        ))
        .unwrap();
        assert!(actions[0].sudo);
        assert_eq!(actions[0].local_source(), None);
        assert!(actions[0].description().starts_with("/etc/hosts"));
    }

    #[test]
    fn unmatched_glob_fails_before_any_action() {
        let err = build_actions(&config(
            "- create:\n    - {src: a, dest: /nonexistent-dotlink-*/x, dest_type: glob_single}\n\
             - create:\n    - {src: b, dest: /tmp/b}\n",
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::NoGlobMatch(_)));
    }

    #[test]
    fn execute_delegates_to_resource() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("f");
        std::fs::write(&dest, "a=1\n").unwrap();
        let decl = Config::parse(
            Path::new("d.yml"),
            &format!("- filecontent:\n    - {{dest: '{}', content: 'b=2'}}\n", dest.display()),
            tmp.path().to_path_buf(),
        )
        .unwrap();
        let action = &build_actions(&decl).unwrap()[0];

        let applied = action.execute(&test_helpers::make_context(false)).unwrap();
        assert_eq!(applied.outcome, crate::resources::Outcome::ContentAdded);
    }
}
