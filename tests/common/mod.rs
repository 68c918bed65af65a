// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed dotfiles repository plus a separate
// "home" directory for destinations, and a fluent builder so each test can
// declare its sources and declaration file without filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use dotlink::cli::{ApplyOpts, ColorChoice, GlobalOpts};
use dotlink::commands;
use dotlink::logging::Logger;
use dotlink::platform::{Os, Platform};
use dotlink::tasks::runner::RunSummary;

/// An isolated repository and home directory backed by a [`tempfile::TempDir`].
pub struct Fixture {
    /// Temporary directory holding `repo/` and `home/`.
    pub root: tempfile::TempDir,
    /// Path of the declaration file.
    pub config: PathBuf,
}

impl Fixture {
    /// Directory holding the declaration file and local sources, with
    /// symlinks in the temp path resolved the way the loader resolves them.
    pub fn repo(&self) -> PathBuf {
        std::fs::canonicalize(self.root.path().join("repo")).expect("canonicalize repo")
    }

    /// Directory destinations are written under.
    pub fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    /// Path of `rel` under the home directory.
    pub fn dest(&self, rel: &str) -> PathBuf {
        self.home().join(rel)
    }

    /// Path of `rel` under the repository.
    pub fn source(&self, rel: &str) -> PathBuf {
        self.repo().join(rel)
    }

    /// Global options pointing at this fixture's declaration file.
    pub fn global(&self) -> GlobalOpts {
        GlobalOpts {
            verbose: 0,
            color: ColorChoice::Never,
            config_file: Some(self.config.clone()),
        }
    }

    /// Apply options with backups kept inside the fixture.
    pub fn apply_opts(&self) -> ApplyOpts {
        ApplyOpts {
            backup_dir: Some(self.root.path().join("backups")),
            ..ApplyOpts::default()
        }
    }

    /// Run `apply` as an unelevated Linux user.
    pub fn apply(&self, opts: &ApplyOpts) -> anyhow::Result<RunSummary> {
        self.apply_as(opts, &Platform::new(Os::Linux, false))
    }

    /// Run `apply` on `platform`.
    pub fn apply_as(&self, opts: &ApplyOpts, platform: &Platform) -> anyhow::Result<RunSummary> {
        let log = Arc::new(Logger::new("test"));
        commands::apply::run(
            &self.global(),
            opts,
            &log,
            platform,
            Arc::new(AtomicBool::new(false)),
        )
    }

    /// Read `rel` under the home directory as text.
    pub fn read_dest(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dest(rel)).expect("read destination")
    }

    /// Write `content` to `rel` under the home directory.
    pub fn write_dest(&self, rel: &str, content: &str) {
        write_file(&self.dest(rel), content);
    }

    /// Rewrite the declaration file.
    pub fn rewrite_config(&self, yaml: &str) {
        write_file(&self.config, &expand(yaml, self));
    }
}

/// Fluent builder for [`Fixture`].
pub struct FixtureBuilder {
    root: tempfile::TempDir,
    config: String,
}

impl FixtureBuilder {
    /// Begin building a fixture with empty `repo/` and `home/` directories.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("repo")).expect("create repo dir");
        std::fs::create_dir_all(root.path().join("home")).expect("create home dir");
        Self {
            root,
            config: "[]\n".to_string(),
        }
    }

    /// Write a source file at `rel` inside the repository.
    pub fn with_source(self, rel: &str, content: &str) -> Self {
        write_file(&self.root.path().join("repo").join(rel), content);
        self
    }

    /// Write a file at `rel` inside the home directory.
    pub fn with_dest(self, rel: &str, content: &str) -> Self {
        write_file(&self.root.path().join("home").join(rel), content);
        self
    }

    /// Use `yaml` as the declaration file.
    ///
    /// `{home}` is replaced by the fixture's home directory so destinations
    /// can be written as absolute paths.
    pub fn with_config(mut self, yaml: &str) -> Self {
        self.config = yaml.to_string();
        self
    }

    /// Finish building and write the declaration file.
    pub fn build(self) -> Fixture {
        let fixture = Fixture {
            config: self.root.path().join("repo").join("config.yml"),
            root: self.root,
        };
        write_file(&fixture.config, &expand(&self.config, &fixture));
        fixture
    }
}

fn expand(yaml: &str, fixture: &Fixture) -> String {
    yaml.replace("{home}", &fixture.home().display().to_string())
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}
