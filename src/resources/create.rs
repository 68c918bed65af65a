//! Link-or-copy reconciler behind `create` declarations.
use std::fmt;
use std::path::{Path, PathBuf};

use super::helpers::fs::{
    ensure_parent_dir, perform, read_for_diff, replace_file, replace_with_link, sha256_hex,
};
use super::paths::PathResolver;
use super::probe::{DestinationState, links_to};
use super::{Applicable, Applied, Outcome, diff, permissions};
use crate::config::link::{CreateMode, FileMode, LinkSpec, Policy, SourceSpec};
use crate::error::{ActionError, ConfigError};
use crate::tasks::Context;

/// Resolved origin of the desired content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Absolute local path.
    Path(PathBuf),
    /// Remote URL.
    Url(String),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => f.write_str(u),
        }
    }
}

/// What the destination should become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Desired {
    /// A symlink to this absolute path.
    Link(PathBuf),
    /// A regular file with the bytes of this source.
    Copy(Source),
}

/// A destination that must be a link to, or a copy of, a source.
#[derive(Debug, Clone)]
pub struct CreateResource {
    /// Desired end state.
    pub desired: Desired,
    /// Absolute destination path.
    pub dest: PathBuf,
    /// Whether a wrong or broken link may be replaced.
    pub relink: Policy,
    /// Whether an existing file (or, for copies, link) may be replaced.
    pub replace: Policy,
    /// Move replaced regular files to a timestamped backup.
    pub backup: bool,
    /// Create a missing parent directory.
    pub create_dirs: bool,
    /// Permission bits to enforce.
    pub file_permissions: Option<FileMode>,
}

impl CreateResource {
    /// Resource with default policies: `allow` relink and replace, backups
    /// on, no directory creation, no mode enforcement.
    #[must_use]
    pub const fn new(desired: Desired, dest: PathBuf) -> Self {
        Self {
            desired,
            dest,
            relink: Policy::Allow,
            replace: Policy::Allow,
            backup: true,
            create_dirs: false,
            file_permissions: None,
        }
    }

    /// Resolve the paths in `spec`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a glob destination does not resolve to
    /// exactly one directory.
    pub fn from_spec(spec: &LinkSpec, resolver: &PathResolver) -> Result<Self, ConfigError> {
        let dest = resolver.resolve_destination(&spec.dest, spec.dest_type)?;
        let source = match &spec.source {
            SourceSpec::Path(p) => Source::Path(resolver.resolve(p)),
            SourceSpec::Url(u) => Source::Url(u.clone()),
        };
        let desired = match (spec.mode, source) {
            (CreateMode::Link, Source::Path(p)) => Desired::Link(p),
            (CreateMode::Link, Source::Url(url)) => {
                return Err(ConfigError::UrlWithLink {
                    dest: spec.dest.clone(),
                    url,
                });
            }
            (CreateMode::Copy, source) => Desired::Copy(source),
        };
        Ok(Self {
            desired,
            dest,
            relink: spec.relink,
            replace: spec.replace,
            backup: spec.backup,
            create_dirs: spec.create_dirs,
            file_permissions: spec.file_permissions,
        })
    }

    /// The local source path, if the source is not a URL.
    #[must_use]
    pub fn local_source(&self) -> Option<&Path> {
        match &self.desired {
            Desired::Link(p) | Desired::Copy(Source::Path(p)) => Some(p),
            Desired::Copy(Source::Url(_)) => None,
        }
    }

    fn source_label(&self) -> String {
        match &self.desired {
            Desired::Link(p) => p.display().to_string(),
            Desired::Copy(source) => source.to_string(),
        }
    }

    /// Diff from the destination's current content to `new`, when requested.
    fn diff_with(
        &self,
        ctx: &Context,
        new: impl FnOnce() -> Result<Vec<u8>, ActionError>,
    ) -> Result<Option<String>, ActionError> {
        if !ctx.show_diff {
            return Ok(None);
        }
        let old = read_for_diff(ctx.fs_ops.as_ref(), &self.dest)?;
        let new = new()?;
        let text = diff::unified(
            &old,
            &new,
            &self.dest.display().to_string(),
            &self.source_label(),
        );
        Ok(Some(text).filter(|t| !t.is_empty()))
    }

    /// Make sure the destination's directory exists (or will in a dry run).
    fn prepare_parent(&self, ctx: &Context) -> Result<(), ActionError> {
        let Some(parent) = self.dest.parent() else {
            return Ok(());
        };
        let ops = ctx.fs_ops.as_ref();
        if ops.is_dir(parent) {
            return Ok(());
        }
        if !self.create_dirs {
            return Err(ActionError::DirectoryMissing(parent.to_path_buf()));
        }
        perform(ctx, &format!("create directory {}", parent.display()), || {
            ensure_parent_dir(ops, &self.dest)
        })
    }

    /// Back up the regular file at the destination if backups are enabled.
    fn back_up_if_enabled(&self, ctx: &Context) -> Result<(), ActionError> {
        if self.backup {
            let backup = ctx.backups.back_up(ctx.fs_ops.as_ref(), &self.dest)?;
            ctx.log
                .info(&format!("backed up {} to {}", self.dest.display(), backup.display()));
        }
        Ok(())
    }

    fn apply_link(&self, ctx: &Context, source: &Path) -> Result<Applied, ActionError> {
        let ops = ctx.fs_ops.as_ref();
        if !ops.is_file(source) {
            return Err(ActionError::SourceMissing(source.to_path_buf()));
        }
        let read_source = || read_for_diff(ops, source);
        let dest = &self.dest;

        match DestinationState::probe(ops, dest)? {
            DestinationState::Link(target) if links_to(dest, &target, source) => {
                Ok(Applied::new(Outcome::LinkAsExpected))
            }
            DestinationState::Link(target) => {
                if !self.relink.permits(ctx.force) {
                    return Err(ActionError::WrongLinkSource {
                        dest: dest.clone(),
                        current: target,
                        expected: source.to_path_buf(),
                    });
                }
                let diff = self.diff_with(ctx, read_source)?;
                perform(
                    ctx,
                    &format!("relink {} -> {}", dest.display(), source.display()),
                    || replace_with_link(ops, source, dest),
                )?;
                Ok(Applied::with_diff(Outcome::Relinked, diff))
            }
            DestinationState::BrokenLink(target) => {
                if !self.relink.permits(ctx.force) {
                    return Err(ActionError::BrokenLink {
                        dest: dest.clone(),
                        current: target,
                    });
                }
                let diff = self.diff_with(ctx, read_source)?;
                perform(
                    ctx,
                    &format!("relink broken {} -> {}", dest.display(), source.display()),
                    || replace_with_link(ops, source, dest),
                )?;
                Ok(Applied::with_diff(Outcome::RelinkedBrokenLink, diff))
            }
            DestinationState::RegularFile => {
                if !self.replace.permits(ctx.force) {
                    return Err(ActionError::DestinationFileExists(dest.clone()));
                }
                let diff = self.diff_with(ctx, read_source)?;
                perform(
                    ctx,
                    &format!("replace file {} with link to {}", dest.display(), source.display()),
                    || {
                        self.back_up_if_enabled(ctx)?;
                        replace_with_link(ops, source, dest)
                    },
                )?;
                Ok(Applied::with_diff(Outcome::ReplacedFileWithLink, diff))
            }
            DestinationState::OtherType => Err(ActionError::NotFileOrLink(dest.clone())),
            DestinationState::Absent => {
                self.prepare_parent(ctx)?;
                let diff = self.diff_with(ctx, read_source)?;
                perform(
                    ctx,
                    &format!("link {} -> {}", dest.display(), source.display()),
                    || {
                        ops.symlink(source, dest)
                            .map_err(ActionError::fs("symlink", dest))
                    },
                )?;
                Ok(Applied::with_diff(Outcome::NewLinkCreated, diff))
            }
        }
    }

    /// Bytes the destination should hold.
    fn load(ctx: &Context, source: &Source) -> Result<Vec<u8>, ActionError> {
        match source {
            Source::Path(path) => {
                let ops = ctx.fs_ops.as_ref();
                if !ops.is_file(path) {
                    return Err(ActionError::SourceMissing(path.clone()));
                }
                ops.read(path).map_err(ActionError::fs("read", path))
            }
            Source::Url(url) => {
                ctx.log.debug(&format!("fetching {url}"));
                ctx.fetcher.fetch(url).map_err(|e| ActionError::Fetch {
                    url: url.clone(),
                    message: format!("{e:#}"),
                })
            }
        }
    }

    fn apply_copy(&self, ctx: &Context, source: &Source) -> Result<Applied, ActionError> {
        let ops = ctx.fs_ops.as_ref();
        let content = Self::load(ctx, source)?;
        let mode = self.file_permissions.map(FileMode::bits);
        let dest = &self.dest;
        let write = || replace_file(ops, dest, &content, mode);
        let new_content = || Ok(content.clone());

        match DestinationState::probe(ops, dest)? {
            DestinationState::RegularFile => {
                let current = ops.read(dest).map_err(ActionError::fs("read", dest))?;
                if sha256_hex(&current) == sha256_hex(&content) {
                    return Ok(Applied::new(Outcome::FileAsExpected));
                }
                if !self.replace.permits(ctx.force) {
                    return Err(ActionError::DestinationFileExists(dest.clone()));
                }
                let diff = self.diff_with(ctx, new_content)?;
                perform(
                    ctx,
                    &format!("replace {} with a copy of {source}", dest.display()),
                    || {
                        self.back_up_if_enabled(ctx)?;
                        write()
                    },
                )?;
                Ok(Applied::with_diff(Outcome::ReplacedFile, diff))
            }
            DestinationState::Link(target) | DestinationState::BrokenLink(target) => {
                let broken = !ops.exists(dest);
                if !self.replace.permits(ctx.force) {
                    return Err(ActionError::DestinationIsLink {
                        dest: dest.clone(),
                        current: target,
                    });
                }
                let diff = self.diff_with(ctx, new_content)?;
                perform(
                    ctx,
                    &format!("replace link {} with a copy of {source}", dest.display()),
                    write,
                )?;
                let outcome = if broken {
                    Outcome::ReplacedBrokenLinkWithFile
                } else {
                    Outcome::ReplacedLinkWithFile
                };
                Ok(Applied::with_diff(outcome, diff))
            }
            DestinationState::OtherType => Err(ActionError::NotFileOrLink(dest.clone())),
            DestinationState::Absent => {
                self.prepare_parent(ctx)?;
                let diff = self.diff_with(ctx, new_content)?;
                perform(
                    ctx,
                    &format!("copy {source} to {}", dest.display()),
                    write,
                )?;
                Ok(Applied::with_diff(Outcome::NewFileCreated, diff))
            }
        }
    }
}

impl Applicable for CreateResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.source_label(), self.dest.display())
    }

    fn apply(&self, ctx: &Context) -> Result<Applied, ActionError> {
        let applied = match &self.desired {
            Desired::Link(source) => self.apply_link(ctx, source)?,
            Desired::Copy(source) => self.apply_copy(ctx, source)?,
        };
        permissions::sync_mode(ctx, &self.dest, self.file_permissions, applied)
    }
}
