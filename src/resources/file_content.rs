//! Fragment patcher behind `filecontent` declarations.
use std::path::PathBuf;

use regex::Regex;

use super::helpers::fs::{perform, replace_file};
use super::paths::PathResolver;
use super::probe::DestinationState;
use super::{Applicable, Applied, Outcome, diff};
use crate::config::content::ContentSpec;
use crate::error::ActionError;
use crate::operations::EntryKind;
use crate::tasks::Context;

/// Result of splicing a fragment into a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// The text with the fragment in place.
    pub text: String,
    /// Whether an existing fragment was replaced (otherwise it was appended).
    pub matched: bool,
}

/// Splice `content` into `original`.
///
/// When `after` is given, everything up to the end of its last match is left
/// untouched. In the rest, the last match of `regex` (or, without a regex,
/// the last literal occurrence of `content`) is replaced by `content`. With
/// nothing to replace, `content` is appended verbatim.
///
/// Always working on the last occurrence makes repeated application
/// converge.
#[must_use]
pub fn patch(original: &str, content: &str, regex: Option<&Regex>, after: Option<&Regex>) -> Patch {
    let split = after
        .and_then(|re| re.find_iter(original).last())
        .map_or(0, |m| m.end());
    let (head, rest) = original.split_at(split);

    let span = regex.map_or_else(
        || rest.rfind(content).map(|start| (start, start + content.len())),
        |re| re.find_iter(rest).last().map(|m| (m.start(), m.end())),
    );

    match span {
        Some((start, end)) => {
            let (before, from_match) = rest.split_at(start);
            let (_, tail) = from_match.split_at(end - start);
            Patch {
                text: [head, before, content, tail].concat(),
                matched: true,
            }
        }
        None => Patch {
            text: [original, content].concat(),
            matched: false,
        },
    }
}

/// A fragment that must be present inside an existing text file.
#[derive(Debug, Clone)]
pub struct FileContentResource {
    /// Absolute path of the file to patch.
    pub dest: PathBuf,
    /// Fragment that must be present.
    pub content: String,
    /// Pattern locating the fragment to replace.
    pub regex: Option<Regex>,
    /// Pattern whose last match bounds the editable region.
    pub after: Option<Regex>,
    /// Move the original aside before rewriting it.
    pub backup: bool,
}

impl FileContentResource {
    /// Resolve the destination of `spec`.
    #[must_use]
    pub fn from_spec(spec: &ContentSpec, resolver: &PathResolver) -> Self {
        Self {
            dest: resolver.resolve(&spec.dest),
            content: spec.content.clone(),
            regex: spec.regex.clone(),
            after: spec.after.clone(),
            backup: spec.backup,
        }
    }

    /// The regular file to edit: the destination itself, or what it links to.
    fn target(&self, ctx: &Context) -> Result<PathBuf, ActionError> {
        let ops = ctx.fs_ops.as_ref();
        let dest = &self.dest;
        match DestinationState::probe(ops, dest)? {
            DestinationState::RegularFile => Ok(dest.clone()),
            DestinationState::Link(_) => {
                let resolved = ops
                    .canonicalize(dest)
                    .map_err(ActionError::fs("canonicalize", dest))?;
                let kind = ops
                    .entry_kind(&resolved)
                    .map_err(ActionError::fs("stat", &resolved))?;
                if kind == Some(EntryKind::File) {
                    Ok(resolved)
                } else {
                    Err(ActionError::NotRegularFile(dest.clone()))
                }
            }
            DestinationState::Absent | DestinationState::BrokenLink(_) => {
                Err(ActionError::DestinationMissing(dest.clone()))
            }
            DestinationState::OtherType => Err(ActionError::NotRegularFile(dest.clone())),
        }
    }
}

impl Applicable for FileContentResource {
    fn description(&self) -> String {
        format!("{}: {:?}", self.dest.display(), self.content)
    }

    fn apply(&self, ctx: &Context) -> Result<Applied, ActionError> {
        let ops = ctx.fs_ops.as_ref();
        let target = self.target(ctx)?;
        let bytes = ops.read(&target).map_err(ActionError::fs("read", &target))?;
        let original =
            String::from_utf8(bytes).map_err(|_| ActionError::NotText(target.clone()))?;

        let patched = patch(
            &original,
            &self.content,
            self.regex.as_ref(),
            self.after.as_ref(),
        );
        if patched.text == original {
            return Ok(Applied::new(Outcome::ContentAsExpected));
        }

        let label = self.dest.display().to_string();
        let diff = ctx
            .show_diff
            .then(|| {
                diff::unified(
                    original.as_bytes(),
                    patched.text.as_bytes(),
                    &label,
                    &format!("{label} (updated)"),
                )
            })
            .filter(|d| !d.is_empty());

        perform(ctx, &format!("update content of {}", target.display()), || {
            let mode = ops.mode(&target).ok();
            if self.backup {
                let backup = ctx.backups.back_up(ops, &target)?;
                ctx.log.info(&format!(
                    "backed up {} to {}",
                    target.display(),
                    backup.display()
                ));
            }
            replace_file(ops, &target, patched.text.as_bytes(), mode)
        })?;

        let outcome = if patched.matched {
            Outcome::ContentUpdated
        } else {
            Outcome::ContentAdded
        };
        Ok(Applied::with_diff(outcome, diff))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use super::*;
    use crate::config::content::compile;
    use crate::error::ErrorKind;
    use crate::tasks::RunOptions;
    use crate::tasks::test_helpers::{context_with, make_context};

    fn re(pattern: &str) -> Regex {
        compile("regex", pattern).unwrap()
    }

    // ------------------------------------------------------------------
    // patch
    // ------------------------------------------------------------------

    #[test]
    fn after_splits_at_last_match() {
        let after = re("MARK");
        let out = patch("A\nMARK\nB\nMARK\nC\n", "X\n", None, Some(&after));
        assert_eq!(out.text, "A\nMARK\nB\nMARK\nC\nX\n");
        assert!(!out.matched);

        let regex = re("^[BC]$");
        let out = patch("A\nMARK\nB\nMARK\nC\n", "Z", Some(&regex), Some(&after));
        assert_eq!(out.text, "A\nMARK\nB\nMARK\nZ\n", "head keeps the B line");
        assert!(out.matched);
    }

    #[test]
    fn literal_fragment_without_regex_is_appended() {
        let out = patch("foo=0\nbar=2\n", "foo=1", None, None);
        assert_eq!(out.text, "foo=0\nbar=2\nfoo=1");
        assert!(!out.matched);
    }

    #[test]
    fn regex_replaces_matching_line() {
        let regex = re("^foo=.*$");
        let out = patch("foo=0\nbar=2\n", "foo=1", Some(&regex), None);
        assert_eq!(out.text, "foo=1\nbar=2\n");
        assert!(out.matched);
    }

    #[test]
    fn last_regex_match_is_replaced() {
        let regex = re("^foo=.*$");
        let out = patch("foo=0\nfoo=5\n", "foo=1", Some(&regex), None);
        assert_eq!(out.text, "foo=0\nfoo=1\n");
    }

    #[test]
    fn present_fragment_is_unchanged() {
        let out = patch("a\nfragment\nb\n", "fragment\n", None, None);
        assert_eq!(out.text, "a\nfragment\nb\n");
        assert!(out.matched);
    }

    #[test]
    fn after_without_match_uses_whole_text() {
        let after = re("NOPE");
        let regex = re("^x=.*$");
        let out = patch("x=1\n", "x=2", Some(&regex), Some(&after));
        assert_eq!(out.text, "x=2\n");
    }

    #[test]
    fn patching_twice_converges() {
        let regex = re("^export PATH=.*$");
        let content = "export PATH=$HOME/bin:$PATH";
        for original in ["", "a\n", "export PATH=/usr/bin\nexport PATH=/bin\n"] {
            let once = patch(original, content, Some(&regex), None).text;
            let twice = patch(&once, content, Some(&regex), None).text;
            assert_eq!(once, twice, "input {original:?}");
        }
    }

    // ------------------------------------------------------------------
    // FileContentResource
    // ------------------------------------------------------------------

    fn resource(dest: PathBuf, content: &str, regex: Option<&str>) -> FileContentResource {
        FileContentResource {
            dest,
            content: content.to_string(),
            regex: regex.map(re),
            after: None,
            backup: false,
        }
    }

    #[test]
    fn update_then_as_expected() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("app.conf");
        fs::write(&dest, "foo=0\nbar=2\n").unwrap();
        let r = resource(dest.clone(), "foo=1", Some("^foo=.*$"));
        let ctx = make_context(false);

        assert_eq!(r.apply(&ctx).unwrap().outcome, Outcome::ContentUpdated);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "foo=1\nbar=2\n");
        assert_eq!(r.apply(&ctx).unwrap().outcome, Outcome::ContentAsExpected);
    }

    #[test]
    fn append_then_as_expected() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("app.conf");
        fs::write(&dest, "foo=0\nbar=2\n").unwrap();
        let r = resource(dest.clone(), "foo=1", None);
        let ctx = make_context(false);

        assert_eq!(r.apply(&ctx).unwrap().outcome, Outcome::ContentAdded);
        assert_eq!(r.apply(&ctx).unwrap().outcome, Outcome::ContentAsExpected);
    }

    #[test]
    fn missing_destination_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resource(tmp.path().join("nope"), "x", None)
            .apply(&make_context(false))
            .unwrap_err();
        assert!(matches!(err, ActionError::DestinationMissing(_)));
        assert_eq!(err.kind(), ErrorKind::UnsupportedState);
    }

    #[test]
    fn directory_destination_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resource(tmp.path().to_path_buf(), "x", None)
            .apply(&make_context(false))
            .unwrap_err();
        assert!(matches!(err, ActionError::NotRegularFile(_)));
    }

    #[test]
    fn binary_destination_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("blob");
        fs::write(&dest, [0xff, 0xfe, 0x00]).unwrap();
        let err = resource(dest, "x", None)
            .apply(&make_context(false))
            .unwrap_err();
        assert!(matches!(err, ActionError::NotText(_)));
    }

    #[test]
    fn dry_run_leaves_file_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("app.conf");
        fs::write(&dest, "foo=0\n").unwrap();
        let (ctx, log) = context_with(&RunOptions {
            dry_run: true,
            show_diff: true,
            ..RunOptions::default()
        });

        let applied = resource(dest.clone(), "foo=1", Some("^foo=.*$"))
            .apply(&ctx)
            .unwrap();

        assert_eq!(applied.outcome, Outcome::ContentUpdated);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "foo=0\n");
        assert!(log.contains("would update content"));
        let diff = applied.diff.unwrap();
        assert!(diff.contains("(updated)"));
        assert!(diff.contains("+foo=1"));
    }

    #[test]
    fn backup_keeps_original() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("app.conf");
        fs::write(&dest, "foo=0\n").unwrap();
        let mut r = resource(dest.clone(), "foo=1", Some("^foo=.*$"));
        r.backup = true;

        r.apply(&make_context(false)).unwrap();

        let backups: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p != &dest)
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "foo=0\n");
    }

    #[cfg(unix)]
    #[test]
    fn link_target_is_edited_with_mode_kept() {
        use std::os::unix::fs::{PermissionsExt, symlink};

        let tmp = tempfile::tempdir().unwrap();
        let real = tmp.path().join("real.conf");
        fs::write(&real, "foo=0\n").unwrap();
        fs::set_permissions(&real, fs::Permissions::from_mode(0o640)).unwrap();
        let dest = tmp.path().join("link.conf");
        symlink(&real, &dest).unwrap();

        resource(dest.clone(), "foo=1", Some("^foo=.*$"))
            .apply(&make_context(false))
            .unwrap();

        assert!(fs::symlink_metadata(&dest).unwrap().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "foo=1\n");
        let mode = fs::metadata(&real).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode, 0o640);
    }
}
