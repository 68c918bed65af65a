//! Idempotent reconcilers and the primitives they share.
//!
//! Each reconciler probes the destination, decides what to do from the
//! current state and the declared policy, and reports an [`Outcome`].
pub mod backup;
pub mod create;
pub mod diff;
pub mod file_content;
pub mod helpers;
pub mod paths;
pub mod permissions;
pub mod probe;

use std::fmt;

use crate::error::ActionError;
use crate::tasks::Context;

/// How much an action changed the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Nothing changed.
    Unchanged,
    /// The filesystem was (or in a dry run, would be) changed.
    Changed,
    /// The action failed.
    Failed,
}

/// What an action found and did.
///
/// # Examples
///
/// ```
/// use dotlink::resources::{Outcome, Severity};
///
/// assert_eq!(Outcome::NewLinkCreated.severity(), Severity::Changed);
/// assert_eq!(Outcome::LinkAsExpected.message(), "Correct link already exists");
/// assert_eq!(
///     Outcome::FileAsExpected.with_mode_changed(),
///     Outcome::FileModeChanged
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The destination already links to the source.
    LinkAsExpected,
    /// A link was created where nothing existed.
    NewLinkCreated,
    /// A link to the wrong target was replaced.
    Relinked,
    /// A dangling link was replaced.
    RelinkedBrokenLink,
    /// A regular file was replaced by a link.
    ReplacedFileWithLink,
    /// The link was correct but its target's mode was changed.
    LinkModeChanged,
    /// The destination already holds the source's bytes.
    FileAsExpected,
    /// A copy was written where nothing existed.
    NewFileCreated,
    /// A link was replaced by a copy.
    ReplacedLinkWithFile,
    /// A dangling link was replaced by a copy.
    ReplacedBrokenLinkWithFile,
    /// A divergent file was overwritten.
    ReplacedFile,
    /// The copy was correct but its mode was changed.
    FileModeChanged,
    /// The fragment is already present.
    ContentAsExpected,
    /// An existing fragment was replaced.
    ContentUpdated,
    /// The fragment was appended.
    ContentAdded,
    /// Not run because it needs privileges this process lacks.
    SkippedRequiresElevation,
}

impl Outcome {
    /// Every outcome, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::LinkAsExpected,
        Self::NewLinkCreated,
        Self::Relinked,
        Self::RelinkedBrokenLink,
        Self::ReplacedFileWithLink,
        Self::LinkModeChanged,
        Self::FileAsExpected,
        Self::NewFileCreated,
        Self::ReplacedLinkWithFile,
        Self::ReplacedBrokenLinkWithFile,
        Self::ReplacedFile,
        Self::FileModeChanged,
        Self::ContentAsExpected,
        Self::ContentUpdated,
        Self::ContentAdded,
        Self::SkippedRequiresElevation,
    ];

    /// Fixed user-facing message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::LinkAsExpected => "Correct link already exists",
            Self::NewLinkCreated => "New link created",
            Self::Relinked => "Incorrect link was relinked",
            Self::RelinkedBrokenLink => "Broken link was relinked",
            Self::ReplacedFileWithLink => "Replaced file with link",
            Self::LinkModeChanged => "Correct link already exists, mode changed",
            Self::FileAsExpected => "Correct file already exists",
            Self::NewFileCreated => "New file created",
            Self::ReplacedLinkWithFile => "Replaced link with file",
            Self::ReplacedBrokenLinkWithFile => "Replaced broken link with file",
            Self::ReplacedFile => "Replaced file",
            Self::FileModeChanged => "Correct file already exists, mode changed",
            Self::ContentAsExpected => "File contents already as expected",
            Self::ContentUpdated => "File content updated",
            Self::ContentAdded => "File content added",
            Self::SkippedRequiresElevation => "Skipped, requires elevated privileges",
        }
    }

    /// Severity of this outcome.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::LinkAsExpected
            | Self::FileAsExpected
            | Self::ContentAsExpected
            | Self::SkippedRequiresElevation => Severity::Unchanged,
            _ => Severity::Changed,
        }
    }

    /// The outcome to report when only the permission bits had to change.
    ///
    /// Outcomes other than the two "as expected" ones already describe a
    /// change and are returned as-is.
    #[must_use]
    pub const fn with_mode_changed(self) -> Self {
        match self {
            Self::LinkAsExpected => Self::LinkModeChanged,
            Self::FileAsExpected => Self::FileModeChanged,
            other => other,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of one successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// What happened.
    pub outcome: Outcome,
    /// Unified diff of the change, when diff reporting was requested.
    pub diff: Option<String>,
}

impl Applied {
    /// An outcome without a diff.
    #[must_use]
    pub const fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            diff: None,
        }
    }

    /// An outcome with an optional diff.
    #[must_use]
    pub const fn with_diff(outcome: Outcome, diff: Option<String>) -> Self {
        Self { outcome, diff }
    }
}

/// Minimal interface for resources that can be described and applied.
pub trait Applicable {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Converge the resource to its desired state.
    ///
    /// In a dry run the same decisions are taken and the same outcome is
    /// returned, but nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] when the source is unavailable, the policy
    /// forbids the change, the destination is in an unsupported state, or a
    /// filesystem operation fails.
    fn apply(&self, ctx: &Context) -> Result<Applied, ActionError>;
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn outcome_table() {
        let table = Outcome::ALL
            .iter()
            .map(|o| format!("{o:?} | {} | {:?}", o.message(), o.severity()))
            .collect::<Vec<_>>()
            .join("\n");
        insta::assert_snapshot!(table, @r"
        LinkAsExpected | Correct link already exists | Unchanged
        NewLinkCreated | New link created | Changed
        Relinked | Incorrect link was relinked | Changed
        RelinkedBrokenLink | Broken link was relinked | Changed
        ReplacedFileWithLink | Replaced file with link | Changed
        LinkModeChanged | Correct link already exists, mode changed | Changed
        FileAsExpected | Correct file already exists | Unchanged
        NewFileCreated | New file created | Changed
        ReplacedLinkWithFile | Replaced link with file | Changed
        ReplacedBrokenLinkWithFile | Replaced broken link with file | Changed
        ReplacedFile | Replaced file | Changed
        FileModeChanged | Correct file already exists, mode changed | Changed
        ContentAsExpected | File contents already as expected | Unchanged
        ContentUpdated | File content updated | Changed
        ContentAdded | File content added | Changed
        SkippedRequiresElevation | Skipped, requires elevated privileges | Unchanged
        ");
    }

    #[test]
    fn mode_change_upgrades_only_as_expected_outcomes() {
        assert_eq!(
            Outcome::LinkAsExpected.with_mode_changed(),
            Outcome::LinkModeChanged
        );
        assert_eq!(
            Outcome::FileAsExpected.with_mode_changed(),
            Outcome::FileModeChanged
        );
        assert_eq!(
            Outcome::NewFileCreated.with_mode_changed(),
            Outcome::NewFileCreated
        );
        assert_eq!(
            Outcome::ContentAsExpected.with_mode_changed(),
            Outcome::ContentAsExpected
        );
    }

    #[test]
    fn display_is_message() {
        assert_eq!(Outcome::ReplacedFile.to_string(), "Replaced file");
    }

    #[test]
    fn severity_orders_failed_highest() {
        assert!(Severity::Failed > Severity::Changed);
        assert!(Severity::Changed > Severity::Unchanged);
    }
}
