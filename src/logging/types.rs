//! Core logging types: action entries, status, and the [`Log`] trait.

/// Action result for summary reporting.
#[derive(Debug, Clone)]
pub struct ActionEntry {
    /// Human-readable action description.
    pub name: String,
    /// Final status of the action.
    pub status: ActionStatus,
    /// Optional detail message (outcome or error text).
    pub message: Option<String>,
}

/// Status of a completed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// Nothing needed to change.
    Unchanged,
    /// The filesystem was changed.
    Changed,
    /// Not attempted (e.g. requires elevation, run interrupted).
    Skipped,
    /// A change was computed but not applied.
    DryRun,
    /// The action failed.
    Failed,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) is the production implementation;
/// tests substitute recorders that capture messages instead of printing.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a trace message (console only, at the highest verbosity).
    fn trace(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record an action result for the summary.
    fn record_action(&self, name: &str, status: ActionStatus, message: Option<&str>);
}
