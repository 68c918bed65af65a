//! Sequential execution of resolved actions.
use super::{Action, Context};
use crate::error::ActionError;
use crate::logging::ActionStatus;
use crate::resources::{Applied, Outcome, Severity};

const BLUE: &str = "\x1b[34m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Which actions a run covers, by their `sudo` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Elevated process: run everything.
    All,
    /// Unelevated process: run non-`sudo` actions, report `sudo` ones as
    /// skipped.
    Unelevated,
    /// `--sudo-only`: run only `sudo` actions.
    ElevatedOnly,
}

impl Scope {
    const fn includes(self, sudo: bool) -> bool {
        !matches!(self, Self::ElevatedOnly) || sudo
    }

    const fn skips(self, sudo: bool) -> bool {
        matches!(self, Self::Unelevated) && sudo
    }
}

/// What happened to one action.
#[derive(Debug)]
pub struct ActionReport {
    /// One-based position among the actions in scope.
    pub index: usize,
    /// The action's description.
    pub description: String,
    /// Whether the action requires elevation.
    pub sudo: bool,
    /// Outcome and diff, or the failure.
    pub result: Result<Applied, ActionError>,
}

impl ActionReport {
    /// Severity of the report; failures are [`Severity::Failed`].
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.result
            .as_ref()
            .map_or(Severity::Failed, |applied| applied.outcome.severity())
    }

    /// Outcome, if the action did not fail.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.result.as_ref().ok().map(|applied| applied.outcome)
    }
}

/// Reports of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One report per executed (or skipped) action, in order.
    pub reports: Vec<ActionReport>,
    /// The run was stopped by Ctrl-C before every action ran.
    pub interrupted: bool,
}

impl RunSummary {
    fn count(&self, severity: Severity) -> usize {
        self.reports.iter().filter(|r| r.severity() == severity).count()
    }

    /// Number of actions that changed (or would change) something.
    #[must_use]
    pub fn changed(&self) -> usize {
        self.count(Severity::Changed)
    }

    /// Number of actions that found nothing to do.
    #[must_use]
    pub fn unchanged(&self) -> usize {
        self.count(Severity::Unchanged)
    }

    /// Number of failed actions.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Severity::Failed)
    }

    /// Number of `sudo` actions skipped for lack of privileges.
    #[must_use]
    pub fn skipped_for_elevation(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome() == Some(Outcome::SkippedRequiresElevation))
            .count()
    }

    /// No action failed and the run was not interrupted.
    #[must_use]
    pub fn success(&self) -> bool {
        self.failed() == 0 && !self.interrupted
    }
}

/// Runs actions one at a time, in order, isolating failures.
#[derive(Debug)]
pub struct ActionRunner<'a> {
    ctx: &'a Context,
    scope: Scope,
}

impl<'a> ActionRunner<'a> {
    /// Runner for the actions in `scope`.
    #[must_use]
    pub const fn new(ctx: &'a Context, scope: Scope) -> Self {
        Self { ctx, scope }
    }

    /// Execute every action in scope and report each outcome.
    ///
    /// A failing action is reported and the run continues with the next.
    /// An interrupt is honoured between actions.
    #[must_use]
    pub fn run(&self, actions: &[Action]) -> RunSummary {
        let selected: Vec<&Action> = actions
            .iter()
            .filter(|a| self.scope.includes(a.sudo))
            .collect();
        let total = selected.len();
        let mut summary = RunSummary::default();

        for (i, action) in selected.into_iter().enumerate() {
            if self.ctx.is_interrupted() {
                self.ctx.log.warn(&format!(
                    "interrupted, {} action(s) not run",
                    total - i
                ));
                summary.interrupted = true;
                break;
            }
            summary.reports.push(self.run_one(i + 1, total, action));
        }

        let skipped = summary.skipped_for_elevation();
        if skipped > 0 {
            self.ctx.log.warn(&format!(
                "{skipped} action(s) need elevated privileges, rerun with 'sudo dotlink apply --sudo-only'"
            ));
        }
        summary
    }

    fn run_one(&self, index: usize, total: usize, action: &Action) -> ActionReport {
        let description = action.description();
        self.ctx.log.trace(&format!("running {description}"));
        let result = if self.scope.skips(action.sudo) {
            Ok(Applied::new(Outcome::SkippedRequiresElevation))
        } else {
            action.execute(self.ctx)
        };

        let report = ActionReport {
            index,
            description,
            sudo: action.sudo,
            result,
        };
        self.emit(&report, total);
        report
    }

    fn emit(&self, report: &ActionReport, total: usize) {
        let log = &self.ctx.log;
        let sudo = if report.sudo { " (sudo)" } else { "" };
        let prefix = format!("[{}/{total}]", report.index);

        match &report.result {
            Ok(applied) => {
                let color = match applied.outcome.severity() {
                    Severity::Changed => GREEN,
                    Severity::Unchanged | Severity::Failed => BLUE,
                };
                log.info(&format!(
                    "{prefix} {color}{}{sudo}{RESET}: {}",
                    applied.outcome, report.description
                ));
                if let Some(diff) = &applied.diff {
                    log.info(&colorize_diff(diff));
                }
                log.record_action(
                    &report.description,
                    self.status_of(applied.outcome),
                    Some(applied.outcome.message()),
                );
            }
            Err(e) => {
                log.error(&format!(
                    "{prefix} {RED}Failed{sudo}{RESET}: {}: {e}",
                    report.description
                ));
                log.record_action(
                    &report.description,
                    ActionStatus::Failed,
                    Some(&e.to_string()),
                );
            }
        }
    }

    fn status_of(&self, outcome: Outcome) -> ActionStatus {
        if outcome == Outcome::SkippedRequiresElevation {
            return ActionStatus::Skipped;
        }
        match outcome.severity() {
            Severity::Changed if self.ctx.dry_run => ActionStatus::DryRun,
            Severity::Changed => ActionStatus::Changed,
            Severity::Unchanged => ActionStatus::Unchanged,
            Severity::Failed => ActionStatus::Failed,
        }
    }
}

/// Colour a unified diff: additions green, removals red, hunk headers cyan.
fn colorize_diff(diff: &str) -> String {
    diff.lines()
        .map(|line| {
            let color = if line.starts_with("+++") || line.starts_with("---") {
                None
            } else if line.starts_with('+') {
                Some(GREEN)
            } else if line.starts_with('-') {
                Some(RED)
            } else if line.starts_with("@@") {
                Some(CYAN)
            } else {
                None
            };
            color.map_or_else(|| line.to_string(), |c| format!("{c}{line}{RESET}"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
