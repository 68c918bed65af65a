//! Command: converge every declared destination.
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Result, bail};

use super::CommandSetup;
use crate::cli::{ApplyOpts, GlobalOpts};
use crate::logging::{Log, Logger};
use crate::platform::Platform;
use crate::tasks::runner::{ActionRunner, RunSummary, Scope};
use crate::tasks::{Context, RunOptions};

/// Choose which actions this process may run.
///
/// # Errors
///
/// Returns an error if `--sudo-only` is requested without elevation.
pub fn select_scope(platform: &Platform, sudo_only: bool) -> Result<Scope> {
    match (sudo_only, platform.elevated) {
        (true, false) => bail!("--sudo-only requires elevated privileges, rerun with sudo"),
        (true, true) => Ok(Scope::ElevatedOnly),
        (false, true) => Ok(Scope::All),
        (false, false) => Ok(Scope::Unelevated),
    }
}

/// Run the apply command.
///
/// `interrupted` is polled between actions; setting it stops the run after
/// the action in progress.
///
/// # Errors
///
/// Returns an error if the declarations cannot be loaded, `--sudo-only` is
/// used without elevation, or any action fails.
pub fn run(
    global: &GlobalOpts,
    opts: &ApplyOpts,
    log: &Arc<Logger>,
    platform: &Platform,
    interrupted: Arc<AtomicBool>,
) -> Result<RunSummary> {
    log.info(&format!("dotlink {}", crate::version()));
    let scope = select_scope(platform, opts.sudo_only)?;
    let setup = CommandSetup::init(global, log.as_ref())?;

    if platform.is_windows() && !platform.elevated {
        log.debug("creating symlinks on Windows needs Developer Mode or an elevated shell");
    }

    let run_opts = RunOptions {
        dry_run: opts.dry_run,
        show_diff: opts.diff,
        force: opts.force,
        backup_dir: opts.backup_dir.clone(),
    };
    let ctx = Context::new(Arc::clone(log) as Arc<dyn Log>, &run_opts)
        .with_interrupt_flag(interrupted);

    log.stage(if opts.dry_run {
        "Applying (dry run)"
    } else {
        "Applying"
    });
    let summary = ActionRunner::new(&ctx, scope).run(&setup.actions);

    log.print_summary();

    if summary.interrupted {
        bail!("interrupted");
    }
    let failed = summary.failed();
    if failed > 0 {
        bail!("{failed} action(s) failed");
    }
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::Os;

    #[test]
    fn scope_follows_elevation() {
        let user = Platform::new(Os::Linux, false);
        let root = Platform::new(Os::Linux, true);

        assert_eq!(select_scope(&user, false).unwrap(), Scope::Unelevated);
        assert_eq!(select_scope(&root, false).unwrap(), Scope::All);
        assert_eq!(select_scope(&root, true).unwrap(), Scope::ElevatedOnly);
    }

    #[test]
    fn sudo_only_requires_elevation() {
        let err = select_scope(&Platform::new(Os::Linux, false), true).unwrap_err();
        assert!(err.to_string().contains("requires elevated privileges"));
    }
}
