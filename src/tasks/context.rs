use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::fetch::{CachingFetcher, Fetcher, HttpFetcher};
use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::resources::backup::BackupManager;

/// Run-wide switches chosen on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Decide and report, but do not write.
    pub dry_run: bool,
    /// Compute unified diffs for changing actions.
    pub show_diff: bool,
    /// Let `allow` policies replace and relink.
    pub force: bool,
    /// Put backups under this root instead of beside the original.
    pub backup_dir: Option<PathBuf>,
}

/// Shared context for action execution.
pub struct Context {
    /// Logger for output and action recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// Whether to compute diffs for changing actions.
    pub show_diff: bool,
    /// Run-wide force flag consulted by `allow` policies.
    pub force: bool,
    /// Where replaced files are moved.
    pub backups: BackupManager,
    /// Filesystem operation abstraction (injectable for testing).
    pub fs_ops: Arc<dyn FileSystemOps>,
    /// Remote source retrieval (injectable for testing).
    pub fetcher: Arc<dyn Fetcher>,
    /// Set by the Ctrl-C handler; checked between actions.
    pub interrupted: Arc<AtomicBool>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("show_diff", &self.show_diff)
            .field("force", &self.force)
            .field("backups", &self.backups)
            .field("fs_ops", &"<dyn FileSystemOps>")
            .field("fetcher", &"<dyn Fetcher>")
            .field("interrupted", &self.interrupted)
            .finish()
    }
}

impl Context {
    /// Creates a context backed by the real filesystem and a caching HTTP
    /// fetcher.
    #[must_use]
    pub fn new(log: Arc<dyn Log>, opts: &RunOptions) -> Self {
        Self {
            log,
            dry_run: opts.dry_run,
            show_diff: opts.show_diff,
            force: opts.force,
            backups: BackupManager::new(opts.backup_dir.clone()),
            fs_ops: Arc::new(SystemFileSystemOps),
            fetcher: Arc::new(CachingFetcher::new(Arc::new(HttpFetcher::new()))),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the [`FileSystemOps`] implementation.
    #[must_use]
    pub fn with_fs_ops(mut self, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        self.fs_ops = fs_ops;
        self
    }

    /// Replace the [`Fetcher`] implementation.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Share an externally owned interrupt flag (e.g. one set by a signal
    /// handler).
    #[must_use]
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    /// Whether the run has been asked to stop.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fetch::MockFetcher;
    use crate::operations::MockFileSystemOps;
    use crate::tasks::test_helpers::RecordingLog;

    fn log() -> Arc<dyn Log> {
        Arc::new(RecordingLog::default())
    }

    #[test]
    fn new_copies_run_options() {
        let opts = RunOptions {
            dry_run: true,
            show_diff: true,
            force: false,
            backup_dir: Some(PathBuf::from("/bak")),
        };
        let ctx = Context::new(log(), &opts);
        assert!(ctx.dry_run);
        assert!(ctx.show_diff);
        assert!(!ctx.force);
        assert_eq!(ctx.backups.root(), Some(std::path::Path::new("/bak")));
    }

    #[test]
    fn with_fs_ops_and_fetcher_keep_flags() {
        let opts = RunOptions {
            force: true,
            ..RunOptions::default()
        };
        let ctx = Context::new(log(), &opts)
            .with_fs_ops(Arc::new(MockFileSystemOps::new()))
            .with_fetcher(Arc::new(MockFetcher::new()));
        assert!(ctx.force);
        assert!(!ctx.dry_run);
    }

    #[test]
    fn interrupt_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = Context::new(log(), &RunOptions::default()).with_interrupt_flag(Arc::clone(&flag));
        assert!(!ctx.is_interrupted());
        flag.store(true, Ordering::SeqCst);
        assert!(ctx.is_interrupted());
    }

    #[test]
    fn debug_format_includes_key_fields() {
        let ctx = Context::new(log(), &RunOptions::default());
        let debug = format!("{ctx:?}");
        assert!(debug.contains("Context"));
        assert!(debug.contains("dry_run"));
        assert!(debug.contains("backups"));
    }
}
