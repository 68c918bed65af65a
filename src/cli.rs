//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI entry point for dotlink.
#[derive(Parser, Debug)]
#[command(
    name = "dotlink",
    about = "Converge links, copies and file fragments to a declared state",
    version = crate::version()
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// When to colour console output.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Always emit ANSI colours.
    Always,
    /// Colour when stdout is a terminal.
    #[default]
    Auto,
    /// Never emit ANSI colours.
    Never,
}

impl ColorChoice {
    /// Whether to colour, given whether stdout is a terminal.
    #[must_use]
    pub const fn enabled(self, is_terminal: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Auto => is_terminal,
            Self::Never => false,
        }
    }
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Increase console verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colour console output
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Declaration file (default: $DOTLINK_CONFIG, then ~/dotfiles/config.yml)
    #[arg(short = 'c', long, global = true)]
    pub config_file: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Converge every declared destination
    Apply(ApplyOpts),
    /// Load and resolve the declaration file without changing anything
    Validate,
    /// Print a shell completion script
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

/// Options for the `apply` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct ApplyOpts {
    /// Report what would change without changing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show a unified diff for every change
    #[arg(long)]
    pub diff: bool,

    /// Let `allow` policies replace files and relink
    #[arg(short, long)]
    pub force: bool,

    /// Put backups under this directory instead of beside the original
    #[arg(long, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Run only actions marked `sudo` (requires elevated privileges)
    #[arg(long)]
    pub sudo_only: bool,
}

/// Options for the `completions` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_apply_flags() {
        let cli = Cli::parse_from([
            "dotlink",
            "apply",
            "-n",
            "--diff",
            "-f",
            "--backup-dir",
            "/bak",
            "--sudo-only",
        ]);
        let Command::Apply(opts) = cli.command else {
            panic!("expected apply");
        };
        assert!(opts.dry_run);
        assert!(opts.diff);
        assert!(opts.force);
        assert!(opts.sudo_only);
        assert_eq!(opts.backup_dir, Some(PathBuf::from("/bak")));
    }

    #[test]
    fn apply_defaults() {
        let cli = Cli::parse_from(["dotlink", "apply"]);
        assert!(matches!(
            cli.command,
            Command::Apply(ApplyOpts {
                dry_run: false,
                diff: false,
                force: false,
                backup_dir: None,
                sudo_only: false,
            })
        ));
    }

    #[test]
    fn verbose_counts() {
        let cli = Cli::parse_from(["dotlink", "-vv", "validate"]);
        assert_eq!(cli.global.verbose, 2);
        let cli = Cli::parse_from(["dotlink", "validate", "-v"]);
        assert_eq!(cli.global.verbose, 1);
    }

    #[test]
    fn global_config_file_after_subcommand() {
        let cli = Cli::parse_from(["dotlink", "apply", "--config-file", "/etc/d.yml"]);
        assert_eq!(cli.global.config_file, Some(PathBuf::from("/etc/d.yml")));
    }

    #[test]
    fn color_choice() {
        let cli = Cli::parse_from(["dotlink", "--color", "never", "version"]);
        assert_eq!(cli.global.color, ColorChoice::Never);
        assert!(!ColorChoice::Never.enabled(true));
        assert!(ColorChoice::Always.enabled(false));
        assert!(ColorChoice::Auto.enabled(true));
        assert!(!ColorChoice::Auto.enabled(false));
    }

    #[test]
    fn parse_completions() {
        let cli = Cli::parse_from(["dotlink", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Command::Completions(CompletionsOpts {
                shell: clap_complete::Shell::Bash
            })
        ));
    }

    #[test]
    fn unknown_shell_is_rejected() {
        assert!(Cli::try_parse_from(["dotlink", "completions", "cmd"]).is_err());
    }
}
