//! Command: load and resolve the declaration file without executing it.
use std::io::Write;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Log;

/// Load, resolve and validate the declarations, writing one line per
/// resolved action to `out`.
///
/// Warnings are logged but do not fail the command.
///
/// # Errors
///
/// Returns an error if the declarations cannot be loaded or resolved, or
/// `out` cannot be written.
pub fn run(global: &GlobalOpts, log: &dyn Log, out: &mut impl Write) -> Result<CommandSetup> {
    let setup = CommandSetup::init(global, log)?;
    for (i, action) in setup.actions.iter().enumerate() {
        let sudo = if action.sudo { " (sudo)" } else { "" };
        writeln!(out, "{:>3}. {}{sudo}", i + 1, action.description())?;
    }
    log.info(&format!(
        "{} action(s), {} warning(s)",
        setup.actions.len(),
        setup.warnings.len()
    ));
    Ok(setup)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::ColorChoice;
    use crate::config::test_helpers::write_temp_config;
    use crate::tasks::test_helpers::RecordingLog;

    fn global(path: &std::path::Path) -> GlobalOpts {
        GlobalOpts {
            verbose: 0,
            color: ColorChoice::Never,
            config_file: Some(path.to_path_buf()),
        }
    }

    #[test]
    fn lists_resolved_actions() {
        let file = write_temp_config(
            "yml",
            "- create:\n    - {url: 'https://example.com/a', dest: /tmp/a}\n\
             - filecontent:\n    - {dest: /etc/hosts, content: x, sudo: true}\n",
        );
        let mut out = Vec::new();

        let setup = run(&global(file.path()), &RecordingLog::default(), &mut out).unwrap();

        assert_eq!(setup.actions.len(), 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "  1. https://example.com/a -> /tmp/a\n  2. /etc/hosts: \"x\" (sudo)\n"
        );
    }

    #[test]
    fn config_errors_fail_the_command() {
        let file = write_temp_config("json", "[{\"create\": [{\"dest\": \"/a\"}]}]");
        let err = run(&global(file.path()), &RecordingLog::default(), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("exactly one of 'src' or 'url'"));
    }
}
