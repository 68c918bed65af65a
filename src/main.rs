//! `dotlink` binary entry point.
use std::io::{self, IsTerminal as _};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::Parser;

use dotlink::cli::{Cli, Command, GlobalOpts};
use dotlink::commands;
use dotlink::logging::{self, Logger};
use dotlink::platform::Platform;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let result = match &args.command {
        Command::Apply(opts) => with_logging(&args.global, "apply", |log| {
            let interrupted = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&interrupted);
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
                log.debug(&format!("cannot install Ctrl-C handler: {e}"));
            }
            commands::apply::run(&args.global, opts, log, &Platform::detect(), interrupted)
                .map(drop)
        }),
        Command::Validate => with_logging(&args.global, "validate", |log| {
            commands::validate::run(&args.global, log.as_ref(), &mut io::stdout().lock()).map(drop)
        }),
        Command::Completions(opts) => {
            commands::completions::run(opts.shell, &mut io::stdout().lock());
            Ok(())
        }
        Command::Version => commands::version::run(&mut io::stdout().lock()).map_err(Into::into),
    };

    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Install the subscriber for `command`, run `body` and log its error.
fn with_logging(
    global: &GlobalOpts,
    command: &str,
    body: impl FnOnce(&Arc<Logger>) -> Result<()>,
) -> Result<()> {
    let color = global.color.enabled(io::stdout().is_terminal());
    logging::init_subscriber(global.verbose, color, command);
    let log = Arc::new(Logger::new(command));
    body(&log).inspect_err(|e| log.error(&format!("{e:#}")))
}
