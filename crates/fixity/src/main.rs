mod cli;

use anyhow::Context as _;
use clap::Parser;
use console::style;
use fixity_lib::FixityError;
use std::process::ExitCode;

const EXIT_VIOLATIONS: u8 = 1;
const EXIT_FAILURE: u8 = 2;
const EXIT_BUSY: u8 = 75;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = run(cli);
    if let Err(err) = &result {
        eprintln!("{} {:#}", style("Error:").red().bold(), err);
    }
    ExitCode::from(exit_code(&result))
}

/// 0 clean, 1 violations, 75 store busy, 2 anything else (cancelled included).
fn exit_code(result: &anyhow::Result<usize>) -> u8 {
    match result {
        Ok(0) => 0,
        Ok(_) => EXIT_VIOLATIONS,
        Err(err) => {
            let busy = err
                .downcast_ref::<FixityError>()
                .is_some_and(FixityError::is_retryable);
            if busy {
                EXIT_BUSY
            } else {
                EXIT_FAILURE
            }
        }
    }
}

/// Runs one command and returns how many integrity violations it found.
fn run(cli: cli::Cli) -> anyhow::Result<usize> {
    let ctx = cli::init_context(&cli).context("Failed to initialise fixity")?;

    let violations = match cli.command {
        cli::Commands::Add { paths, pattern, .. } => {
            cli::add::handle_add_command(&ctx, paths, pattern)?
        }

        cli::Commands::Check { path } => cli::check::handle_check_command(&ctx, path)?,

        cli::Commands::Scan { root, pattern, .. } => {
            cli::scan::handle_scan_command(&ctx, root, pattern)?
        }

        cli::Commands::Report { refresh, .. } => {
            cli::report::handle_report_command(&ctx, refresh)?
        }

        cli::Commands::List => cli::list::handle_list_command(&ctx)?,

        cli::Commands::Remove { path } => cli::list::handle_remove_command(&ctx, path)?,
    };

    Ok(violations)
}
