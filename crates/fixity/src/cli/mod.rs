pub mod add;
pub mod check;
pub mod list;
pub mod report;
pub mod scan;

use clap::{Parser, Subcommand};
use fixity_lib::{Algorithm, Config, ExportFormat, Monitor, Result, RunOptions, Settings};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

#[derive(Parser)]
#[command(name = "fixity")]
#[command(about = "Detect unauthorized changes to tracked files", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to the record store snapshot")]
    pub store: Option<PathBuf>,

    #[arg(long, global = true, help = "Path to settings file (fixity.toml)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Seconds to wait for the store lock")]
    pub lock_timeout: Option<u64>,

    #[arg(long, global = true, help = "Number of hashing workers")]
    pub workers: Option<usize>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, short = 'q', global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Track files (or the files in a directory)")]
    Add {
        #[arg(required = true, help = "Files or directories to track")]
        paths: Vec<PathBuf>,

        #[arg(long, short = 'a', help = "Digest algorithm (md5, sha1, sha224, sha256, sha384, sha512)")]
        algorithm: Option<Algorithm>,

        #[arg(long, short = 'r', help = "Descend into subdirectories when adding a directory")]
        recursive: bool,

        #[arg(long, help = "Only add files whose name matches this glob")]
        pattern: Option<String>,
    },

    #[command(about = "Check a single tracked file")]
    Check {
        #[arg(help = "Tracked file to check")]
        path: PathBuf,
    },

    #[command(about = "Check the tracked files under a directory")]
    Scan {
        #[arg(help = "Directory to scan")]
        root: PathBuf,

        #[arg(long, short = 'r', help = "Include tracked files in subdirectories")]
        recursive: bool,

        #[arg(long, help = "Only check files whose name matches this glob")]
        pattern: Option<String>,
    },

    #[command(about = "Summarise integrity status")]
    Report {
        #[arg(long, help = "Re-check every tracked file before reporting")]
        refresh: bool,

        #[arg(long, short = 'e', help = "Export format (json, html)")]
        export: Option<ExportFormat>,

        #[arg(long, short = 'o', help = "Output file path")]
        output: Option<PathBuf>,
    },

    #[command(about = "List tracked files")]
    List,

    #[command(about = "Stop tracking a file")]
    Remove {
        #[arg(help = "Tracked file to forget")]
        path: PathBuf,
    },
}

/// Everything a handler needs: the engine, the resolved options and the
/// output mode.
pub struct Context {
    pub monitor: Monitor,
    pub options: RunOptions,
    pub config: Config,
    pub verbose: bool,
    pub quiet: bool,
}

pub fn init_context(cli: &Cli) -> Result<Context> {
    let config = Config::new(cli.store.clone(), cli.config.clone())?;
    config.ensure_store_directory()?;

    let options = run_options(&cli.command, &config.settings)?;

    let mut monitor = Monitor::with_settings(&config.store_path, &config.settings);
    if let Some(secs) = cli.lock_timeout {
        monitor = monitor.lock_timeout(std::time::Duration::from_secs(secs));
    }
    if let Some(workers) = cli.workers {
        monitor = monitor.workers(workers);
    }

    log::debug!("Store: {}", config.store_path.display());

    Ok(Context {
        monitor,
        options,
        config,
        verbose: cli.verbose,
        quiet: cli.quiet,
    })
}

/// Maps the subcommand's flags onto the run options seeded from settings.
pub fn run_options(command: &Commands, settings: &Settings) -> Result<RunOptions> {
    let options = RunOptions::from_settings(settings)?;

    Ok(match command {
        Commands::Add {
            algorithm,
            recursive,
            ..
        } => options.with_flags(*algorithm, *recursive, None, None),
        Commands::Scan { recursive, .. } => options.with_flags(None, *recursive, None, None),
        Commands::Report { export, output, .. } => {
            options.with_flags(None, false, *export, output.clone())
        }
        Commands::Check { .. } | Commands::List | Commands::Remove { .. } => options,
    })
}

static INTERRUPT: OnceLock<Arc<AtomicBool>> = OnceLock::new();

extern "C" fn on_interrupt(_signal: libc::c_int) {
    if let Some(flag) = INTERRUPT.get() {
        flag.store(true, Ordering::SeqCst);
    }
    // A second Ctrl-C terminates immediately.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

/// Routes SIGINT to a cancellation flag for the duration of a scan.
pub fn install_interrupt_handler() -> Arc<AtomicBool> {
    let flag = INTERRUPT
        .get_or_init(|| Arc::new(AtomicBool::new(false)))
        .clone();
    let handler: extern "C" fn(libc::c_int) = on_interrupt;
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
    }
    flag
}
