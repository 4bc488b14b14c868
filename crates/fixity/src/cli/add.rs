use super::Context;
use console::style;
use fixity_lib::{Algorithm, FixityError, Result};
use std::path::PathBuf;

pub fn handle_add_command(
    ctx: &Context,
    paths: Vec<PathBuf>,
    pattern: Option<String>,
) -> Result<usize> {
    let algorithm = ctx.options.algorithm;
    let recursive = ctx.options.recursive;
    let mut failures = 0;

    for path in paths {
        if path.is_dir() {
            failures += add_directory(ctx, &path, algorithm, recursive, pattern.as_deref())?;
        } else {
            match ctx.monitor.add(&path, algorithm) {
                Ok(record) => {
                    if !ctx.quiet {
                        println!(
                            "{} Added {} ({})",
                            style("✓").green(),
                            record.path.display(),
                            record.algorithm
                        );
                    }
                }
                Err(e @ (FixityError::StoreBusy { .. } | FixityError::StoreCorrupted { .. })) => {
                    return Err(e);
                }
                Err(e) => {
                    failures += 1;
                    println!("{} Failed to add {}: {}", style("✗").red(), path.display(), e);
                }
            }
        }
    }

    if failures > 0 {
        return Err(FixityError::Config(format!("{} path(s) could not be added", failures)));
    }

    Ok(0)
}

fn add_directory(
    ctx: &Context,
    dir: &std::path::Path,
    algorithm: Algorithm,
    recursive: bool,
    pattern: Option<&str>,
) -> Result<usize> {
    let summary = ctx.monitor.add_tree(dir, algorithm, recursive, pattern)?;

    if !ctx.quiet {
        println!(
            "{} Added {} files under {}",
            style("✓").green(),
            style(summary.added.len()).cyan(),
            dir.display()
        );
        if ctx.verbose {
            for record in &summary.added {
                println!("  {} {}", style("+").cyan(), record.path.display());
            }
        }
    }

    for (path, err) in &summary.failed {
        println!("{} Skipped {}: {}", style("!").yellow(), path.display(), err);
    }

    Ok(summary.failed.len())
}
