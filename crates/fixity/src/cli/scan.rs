use super::check::status_symbol;
use super::Context;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use fixity_lib::index::compile_pattern;
use fixity_lib::index::scanner::ProgressCallback;
use fixity_lib::util::format::abbreviate_digest;
use fixity_lib::util::normalize_path;
use fixity_lib::util::progress::create_progress_bar;
use fixity_lib::{
    select_tracked, Counts, FixityError, Report, Result, ScanOptions, ScanOutcome, Status,
    Verdict,
};
use std::path::PathBuf;

pub fn handle_scan_command(ctx: &Context, root: PathBuf, pattern: Option<String>) -> Result<usize> {
    let cancel = super::install_interrupt_handler();
    let options = ScanOptions {
        recursive: ctx.options.recursive,
        pattern: compile_pattern(pattern.as_deref())?,
        cancel: Some(cancel),
        ..Default::default()
    };

    let tracked = ctx.monitor.load()?;
    let expected = select_tracked(&tracked, &normalize_path(&root)?, &options).len();

    if !ctx.quiet {
        println!(
            "{} Scanning {} tracked files under {}...",
            style(">>>").cyan(),
            expected,
            root.display()
        );
    }

    let pb = if !ctx.verbose && !ctx.quiet && expected > 0 {
        Some(create_progress_bar(expected as u64, "Verifying digests"))
    } else {
        None
    };
    let on_verdict: ProgressCallback<'_> = &|_| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    };

    let outcome = ctx.monitor.scan(&root, &options, Some(on_verdict))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let report = Report::build(outcome.verdicts());

    if !ctx.quiet {
        print_verdicts(&report.entries, ctx.verbose);
        print_summary(&report.counts);
    }

    finish(outcome, &report)
}

/// Exit status of a completed scan. A cancelled scan has already committed
/// its partial results but never reads as clean.
pub fn finish(outcome: ScanOutcome, report: &Report) -> Result<usize> {
    if outcome.cancelled() {
        println!(
            "{} Scan interrupted: {} files not checked",
            style("!").yellow(),
            outcome.skipped
        );
        return Err(FixityError::Cancelled);
    }

    Ok(report.counts.violations())
}

fn print_verdicts(verdicts: &[Verdict], verbose: bool) {
    if verdicts.is_empty() {
        println!("{}", style("No tracked files under this path").yellow());
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("").fg(Color::Cyan),
        Cell::new("Path").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Detail").fg(Color::Cyan),
    ]);

    let mut shown = 0;
    for verdict in verdicts {
        if !verbose && verdict.new_status == Status::Unchanged {
            continue;
        }

        let detail = match (&verdict.current_digest, &verdict.error) {
            (_, Some(err)) => err.clone(),
            (Some(current), None) if verdict.new_status == Status::Modified => format!(
                "{} -> {}",
                abbreviate_digest(&verdict.previous_digest),
                abbreviate_digest(current)
            ),
            _ => verdict.new_status.describe().to_string(),
        };

        table.add_row(vec![
            Cell::new(status_symbol(verdict.new_status).to_string()),
            Cell::new(verdict.path.display()),
            Cell::new(verdict.new_status.as_str()),
            Cell::new(detail),
        ]);
        shown += 1;
    }

    if shown > 0 {
        println!("{}", table);
    }
}

pub fn print_summary(counts: &Counts) {
    println!("\n{} Checked {} files", style("✓").green(), style(counts.total).cyan());
    println!("  Unchanged: {}", style(counts.unchanged).green());
    if counts.new > 0 {
        println!("  New: {}", style(counts.new).cyan());
    }
    if counts.modified > 0 {
        println!("  Modified: {}", style(counts.modified).red());
    }
    if counts.missing > 0 {
        println!("  Missing: {}", style(counts.missing).yellow());
    }
    if counts.error > 0 {
        println!("  Errors: {}", style(counts.error).red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_scan_is_not_clean() {
        let outcome = ScanOutcome {
            evaluations: Vec::new(),
            skipped: 3,
        };
        let report = Report::build(outcome.verdicts());

        assert!(matches!(finish(outcome, &report), Err(FixityError::Cancelled)));
    }

    #[test]
    fn test_complete_scan_reports_violations() {
        let outcome = ScanOutcome::default();
        let report = Report::build(outcome.verdicts());

        assert_eq!(finish(outcome, &report).unwrap(), 0);
    }
}
