use super::Context;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use fixity_lib::index::scanner::ProgressCallback;
use fixity_lib::report::write_report;
use fixity_lib::util::format::format_timestamp;
use fixity_lib::util::progress::create_spinner;
use fixity_lib::{Report, Result, ScanOptions};

pub fn handle_report_command(ctx: &Context, refresh: bool) -> Result<usize> {
    let report = if refresh {
        refreshed(ctx)?
    } else {
        ctx.monitor.report()?
    };

    if !ctx.quiet {
        print_report(&report);
    }

    if let Some(format) = ctx.options.export_format {
        let path = write_report(
            &report,
            format,
            ctx.options.output_path.as_deref(),
            ctx.config.settings.report_dir.as_deref(),
        )?;
        if !ctx.quiet {
            println!("{} Report exported to: {}", style("✓").green(), path.display());
        }
    }

    Ok(report.counts.violations())
}

fn refreshed(ctx: &Context) -> Result<Report> {
    let options = ScanOptions {
        cancel: Some(super::install_interrupt_handler()),
        ..Default::default()
    };

    let spinner = if !ctx.quiet && !ctx.verbose {
        Some(create_spinner("Re-checking tracked files"))
    } else {
        None
    };
    let on_verdict: ProgressCallback<'_> = &|verdict| {
        if let Some(spinner) = &spinner {
            spinner.set_message(format!("Checked {}", verdict.path.display()));
            spinner.tick();
        }
    };

    let report = ctx.monitor.refreshed_report(&options, Some(on_verdict));

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    report
}

fn print_report(report: &Report) {
    let counts = &report.counts;

    println!("\n{}", style("Integrity Report").bold().cyan());
    println!("{}", style("═".repeat(60)).dim());
    println!("Generated at: {}", format_timestamp(&report.generated_at));
    println!("Total files monitored: {}", style(counts.total).cyan());
    println!("New: {}", style(counts.new).cyan());
    println!("Unchanged: {}", style(counts.unchanged).green());
    println!("Modified: {}", style(counts.modified).red());
    println!("Missing: {}", style(counts.missing).yellow());
    println!("Errors: {}", style(counts.error).red());

    if !report.has_violations() {
        println!("\n{} No integrity violations", style("✓").green());
        return;
    }

    println!("\n{}", style("Violations").bold());
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Path").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Message").fg(Color::Cyan),
    ]);

    for verdict in report.violations() {
        table.add_row(vec![
            Cell::new(verdict.path.display()),
            Cell::new(verdict.new_status.as_str()).fg(Color::Red),
            Cell::new(verdict.message()),
        ]);
    }

    println!("{}", table);
}
