use super::Context;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use fixity_lib::util::format::{abbreviate_digest, format_bytes, format_timestamp};
use fixity_lib::Result;
use std::path::PathBuf;

pub fn handle_list_command(ctx: &Context) -> Result<usize> {
    let store = ctx.monitor.load()?;

    if store.is_empty() {
        println!("{}", style("No files are being monitored").yellow());
        return Ok(0);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Path").fg(Color::Cyan),
        Cell::new("Algorithm").fg(Color::Cyan),
        Cell::new("Digest").fg(Color::Cyan),
        Cell::new("Size").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Last Check").fg(Color::Cyan),
    ]);

    for record in store.all() {
        let digest = if ctx.verbose {
            record.digest.clone()
        } else {
            abbreviate_digest(&record.digest)
        };
        table.add_row(vec![
            Cell::new(record.path.display()),
            Cell::new(record.algorithm.as_str()),
            Cell::new(digest),
            Cell::new(format_bytes(record.size)),
            Cell::new(record.status.as_str()),
            Cell::new(format_timestamp(&record.last_checked_at)),
        ]);
    }

    println!("{}", table);
    println!("  {} tracked files in {}", store.len(), ctx.monitor.snapshot().path().display());

    Ok(0)
}

pub fn handle_remove_command(ctx: &Context, path: PathBuf) -> Result<usize> {
    let record = ctx.monitor.remove(&path)?;

    if !ctx.quiet {
        println!(
            "{} Stopped monitoring {}",
            style("✓").green(),
            record.path.display()
        );
    }

    Ok(0)
}
