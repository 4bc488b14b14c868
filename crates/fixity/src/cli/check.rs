use super::Context;
use console::style;
use fixity_lib::{Result, Status, Verdict};
use std::path::PathBuf;

pub fn handle_check_command(ctx: &Context, path: PathBuf) -> Result<usize> {
    let verdict = ctx.monitor.check(&path)?;

    if !ctx.quiet || verdict.is_violation() {
        print_verdict(&verdict);
    }

    Ok(usize::from(verdict.is_violation()))
}

pub fn status_symbol(status: Status) -> console::StyledObject<&'static str> {
    match status {
        Status::New => style("+").cyan(),
        Status::Unchanged => style("✓").green(),
        Status::Modified => style("✗").red(),
        Status::Missing => style("?").yellow(),
        Status::Error => style("!").red(),
    }
}

fn print_verdict(verdict: &Verdict) {
    println!("File: {}", verdict.path.display());
    println!(
        "Status: {} {}",
        status_symbol(verdict.new_status),
        style(verdict.new_status.as_str()).bold()
    );
    println!("Message: {}", verdict.message());

    if verdict.new_status == Status::Modified {
        println!("Algorithm: {}", verdict.algorithm);
        println!("Original hash: {}", verdict.previous_digest);
        if let Some(current) = &verdict.current_digest {
            println!("Current hash:  {}", current);
        }
        if let Some(delta) = verdict.size_delta {
            println!("Size change:   {}", fixity_lib::util::format::format_size_delta(delta));
        }
    }
}
