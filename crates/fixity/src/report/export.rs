use super::Report;
use crate::error::{FixityError, Result};
use crate::store::Status;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// Standalone HTML page.
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = FixityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" | "structured" => Ok(ExportFormat::Json),
            "html" | "hypertext" => Ok(ExportFormat::Html),
            _ => Err(FixityError::UnsupportedFormat(s.to_string())),
        }
    }
}

pub fn render(report: &Report, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => {
            let mut json = serde_json::to_string_pretty(report)?;
            json.push('\n');
            Ok(json)
        }
        ExportFormat::Html => Ok(render_html(report)),
    }
}

/// `integrity_report_<YYYYmmdd_HHMMSS>.<ext>`
pub fn default_file_name(format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "integrity_report_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Renders `report` and writes it to `output`, or to an auto-named file in
/// `dir` when no output path is given. Returns the path written.
pub fn write_report(
    report: &Report,
    format: ExportFormat,
    output: Option<&Path>,
    dir: Option<&Path>,
) -> Result<PathBuf> {
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let name = default_file_name(format, report.generated_at);
            dir.map(|d| d.join(&name)).unwrap_or_else(|| PathBuf::from(name))
        }
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(&path, render(report, format)?)?;
    log::info!("Report exported to: {}", path.display());
    Ok(path)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn status_class(status: Status) -> &'static str {
    match status {
        Status::New => "new",
        Status::Unchanged => "ok",
        Status::Modified | Status::Error => "bad",
        Status::Missing => "warn",
    }
}

const STYLE: &str = "body{font-family:sans-serif;background:#f3f4f6;margin:0;padding:2rem}\
h1{text-align:center}\
.cards{display:flex;gap:1rem;justify-content:center;margin-bottom:2rem}\
.card{background:#fff;border-radius:8px;padding:1rem 1.5rem;text-align:center;box-shadow:0 1px 3px #0002}\
.card .n{font-size:1.6rem;font-weight:bold}\
table{width:100%;border-collapse:collapse;background:#fff}\
th,td{padding:.5rem 1rem;text-align:left;border-bottom:1px solid #e5e7eb;font-size:.9rem}\
td.digest{font-family:monospace;font-size:.75rem}\
.ok{color:#059669}.bad{color:#dc2626}.warn{color:#d97706}.new{color:#2563eb}\
footer{margin-top:2rem;text-align:center;color:#6b7280;font-size:.8rem}";

fn render_html(report: &Report) -> String {
    let counts = &report.counts;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str("<title>File Integrity Report</title>\n");
    let _ = writeln!(html, "<style>{}</style>", STYLE);
    html.push_str("</head>\n<body>\n<h1>File Integrity Report</h1>\n<div class=\"cards\">\n");

    for (label, value, class) in [
        ("Total Files", counts.total, ""),
        ("New", counts.new, "new"),
        ("Unchanged", counts.unchanged, "ok"),
        ("Modified", counts.modified, "bad"),
        ("Missing", counts.missing, "warn"),
        ("Errors", counts.error, "bad"),
    ] {
        let _ = writeln!(
            html,
            "<div class=\"card\"><div class=\"n {}\">{}</div><div>{}</div></div>",
            class, value, label
        );
    }

    html.push_str("</div>\n<table>\n<thead><tr><th>File Path</th><th>Status</th><th>Message</th>");
    html.push_str("<th>Stored Digest</th><th>Current Digest</th></tr></thead>\n<tbody>\n");

    for entry in &report.entries {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td class=\"digest\">{}</td><td class=\"digest\">{}</td></tr>",
            escape_html(&entry.path.to_string_lossy()),
            status_class(entry.new_status),
            entry.new_status.as_str().to_uppercase(),
            escape_html(&entry.message()),
            escape_html(&entry.previous_digest),
            escape_html(entry.current_digest.as_deref().unwrap_or("-")),
        );
    }

    html.push_str("</tbody>\n</table>\n");
    let _ = writeln!(
        html,
        "<footer>Generated on {}</footer>",
        report.generated_at.to_rfc3339()
    );
    html.push_str("</body>\n</html>\n");
    html
}
