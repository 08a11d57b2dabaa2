//! Shared presentation helpers: headings, status lines, defect tables.

use crate::error::{ApiError, Defect};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// One-line outcome, green on success and red otherwise.
pub fn format_status_line(ok: bool, success: &str, failure: &str) -> String {
    if ok {
        format!("{} {}", "OK".green().bold(), success)
    } else {
        format!("{} {}", "FAILED".red().bold(), failure)
    }
}

/// Defects as a table: kind, where, what, and a hint when one exists.
pub fn format_defect_table(defects: &[Defect]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Kind", "Location", "Problem", "Hint"]);
    for defect in defects {
        table.add_row(vec![
            defect.label().to_string(),
            defect_location(defect).to_string(),
            defect.to_string(),
            defect_hint(defect),
        ]);
    }
    table.to_string()
}

fn defect_location(defect: &Defect) -> &str {
    match defect {
        Defect::StructuralDefect { location, .. } => location,
        Defect::MissingResource { path, .. } => path,
        Defect::RenameFailure { from, .. } => from,
        Defect::RemoteUnreachable { document, .. } => document,
        Defect::IndirectionPointerDetected { document, .. } => document,
    }
}

fn defect_hint(defect: &Defect) -> String {
    match defect {
        Defect::StructuralDefect {
            suggested_fix: Some(fix),
            ..
        } => format!("use {}", fix),
        Defect::IndirectionPointerDetected { .. } => {
            "resolve with the download or media strategy".to_string()
        }
        Defect::RenameFailure { .. } => "restore from the backup".to_string(),
        _ => "-".to_string(),
    }
}

/// Append a titled defect section, or nothing when `defects` is empty.
pub fn push_defects(out: &mut String, title: &str, defects: &[Defect]) {
    if defects.is_empty() {
        return;
    }
    out.push_str(&format!("\n{} ({})\n\n", format_section_heading(title), defects.len()));
    out.push_str(&format_defect_table(defects));
    out.push('\n');
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::Runtime(format!("Failed to serialize report: {}", e)))
}
