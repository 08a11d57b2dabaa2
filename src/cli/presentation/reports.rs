//! Report formatters, one per command.

use super::shared::{format_section_heading, format_status_line, push_defects, to_json};
use crate::error::ApiError;
use crate::service::{ExportReport, FixPathsReport, GenerateReport, InspectReport, ResolveReport};
use crate::tree::rewriter::{RewritePlan, RewriteReport, RewriteStatus};
use crate::verify::{LocalReport, RemoteReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

pub fn format_generate_report(report: &GenerateReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(report);
    }
    let mut out = format!("{}\n\n", format_section_heading("Generate"));
    out.push_str(&format!(
        "{}\n",
        format_status_line(
            report.ok,
            "manifest generated",
            "manifest generated, some entries were left out"
        )
    ));
    out.push_str(&format!(
        "  Filières: {}\n  Semestres: {}\n  Matières: {}\n  Documents: {}\n  Manifest: {}\n",
        report.counts.filieres,
        report.counts.semestres,
        report.counts.matieres,
        report.counts.documents,
        report.manifest_path.display()
    ));
    push_defects(&mut out, "Skipped entries", &report.defects);
    Ok(out)
}

fn rename_table<'a>(rows: impl Iterator<Item = (String, String, String)> + 'a) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Kind", "From", "To"]);
    for (kind, from, to) in rows {
        table.add_row(vec![kind, from, to]);
    }
    table.to_string()
}

pub fn format_rewrite_plan(plan: &RewritePlan, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(plan);
    }
    let mut out = format!("{}\n\n", format_section_heading("Sanitize plan (dry run)"));
    out.push_str(&format!(
        "{}\n",
        format_status_line(
            plan.conflicts.is_empty(),
            "plan is applicable",
            "plan has name collisions and cannot be applied"
        )
    ));
    out.push_str(&format!(
        "  Renames: {}\n  Already canonical: {}\n",
        plan.ops.len(),
        plan.unchanged
    ));
    if !plan.ops.is_empty() {
        out.push('\n');
        out.push_str(&rename_table(plan.ops.iter().map(|op| {
            (
                format!("{:?}", op.kind).to_lowercase(),
                op.from.display().to_string(),
                op.to.display().to_string(),
            )
        })));
        out.push('\n');
    }
    push_defects(&mut out, "Conflicts", &plan.conflicts);
    Ok(out)
}

pub fn format_rewrite_report(report: &RewriteReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(report);
    }
    let mut out = format!("{}\n\n", format_section_heading("Sanitize"));
    let failure = match report.status {
        RewriteStatus::Conflicted => "name collisions, nothing was renamed",
        RewriteStatus::Aborted => "a rename failed; restore from the backup",
        RewriteStatus::Completed => "renamed, but the manifest was not saved",
    };
    out.push_str(&format!(
        "{}\n",
        format_status_line(report.ok, "tree sanitized", failure)
    ));
    out.push_str(&format!(
        "  Planned: {}\n  Renamed: {}\n  Already canonical: {}\n  Not attempted: {}\n",
        report.planned,
        report.renamed,
        report.unchanged,
        report.pending.len()
    ));
    if let Some(backup) = &report.backup {
        out.push_str(&format!(
            "  Backup: {} ({} files, blake3 {})\n",
            backup.path.display(),
            backup.files,
            backup.digest
        ));
    }
    if let Some(path) = &report.manifest_path {
        out.push_str(&format!("  Manifest: {}\n", path.display()));
    }
    push_defects(&mut out, "Defects", &report.defects);
    Ok(out)
}

pub fn format_resolve_report(report: &ResolveReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(report);
    }
    let mut out = format!("{}\n\n", format_section_heading("Resolve URLs"));
    out.push_str(&format!(
        "{}\n",
        format_status_line(
            report.ok,
            "remote manifest written",
            "remote manifest written from a manifest with structural defects"
        )
    ));
    out.push_str(&format!(
        "  Strategy: {}\n  Documents: {}\n  Manifest: {}\n",
        report.strategy,
        report.documents,
        report.manifest_path.display()
    ));
    push_defects(&mut out, "Structural defects", &report.defects);
    Ok(out)
}

pub fn format_local_report(report: &LocalReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(report);
    }
    let mut out = format!("{}\n\n", format_section_heading("Local verification"));
    out.push_str(&format!(
        "{}\n",
        format_status_line(report.ok, "every entry exists", "defects found")
    ));
    push_local_counts(&mut out, report);
    push_defects(&mut out, "Missing", &report.missing);
    push_defects(&mut out, "Structural defects", &report.errors);
    Ok(out)
}

fn push_local_counts(out: &mut String, report: &LocalReport) {
    out.push_str(&format!(
        "  Subjects: {}\n  Folders missing: {}\n  Documents found: {}\n  Documents missing: {}\n",
        report.subjects, report.folders_missing, report.documents_found, report.documents_missing
    ));
}

pub fn format_remote_report(report: &RemoteReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(report);
    }
    let mut out = format!("{}\n\n", format_section_heading("Remote verification"));
    out.push_str(&format!(
        "{}\n",
        format_status_line(report.ok, "every URL serves real content", "defects found")
    ));
    out.push_str(&format!(
        "  URLs: {}\n  Accessible: {}\n  Failing: {}\n  Pointer stubs: {}\n  Cut by deadline: {}\n  Elapsed: {} ms\n",
        report.total,
        report.accessible,
        report.failing,
        report.pointers,
        report.timed_out,
        report.elapsed_ms
    ));
    push_defects(&mut out, "Without URL", &report.missing);
    push_defects(&mut out, "Errors", &report.errors);
    Ok(out)
}

pub fn format_fix_report(report: &FixPathsReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(report);
    }
    let title = if report.dry_run {
        "Fix paths (dry run)"
    } else {
        "Fix paths"
    };
    let mut out = format!("{}\n\n", format_section_heading(title));
    out.push_str(&format!(
        "{}\n",
        format_status_line(
            report.fix.ok,
            "manifest consistent after fixes",
            "defects remain after fixes"
        )
    ));
    out.push_str(&format!("  Fixed folders: {}\n", report.fix.fixes.len()));
    if let Some(path) = &report.manifest_path {
        out.push_str(&format!("  Saved: {}\n", path.display()));
    }
    if !report.fix.fixes.is_empty() {
        out.push('\n');
        out.push_str(&rename_table(report.fix.fixes.iter().map(|fix| {
            ("folder".to_string(), fix.from.clone(), fix.to.clone())
        })));
        out.push('\n');
    }
    out.push_str(&format!("\n{}\n\n", format_section_heading("Re-check")));
    push_local_counts(&mut out, &report.fix.recheck);
    push_defects(&mut out, "Missing", &report.fix.recheck.missing);
    push_defects(&mut out, "Structural defects", &report.fix.recheck.errors);
    Ok(out)
}

pub fn format_export_report(report: &ExportReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(report);
    }
    let mut out = format!("{}\n\n", format_section_heading("Export web manifest"));
    out.push_str(&format!(
        "{}\n",
        format_status_line(report.ok, "web manifest written", "export failed")
    ));
    out.push_str(&format!(
        "  Subjects: {}\n  Documents: {}\n  Manifest: {}\n",
        report.subjects,
        report.documents,
        report.manifest_path.display()
    ));
    Ok(out)
}

pub fn format_inspect_report(report: &InspectReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(report);
    }
    let mut out = format!("{}\n\n", format_section_heading("Inspect manifest"));
    out.push_str(&format!(
        "{}\n",
        format_status_line(report.ok, "no structural defects", "structural defects found")
    ));
    out.push_str(&format!(
        "  Flavor: {}\n  Root: {}\n  Subjects: {}\n  Documents: {}\n  Manifest: {}\n",
        report.flavor,
        report.root,
        report.counts.matieres,
        report.counts.documents,
        report.manifest_path.display()
    ));
    push_defects(&mut out, "Structural defects", &report.defects);
    Ok(out)
}
