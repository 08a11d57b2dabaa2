//! CLI presentation: text and json formatters per command family.

mod reports;
mod shared;

pub use reports::{
    format_export_report, format_fix_report, format_generate_report, format_inspect_report,
    format_local_report, format_remote_report, format_resolve_report, format_rewrite_plan, format_rewrite_report,
};
pub use shared::{format_defect_table, format_section_heading};
