//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to the catalog service.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, is_mutating};
pub use output::{map_error, CommandOutput};
pub use parse::{Cli, Commands};
pub use presentation::{
    format_defect_table, format_export_report, format_fix_report, format_generate_report,
    format_inspect_report, format_local_report, format_remote_report, format_resolve_report, format_rewrite_plan,
    format_rewrite_report, format_section_heading,
};
pub use route::RunContext;
