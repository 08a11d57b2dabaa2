//! CLI output: error mapping and the value a command hands back to the binary.

use crate::error::ApiError;
use crate::manifest::Flavor;

/// Rendered command result. `ok == false` means the report lists defects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub rendered: String,
    pub ok: bool,
}

impl CommandOutput {
    pub fn new(rendered: String, ok: bool) -> Self {
        Self { rendered, ok }
    }

    /// Exit status for this result: 0 clean, 2 defects reported.
    pub fn exit_code(&self) -> i32 {
        if self.ok {
            0
        } else {
            2
        }
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::LockHeld(root) => format!(
            "{} is busy: another resman operation holds its lock. Retry once it finishes.",
            root.display()
        ),
        ApiError::WrongFlavor {
            path,
            expected: Flavor::Remote,
            ..
        } => format!(
            "{} has no resolved URLs. Run `resman resolve-urls` first.",
            path.display()
        ),
        _ => e.to_string(),
    }
}
