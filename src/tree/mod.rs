//! Resource tree on disk
//!
//! Name sanitization, scanning into a manifest, and the two-phase rewriter
//! that renames folders and documents after taking a backup.

pub mod backup;
pub mod hasher;
pub mod path;
pub mod rewriter;
pub mod sanitize;
pub mod walker;
