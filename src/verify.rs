//! Manifest verification against the local tree and the remote host
//!
//! Both checks run to completion and return a full inventory of defects.

pub mod local;
pub mod remote;

pub use local::{check_local, fix_paths, FixReport, LocalReport};
pub use remote::{check_remote, RemoteCheckOptions, RemoteReport};
