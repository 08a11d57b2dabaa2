//! Resman: course resource manifests
//!
//! Scans a filière/semestre/matière tree of PDFs into a canonical manifest,
//! sanitizes names on disk, derives web and remote-URL manifest flavors, and
//! verifies that every entry exists locally and is served remotely.

pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod logging;
pub mod manifest;
pub mod remote;
pub mod service;
pub mod tree;
pub mod verify;
