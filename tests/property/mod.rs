//! Property-based tests for naming, path and persistence invariants
