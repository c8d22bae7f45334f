// Rust guideline compliant 2026-10-18

//! Adapters (secondary ports) for the `txn_doctor` binary.
//!
//! Each sub-module implements one hexagonal port trait defined in the
//! `domain` crate.

pub mod json_source;
pub mod sql_files;
