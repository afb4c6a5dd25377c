// vcr-cleaner/src/lib.rs
//! # vcr-cleaner CLI Application
//!
//! A command-line host for the `vcr-cleaner-core` engine: sanitizes recorded
//! exchanges and reports relaxed-match verdicts, driven by a policy file.

pub mod cli;
pub mod commands;
pub mod logger;
