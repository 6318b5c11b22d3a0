//! Tooling & Integration Layer
//!
//! The `marksync` command line: export, plan and import, plus text formatting
//! of reconciliation reports.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
