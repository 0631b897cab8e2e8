//! Command line interface for framework_codesign.
//!
//! Parses arguments, builds the run configuration, and maps the outcome of a
//! signing run to a process exit code.

mod args;
pub mod commands;
mod output;
mod shutdown;

pub use args::{Args, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
