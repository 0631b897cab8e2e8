//! Command execution.
//!
//! There is a single command: sign the framework, then optionally the
//! installer package.

mod sign;

use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;

pub use sign::execute_sign;

/// Execute the command for parsed arguments and return the exit code.
pub async fn execute_command(args: Args) -> Result<i32> {
    let config = RuntimeConfig::from(&args);

    match execute_sign(&config).await {
        Ok(()) => Ok(0),
        Err(e) => {
            config.output().error(&format!("Signing failed: {}", e));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                config.output().indent("");
                config.output().indent("💡 Recovery suggestions:");
                for suggestion in suggestions {
                    config.output().indent(&format!("  • {}", suggestion));
                }
            }

            Ok(e.exit_code())
        }
    }
}
