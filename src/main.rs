//! Framework Codesign - signs an embedded Python.framework in dependency order.
//!
//! Signing is strictly sequential, so a current-thread runtime is enough.

use framework_codesign::cli;
use framework_codesign::cli::OutputManager;
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            let output = OutputManager::new(false);
            output.error(&format!("Fatal error: {e}"));
            process::exit(e.exit_code());
        }
    }
}
