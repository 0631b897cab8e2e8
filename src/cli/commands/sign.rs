//! The signing command.

use crate::cli::RuntimeConfig;
use crate::cli::shutdown::interruptible;
use crate::error::Result;
use crate::signing::{
    CodeSigner, Codesign, Host, Orchestrator, Productsign, SigningReport, SystemHost,
};

/// Sign the framework, then the package if one was requested.
///
/// SIGINT/SIGTERM abort either step; the scratch directory is still removed
/// and the running tool is killed.
pub async fn execute_sign(config: &RuntimeConfig) -> Result<()> {
    let sign = config.sign();
    let output = config.output();

    output.section("Signing framework");
    output.verbose(&format!("Framework: {}", sign.layout.root().display()));
    output.verbose(&format!("Tool: {}", sign.codesign.display()));

    let orchestrator = Orchestrator::new(sign, Codesign::new(&sign.codesign), SystemHost);
    interruptible(sign_all(config, &orchestrator)).await
}

async fn sign_all<C: CodeSigner, H: Host>(
    config: &RuntimeConfig,
    orchestrator: &Orchestrator<'_, C, H>,
) -> Result<()> {
    let sign = config.sign();
    let output = config.output();

    output.progress("Signing binaries (this may take a while)...");
    let report = orchestrator.run().await?;
    print_report(config, &report);

    if let Some(package) = config.package() {
        // run() has already rejected a missing identity
        let identity = sign.identity.as_deref().unwrap_or_default();
        output.progress(&format!("Signing package {}...", package.display()));
        Productsign::new(&sign.productsign)
            .sign_package(identity, package, sign.verbose)
            .await?;
        output.success(&format!("Signed {}", package.display()));
    }

    Ok(())
}

fn print_report(config: &RuntimeConfig, report: &SigningReport) {
    let output = config.output();
    for path in &report.plain {
        output.verbose(&format!("signed {}", path.display()));
    }
    for path in &report.entitled {
        output.verbose(&format!("signed {} (entitlements)", path.display()));
    }
    output.success(&format!(
        "Signed {} binaries and libraries, {} entitled, and {}",
        report.plain.len(),
        report.entitled.len(),
        report.container.display()
    ));
}
