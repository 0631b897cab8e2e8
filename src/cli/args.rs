//! Command line argument parsing.
//!
//! The identity is optional at the parser level so that a missing identity is
//! reported as a precondition failure (exit 1) rather than a usage error.

use crate::config::{
    DEFAULT_CODESIGN, DEFAULT_FRAMEWORK_ROOT, DEFAULT_PRODUCTSIGN, FrameworkLayout, Ownership,
    SignConfig,
};
use clap::Parser;
use std::path::PathBuf;

/// Sign an embedded Python.framework for distribution
#[derive(Parser, Debug, Clone)]
#[command(
    name = "framework_codesign",
    version,
    about = "Sign an embedded Python.framework for distribution",
    long_about = "Sets root:admin ownership across the framework, then signs its libraries and
executables, the entitled interpreter, and finally the framework itself.

Must be run as root.

Usage:
  framework_codesign --sign-binaries 'Developer ID Application: Example (ABCDE12345)'
  framework_codesign -S 'Developer ID Application: Example (ABCDE12345)' --verbose"
)]
pub struct Args {
    /// A Developer ID Application certificate from the keychain, by common name
    #[arg(
        short = 'S',
        long = "sign-binaries",
        value_name = "IDENTITY",
        env = "FRAMEWORK_CODESIGN_IDENTITY"
    )]
    pub sign_binaries: Option<String>,

    /// Be more verbose
    #[arg(short, long)]
    pub verbose: bool,

    /// Framework bundle to sign
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_FRAMEWORK_ROOT,
        env = "FRAMEWORK_CODESIGN_ROOT"
    )]
    pub framework: PathBuf,

    /// Installer package to sign with productsign after the framework
    #[arg(long, value_name = "PKG")]
    pub sign_package: Option<PathBuf>,

    /// Path to codesign
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CODESIGN)]
    pub codesign: PathBuf,

    /// Path to productsign
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PRODUCTSIGN)]
    pub productsign: PathBuf,

    /// Do not request secure timestamps (offline testing only; breaks notarization)
    #[arg(long)]
    pub no_timestamp: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl From<&Args> for SignConfig {
    fn from(args: &Args) -> Self {
        Self {
            identity: args.sign_binaries.clone(),
            verbose: args.verbose,
            layout: FrameworkLayout::new(args.framework.clone()),
            ownership: Ownership::default(),
            codesign: args.codesign.clone(),
            productsign: args.productsign.clone(),
            timestamp: !args.no_timestamp,
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
    sign: SignConfig,
    package: Option<PathBuf>,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose),
            sign: SignConfig::from(args),
            package: args.sign_package.clone(),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Signing configuration
    pub fn sign(&self) -> &SignConfig {
        &self.sign
    }

    /// Package to productsign, if requested
    pub fn package(&self) -> Option<&PathBuf> {
        self.package.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags_and_defaults() {
        let args =
            Args::try_parse_from(["framework_codesign", "-S", "Test Identity", "-v"]).unwrap();
        let config = SignConfig::from(&args);
        assert_eq!(config.identity.as_deref(), Some("Test Identity"));
        assert!(config.verbose);
        assert!(config.timestamp);
        assert_eq!(config.codesign, PathBuf::from(DEFAULT_CODESIGN));
        assert_eq!(config.productsign, PathBuf::from(DEFAULT_PRODUCTSIGN));
        assert_eq!(config.ownership, Ownership::default());
    }

    #[test]
    fn test_long_flags() {
        let args = Args::try_parse_from([
            "framework_codesign",
            "--sign-binaries",
            "Test Identity",
            "--verbose",
            "--framework",
            "/tmp/Python.framework",
            "--sign-package",
            "/tmp/Crypt.pkg",
            "--no-timestamp",
        ])
        .unwrap();
        let runtime = RuntimeConfig::from(&args);
        assert!(runtime.sign().verbose);
        assert!(!runtime.sign().timestamp);
        assert_eq!(
            runtime.sign().layout.root(),
            PathBuf::from("/tmp/Python.framework")
        );
        assert_eq!(runtime.package(), Some(&PathBuf::from("/tmp/Crypt.pkg")));
    }
}
