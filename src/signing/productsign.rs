//! Installer package signing with `productsign`.
//!
//! `productsign` cannot sign in place: it writes `<pkg>-signed` next to the
//! input, which then replaces the input package.

use super::codesign::run_tool;
use crate::error::{ErrorExt, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The platform `productsign` tool.
#[derive(Debug, Clone)]
pub struct Productsign {
    program: PathBuf,
}

impl Productsign {
    /// Use the tool at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Sign `package` with `identity`, replacing it with the signed copy.
    pub async fn sign_package(&self, identity: &str, package: &Path, verbose: bool) -> Result<()> {
        let signed = signed_copy_path(package);
        log::info!("Signing package {}", package.display());

        let args: Vec<OsString> = vec![
            "--sign".into(),
            identity.into(),
            package.into(),
            signed.clone().into(),
        ];
        run_tool(&self.program, &args, package, verbose).await?;

        log::info!("Moving {} to {}", signed.display(), package.display());
        tokio::fs::rename(&signed, package)
            .await
            .fs_context("replacing package with signed copy", package)?;
        Ok(())
    }
}

/// `<pkg>-signed`
pub fn signed_copy_path(package: &Path) -> PathBuf {
    let mut name = package.as_os_str().to_os_string();
    name.push("-signed");
    PathBuf::from(name)
}
