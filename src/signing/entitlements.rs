//! Entitlements for the embedded interpreter.
//!
//! The entitlements plist lives in a scratch directory owned by one signing
//! run. The directory is removed when [`ScratchDir`] is dropped, which covers
//! normal completion, early return on error, and the run future being dropped
//! on interruption.

use crate::error::{ErrorExt, Result};
use plist::{Dictionary, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name of the serialized entitlements inside the scratch directory
pub const ENTITLEMENTS_FILE_NAME: &str = "entitlements.plist";

/// Capabilities the interpreter needs under the hardened runtime.
///
/// JIT and unsigned executable memory for ctypes/cffi, dyld environment
/// variables for `DYLD_*` overrides, and disabled library validation so
/// third-party extension modules signed by other teams can be loaded.
pub const INTERPRETER_ENTITLEMENTS: &[&str] = &[
    "com.apple.security.cs.allow-unsigned-executable-memory",
    "com.apple.security.cs.allow-jit",
    "com.apple.security.cs.allow-dyld-environment-variables",
    "com.apple.security.cs.disable-library-validation",
];

/// Capability name to boolean mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Entitlements {
    entries: Dictionary,
}

impl Entitlements {
    /// Entitlements attached to the interpreter executable and its app wrapper
    pub fn interpreter() -> Self {
        let mut entries = Dictionary::new();
        for key in INTERPRETER_ENTITLEMENTS {
            entries.insert((*key).into(), true.into());
        }
        Self { entries }
    }

    /// Value of a capability, `None` if absent
    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.get(key).and_then(Value::as_boolean)
    }

    /// Number of capabilities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no capability is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as an XML property list.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        Value::Dictionary(self.entries.clone()).to_file_xml(path)?;
        Ok(())
    }
}

/// Process-scoped scratch directory, removed exactly once.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh directory under the system temp dir.
    pub fn new() -> Result<Self> {
        let tmp = std::env::temp_dir();
        let dir = tempfile::Builder::new()
            .prefix("framework-codesign-")
            .tempdir_in(&tmp)
            .fs_context("creating scratch directory in", &tmp)?;
        let path = dir.path().to_path_buf();
        log::debug!("Created scratch directory {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Location of the directory (valid until cleanup)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now. Later calls, and the drop, are no-ops.
    ///
    /// Removal errors are swallowed: another actor may already have deleted
    /// the directory.
    pub fn cleanup(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        log::info!("Cleaning up {}", self.path.display());
        if let Err(e) = dir.close() {
            log::debug!(
                "Ignoring cleanup error for {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Entitlements serialized into their own scratch directory.
#[derive(Debug)]
pub struct EntitlementsFile {
    scratch: ScratchDir,
    path: PathBuf,
}

impl EntitlementsFile {
    /// Acquire a scratch directory and write `entitlements` into it.
    pub fn create(entitlements: &Entitlements) -> Result<Self> {
        let scratch = ScratchDir::new()?;
        let path = scratch.path().join(ENTITLEMENTS_FILE_NAME);
        entitlements.write_to(&path)?;
        log::debug!("Wrote entitlements to {}", path.display());
        Ok(Self { scratch, path })
    }

    /// Path handed to `codesign --entitlements`
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The containing scratch directory
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}
