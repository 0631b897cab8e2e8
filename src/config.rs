//! Run configuration.
//!
//! Everything a signing run needs is carried in [`SignConfig`] and passed
//! explicitly; there is no process-wide state.

use std::path::{Path, PathBuf};

/// Default location of the embedded interpreter framework
pub const DEFAULT_FRAMEWORK_ROOT: &str = "/Library/Crypt/Python.framework";

/// Default platform code-signing tool
pub const DEFAULT_CODESIGN: &str = "/usr/bin/codesign";

/// Default platform product-signing tool
pub const DEFAULT_PRODUCTSIGN: &str = "/usr/bin/productsign";

/// uid of `root`
pub const ROOT_UID: u32 = 0;

/// gid of the `admin` group on macOS
pub const ADMIN_GID: u32 = 80;

/// Directory layout of a versioned framework bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkLayout {
    root: PathBuf,
}

impl FrameworkLayout {
    /// Subpath of the active version inside the framework
    pub const CURRENT_VERSION: &'static str = "Versions/Current";

    /// Create a layout rooted at `root` (the `.framework` directory).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The framework directory itself; signed last as the container.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `Versions/Current` under the root
    pub fn current(&self) -> PathBuf {
        self.root.join(Self::CURRENT_VERSION)
    }

    /// Native library tree
    pub fn lib_dir(&self) -> PathBuf {
        self.current().join("lib")
    }

    /// Executable directory
    pub fn bin_dir(&self) -> PathBuf {
        self.current().join("bin")
    }

    /// Directories scanned for plain (non-entitled) artifacts, in scan order.
    pub fn artifact_dirs(&self) -> [PathBuf; 2] {
        [self.lib_dir(), self.bin_dir()]
    }

    /// The interpreter's application wrapper
    pub fn app_wrapper(&self) -> PathBuf {
        self.current().join("Resources/Python.app")
    }

    /// The interpreter's primary executable
    pub fn interpreter(&self) -> PathBuf {
        self.bin_dir().join("python3")
    }
}

impl Default for FrameworkLayout {
    fn default() -> Self {
        Self::new(DEFAULT_FRAMEWORK_ROOT)
    }
}

/// Owner and group applied to every entry of the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    /// Owning user id
    pub uid: u32,
    /// Owning group id
    pub gid: u32,
}

impl Default for Ownership {
    /// `root:admin`
    fn default() -> Self {
        Self {
            uid: ROOT_UID,
            gid: ADMIN_GID,
        }
    }
}

/// Configuration for one signing run
#[derive(Debug, Clone)]
pub struct SignConfig {
    /// Certificate common name; `None` fails preflight
    pub identity: Option<String>,
    /// Echo commands and tool output
    pub verbose: bool,
    /// Bundle being signed
    pub layout: FrameworkLayout,
    /// Ownership applied before signing
    pub ownership: Ownership,
    /// Path to `codesign`
    pub codesign: PathBuf,
    /// Path to `productsign`
    pub productsign: PathBuf,
    /// Request a secure timestamp with every signature
    pub timestamp: bool,
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            identity: None,
            verbose: false,
            layout: FrameworkLayout::default(),
            ownership: Ownership::default(),
            codesign: PathBuf::from(DEFAULT_CODESIGN),
            productsign: PathBuf::from(DEFAULT_PRODUCTSIGN),
            timestamp: true,
        }
    }
}
