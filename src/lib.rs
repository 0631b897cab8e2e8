//! # Framework Codesign
//!
//! Signs an embedded `Python.framework` so that it passes Gatekeeper and
//! notarization.
//!
//! Code inside a bundle has to be signed before the code that encloses it,
//! and the interpreter needs a handful of hardened-runtime exceptions. This
//! crate normalizes ownership, signs libraries and executables, then the
//! entitled interpreter, then the framework itself, aborting on the first
//! failure.
//!
//! ## Usage
//!
//! ```bash
//! sudo framework_codesign --sign-binaries "Developer ID Application: Example (ABCDE12345)"
//! sudo framework_codesign -S "Developer ID Application: Example (ABCDE12345)" \
//!     --framework /Library/Crypt/Python.framework --sign-package build/Crypt.pkg -v
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod config;
pub mod error;
pub mod signing;

// Re-export main types for public API
pub use cli::Args;
pub use config::{FrameworkLayout, Ownership, SignConfig};
pub use error::{PreconditionError, Result, SignError};
pub use signing::{Codesign, Orchestrator, SigningReport, SystemHost};
