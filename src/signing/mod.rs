//! Code signing of a versioned framework bundle.
//!
//! # Order
//!
//! | Stage | Artifacts | Flags |
//! |-------|-----------|-------|
//! | ownership | every entry under the root | `root:admin` |
//! | tier 1 | `lib/**/*.{so,dylib}`, executables in `lib/` and `bin/` | `--force --deep --options runtime` |
//! | tier 2 | `Resources/Python.app`, `bin/python3` | tier 1 + `--entitlements` |
//! | container | the `.framework` directory | `--force --deep` |
//!
//! All `codesign` calls also pass `--timestamp` unless disabled in
//! [`SignConfig`](crate::config::SignConfig).

pub mod classify;
pub mod codesign;
pub mod discover;
pub mod entitlements;
pub mod ownership;
pub mod pipeline;
pub mod productsign;

pub use classify::{
    ArtifactKind, classify, has_library_suffix, is_signable_binary, is_signable_library,
};
pub use codesign::{CodeSigner, Codesign, SignOptions};
pub use discover::{Artifact, discover_plain_artifacts, entitled_artifacts};
pub use entitlements::{Entitlements, EntitlementsFile, ScratchDir};
pub use ownership::{Host, SystemHost, normalize_ownership};
pub use pipeline::{Orchestrator, SigningReport, SigningRun, Tier};
pub use productsign::Productsign;
