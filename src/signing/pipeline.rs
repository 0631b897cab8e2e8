//! Ordered signing pipeline.
//!
//! Signatures are computed bottom-up: an enclosing signature covers the
//! already-signed code inside it, so inner code must be signed first. The
//! stages are typestates. Each one consumes the previous stage, which makes
//! the order plain libraries/binaries → entitled binaries → container the only
//! order that compiles.
//!
//! ```text
//! SigningRun<Prepared> ──sign_plain──▶ SigningRun<PlainSigned>
//!     ──sign_entitled──▶ SigningRun<EntitledSigned> ──sign_container──▶ SigningReport
//! ```
//!
//! The run owns the entitlements scratch directory, so it is removed when the
//! run completes, fails at any stage, or is dropped mid-flight.

use super::codesign::{CodeSigner, SignOptions};
use super::discover::{Artifact, discover_plain_artifacts, entitled_artifacts};
use super::entitlements::{Entitlements, EntitlementsFile};
use super::ownership::{Host, normalize_ownership};
use crate::config::{FrameworkLayout, SignConfig};
use crate::error::{PreconditionError, Result};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// One phase of the pipeline, in signing order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Libraries and executables without entitlements
    Plain,
    /// Interpreter executable and app wrapper, with entitlements
    Entitled,
    /// The framework directory itself
    Container,
}

impl Tier {
    /// `codesign` flags used for every artifact of this tier.
    pub fn options(self, config: &SignConfig, entitlements: &Path) -> SignOptions {
        let base = SignOptions {
            force: true,
            deep: true,
            verbose: config.verbose,
            timestamp: config.timestamp,
            ..Default::default()
        };
        match self {
            Tier::Plain => SignOptions {
                runtime_hardening: true,
                ..base
            },
            Tier::Entitled => SignOptions {
                runtime_hardening: true,
                ..base
            }
            .with_entitlements(entitlements),
            Tier::Container => base,
        }
    }
}

/// Entitlements written, nothing signed yet
#[derive(Debug)]
pub struct Prepared;

/// Tier 1 complete
#[derive(Debug)]
pub struct PlainSigned;

/// Tier 2 complete
#[derive(Debug)]
pub struct EntitledSigned;

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningReport {
    /// Artifacts signed in tier 1
    pub plain: Vec<PathBuf>,
    /// Artifacts signed in tier 2
    pub entitled: Vec<PathBuf>,
    /// The framework directory
    pub container: PathBuf,
}

impl SigningReport {
    /// Total number of signing calls made
    pub fn total(&self) -> usize {
        self.plain.len() + self.entitled.len() + 1
    }
}

/// A signing run at stage `S`.
#[derive(Debug)]
pub struct SigningRun<'a, C, S> {
    signer: &'a C,
    identity: &'a str,
    config: &'a SignConfig,
    entitlements: EntitlementsFile,
    plain: Vec<PathBuf>,
    entitled: Vec<PathBuf>,
    _stage: PhantomData<S>,
}

impl<'a, C: CodeSigner, S> SigningRun<'a, C, S> {
    fn advance<T>(self) -> SigningRun<'a, C, T> {
        SigningRun {
            signer: self.signer,
            identity: self.identity,
            config: self.config,
            entitlements: self.entitlements,
            plain: self.plain,
            entitled: self.entitled,
            _stage: PhantomData,
        }
    }

    async fn sign(&self, tier: Tier, artifact: &Artifact) -> Result<()> {
        log::debug!(
            "Signing {} ({:?}, {:?} tier)",
            artifact.path.display(),
            artifact.kind,
            tier
        );
        let options = tier.options(self.config, self.entitlements.path());
        self.signer
            .sign(self.identity, &artifact.path, &options)
            .await
    }
}

impl<'a, C: CodeSigner> SigningRun<'a, C, Prepared> {
    /// Acquire the scratch directory and write the interpreter entitlements.
    pub fn prepare(signer: &'a C, identity: &'a str, config: &'a SignConfig) -> Result<Self> {
        let entitlements = EntitlementsFile::create(&Entitlements::interpreter())?;
        Ok(Self {
            signer,
            identity,
            config,
            entitlements,
            plain: Vec::new(),
            entitled: Vec::new(),
            _stage: PhantomData,
        })
    }

    /// Tier 1: sign every plain artifact. All complete before tier 2 can start.
    pub async fn sign_plain(mut self, artifacts: &[Artifact]) -> Result<SigningRun<'a, C, PlainSigned>> {
        log::info!("Signing {} binaries and libraries", artifacts.len());
        for artifact in artifacts {
            self.sign(Tier::Plain, artifact).await?;
            self.plain.push(artifact.path.clone());
        }
        Ok(self.advance())
    }
}

impl<'a, C: CodeSigner> SigningRun<'a, C, PlainSigned> {
    /// Tier 2: sign the interpreter's app wrapper and executable with
    /// entitlements attached.
    ///
    /// Missing paths are left for the signing tool to reject.
    pub async fn sign_entitled(mut self) -> Result<SigningRun<'a, C, EntitledSigned>> {
        for artifact in entitled_artifacts(&self.config.layout) {
            log::info!(
                "Signing {} with entitlements from {}",
                artifact.path.display(),
                self.entitlements.path().display()
            );
            self.sign(Tier::Entitled, &artifact).await?;
            self.entitled.push(artifact.path);
        }
        Ok(self.advance())
    }
}

impl<'a, C: CodeSigner> SigningRun<'a, C, EntitledSigned> {
    /// Sign the framework directory. Ends the run and removes the scratch
    /// directory.
    pub async fn sign_container(self) -> Result<SigningReport> {
        let artifact = Artifact::container(self.config.layout.root().to_path_buf());
        log::info!("Signing {}", artifact.path.display());
        self.sign(Tier::Container, &artifact).await?;

        Ok(SigningReport {
            plain: self.plain,
            entitled: self.entitled,
            container: artifact.path,
        })
    }
}

/// Drives a complete signing run.
#[derive(Debug)]
pub struct Orchestrator<'a, C, H> {
    config: &'a SignConfig,
    signer: C,
    host: H,
}

impl<'a, C: CodeSigner, H: Host> Orchestrator<'a, C, H> {
    /// Create an orchestrator over `config`.
    pub fn new(config: &'a SignConfig, signer: C, host: H) -> Self {
        Self {
            config,
            signer,
            host,
        }
    }

    /// The signer in use
    pub fn signer(&self) -> &C {
        &self.signer
    }

    /// The host in use
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Check privilege and identity. Touches nothing.
    pub fn preflight(&self) -> Result<&'a str> {
        let euid = self.host.effective_uid();
        if euid != 0 {
            return Err(PreconditionError::NotPrivileged { euid }.into());
        }

        match self.config.identity.as_deref() {
            Some(identity) if !identity.trim().is_empty() => Ok(identity),
            _ => Err(PreconditionError::MissingIdentity.into()),
        }
    }

    /// Run every stage in order, stopping at the first failure.
    pub async fn run(&self) -> Result<SigningReport> {
        let identity = self.preflight()?;
        let layout: &FrameworkLayout = &self.config.layout;

        normalize_ownership(layout.root(), self.config.ownership, &self.host)?;

        let run = SigningRun::prepare(&self.signer, identity, self.config)?;
        let artifacts = discover_plain_artifacts(layout)?;

        let report = run
            .sign_plain(&artifacts)
            .await?
            .sign_entitled()
            .await?
            .sign_container()
            .await?;

        log::info!("Signed {} artifacts", report.total());
        Ok(report)
    }
}
