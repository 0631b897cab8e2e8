//! `codesign` invocation.
//!
//! One call signs one artifact. A non-zero exit is returned as
//! [`SignError::ToolFailed`] carrying the tool's stderr verbatim; callers
//! abort the run on it.

use crate::error::{Result, SignError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Flags for a single signing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Replace an existing signature
    pub force: bool,
    /// Sign nested code too
    pub deep: bool,
    /// Opt into the hardened runtime (`--options runtime`)
    pub runtime_hardening: bool,
    /// Entitlements plist to embed
    pub entitlements: Option<PathBuf>,
    /// Ask the tool for diagnostic output
    pub verbose: bool,
    /// Request a secure timestamp
    pub timestamp: bool,
}

impl SignOptions {
    /// Attach an entitlements file.
    pub fn with_entitlements(mut self, path: impl Into<PathBuf>) -> Self {
        self.entitlements = Some(path.into());
        self
    }

    /// Assemble the `codesign` argument list for `target`.
    pub fn to_args(&self, identity: &str, target: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if self.timestamp {
            args.push("--timestamp".into());
        }
        args.push("--sign".into());
        args.push(identity.into());
        if self.force {
            args.push("--force".into());
        }
        if self.deep {
            args.push("--deep".into());
        }
        if self.verbose {
            args.push("--verbose".into());
        }
        if let Some(entitlements) = &self.entitlements {
            args.push("--entitlements".into());
            args.push(entitlements.into());
        }
        if self.runtime_hardening {
            args.push("--options".into());
            args.push("runtime".into());
        }
        args.push(target.into());
        args
    }
}

/// Signs one artifact at a time.
#[allow(async_fn_in_trait)]
pub trait CodeSigner {
    /// Sign `target` with `identity`. Any error aborts the run.
    async fn sign(&self, identity: &str, target: &Path, options: &SignOptions) -> Result<()>;
}

/// The platform `codesign` tool.
#[derive(Debug, Clone)]
pub struct Codesign {
    program: PathBuf,
}

impl Codesign {
    /// Use the tool at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CodeSigner for Codesign {
    async fn sign(&self, identity: &str, target: &Path, options: &SignOptions) -> Result<()> {
        let args = options.to_args(identity, target);
        run_tool(&self.program, &args, target, options.verbose).await
    }
}

/// Run a signing tool to completion and classify the outcome.
///
/// The child is killed if this future is dropped.
pub(crate) async fn run_tool(
    program: &Path,
    args: &[OsString],
    target: &Path,
    verbose: bool,
) -> Result<()> {
    let command_line = format!("{} {:?}", program.display(), args);
    log::debug!("Running command {}", command_line);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|error| SignError::CommandFailed {
            command: command_line.clone(),
            error,
        })?;

    if verbose {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim_end();
        if !stdout.is_empty() {
            log::info!("{}", stdout);
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        return Err(SignError::ToolFailed {
            tool: tool_name(program),
            path: target.to_path_buf(),
            status: output.status.code(),
            stderr,
        });
    }

    if verbose {
        // codesign reports to stderr even on success
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim_end();
        if !stderr.is_empty() {
            log::info!("{}", stderr);
        }
    }

    Ok(())
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}
