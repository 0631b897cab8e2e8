//! Discovery of the artifacts signed in each tier.
//!
//! For tier 1, each scanned directory contributes its top-level executables plus every
//! native library found by recursive descent. Executables nested deeper are
//! not collected.

use super::classify::{ArtifactKind, classify, has_library_suffix};
use crate::config::FrameworkLayout;
use crate::error::{ErrorExt, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file or directory that receives a signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Absolute path
    pub path: PathBuf,
    /// What the path holds
    pub kind: ArtifactKind,
    /// Signed with the entitlements attached
    pub entitled: bool,
}

impl Artifact {
    /// A plain artifact of an already classified `kind`.
    pub fn plain(path: PathBuf, kind: ArtifactKind) -> Self {
        Self {
            path,
            kind,
            entitled: false,
        }
    }

    /// An artifact signed with entitlements.
    pub fn entitled(path: PathBuf, kind: ArtifactKind) -> Self {
        Self {
            path,
            kind,
            entitled: true,
        }
    }

    /// The enclosing framework directory.
    pub fn container(path: PathBuf) -> Self {
        Self {
            path,
            kind: ArtifactKind::Container,
            entitled: false,
        }
    }
}

/// Collect the plain artifacts of `dir`, keyed by path.
///
/// Every entry is classified once. Executables count only at the top of
/// `dir`; deeper down only library-named files are kept.
fn scan_dir(dir: &Path, found: &mut BTreeMap<PathBuf, ArtifactKind>) -> Result<()> {
    // walkdir reports a missing root without saying what was being read
    std::fs::read_dir(dir).fs_context("reading directory", dir)?;

    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }

        let top_level = entry.depth() == 1;
        let kind = match classify(entry.path()) {
            Some(ArtifactKind::Binary) if top_level || has_library_suffix(entry.path()) => {
                ArtifactKind::Binary
            }
            Some(ArtifactKind::Binary) => {
                log::debug!("Skipping nested executable {}", entry.path().display());
                continue;
            }
            Some(kind) => kind,
            None => continue,
        };
        found.insert(entry.into_path(), kind);
    }

    Ok(())
}

/// Tier-1 artifacts of the framework: libraries and executables under
/// `lib/` and `bin/` of the current version.
///
/// Every path appears once, in sorted order. A missing directory is an
/// error; an empty one yields nothing.
pub fn discover_plain_artifacts(layout: &FrameworkLayout) -> Result<Vec<Artifact>> {
    let mut found = BTreeMap::new();
    for dir in layout.artifact_dirs() {
        log::debug!("Scanning {}", dir.display());
        scan_dir(&dir, &mut found)?;
    }

    Ok(found
        .into_iter()
        .map(|(path, kind)| Artifact::plain(path, kind))
        .collect())
}

/// Tier-2 artifacts in signing order: the app wrapper, then the interpreter.
pub fn entitled_artifacts(layout: &FrameworkLayout) -> [Artifact; 2] {
    [
        Artifact::entitled(layout.app_wrapper(), ArtifactKind::Container),
        Artifact::entitled(layout.interpreter(), ArtifactKind::Binary),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn touch(path: &Path, mode: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    fn framework() -> (tempfile::TempDir, FrameworkLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = FrameworkLayout::new(dir.path().join("Python.framework"));
        fs::create_dir_all(layout.lib_dir()).unwrap();
        fs::create_dir_all(layout.bin_dir()).unwrap();
        (dir, layout)
    }

    fn relative(layout: &FrameworkLayout, artifacts: &[Artifact]) -> Vec<String> {
        artifacts
            .iter()
            .map(|a| {
                a.path
                    .strip_prefix(layout.current())
                    .unwrap()
                    .display()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_top_level_binaries_and_nested_libraries() {
        let (_dir, layout) = framework();
        touch(&layout.bin_dir().join("python3.9"), 0o755);
        touch(&layout.bin_dir().join("idle3"), 0o644);
        touch(&layout.lib_dir().join("libpython3.9.dylib"), 0o644);
        touch(
            &layout
                .lib_dir()
                .join("python3.9/lib-dynload/_ssl.cpython-39-darwin.so"),
            0o644,
        );
        touch(&layout.lib_dir().join("python3.9/os.py"), 0o644);

        let artifacts = discover_plain_artifacts(&layout).unwrap();
        assert_eq!(
            relative(&layout, &artifacts),
            [
                "bin/python3.9",
                "lib/libpython3.9.dylib",
                "lib/python3.9/lib-dynload/_ssl.cpython-39-darwin.so",
            ]
        );
        assert_eq!(artifacts[0].kind, ArtifactKind::Binary);
        assert_eq!(artifacts[1].kind, ArtifactKind::DynamicLibrary);
        assert!(artifacts.iter().all(|a| !a.entitled));
    }

    #[test]
    fn test_nested_executables_are_not_collected() {
        let (_dir, layout) = framework();
        touch(&layout.lib_dir().join("python3.9/config/install-sh"), 0o755);

        assert!(discover_plain_artifacts(&layout).unwrap().is_empty());
    }

    #[test]
    fn test_executable_library_collected_once() {
        let (_dir, layout) = framework();
        touch(&layout.lib_dir().join("libpython3.9.dylib"), 0o755);

        let artifacts = discover_plain_artifacts(&layout).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].kind, ArtifactKind::Binary);
    }

    #[test]
    fn test_nested_executable_library_is_collected() {
        let (_dir, layout) = framework();
        let so = layout
            .lib_dir()
            .join("python3.9/lib-dynload/_ssl.cpython-39-darwin.so");
        touch(&so, 0o755);

        let artifacts = discover_plain_artifacts(&layout).unwrap();
        assert_eq!(artifacts, [Artifact::plain(so, ArtifactKind::Binary)]);
    }

    #[test]
    fn test_entitled_kinds_come_from_layout() {
        // nothing exists on disk; kinds must not depend on it
        let layout = FrameworkLayout::new("/nonexistent/Python.framework");
        let [wrapper, interpreter] = entitled_artifacts(&layout);

        assert_eq!(wrapper.path, layout.app_wrapper());
        assert_eq!(wrapper.kind, ArtifactKind::Container);
        assert_eq!(interpreter.path, layout.interpreter());
        assert_eq!(interpreter.kind, ArtifactKind::Binary);
        assert!(wrapper.entitled && interpreter.entitled);
    }

    #[test]
    fn test_empty_directories() {
        let (_dir, layout) = framework();
        assert!(discover_plain_artifacts(&layout).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let (_dir, layout) = framework();
        fs::remove_dir(layout.bin_dir()).unwrap();

        let err = discover_plain_artifacts(&layout).unwrap_err();
        assert!(err.to_string().contains("reading directory"));
    }
}
