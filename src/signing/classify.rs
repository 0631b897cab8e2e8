//! Path classification for signable artifacts.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Owner-execute permission bit
const S_IXUSR: u32 = 0o100;

/// File name suffixes of native libraries
pub const LIBRARY_SUFFIXES: &[&str] = &[".so", ".dylib"];

/// What kind of code an artifact holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Executable file
    Binary,
    /// Shared object or dylib
    DynamicLibrary,
    /// The enclosing `.framework` or `.app` directory
    Container,
}

/// Regular file (following symlinks) with the owner-execute bit set.
pub fn is_signable_binary(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & S_IXUSR != 0)
        .unwrap_or(false)
}

/// File name ends in one of [`LIBRARY_SUFFIXES`]. Looks at the name only.
pub fn has_library_suffix(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| LIBRARY_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
}

/// Regular file (following symlinks) named like a native library.
pub fn is_signable_library(path: &Path) -> bool {
    has_library_suffix(path) && std::fs::metadata(path).is_ok_and(|meta| meta.is_file())
}

/// Classify a filesystem entry.
///
/// An executable library is a [`ArtifactKind::Binary`]. Missing files and
/// directories are not signable.
pub fn classify(path: &Path) -> Option<ArtifactKind> {
    if is_signable_binary(path) {
        Some(ArtifactKind::Binary)
    } else if is_signable_library(path) {
        Some(ArtifactKind::DynamicLibrary)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_file(dir: &Path, name: &str, mode: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"\xcf\xfa\xed\xfe").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_executable_is_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "python3", 0o755);
        assert_eq!(classify(&path), Some(ArtifactKind::Binary));
    }

    #[test]
    fn test_group_execute_only_is_not_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "tool", 0o615);
        assert!(!is_signable_binary(&path));
        assert_eq!(classify(&path), None);
    }

    #[test]
    fn test_library_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let dylib = write_file(dir.path(), "libfoo.dylib", 0o644);
        let so = write_file(dir.path(), "_ssl.cpython-39-darwin.so", 0o644);
        let text = write_file(dir.path(), "README.txt", 0o644);
        let near_miss = write_file(dir.path(), "libfoo.dylib.bak", 0o644);

        assert_eq!(classify(&dylib), Some(ArtifactKind::DynamicLibrary));
        assert_eq!(classify(&so), Some(ArtifactKind::DynamicLibrary));
        assert_eq!(classify(&text), None);
        assert_eq!(classify(&near_miss), None);
        assert!(has_library_suffix(Path::new("/nowhere/libbar.so")));
        assert!(!has_library_suffix(&near_miss));
    }

    #[test]
    fn test_executable_library_is_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "libpython3.9.dylib", 0o755);
        assert!(is_signable_library(&path));
        assert_eq!(classify(&path), Some(ArtifactKind::Binary));
    }

    #[test]
    fn test_directories_and_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let lib_dir = dir.path().join("weird.dylib");
        fs::create_dir(&lib_dir).unwrap();

        assert_eq!(classify(&lib_dir), None);
        assert_eq!(classify(dir.path()), None);
        assert_eq!(classify(&dir.path().join("missing.so")), None);
    }

    #[test]
    fn test_symlink_follows_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = write_file(dir.path(), "libpython3.9.dylib", 0o644);
        let link = dir.path().join("libpython3.dylib");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        assert_eq!(classify(&link), Some(ArtifactKind::DynamicLibrary));
    }
}
