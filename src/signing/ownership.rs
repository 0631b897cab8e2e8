//! Ownership normalization and the host operations it needs.
//!
//! Every entry beneath the framework root is set to `root:admin` before any
//! signature is written. The root directory itself is left as is.

use crate::config::Ownership;
use crate::error::{ErrorExt, Result};
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Privileged operations on the host.
///
/// [`SystemHost`] talks to the OS; tests substitute a recorder.
pub trait Host {
    /// Effective uid of the current process
    fn effective_uid(&self) -> u32;

    /// Change owner and group of `path`, following symlinks.
    fn chown(&self, path: &Path, ownership: Ownership) -> io::Result<()>;
}

/// The real host, via `nix`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn effective_uid(&self) -> u32 {
        nix::unistd::geteuid().as_raw()
    }

    fn chown(&self, path: &Path, ownership: Ownership) -> io::Result<()> {
        nix::unistd::chown(
            path,
            Some(nix::unistd::Uid::from_raw(ownership.uid)),
            Some(nix::unistd::Gid::from_raw(ownership.gid)),
        )
        .map_err(io::Error::from)
    }
}

/// Apply `ownership` to every directory and file beneath `root`.
///
/// Symlinked directories are not descended into. Stops at the first failure
/// without undoing earlier changes. Returns the number of entries touched.
pub fn normalize_ownership<H: Host>(root: &Path, ownership: Ownership, host: &H) -> Result<usize> {
    log::info!(
        "Setting {}:{} throughout {}",
        ownership.uid,
        ownership.gid,
        root.display()
    );

    let mut count = 0;
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        host.chown(entry.path(), ownership)
            .fs_context("changing owner of", entry.path())?;
        count += 1;
    }

    log::debug!("Normalized ownership of {} entries", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::os::unix::fs::MetadataExt;
    use std::path::PathBuf;

    #[derive(Default)]
    struct MapHost {
        owners: RefCell<BTreeMap<PathBuf, Ownership>>,
        calls: RefCell<usize>,
        fail_on: Option<PathBuf>,
    }

    impl Host for MapHost {
        fn effective_uid(&self) -> u32 {
            0
        }

        fn chown(&self, path: &Path, ownership: Ownership) -> io::Result<()> {
            if self.fail_on.as_deref() == Some(path) {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            *self.calls.borrow_mut() += 1;
            self.owners
                .borrow_mut()
                .insert(path.to_path_buf(), ownership);
            Ok(())
        }
    }

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("Versions/3.9/lib/python3.9");
        std::fs::create_dir_all(&lib).unwrap();
        std::fs::write(lib.join("os.py"), "").unwrap();
        std::fs::write(dir.path().join("Versions/3.9/lib/libpython3.9.dylib"), "").unwrap();
        dir
    }

    #[test]
    fn test_every_entry_below_root_is_touched() {
        let tree = sample_tree();
        let host = MapHost::default();
        let touched = normalize_ownership(tree.path(), Ownership::default(), &host).unwrap();

        let owners = host.owners.borrow();
        // Versions, 3.9, lib, python3.9, os.py, libpython3.9.dylib
        assert_eq!(touched, 6);
        assert_eq!(owners.len(), 6);
        assert!(!owners.contains_key(tree.path()));
        assert!(owners.values().all(|o| *o == Ownership { uid: 0, gid: 80 }));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let tree = sample_tree();
        let host = MapHost::default();

        normalize_ownership(tree.path(), Ownership::default(), &host).unwrap();
        let once = host.owners.borrow().clone();
        normalize_ownership(tree.path(), Ownership::default(), &host).unwrap();

        assert_eq!(*host.owners.borrow(), once);
        assert_eq!(*host.calls.borrow(), 12);
    }

    #[test]
    fn test_failure_is_fatal_and_names_path() {
        let tree = sample_tree();
        let bad = tree.path().join("Versions/3.9/lib");
        let host = MapHost {
            fail_on: Some(bad.clone()),
            ..Default::default()
        };

        let err = normalize_ownership(tree.path(), Ownership::default(), &host).unwrap_err();
        assert!(err.to_string().contains("changing owner of"));
        assert!(err.to_string().contains(&bad.display().to_string()));
    }

    #[test]
    fn test_system_host_with_own_ids() {
        let tree = sample_tree();
        let mine = Ownership {
            uid: nix::unistd::geteuid().as_raw(),
            gid: nix::unistd::getegid().as_raw(),
        };

        normalize_ownership(tree.path(), mine, &SystemHost).unwrap();
        normalize_ownership(tree.path(), mine, &SystemHost).unwrap();

        for entry in WalkDir::new(tree.path()).min_depth(1) {
            let meta = entry.unwrap().metadata().unwrap();
            assert_eq!((meta.uid(), meta.gid()), (mine.uid, mine.gid));
        }
    }
}
