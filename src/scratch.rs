//! Per-invocation scratch space.
//!
//! Every pipeline run owns one [`Scratch`]: a dedicated temp directory
//! whose lifetime is the invocation itself. Dropping it removes the
//! directory and anything still inside, so early returns and error paths
//! cannot leak files. Staging and discarding are counted, which lets tests
//! assert that the books balance.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;
use tracing::debug;

/// Scoped temp directory with allocation accounting.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
    staged: AtomicUsize,
    discarded: AtomicUsize,
}

impl Scratch {
    /// Create a fresh scratch directory under `root`, or under the system
    /// temp directory when `root` is `None`.
    pub fn new(root: Option<&Path>) -> io::Result<Self> {
        let dir = match root {
            Some(root) => TempDir::new_in(root)?,
            None => TempDir::new()?,
        };
        debug!(dir = %dir.path().display(), "scratch directory created");
        Ok(Self {
            dir,
            staged: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `bytes` to a new file inside the scratch directory.
    ///
    /// `name` must be a bare file name; callers derive it from an object
    /// key basename or a generated UUID.
    pub fn stage(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes)?;
        self.staged.fetch_add(1, Ordering::Relaxed);
        debug!(file = %path.display(), bytes = bytes.len(), "staged scratch file");
        Ok(path)
    }

    /// Remove one staged file ahead of the directory itself.
    ///
    /// Discarding a path that is already gone is a no-op, so a file is
    /// never released twice.
    pub fn discard(&self, path: &Path) {
        if std::fs::remove_file(path).is_ok() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(file = %path.display(), "discarded scratch file");
        }
    }

    /// Files staged over the lifetime of this scratch.
    pub fn staged_count(&self) -> usize {
        self.staged.load(Ordering::Relaxed)
    }

    /// Staged files not yet individually discarded. These are released
    /// together with the directory on drop. Saturates at zero: discards of
    /// files that were never staged here cannot push the count negative.
    pub fn outstanding(&self) -> usize {
        self.staged_count()
            .saturating_sub(self.discarded.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_files_land_inside_the_directory() {
        let scratch = Scratch::new(None).unwrap();
        let a = scratch.stage("a.pdf", b"%PDF-1.7").unwrap();
        let b = scratch.stage("b.md", b"# hi").unwrap();
        assert!(a.starts_with(scratch.path()));
        assert!(b.exists());
        assert_eq!(scratch.staged_count(), 2);
        assert_eq!(scratch.outstanding(), 2);
    }

    #[test]
    fn discard_releases_once_and_only_once() {
        let scratch = Scratch::new(None).unwrap();
        let path = scratch.stage("payload.md", b"# out").unwrap();
        scratch.discard(&path);
        assert!(!path.exists());
        assert_eq!(scratch.outstanding(), 0);
        // Second discard of the same path must not underflow the books.
        scratch.discard(&path);
        assert_eq!(scratch.outstanding(), 0);
    }

    #[test]
    fn discarding_an_unstaged_file_never_underflows_the_books() {
        let scratch = Scratch::new(None).unwrap();
        // Written directly, bypassing stage(), so it was never counted.
        let stray = scratch.path().join("stray.bin");
        std::fs::write(&stray, b"not ours").unwrap();
        scratch.discard(&stray);
        assert!(!stray.exists());
        assert_eq!(scratch.staged_count(), 0);
        assert_eq!(scratch.outstanding(), 0);
    }

    #[test]
    fn drop_removes_the_directory_and_all_leftovers() {
        let root = tempfile::tempdir().unwrap();
        let dir_path;
        {
            let scratch = Scratch::new(Some(root.path())).unwrap();
            dir_path = scratch.path().to_path_buf();
            scratch.stage("leftover.docx", b"PK\x03\x04").unwrap();
            assert!(dir_path.starts_with(root.path()));
        }
        assert!(!dir_path.exists());
        let leftovers: Vec<_> = std::fs::read_dir(root.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "scratch leaked: {leftovers:?}");
    }
}
