//! [`TestMirror`] builder for reconciliation scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use mirror_core::{MirrorConfig, Rule, Task};
use tempfile::TempDir;

/// A temporary drive mount, mirror root and state directory.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::mirror::TestMirror;
///
/// let mirror = TestMirror::new();
/// mirror.add_source_file("movies/a.mp4", b"bytes");
/// mirror.assert_file_contains("movies/a.mp4.strm", "movies/a.mp4");
/// ```
pub struct TestMirror {
    temp_dir: TempDir,
}

impl Default for TestMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl TestMirror {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("drive")).unwrap();
        Self { temp_dir }
    }

    /// Stand-in for the mounted remote drive.
    pub fn source_root(&self) -> PathBuf {
        self.temp_dir.path().join("drive")
    }

    /// Local mirror root (not created until something is written).
    pub fn mirror_root(&self) -> PathBuf {
        self.temp_dir.path().join("mirror")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.temp_dir.path().join("state")
    }

    /// Configuration pointing at this fixture's directories.
    pub fn config(&self, strm_prefix: &str) -> MirrorConfig {
        MirrorConfig::new(self.source_root())
            .with_state_dir(self.state_dir())
            .with_strm_prefix(strm_prefix)
    }

    /// A task mirroring `source_path` into this fixture's mirror root.
    pub fn task(&self, name: &str, source_path: &str, rules: Vec<Rule>) -> Task {
        Task::new(name, source_path, self.mirror_root(), rules)
    }

    /// Write a file on the fake drive, creating parents.
    pub fn add_source_file(&self, relative: &str, content: &[u8]) -> PathBuf {
        write_file(&self.source_root(), relative, content)
    }

    /// Write a file directly into the mirror, creating parents.
    pub fn add_mirror_file(&self, relative: &str, content: &[u8]) -> PathBuf {
        write_file(&self.mirror_root(), relative, content)
    }

    pub fn mirror_path(&self, relative: &str) -> PathBuf {
        self.mirror_root().join(relative)
    }

    /// Assert that `relative` exists in the mirror (symlinks are not followed).
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, relative: &str) {
        let path = self.mirror_path(relative);
        assert!(
            fs::symlink_metadata(&path).is_ok(),
            "Expected mirror entry to exist: {}",
            path.display()
        );
    }

    /// Assert that `relative` does **not** exist in the mirror.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_not_exists(&self, relative: &str) {
        let path = self.mirror_path(relative);
        assert!(
            fs::symlink_metadata(&path).is_err(),
            "Expected mirror entry NOT to exist: {}",
            path.display()
        );
    }

    /// Assert that the mirror file at `relative` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let path = self.mirror_path(relative);
        let actual = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()));
        assert!(
            actual.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            path.display(),
            content,
            actual
        );
    }

    /// Assert that `relative` is a symlink in the mirror.
    ///
    /// # Panics
    /// Panics if the entry is missing or is not a symlink.
    pub fn assert_symlink(&self, relative: &str) {
        let path = self.mirror_path(relative);
        let metadata = fs::symlink_metadata(&path)
            .unwrap_or_else(|_| panic!("Expected symlink at {}", path.display()));
        assert!(
            metadata.file_type().is_symlink(),
            "Expected {} to be a symlink",
            path.display()
        );
    }
}

fn write_file(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("write_file: failed to create {}: {e}", parent.display()));
    }
    fs::write(&path, content)
        .unwrap_or_else(|e| panic!("write_file: failed to write {}: {e}", path.display()));
    path
}
