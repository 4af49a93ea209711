//! Normalized path handling for mirror-relative paths

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Remote listings and local walks both produce these, so the diff can
/// compare the two trees as plain strings. Conversion to a platform-native
/// path happens only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes for internal storage.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: path_str.replace('\\', "/"),
        }
    }

    /// The empty path, used for the anchor of a tree.
    pub fn root() -> Self {
        Self {
            inner: String::new(),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Join this path with a segment.
    ///
    /// Joining onto the empty path yields the segment unchanged, so tree
    /// paths built from the anchor stay relative.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        let segment = segment.trim_start_matches('/');
        if self.inner.is_empty() {
            return Self {
                inner: segment.to_string(),
            };
        }
        if segment.is_empty() {
            return self.clone();
        }
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment)
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self { inner: joined }
    }

    /// Resolve this relative path under a native base directory.
    ///
    /// `.` and `..` segments are dropped, so the result never leaves `base`.
    pub fn under(&self, base: &Path) -> PathBuf {
        let mut native = base.to_path_buf();
        for component in self
            .inner
            .split('/')
            .filter(|c| !c.is_empty() && *c != "." && *c != "..")
        {
            native.push(component);
        }
        native
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension of the final segment, including the leading dot.
    ///
    /// Matching is case-sensitive and takes everything after the last `.`,
    /// so `.nfo` is the extension of both `movie.nfo` and `.nfo`.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        let idx = name.rfind('.')?;
        if idx + 1 == name.len() {
            None
        } else {
            Some(&name[idx..])
        }
    }

    /// Append a suffix to the final segment (`a.mp4` -> `a.mp4.strm`).
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            inner: format!("{}{}", self.inner, suffix),
        }
    }

    /// Remove a trailing suffix, if present.
    pub fn strip_suffix(&self, suffix: &str) -> Option<Self> {
        self.inner.strip_suffix(suffix).map(|s| Self {
            inner: s.to_string(),
        })
    }

    /// Resolve to an absolute path without UNC prefixes on Windows.
    pub fn canonicalize(&self) -> Result<PathBuf> {
        dunce::canonicalize(&self.inner).map_err(|e| Error::io(&self.inner, e))
    }
}

/// True if something occupies `path`, without following symlinks.
///
/// Dangling symlinks count as present.
pub fn entry_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<NormalizedPath> for String {
    fn from(p: NormalizedPath) -> Self {
        p.inner
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
