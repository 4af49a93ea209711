//! Comparable path sets built from the remote listing and the local mirror

mod export;
mod local;
mod remote;

pub use export::ExportFileSource;
pub use local::build_local_tree;
pub use remote::{EntryStream, RemoteEntry, RemoteSource, build_remote_tree};

use std::collections::HashSet;

use mirror_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

/// Ordered relative paths describing one side of the mirror.
///
/// Uniqueness is not enforced; the local walker never produces duplicates
/// and the diff tolerates them from the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathSet {
    paths: Vec<NormalizedPath>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: NormalizedPath) {
        self.paths.push(path);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedPath> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Hash index for membership checks during a diff.
    pub fn lookup(&self) -> HashSet<&str> {
        self.paths.iter().map(NormalizedPath::as_str).collect()
    }

    pub fn as_strs(&self) -> Vec<&str> {
        self.paths.iter().map(NormalizedPath::as_str).collect()
    }
}

impl<P: Into<NormalizedPath>> FromIterator<P> for PathSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a NormalizedPath;
    type IntoIter = std::slice::Iter<'a, NormalizedPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}
