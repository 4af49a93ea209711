//! Reconstructs relative paths from a parent-linked remote listing

use std::collections::HashMap;

use mirror_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use super::PathSet;
use crate::{Error, Result};

/// One record of the remote export stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Opaque identifier of this entry
    pub key: String,
    /// Identifier of the containing directory
    pub parent_key: String,
    pub name: String,
}

impl RemoteEntry {
    pub fn new(key: impl Into<String>, parent_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            parent_key: parent_key.into(),
            name: name.into(),
        }
    }
}

/// Entry stream yielded by a [`RemoteSource`]
pub type EntryStream<'a> = Box<dyn Iterator<Item = Result<RemoteEntry>> + 'a>;

/// An authenticated handle able to list a remote tree.
///
/// Implementations must yield every parent before its children. Only the
/// first entry may have an unknown parent; it becomes the anchor.
pub trait RemoteSource: Send + Sync {
    /// Stream the entries below `root`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteListing` if the listing cannot be started. Failures
    /// after the stream has started are yielded as items.
    fn list_entries<'a>(&'a self, root: &str) -> Result<EntryStream<'a>>;
}

/// Consume the listing for `root` once and return the relative paths it describes.
///
/// The anchor (first entry) gets the empty path and is not emitted. When the
/// second entry is the requested directory itself, its path is seeded with
/// the root path, so descendants come out as `<root>/<name>/...`.
///
/// # Errors
///
/// Returns `RemoteListing` if the stream fails or an entry name is not a
/// single path segment, and `OutOfOrderEntry` if an entry other than the
/// anchor arrives before its parent.
pub fn build_remote_tree(source: &dyn RemoteSource, root: &str) -> Result<PathSet> {
    let root_path = NormalizedPath::new(root.trim_matches(['/', '\\']));
    let root_name = root_path.file_name().map(str::to_owned);

    let mut index: HashMap<String, NormalizedPath> = HashMap::new();
    let mut tree = PathSet::new();
    let mut anchored = false;

    for (position, entry) in source.list_entries(root)?.enumerate() {
        let entry = entry.map_err(into_listing_error)?;

        let path = match index.get(&entry.parent_key) {
            None if !anchored => {
                anchored = true;
                NormalizedPath::root()
            }
            None => {
                return Err(Error::OutOfOrderEntry {
                    key: entry.key,
                    parent_key: entry.parent_key,
                    name: entry.name,
                });
            }
            Some(_) if !is_plain_segment(&entry.name) => {
                return Err(Error::remote(format!(
                    "entry {} has unusable name {:?}",
                    entry.key, entry.name
                )));
            }
            Some(_) if position == 1 && root_name.as_deref() == Some(entry.name.as_str()) => {
                root_path.clone()
            }
            Some(parent) => parent.join(&entry.name),
        };

        if !path.is_empty() {
            tree.push(path.clone());
        }
        index.insert(entry.key, path);
    }

    tracing::debug!(root, entries = index.len(), paths = tree.len(), "Built remote tree");
    Ok(tree)
}

/// Names are joined under the mount root, so they must not climb or nest.
fn is_plain_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn into_listing_error(error: Error) -> Error {
    match error {
        Error::RemoteListing { .. } => error,
        other => Error::remote(other.to_string()),
    }
}
