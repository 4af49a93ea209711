//! Walks the local mirror into a path set

use std::io;
use std::path::Path;

use mirror_fs::NormalizedPath;
use walkdir::WalkDir;

use super::PathSet;
use crate::{Error, Result};

/// List every file and directory below `root`, relative to `root`.
///
/// A missing root is an empty mirror, not an error. Entries are visited in
/// file-name order so a fixed filesystem state always yields the same
/// sequence. Symlinked directories are listed but not descended into.
///
/// # Errors
///
/// Returns `LocalWalk` if a directory cannot be read.
pub fn build_local_tree(root: &Path) -> Result<PathSet> {
    let mut tree = PathSet::new();
    if !root.exists() {
        return Ok(tree);
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if let Ok(relative) = entry.path().strip_prefix(root) {
            tree.push(NormalizedPath::new(relative));
        }
    }

    tracing::debug!(root = %root.display(), paths = tree.len(), "Built local tree");
    Ok(tree)
}

fn walk_error(root: &Path, error: walkdir::Error) -> Error {
    let path = error.path().unwrap_or(root).to_path_buf();
    let source = error
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("filesystem loop"));
    Error::LocalWalk { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let tree = build_local_tree(&temp.path().join("absent")).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn lists_files_and_directories_relative_to_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("movies/extras")).unwrap();
        fs::write(root.join("movies/a.mp4.strm"), "x").unwrap();
        fs::write(root.join("movies/extras/b.srt"), "x").unwrap();
        fs::write(root.join("top.nfo"), "").unwrap();

        let tree = build_local_tree(root).unwrap();
        let paths: BTreeSet<&str> = tree.iter().map(NormalizedPath::as_str).collect();

        assert_eq!(
            paths,
            BTreeSet::from([
                "movies",
                "movies/a.mp4.strm",
                "movies/extras",
                "movies/extras/b.srt",
                "top.nfo",
            ])
        );
    }

    #[test]
    fn walk_is_deterministic() {
        let temp = TempDir::new().unwrap();
        for name in ["c.mp4", "a.mp4", "b.mp4"] {
            fs::write(temp.path().join(name), "").unwrap();
        }

        let first = build_local_tree(temp.path()).unwrap();
        let second = build_local_tree(temp.path()).unwrap();

        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_descended() {
        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("outside");
        let mirror = temp.path().join("mirror");
        fs::create_dir_all(&outside).unwrap();
        fs::create_dir_all(&mirror).unwrap();
        fs::write(outside.join("hidden.mp4"), "").unwrap();
        std::os::unix::fs::symlink(&outside, mirror.join("link")).unwrap();

        let tree = build_local_tree(&mirror).unwrap();

        assert_eq!(tree.as_strs(), vec!["link"]);
    }
}
