//! Method-aware diff between the remote tree and the local mirror

use std::collections::HashSet;

use mirror_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::rules::{Method, RuleResolver, STRM_SUFFIX};
use crate::tree::PathSet;

/// Paths to materialize and paths to remove
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Source-side paths, without any mirrored suffix
    pub added: Vec<NormalizedPath>,
    /// Mirror-side paths, with the `.strm` suffix where one applies
    pub deleted: Vec<NormalizedPath>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}

/// Compare `source` against `target` under the task's rules.
///
/// Additions iterate the source and look for each path under its mirrored
/// name; deletions iterate the target and map each mirrored name back to
/// its source path. Both passes share one rule table, so a file written this
/// run is never considered stale on the next. Duplicate input paths are
/// reported once.
pub fn diff(source: &PathSet, target: &PathSet, resolver: &RuleResolver) -> DiffResult {
    let source_index = source.lookup();
    let target_index = target.lookup();
    let mut result = DiffResult::default();

    let mut seen: HashSet<&str> = HashSet::new();
    for path in source {
        let present = match resolver.resolve(path) {
            Method::Ignore => continue,
            Method::Strm => {
                let mirrored = format!("{}{}", path.as_str(), STRM_SUFFIX);
                target_index.contains(mirrored.as_str())
            }
            _ => target_index.contains(path.as_str()),
        };
        if !present && seen.insert(path.as_str()) {
            result.added.push(path.clone());
        }
    }

    seen.clear();
    for path in target {
        let (method, candidate) = resolver.resolve_mirrored(path);
        if method == Method::Ignore {
            continue;
        }
        if !source_index.contains(candidate.as_str()) && seen.insert(path.as_str()) {
            result.deleted.push(path.clone());
        }
    }

    tracing::debug!(
        source = source.len(),
        target = target.len(),
        added = result.added.len(),
        deleted = result.deleted.len(),
        "Computed diff"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use pretty_assertions::assert_eq;

    fn resolver(rules: &[Rule]) -> RuleResolver {
        RuleResolver::new(rules).unwrap()
    }

    fn strs(paths: &[NormalizedPath]) -> Vec<&str> {
        paths.iter().map(NormalizedPath::as_str).collect()
    }

    #[test]
    fn mixed_methods_against_empty_mirror() {
        let rules = resolver(&[
            Rule::new("video", [".mp4"], Method::Copy),
            Rule::new("subs", [".srt"], Method::Symlink),
        ]);
        let source: PathSet = ["a.mp4", "b.srt", "c.nfo"].into_iter().collect();

        let result = diff(&source, &PathSet::new(), &rules);

        assert_eq!(strs(&result.added), vec!["a.mp4", "b.srt"]);
        assert!(result.deleted.is_empty());
    }

    #[test]
    fn stale_copy_is_deleted() {
        let rules = resolver(&[Rule::new("video", [".mp4"], Method::Copy)]);
        let source: PathSet = ["a.mp4"].into_iter().collect();
        let target: PathSet = ["a.mp4", "old.mp4"].into_iter().collect();

        let result = diff(&source, &target, &rules);

        assert!(result.added.is_empty());
        assert_eq!(strs(&result.deleted), vec!["old.mp4"]);
    }

    #[test]
    fn strm_uses_suffixed_name_on_both_sides() {
        let rules = resolver(&[Rule::new("video", [".mp4"], Method::Strm)]);
        let source: PathSet = ["movies", "movies/a.mp4", "movies/b.mp4"].into_iter().collect();
        let target: PathSet = ["movies", "movies/a.mp4.strm", "movies/gone.mp4.strm"]
            .into_iter()
            .collect();

        let result = diff(&source, &target, &rules);

        assert_eq!(strs(&result.added), vec!["movies/b.mp4"]);
        assert_eq!(strs(&result.deleted), vec!["movies/gone.mp4.strm"]);
    }

    #[test]
    fn unchanged_strm_pair_is_stable() {
        let rules = resolver(&[Rule::new("video", [".mp4"], Method::Strm)]);
        let source: PathSet = ["movies/a.mp4"].into_iter().collect();
        let target: PathSet = ["movies/a.mp4.strm"].into_iter().collect();

        assert!(diff(&source, &target, &rules).is_empty());
    }

    #[test]
    fn ignored_mirror_files_are_left_alone() {
        let rules = resolver(&[Rule::new("video", [".mp4"], Method::Copy)]);
        let target: PathSet = ["notes.txt", "movies", "poster.jpg"].into_iter().collect();

        assert!(diff(&PathSet::new(), &target, &rules).is_empty());
    }

    #[test]
    fn duplicate_source_paths_are_added_once() {
        let rules = resolver(&[Rule::new("video", [".mp4"], Method::Virtual)]);
        let source: PathSet = ["a.mp4", "a.mp4"].into_iter().collect();

        let result = diff(&source, &PathSet::new(), &rules);

        assert_eq!(strs(&result.added), vec!["a.mp4"]);
    }
}
