//! End-to-end reconciliation scenarios
//!
//! Each test drives the full flow: listing -> trees -> diff -> materialize,
//! and checks the mirror on disk afterwards.

use std::sync::Arc;

use mirror_core::{
    ConfigurationError, DiffResult, Error, Job, JobContext, JobStatus, MemorySink, Materializer,
    Method, Rule, RuleResolver, Task, TaskStore, build_local_tree, build_remote_tree, diff,
};
use mirror_fs::NormalizedPath;
use mirror_test_utils::mirror::TestMirror;
use mirror_test_utils::source::MemorySource;
use pretty_assertions::assert_eq;

/// Listing of files sitting directly under the export anchor.
fn flat_listing(names: &[&str]) -> MemorySource {
    names
        .iter()
        .enumerate()
        .fold(MemorySource::new().entry("0", "", "export"), |source, (i, name)| {
            source.entry(&format!("f{i}"), "0", name)
        })
}

fn run_job(mirror: &TestMirror, task: Task, remote: &MemorySource) -> Job {
    let config = mirror.config("http://nas:19798/d/");
    let sink = MemorySink::new();
    let mut job = Job::new(Arc::new(task));
    job.run(&JobContext::new(&config, remote, &sink));
    job
}

fn paths(items: &[NormalizedPath]) -> Vec<&str> {
    items.iter().map(NormalizedPath::as_str).collect()
}

// ============================================================================
// Copy and symlink into an empty mirror
// ============================================================================

#[test]
fn test_copy_and_symlink_into_empty_mirror() {
    let mirror = TestMirror::new();
    mirror.add_source_file("a.mp4", b"full video bytes");
    mirror.add_source_file("b.srt", b"subtitles");
    mirror.add_source_file("c.nfo", b"<movie/>");
    let remote = flat_listing(&["a.mp4", "b.srt", "c.nfo"]);
    let rules = vec![
        Rule::new("video", [".mp4"], Method::Copy),
        Rule::new("subtitles", [".srt"], Method::Symlink),
    ];
    let task = mirror.task("flat", "", rules);

    let resolver = task.resolver().unwrap();
    let source = build_remote_tree(&remote, &task.source_path).unwrap();
    let target = build_local_tree(&task.target_path).unwrap();
    let plan = diff(&source, &target, &resolver);
    assert_eq!(paths(&plan.added), vec!["a.mp4", "b.srt"]);
    assert!(plan.deleted.is_empty());

    let job = run_job(&mirror, task, &remote);

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result.materialized, 2);
    mirror.assert_file_contains("a.mp4", "full video bytes");
    mirror.assert_not_exists("c.nfo");
    #[cfg(unix)]
    {
        mirror.assert_symlink("b.srt");
        mirror.assert_file_contains("b.srt", "subtitles");
    }
}

#[test]
fn test_stale_copy_is_deleted() {
    let mirror = TestMirror::new();
    mirror.add_mirror_file("a.mp4", b"a");
    mirror.add_mirror_file("old.mp4", b"old");
    let remote = flat_listing(&["a.mp4"]);
    let task = mirror.task("flat", "", vec![Rule::new("video", [".mp4"], Method::Copy)]);

    let resolver = task.resolver().unwrap();
    let source = build_remote_tree(&remote, "").unwrap();
    let target = build_local_tree(&task.target_path).unwrap();
    let plan = diff(&source, &target, &resolver);
    assert!(plan.added.is_empty());
    assert_eq!(paths(&plan.deleted), vec!["old.mp4"]);

    let job = run_job(&mirror, task, &remote);

    assert_eq!(job.result.deleted, 1);
    mirror.assert_exists("a.mp4");
    mirror.assert_not_exists("old.mp4");
}

// ============================================================================
// strm pointers
// ============================================================================

#[test]
fn test_strm_round_trip_is_stable() {
    let mirror = TestMirror::new();
    let remote = MemorySource::export_of("movies", &["a.mp4"]);
    let rules = vec![Rule::new("video", [".mp4"], Method::Strm)];

    let first = run_job(&mirror, mirror.task("movies", "movies", rules.clone()), &remote);
    assert_eq!(first.result.materialized, 1);
    let content = std::fs::read_to_string(mirror.mirror_path("movies/a.mp4.strm")).unwrap();
    assert_eq!(content, "http://nas:19798/d/movies/a.mp4");

    let second = run_job(&mirror, mirror.task("movies", "movies", rules), &remote);
    assert_eq!(second.status, JobStatus::Completed);
    assert_eq!(second.result.materialized, 0);
    assert_eq!(second.result.deleted, 0);
}

#[test]
fn test_removed_remote_file_drops_its_pointer() {
    let mirror = TestMirror::new();
    let rules = vec![Rule::new("video", [".mp4", ".mkv"], Method::Strm)];
    let before = MemorySource::export_of("movies", &["a.mp4", "season/b.mkv"]);
    let after = MemorySource::export_of("movies", &["a.mp4"]);

    run_job(&mirror, mirror.task("movies", "movies", rules.clone()), &before);
    mirror.assert_exists("movies/season/b.mkv.strm");
    let job = run_job(&mirror, mirror.task("movies", "movies", rules), &after);

    assert_eq!(job.result.deleted, 1);
    mirror.assert_not_exists("movies/season/b.mkv.strm");
    // Empty directories are left in place
    mirror.assert_exists("movies/season");
}

// ============================================================================
// Rule validation and error paths
// ============================================================================

#[test]
fn test_conflicting_extension_rejected_at_registration() {
    let mirror = TestMirror::new();
    let rules = vec![
        Rule::new("subtitles", [".srt"], Method::Copy),
        Rule::new("linked", [".srt"], Method::Symlink),
    ];

    let err = TaskStore::new(vec![mirror.task("movies", "movies", rules)], &[]).unwrap_err();

    assert_eq!(
        err,
        ConfigurationError::DuplicateExtensionMapping {
            extension: ".srt".to_string(),
            first: Method::Copy,
            second: Method::Symlink,
        }
    );
}

#[test]
fn test_out_of_order_listing_fails_job() {
    let mirror = TestMirror::new();
    let remote = MemorySource::new()
        .entry("0", "", "export")
        .entry("2", "1", "a.mp4")
        .entry("1", "0", "movies");
    let task = mirror.task("movies", "", vec![Rule::new("video", [".mp4"], Method::Strm)]);

    let err = build_remote_tree(&remote, "").unwrap_err();
    assert!(matches!(err, Error::OutOfOrderEntry { ref key, .. } if key == "2"));

    let job = run_job(&mirror, task, &remote);
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.logs.iter().any(|line| line.contains("a.mp4")));
}

#[test]
fn test_delete_under_missing_parent_is_noop() {
    let mirror = TestMirror::new();
    let config = mirror.config("");
    let resolver = RuleResolver::new(&[Rule::new("video", [".mp4"], Method::Copy)]).unwrap();
    let sink = MemorySink::new();
    let plan = DiffResult {
        added: vec![],
        deleted: vec![NormalizedPath::new("gone/x.mp4")],
    };

    let report = Materializer::new(&resolver, &config, &sink).apply(&plan, &mirror.mirror_root());

    assert_eq!(report.deleted, 0);
    assert_eq!(report.errors, 0);
}

#[test]
fn test_one_failed_item_does_not_stop_the_batch() {
    let mirror = TestMirror::new();
    mirror.add_source_file("b.mp4", b"b");
    // a.mp4 is listed but missing from the mount, so its copy fails
    let remote = flat_listing(&["a.mp4", "b.mp4", "c.jpg"]);
    let rules = vec![
        Rule::new("video", [".mp4"], Method::Copy),
        Rule::new("artwork", [".jpg"], Method::Virtual),
    ];

    let job = run_job(&mirror, mirror.task("flat", "", rules), &remote);

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result.materialized, 2);
    assert_eq!(job.result.errors, 1);
    mirror.assert_exists("b.mp4");
    mirror.assert_exists("c.jpg");
}
