//! Configuration files driving real runs
//!
//! Loads YAML and JSON configs from disk, reads listings through the
//! JSON-lines export source and runs every enabled task.

use std::fs;
use std::time::{Duration, SystemTime};

use mirror_core::{
    ExportFileSource, JobStatus, LockScope, MemorySink, Method, MirrorConfig, Scheduler, TaskStore,
    prune_logs,
};
use mirror_test_utils::mirror::TestMirror;
use pretty_assertions::assert_eq;

fn write_listing(dir: &std::path::Path, file: &str, lines: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(file), lines.join("\n")).unwrap();
}

fn yaml_config(mirror: &TestMirror) -> String {
    format!(
        r#"source_mount: '{source}'
strm_prefix: "http://nas/"
state_dir: '{state}'
lock_scope: tree_fetch
default_rules:
  - name: video
    extensions: [".mp4", ".mkv"]
    method: strm
tasks:
  - name: movies
    source_path: /media/movies
    target_path: '{target}/movies'
  - name: shows
    source_path: /media/shows
    target_path: '{target}/shows'
    rules:
      - name: episodes
        extensions: [".mkv"]
        method: virtual
  - name: music
    source_path: /media/music
    target_path: '{target}/music'
    enabled: false
"#,
        source = mirror.source_root().display(),
        state = mirror.state_dir().display(),
        target = mirror.mirror_root().display(),
    )
}

#[test]
fn test_yaml_config_runs_every_enabled_task() {
    let mirror = TestMirror::new();
    let config_path = mirror.state_dir().with_file_name("mirror.yaml");
    fs::write(&config_path, yaml_config(&mirror)).unwrap();
    let listings = mirror.state_dir().with_file_name("listings");
    write_listing(
        &listings,
        "media_movies.jsonl",
        &[
            r#"{"key": "0", "parent_key": "", "name": "export"}"#,
            r#"{"key": "1", "parent_key": "0", "name": "movies"}"#,
            r#"{"key": "2", "parent_key": "1", "name": "a.mp4"}"#,
        ],
    );
    write_listing(
        &listings,
        "media_shows.jsonl",
        &[
            r#"{"key": "0", "parent_key": "", "name": "export"}"#,
            r#"{"key": "1", "parent_key": "0", "name": "shows"}"#,
            r#"{"key": "2", "parent_key": "1", "name": "s01"}"#,
            r#"{"key": "3", "parent_key": "2", "name": "e01.mkv"}"#,
        ],
    );

    let config = MirrorConfig::load(&config_path).unwrap();
    assert_eq!(config.lock_scope, LockScope::TreeFetch);
    let store = TaskStore::from_config(&config).unwrap();
    assert_eq!(store.require("movies").unwrap().rules[0].method, Method::Strm);
    let remote = ExportFileSource::new(&listings);
    let sink = MemorySink::new();

    let jobs = Scheduler::new(&config, &store, &remote, &sink).run_enabled();

    let names: Vec<&str> = jobs.iter().map(|job| job.task_name.as_str()).collect();
    assert_eq!(names, vec!["movies", "shows"]);
    assert!(jobs.iter().all(|job| job.status == JobStatus::Completed));
    mirror.assert_file_contains("movies/media/movies/a.mp4.strm", "http://nas/media/movies/a.mp4");
    mirror.assert_exists("shows/media/shows/s01/e01.mkv");
    mirror.assert_not_exists("music");
}

#[test]
fn test_json_config_round_trip() {
    let mirror = TestMirror::new();
    let path = mirror.state_dir().with_file_name("mirror.json");
    let mut config = mirror.config("http://nas/");
    config.logging.retention_days = 3;
    config.tasks.push(mirror.task("movies", "movies", vec![]));

    config.save(&path).unwrap();
    let loaded = MirrorConfig::load(&path).unwrap();

    assert_eq!(loaded.strm_prefix, "http://nas/");
    assert_eq!(loaded.logging.retention_days, 3);
    assert_eq!(loaded.tasks, config.tasks);
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["lock_scope"], "full_run");
}

#[test]
fn test_job_logs_are_written_and_pruned() {
    let mirror = TestMirror::new();
    let config = mirror.config("");
    let task = mirror.task("movies", "", vec![]);
    let store = TaskStore::new(vec![task], &[]).unwrap();
    let listing = mirror.state_dir().with_file_name("listing.jsonl");
    write_listing(
        listing.parent().unwrap(),
        "listing.jsonl",
        &[r#"{"key": "0", "parent_key": "", "name": "export"}"#],
    );
    let remote = ExportFileSource::new(&listing);
    let sink = MemorySink::new();

    let job = Scheduler::new(&config, &store, &remote, &sink)
        .run_task("movies")
        .unwrap();
    let log = job.write_log(&config.log_dir()).unwrap();
    assert!(fs::read_to_string(&log).unwrap().contains("0 materialized"));

    let later = SystemTime::now() + config.retention() + Duration::from_secs(60);
    let removed = prune_logs(&config.log_dir(), config.retention(), later).unwrap();
    assert_eq!(removed, vec![job.id.clone()]);
    assert!(!log.exists());
}
