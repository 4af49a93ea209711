use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mirror_fs::io::{self, RobustnessConfig};
use mirror_fs::{DirLock, NormalizedPath};
use std::time::Duration;
use tempfile::tempdir;

fn write_atomic_benchmark(c: &mut Criterion) {
    c.bench_function("io::write_atomic (strm)", |b| {
        let dir = tempdir().unwrap();
        let path = dir.path().join("movies/a.mp4.strm");
        let content = "http://drive/movies/a.mp4".as_bytes();
        let config = RobustnessConfig::default();

        b.iter(|| {
            io::write_atomic(black_box(&path), black_box(content), config).unwrap();
        })
    });
}

fn lock_benchmark(c: &mut Criterion) {
    c.bench_function("lock::DirLock::acquire (uncontended)", |b| {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locks/movies.lock");

        b.iter(|| {
            let lock = DirLock::acquire(black_box(&path), Duration::from_secs(1)).unwrap();
            drop(lock);
        })
    });
}

fn normalize_benchmark(c: &mut Criterion) {
    c.bench_function("path::NormalizedPath::new", |b| {
        b.iter(|| NormalizedPath::new(black_box(r"shows\season-01\episode-01.mkv")))
    });
}

criterion_group!(
    benches,
    write_atomic_benchmark,
    lock_benchmark,
    normalize_benchmark
);
criterion_main!(benches);
