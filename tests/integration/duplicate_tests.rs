use super::common::{scan, write_file};
use data_symmetry::duplicates::{DuplicateMode, Reconciler};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_path_name_versus_hash_mode() {
    let reference = tempdir().unwrap();
    let cleanup = tempdir().unwrap();
    write_file(reference.path(), "a.txt", b"H1-content");
    write_file(reference.path(), "b-elsewhere.txt", b"H2-content");
    write_file(cleanup.path(), "a.txt", b"H1-content");
    write_file(cleanup.path(), "b.txt", b"H2-content");

    let r = scan(reference.path());
    let c = vec![scan(cleanup.path())];
    let reconciler = Reconciler::with_defaults();

    let by_name = reconciler.duplicates(&r, &c, DuplicateMode::PathName);
    assert_eq!(by_name.total_cleanup_files(), 1);
    assert_eq!(by_name.groups[0].cleanup[0].relative, PathBuf::from("a.txt"));

    let by_hash = reconciler.duplicates(&r, &c, DuplicateMode::HashOnly);
    assert_eq!(by_hash.total_cleanup_files(), 2);
    let matched: Vec<_> = by_hash
        .cleanup_records()
        .map(|rec| rec.relative.clone())
        .collect();
    assert!(matched.contains(&PathBuf::from("b.txt")));
}

#[test]
fn test_groups_sorted_by_reference_then_cleanup_path() {
    let reference = tempdir().unwrap();
    let c1 = tempdir().unwrap();
    let c2 = tempdir().unwrap();
    write_file(reference.path(), "m.txt", b"mmm");
    write_file(reference.path(), "b.txt", b"bb");
    write_file(c1.path(), "copy-m.txt", b"mmm");
    write_file(c2.path(), "copy-m.txt", b"mmm");
    write_file(c2.path(), "copy-b.txt", b"bb");

    let set = Reconciler::with_defaults().duplicates(
        &scan(reference.path()),
        &[scan(c1.path()), scan(c2.path())],
        DuplicateMode::HashOnly,
    );

    assert_eq!(set.len(), 2);
    assert_eq!(set.groups[0].reference.relative, PathBuf::from("b.txt"));
    assert_eq!(set.groups[1].reference.relative, PathBuf::from("m.txt"));
    let paths = set.groups[1].cleanup_paths();
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted);
    assert_eq!(paths.len(), 2);
}

#[test]
fn test_hash_mode_is_idempotent() {
    let reference = tempdir().unwrap();
    let cleanup = tempdir().unwrap();
    write_file(reference.path(), "a.bin", b"alpha");
    write_file(reference.path(), "b.bin", b"bravo");
    write_file(cleanup.path(), "x/a.bin", b"alpha");
    write_file(cleanup.path(), "y/b.bin", b"bravo");
    write_file(cleanup.path(), "keep.bin", b"kilo!");

    let reconciler = Reconciler::with_defaults();
    let first = reconciler.duplicates(
        &scan(reference.path()),
        &[scan(cleanup.path())],
        DuplicateMode::HashOnly,
    );
    assert_eq!(first.total_cleanup_files(), 2);
    for record in first.cleanup_records() {
        fs::remove_file(&record.path).unwrap();
    }

    let second = reconciler.duplicates(
        &scan(reference.path()),
        &[scan(cleanup.path())],
        DuplicateMode::HashOnly,
    );
    assert!(second.is_empty());
}

#[test]
fn test_empty_files_match_each_other() {
    let reference = tempdir().unwrap();
    let cleanup = tempdir().unwrap();
    write_file(reference.path(), "empty", b"");
    write_file(cleanup.path(), "also-empty", b"");

    let set = Reconciler::with_defaults().duplicates(
        &scan(reference.path()),
        &[scan(cleanup.path())],
        DuplicateMode::HashOnly,
    );

    assert_eq!(set.total_cleanup_files(), 1);
    assert_eq!(set.reclaimable(), 0);
}

#[test]
fn test_reference_is_never_a_cleanup_entry() {
    let reference = tempdir().unwrap();
    let cleanup = tempdir().unwrap();
    write_file(reference.path(), "a.txt", b"same");
    write_file(reference.path(), "b.txt", b"same");
    write_file(cleanup.path(), "c.txt", b"same");

    let r = scan(reference.path());
    let set = Reconciler::with_defaults().duplicates(
        &r,
        &[scan(cleanup.path())],
        DuplicateMode::HashOnly,
    );

    for group in &set.groups {
        for record in &group.cleanup {
            assert!(!record.path.starts_with(reference.path()));
        }
    }
    assert_eq!(set.total_cleanup_files(), 1);
}
