use super::common::{listing, scan, write_file};
use data_symmetry::scanner::{ContentHasher, HasherConfig, TreeScanner, WalkerConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let tree = scan(dir.path());

    assert!(tree.is_empty());
    assert_eq!(tree.total_size(), 0);
}

#[test]
fn test_scan_records_relative_paths_and_sizes() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"12345");
    write_file(dir.path(), "sub/b.txt", b"");
    write_file(dir.path(), "sub/deeper/c.bin", &[0u8; 300]);

    let tree = scan(dir.path());

    assert_eq!(
        listing(&tree),
        vec![
            (PathBuf::from("a.txt"), 5),
            (PathBuf::from("sub/b.txt"), 0),
            (PathBuf::from("sub/deeper/c.bin"), 300),
        ]
    );
    let record = tree.get(&PathBuf::from("sub/deeper/c.bin")).unwrap();
    assert_eq!(record.path, dir.path().join("sub/deeper/c.bin"));
    assert!(record.content_hash().is_none());
}

#[test]
fn test_scan_is_repeatable() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write_file(dir.path(), &format!("d{}/e{}/f{}.txt", i % 3, i % 5, i), &vec![b'x'; i]);
    }

    let first = scan(dir.path());
    let second = TreeScanner::new(WalkerConfig::default().with_workers(1))
        .scan(dir.path())
        .unwrap();

    assert_eq!(listing(&first), listing(&second));
    assert_eq!(first.len(), 20);
}

#[test]
fn test_wide_tree_with_small_pool() {
    let dir = tempdir().unwrap();
    for i in 0..200 {
        write_file(dir.path(), &format!("dir{:03}/file.txt", i), b"x");
    }

    let tree = TreeScanner::new(WalkerConfig::default().with_workers(2))
        .scan(dir.path())
        .unwrap();

    assert_eq!(tree.len(), 200);
}

#[test]
fn test_scan_missing_root_fails() {
    let dir = tempdir().unwrap();
    let result = TreeScanner::new(WalkerConfig::default()).scan(&dir.path().join("missing"));
    assert!(result.is_err());
}

#[test]
fn test_scan_all_keeps_root_order() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    write_file(a.path(), "one.txt", b"1");
    write_file(b.path(), "two.txt", b"22");
    write_file(b.path(), "three.txt", b"333");

    let trees = TreeScanner::new(WalkerConfig::default())
        .scan_all(&[a.path().to_path_buf(), b.path().to_path_buf()])
        .unwrap();

    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].root(), a.path());
    assert_eq!(trees[0].len(), 1);
    assert_eq!(trees[1].len(), 2);
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write_file(dir.path(), "ok.txt", b"fine");
    write_file(dir.path(), "locked/hidden.txt", b"secret");
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let tree = scan(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.skipped_dirs(), 1);
}

#[test]
fn test_hasher_digests_scanned_records() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"same bytes");
    write_file(dir.path(), "b/a-copy.txt", b"same bytes");
    write_file(dir.path(), "c.txt", b"other bytes");

    let tree = scan(dir.path());
    let hasher = ContentHasher::new(HasherConfig::default().with_max_workers(3));
    let digests = hasher.hash(tree.records());

    assert_eq!(digests.len(), 3);
    let a = &tree.records()[0];
    let copy = &tree.records()[1];
    assert_eq!(digests[&a.path], digests[&copy.path]);
    assert_eq!(a.content_hash(), Some(&digests[&a.path]));
}
