//! Shared fixtures for integration tests.

#![allow(dead_code)]

use data_symmetry::scanner::{Tree, TreeScanner, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Write `content` at `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Scan `root` with a small pool.
pub fn scan(root: &Path) -> Tree {
    TreeScanner::new(WalkerConfig::default().with_workers(4))
        .scan(root)
        .unwrap()
}

/// (relative path, size) pairs of a tree, sorted.
pub fn listing(tree: &Tree) -> Vec<(PathBuf, u64)> {
    tree.records()
        .iter()
        .map(|r| (r.relative.clone(), r.size))
        .collect()
}

/// Every file below `root` with its contents, sorted by path.
pub fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
        .collect();
    files.sort();
    files
}
