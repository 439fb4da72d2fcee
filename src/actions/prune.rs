//! Empty-directory pruning after a cleanup run.
//!
//! Directories are visited deepest first, so a parent whose only contents
//! were empty subdirectories is removed in the same pass. The root itself
//! is never removed. In dry-run mode nothing is touched, but the same
//! cascade is computed and reported, treating the files a confirmed run
//! would remove as already gone.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Directories removed (or that would be removed) below one root.
#[derive(Debug, Default, Clone)]
pub struct PruneResult {
    /// Removed directories, deepest first.
    pub removed: Vec<PathBuf>,
    /// Directories that looked empty but could not be removed.
    pub failures: Vec<(PathBuf, String)>,
}

impl PruneResult {
    /// Number of removed directories.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: PruneResult) {
        self.removed.extend(other.removed);
        self.failures.extend(other.failures);
    }
}

/// Remove every empty directory strictly below `root`.
///
/// With `dry_run` set, directories are only reported, and files listed in
/// `pending` count as removed. `pending` is ignored on a real run.
pub fn prune_empty_dirs(root: &Path, dry_run: bool, pending: &HashSet<PathBuf>) -> PruneResult {
    let mut result = PruneResult::default();
    let mut gone: HashSet<PathBuf> = if dry_run {
        pending.iter().filter(|p| p.starts_with(root)).cloned().collect()
    } else {
        HashSet::new()
    };

    let walker = WalkDir::new(root)
        .follow_links(false)
        .contents_first(true)
        .min_depth(1);

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::debug!("Skipping during prune: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();

        if !is_effectively_empty(dir, &gone) {
            continue;
        }

        if dry_run {
            log::debug!("Would remove empty directory: {}", dir.display());
        } else if let Err(e) = fs::remove_dir(dir) {
            log::warn!("Failed to remove {}: {}", dir.display(), e);
            result.failures.push((dir.to_path_buf(), e.to_string()));
            continue;
        } else {
            log::info!("Removed empty directory: {}", dir.display());
        }

        gone.insert(dir.to_path_buf());
        result.removed.push(dir.to_path_buf());
    }

    result
}

fn is_effectively_empty(dir: &Path, gone: &HashSet<PathBuf>) -> bool {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .all(|child| gone.contains(&child.path())),
        Err(e) => {
            log::debug!("Cannot read {}: {}", dir.display(), e);
            false
        }
    }
}
