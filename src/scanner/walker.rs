//! Concurrent tree scanner.
//!
//! # Overview
//!
//! This module provides the [`TreeScanner`] struct for enumerating every
//! regular file under a root directory without reading file contents.
//!
//! # Concurrency
//!
//! Every discovered directory becomes an independent task on a bounded rayon
//! pool, so the pool's queue doubles as the directory work queue. Tasks never
//! touch shared state: each one sends [`ScanEvent`]s into a channel that is
//! drained by exactly one consumer thread, which folds them into the final
//! [`Tree`]. The fold is exposed as [`merge_events`] so it can be exercised
//! without a filesystem.
//!
//! # Errors
//!
//! A directory that cannot be listed is skipped and counted, never fatal.
//! Only a missing or non-directory root fails the scan.
//!
//! # Example
//!
//! ```no_run
//! use data_symmetry::scanner::{TreeScanner, WalkerConfig};
//! use std::path::Path;
//!
//! let scanner = TreeScanner::new(WalkerConfig::default());
//! let tree = scanner.scan(Path::new("/home/user/Downloads")).unwrap();
//! println!("{} files, {} skipped directories", tree.len(), tree.skipped_dirs());
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use super::{FileRecord, ScanError};
use crate::progress::{ProgressCallback, PHASE_SCAN};

/// Configuration for tree scanning.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Number of worker threads servicing the directory queue.
    pub workers: usize,

    /// Follow symbolic links to files and directories.
    /// Warning: symlink cycles are not detected.
    pub follow_symlinks: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            workers: default_scan_workers(),
            follow_symlinks: false,
        }
    }
}

impl WalkerConfig {
    /// Set the worker count (at least 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Enable/disable following symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Default scan pool size: one worker per available CPU.
#[must_use]
pub fn default_scan_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
}

/// The set of files produced by scanning one root.
///
/// Records are stored sorted by relative path, so iteration order is
/// deterministic no matter how the concurrent scan interleaved.
#[derive(Debug, Clone)]
pub struct Tree {
    root: PathBuf,
    records: Vec<Arc<FileRecord>>,
    by_relative: HashMap<PathBuf, usize>,
    skipped_dirs: usize,
}

impl Tree {
    /// Build a tree from already-discovered records.
    ///
    /// Records are sorted by relative path. If two records share a relative
    /// path, the later one wins.
    #[must_use]
    pub fn from_records(root: impl Into<PathBuf>, records: Vec<FileRecord>) -> Self {
        let root = root.into();
        let mut unique: HashMap<PathBuf, FileRecord> = HashMap::with_capacity(records.len());
        for record in records {
            debug_assert!(
                !unique.contains_key(&record.relative),
                "duplicate relative path in tree: {}",
                record.relative.display()
            );
            unique.insert(record.relative.clone(), record);
        }

        let mut records: Vec<Arc<FileRecord>> = unique.into_values().map(Arc::new).collect();
        records.sort_by(|a, b| a.relative.cmp(&b.relative));

        let by_relative = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.relative.clone(), i))
            .collect();

        Self {
            root,
            records,
            by_relative,
            skipped_dirs: 0,
        }
    }

    /// Root directory this tree was scanned from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All records, sorted by relative path.
    #[must_use]
    pub fn records(&self) -> &[Arc<FileRecord>] {
        &self.records
    }

    /// Look up a record by its relative path.
    #[must_use]
    pub fn get(&self, relative: &Path) -> Option<&Arc<FileRecord>> {
        self.by_relative.get(relative).map(|&i| &self.records[i])
    }

    /// Whether a record with the same relative path and size exists.
    #[must_use]
    pub fn contains_path_and_size(&self, record: &FileRecord) -> bool {
        self.get(&record.relative)
            .is_some_and(|other| other.size == record.size)
    }

    /// Number of files in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the tree has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of directories that could not be listed and were left out.
    #[must_use]
    pub fn skipped_dirs(&self) -> usize {
        self.skipped_dirs
    }

    /// Total size of all files in bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }
}

/// A message sent from a directory task to the merge consumer.
#[derive(Debug)]
pub enum ScanEvent {
    /// A regular file was found.
    File {
        /// Path relative to the scan root
        relative: PathBuf,
        /// Size in bytes
        size: u64,
    },
    /// A directory could not be listed and was skipped.
    SkippedDir {
        /// The unreadable directory
        path: PathBuf,
        /// Why it was skipped
        reason: String,
    },
}

/// Fold scan events into a [`Tree`].
///
/// This is the single merge point of a scan: it runs on one thread and is
/// the only code that touches the accumulating record list. It returns when
/// every sender has been dropped.
pub fn merge_events(
    root: &Path,
    events: Receiver<ScanEvent>,
    progress: Option<&dyn ProgressCallback>,
) -> Tree {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for event in events {
        match event {
            ScanEvent::File { relative, size } => {
                if let Some(cb) = progress {
                    cb.on_progress(records.len() + 1, relative.to_string_lossy().as_ref());
                }
                records.push(FileRecord::new(root, relative, size));
            }
            ScanEvent::SkippedDir { path, reason } => {
                log::warn!("Skipping unreadable directory {}: {}", path.display(), reason);
                skipped += 1;
            }
        }
    }

    let mut tree = Tree::from_records(root, records);
    tree.skipped_dirs = skipped;
    tree
}

/// Shared, read-only state for the directory tasks of one scan.
struct ScanContext {
    root: PathBuf,
    follow_symlinks: bool,
    events: Sender<ScanEvent>,
}

impl ScanContext {
    fn emit_file(&self, path: &Path, size: u64) {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            log::debug!("Path escaped scan root: {}", path.display());
            return;
        };
        // The consumer only goes away once every sender is dropped.
        let _ = self.events.send(ScanEvent::File {
            relative: relative.to_path_buf(),
            size,
        });
    }

    fn emit_skipped(&self, path: PathBuf, reason: String) {
        let _ = self.events.send(ScanEvent::SkippedDir { path, reason });
    }
}

/// Concurrent directory-tree scanner.
///
/// Uses a bounded rayon pool; each directory is one task. File contents are
/// never read.
pub struct TreeScanner {
    config: WalkerConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for TreeScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeScanner")
            .field("config", &self.config)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl TreeScanner {
    /// Create a new scanner.
    #[must_use]
    pub fn new(config: WalkerConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Scanner configuration.
    #[must_use]
    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    /// Scan one root directory.
    ///
    /// # Errors
    ///
    /// Returns `ScanError` only if `root` is missing, not a directory, or the
    /// worker pool cannot be created. Unreadable subdirectories are skipped.
    pub fn scan(&self, root: &Path) -> Result<Tree, ScanError> {
        ScanError::check_root(root)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .thread_name(|i| format!("ds-scan-{}", i))
            .build()
            .map_err(|e| ScanError::Io {
                path: root.to_path_buf(),
                source: std::io::Error::other(e),
            })?;

        log::info!(
            "Scanning {} with {} workers",
            root.display(),
            self.config.workers
        );
        if let Some(ref cb) = self.progress {
            cb.on_phase_start(PHASE_SCAN, 0);
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        let ctx = ScanContext {
            root: root.to_path_buf(),
            follow_symlinks: self.config.follow_symlinks,
            events: tx,
        };
        let progress = self.progress.as_deref();

        let tree = std::thread::scope(|s| {
            let consumer = s.spawn(move || merge_events(root, rx, progress));

            pool.scope(|scope| scan_dir(scope, &ctx, root.to_path_buf()));
            // Closing the last sender lets the consumer finish.
            drop(ctx);

            consumer
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        });

        if let Some(ref cb) = self.progress {
            cb.on_phase_end(PHASE_SCAN);
        }
        log::info!(
            "Found {} files in {} ({} directories skipped)",
            tree.len(),
            root.display(),
            tree.skipped_dirs()
        );

        Ok(tree)
    }

    /// Scan several roots concurrently.
    ///
    /// Results are returned in the same order as `roots`.
    ///
    /// # Errors
    ///
    /// Returns the first root-level `ScanError` encountered.
    pub fn scan_all(&self, roots: &[PathBuf]) -> Result<Vec<Tree>, ScanError> {
        std::thread::scope(|s| {
            let handles: Vec<_> = roots
                .iter()
                .map(|root| s.spawn(move || self.scan(root)))
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
                .collect()
        })
    }
}

/// List one directory, emit its files, and spawn a task per subdirectory.
fn scan_dir<'s>(scope: &rayon::Scope<'s>, ctx: &'s ScanContext, dir: PathBuf) {
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            ctx.emit_skipped(dir, e.to_string());
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                log::debug!("Cannot stat {}: {}", path.display(), e);
                continue;
            }
        };

        if file_type.is_dir() {
            scope.spawn(move |s| scan_dir(s, ctx, path));
        } else if file_type.is_file() {
            match entry.metadata() {
                Ok(meta) => ctx.emit_file(&path, meta.len()),
                Err(e) => log::debug!("Cannot stat {}: {}", path.display(), e),
            }
        } else if file_type.is_symlink() {
            if !ctx.follow_symlinks {
                log::trace!("Skipping symlink: {}", path.display());
                continue;
            }
            match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => scope.spawn(move |s| scan_dir(s, ctx, path)),
                Ok(meta) if meta.is_file() => ctx.emit_file(&path, meta.len()),
                Ok(_) => log::trace!("Skipping special file behind symlink: {}", path.display()),
                Err(e) => log::debug!("Dangling symlink {}: {}", path.display(), e),
            }
        } else {
            log::trace!("Skipping special file: {}", path.display());
        }
    }
}
