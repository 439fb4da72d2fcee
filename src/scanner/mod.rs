//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Concurrent directory scanning on a bounded worker pool
//! - Whole-file content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery ([`TreeScanner`])
//! - [`hasher`]: BLAKE3 file hashing on a fixed worker pool ([`ContentHasher`])
//!
//! Scanning never reads file contents. Hashing is only requested for the
//! subset of records the reconciler could not classify by size alone.
//!
//! # Example
//!
//! ```no_run
//! use data_symmetry::scanner::{TreeScanner, WalkerConfig};
//! use std::path::Path;
//!
//! let scanner = TreeScanner::new(WalkerConfig::default());
//! let tree = scanner.scan(Path::new(".")).unwrap();
//! for record in tree.records() {
//!     println!("{}: {} bytes", record.relative.display(), record.size);
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// Re-export main types
pub use hasher::{hash_to_hex, ContentHasher, DigestMap, Hash, HasherConfig, MAX_HASH_WORKERS};
pub use walker::{Tree, TreeScanner, WalkerConfig};

/// Metadata for one regular file discovered under a scan root.
///
/// Identity is the absolute path. Everything except the content hash is
/// fixed at scan time; the hash slot is filled at most once, by the hashing
/// task that owns the record for the duration of the computation.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Root directory the file was discovered under
    pub root: PathBuf,
    /// Path relative to `root`
    pub relative: PathBuf,
    /// Absolute path (`root` joined with `relative`)
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    content_hash: OnceLock<Hash>,
}

impl FileRecord {
    /// Create a new record without a content hash.
    ///
    /// # Arguments
    ///
    /// * `root` - Scan root the file belongs to
    /// * `relative` - Path of the file relative to `root`
    /// * `size` - File size in bytes
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, relative: impl Into<PathBuf>, size: u64) -> Self {
        let root = root.into();
        let relative = relative.into();
        let path = root.join(&relative);
        Self {
            root,
            relative,
            path,
            size,
            content_hash: OnceLock::new(),
        }
    }

    /// The content digest, if this record has been hashed successfully.
    #[must_use]
    pub fn content_hash(&self) -> Option<&Hash> {
        self.content_hash.get()
    }

    /// Store the content digest.
    ///
    /// Returns `false` if a digest was already stored; the existing value
    /// is kept.
    pub(crate) fn set_content_hash(&self, hash: Hash) -> bool {
        self.content_hash.set(hash).is_ok()
    }

    /// File name component of the absolute path.
    #[must_use]
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }

    /// Whether this record lives under `dir`.
    #[must_use]
    pub fn is_under(&self, dir: &Path) -> bool {
        self.path.starts_with(dir)
    }
}

impl PartialEq for FileRecord {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FileRecord {}

impl std::hash::Hash for FileRecord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Errors that can occur while scanning a directory tree.
///
/// Only problems with the scan root itself are returned to the caller.
/// Unreadable subdirectories are skipped and counted on the [`Tree`].
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing the path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Check that `root` exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NotADirectory`, or `Io` describing the problem.
    pub fn check_root(root: &Path) -> Result<(), ScanError> {
        match std::fs::metadata(root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(root.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ScanError::NotFound(root.to_path_buf()))
            }
            Err(e) => Err(ScanError::Io {
                path: root.to_path_buf(),
                source: e,
            }),
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    pub(crate) fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
            _ => HashError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}
