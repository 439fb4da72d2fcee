//! Deleting and relocating individual files.
//!
//! # Overview
//!
//! Each cleanup file is either removed ([`FileAction::Delete`]) or moved
//! into a flat target directory ([`FileAction::MoveTo`]). Before touching a
//! file its current size is compared against the scanned size; a file that
//! changed since the scan is reported as [`OperationError::Modified`] and
//! left alone.
//!
//! Moves never overwrite: if `target/<file name>` already exists the file is
//! reported as [`OperationError::DestinationExists`]. When source and target
//! live on different filesystems the file is copied and the source removed.
//!
//! Batch processing never stops at the first failure. Every failure is
//! recorded with its path in [`BatchResult::failures`].
//!
//! # Example
//!
//! ```no_run
//! use data_symmetry::actions::operation::{apply, FileAction, OperationConfig};
//! use std::path::Path;
//!
//! let action = FileAction::MoveTo("/mnt/quarantine".into());
//! match apply(Path::new("/mnt/old/dup.txt"), 42, &action, &OperationConfig::default()) {
//!     Ok(done) => println!("Moved to {}", done.destination.unwrap().display()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum OperationError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when touching the file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File size changed since the scan.
    #[error("file modified since scan: {path} (size {expected} -> {actual})")]
    Modified {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// A move would overwrite an existing file.
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// The source path has no file name component.
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),

    /// Removing the file failed.
    #[error("delete failed for {path}: {message}")]
    DeleteFailed { path: PathBuf, message: String },

    /// Moving the file failed.
    #[error("move failed for {path}: {message}")]
    MoveFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OperationError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::DestinationExists(p)
            | Self::NoFileName(p)
            | Self::Modified { path: p, .. }
            | Self::DeleteFailed { path: p, .. }
            | Self::MoveFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// What to do with each cleanup file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    /// Remove the file permanently.
    Delete,
    /// Move the file into this directory, keeping its file name.
    MoveTo(PathBuf),
}

impl FileAction {
    /// Verb used in prompts and summaries.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::MoveTo(_) => "move",
        }
    }

    /// Check whether this action moves files.
    #[must_use]
    pub fn is_move(&self) -> bool {
        matches!(self, Self::MoveTo(_))
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::MoveTo(dir) => write!(f, "move to {}", dir.display()),
        }
    }
}

/// Result of a successful operation on one file.
#[derive(Debug, Clone)]
pub struct OperationResult {
    /// File that was processed.
    pub path: PathBuf,
    /// Size of the file in bytes.
    pub size: u64,
    /// Where the file went, for moves.
    pub destination: Option<PathBuf>,
}

/// Results of a batch of operations.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Successfully processed files.
    pub successes: Vec<OperationResult>,
    /// Failed files with their errors.
    pub failures: Vec<OperationError>,
    /// Total bytes deleted or moved.
    pub bytes_processed: u64,
}

impl BatchResult {
    /// Number of successful operations.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed operations.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Total number of attempted operations.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Check if all operations succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary line.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!("Successfully processed {} duplicate files", self.success_count())
        } else {
            format!("{} operations failed", self.failure_count())
        }
    }
}

/// Configuration for file operations.
#[derive(Debug, Clone)]
pub struct OperationConfig {
    /// Refuse to touch files whose size changed since the scan.
    pub verify_size: bool,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self { verify_size: true }
    }
}

impl OperationConfig {
    /// Enable/disable size verification.
    #[must_use]
    pub fn with_verify_size(mut self, verify: bool) -> Self {
        self.verify_size = verify;
        self
    }
}

/// Callback trait for batch progress reporting.
pub trait OperationCallback {
    /// Called before each file is processed.
    fn on_before(&mut self, path: &Path, index: usize, total: usize);

    /// Called after a file was processed.
    fn on_success(&mut self, result: &OperationResult);

    /// Called after a file failed.
    fn on_failure(&mut self, error: &OperationError);
}

/// Callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpCallback;

impl OperationCallback for NoOpCallback {
    fn on_before(&mut self, _path: &Path, _index: usize, _total: usize) {}
    fn on_success(&mut self, _result: &OperationResult) {}
    fn on_failure(&mut self, _error: &OperationError) {}
}

/// Apply `action` to one file that had `expected_size` bytes when scanned.
///
/// # Errors
///
/// - `NotFound` / `PermissionDenied` if the file cannot be inspected
/// - `Modified` if size verification is enabled and the size changed
/// - `DestinationExists` if a move would overwrite a file
/// - `DeleteFailed` / `MoveFailed` if the filesystem operation fails
pub fn apply(
    path: &Path,
    expected_size: u64,
    action: &FileAction,
    config: &OperationConfig,
) -> Result<OperationResult, OperationError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| OperationError::from_io(path, e))?;
    let size = metadata.len();

    if config.verify_size && size != expected_size {
        log::warn!(
            "File modified since scan: {} (size changed from {} to {})",
            path.display(),
            expected_size,
            size
        );
        return Err(OperationError::Modified {
            path: path.to_path_buf(),
            expected: expected_size,
            actual: size,
        });
    }

    match action {
        FileAction::Delete => {
            fs::remove_file(path).map_err(|e| {
                log::error!("Delete failed for {}: {}", path.display(), e);
                OperationError::DeleteFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            })?;
            log::info!("Deleted: {} ({} bytes)", path.display(), size);
            Ok(OperationResult {
                path: path.to_path_buf(),
                size,
                destination: None,
            })
        }
        FileAction::MoveTo(target_dir) => {
            let destination = move_into(path, target_dir)?;
            log::info!(
                "Moved: {} -> {} ({} bytes)",
                path.display(),
                destination.display(),
                size
            );
            Ok(OperationResult {
                path: path.to_path_buf(),
                size,
                destination: Some(destination),
            })
        }
    }
}

/// Destination of `path` when moved into `target_dir`.
///
/// # Errors
///
/// Returns `NoFileName` if `path` ends in `..` or is a root.
pub fn destination_for(path: &Path, target_dir: &Path) -> Result<PathBuf, OperationError> {
    path.file_name()
        .map(|name| target_dir.join(name))
        .ok_or_else(|| OperationError::NoFileName(path.to_path_buf()))
}

fn move_into(path: &Path, target_dir: &Path) -> Result<PathBuf, OperationError> {
    let destination = destination_for(path, target_dir)?;

    fs::create_dir_all(target_dir).map_err(|e| OperationError::MoveFailed {
        path: path.to_path_buf(),
        message: format!("cannot create {}: {}", target_dir.display(), e),
    })?;

    if fs::symlink_metadata(&destination).is_ok() {
        return Err(OperationError::DestinationExists(destination));
    }

    match fs::rename(path, &destination) {
        Ok(()) => Ok(destination),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                "Cross-device move, copying {} to {}",
                path.display(),
                destination.display()
            );
            copy_then_remove(path, &destination)?;
            Ok(destination)
        }
        Err(e) => {
            log::error!("Move failed for {}: {}", path.display(), e);
            Err(OperationError::MoveFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    }
}

fn copy_then_remove(path: &Path, destination: &Path) -> Result<(), OperationError> {
    let move_failed = |e: io::Error| OperationError::MoveFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut source = fs::File::open(path).map_err(move_failed)?;
    let mut target = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                OperationError::DestinationExists(destination.to_path_buf())
            } else {
                move_failed(e)
            }
        })?;

    if let Err(e) = io::copy(&mut source, &mut target).and_then(|_| target.sync_all()) {
        drop(target);
        let _ = fs::remove_file(destination);
        return Err(move_failed(e));
    }

    fs::remove_file(path).map_err(move_failed)
}

/// Apply `action` to every `(path, scanned size)` pair.
///
/// Processes all files regardless of individual failures.
pub fn process_batch<C: OperationCallback>(
    files: &[(PathBuf, u64)],
    action: &FileAction,
    config: &OperationConfig,
    callback: &mut C,
) -> BatchResult {
    let mut result = BatchResult::default();
    let total = files.len();

    for (index, (path, size)) in files.iter().enumerate() {
        callback.on_before(path, index, total);

        match apply(path, *size, action, config) {
            Ok(done) => {
                result.bytes_processed += done.size;
                callback.on_success(&done);
                result.successes.push(done);
            }
            Err(e) => {
                log::warn!("Failed to process {}: {}", path.display(), e);
                callback.on_failure(&e);
                result.failures.push(e);
            }
        }
    }

    log::info!(
        "Batch {} complete: {} succeeded, {} failed",
        action.verb(),
        result.success_count(),
        result.failure_count()
    );

    result
}
