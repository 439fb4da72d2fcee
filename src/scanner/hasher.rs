//! BLAKE3 content hasher on a bounded worker pool.
//!
//! # Overview
//!
//! [`ContentHasher`] computes a digest of the *entire* byte stream of each
//! requested file. Content equality is then decided by digest equality, not
//! by a byte-for-byte comparison: BLAKE3 is collision resistant, so two
//! files with equal digests are treated as identical. Callers that need a
//! byte-level guarantee must compare the files themselves.
//!
//! # Concurrency
//!
//! Records are pushed onto a work queue that a fixed number of workers
//! (`min(records, max_workers)`, never more than [`MAX_HASH_WORKERS`])
//! consume. Each worker sends `(path, digest)` pairs to one result channel
//! that the calling thread drains into the returned [`DigestMap`]. Results
//! are correlated by path, not by arrival order.
//!
//! # Failures
//!
//! A file that cannot be opened or read to completion is dropped from the
//! result and logged. It is never reported with a partial digest.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{FileRecord, HashError};
use crate::progress::{ProgressCallback, PHASE_HASH};

/// BLAKE3 digest (32 bytes).
pub type Hash = [u8; 32];

/// Digests keyed by absolute path.
pub type DigestMap = HashMap<PathBuf, Hash>;

/// Upper bound on hashing workers.
pub const MAX_HASH_WORKERS: usize = 32;

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Render a digest as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}

/// Configuration for the content hasher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasherConfig {
    /// Maximum number of concurrent workers (clamped to 1..=[`MAX_HASH_WORKERS`]).
    pub max_workers: usize,
    /// Read buffer size in bytes.
    pub buffer_size: usize,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            max_workers: MAX_HASH_WORKERS,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl HasherConfig {
    /// Set the worker upper bound.
    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.clamp(1, MAX_HASH_WORKERS);
        self
    }

    /// Set the read buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes.max(1);
        self
    }

    /// Number of workers to start for `pending` files.
    #[must_use]
    pub fn workers_for(&self, pending: usize) -> usize {
        pending
            .min(self.max_workers.clamp(1, MAX_HASH_WORKERS))
            .max(1)
    }
}

/// Whole-file BLAKE3 hasher.
pub struct ContentHasher {
    config: HasherConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHasher")
            .field("config", &self.config)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(HasherConfig::default())
    }
}

impl ContentHasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new(config: HasherConfig) -> Self {
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

    /// Hasher configuration.
    #[must_use]
    pub fn config(&self) -> &HasherConfig {
        &self.config
    }

    /// Hash the full contents of a single file.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if the file cannot be opened or read to the end.
    pub fn hash_file(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.config.buffer_size.max(1)];

        loop {
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            }
        }

        Ok(*hasher.finalize().as_bytes())
    }

    /// Hash a set of records.
    ///
    /// Records that already carry a digest are not read again. Records are
    /// deduplicated by path. Every successful digest is also stored on its
    /// record. Unreadable files are absent from the returned map.
    pub fn hash(&self, records: &[Arc<FileRecord>]) -> DigestMap {
        let mut digests = DigestMap::with_capacity(records.len());
        let mut seen: HashSet<&Path> = HashSet::with_capacity(records.len());
        let mut pending: Vec<Arc<FileRecord>> = Vec::new();

        for record in records {
            if !seen.insert(record.path.as_path()) {
                continue;
            }
            match record.content_hash() {
                Some(hash) => {
                    digests.insert(record.path.clone(), *hash);
                }
                None => pending.push(Arc::clone(record)),
            }
        }

        if pending.is_empty() {
            return digests;
        }

        let total = pending.len();
        let workers = self.config.workers_for(total);
        log::debug!(
            "Hashing {} files with {} workers ({} already hashed)",
            total,
            workers,
            digests.len()
        );
        if let Some(ref cb) = self.progress {
            cb.on_phase_start(PHASE_HASH, total);
        }

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Arc<FileRecord>>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<(PathBuf, Hash)>();
        for record in pending {
            // The receiver is alive until the workers are joined.
            let _ = job_tx.send(record);
        }
        drop(job_tx);

        let mut failed = 0usize;
        std::thread::scope(|s| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                s.spawn(move || {
                    for record in jobs {
                        match self.hash_file(&record.path) {
                            Ok(hash) => {
                                record.set_content_hash(hash);
                                let _ = results.send((record.path.clone(), hash));
                            }
                            Err(e) => {
                                log::warn!("Failed to hash {}: {}", record.path.display(), e);
                            }
                        }
                    }
                });
            }
            drop(result_tx);

            // Single merge point.
            let mut received = 0usize;
            for (path, hash) in result_rx {
                received += 1;
                if let Some(ref cb) = self.progress {
                    cb.on_progress(received, path.to_string_lossy().as_ref());
                }
                digests.insert(path, hash);
            }
            failed = total - received;
        });

        if let Some(ref cb) = self.progress {
            cb.on_phase_end(PHASE_HASH);
        }
        if failed > 0 {
            log::warn!("{} of {} files could not be hashed", failed, total);
        }

        digests
    }
}
