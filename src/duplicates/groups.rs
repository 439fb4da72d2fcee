//! Result types of reconciliation.
//!
//! # Overview
//!
//! - [`MatchKey`]: the attributes compared to decide equivalence under a
//!   [`DuplicateMode`]
//! - [`DuplicateGroup`] / [`DuplicateSet`]: the asymmetric result of
//!   reference-vs-cleanup reconciliation
//! - [`DivergenceReport`]: the symmetric result of comparing two trees under a
//!   [`HashTier`]
//!
//! # Example
//!
//! ```
//! use data_symmetry::duplicates::{DuplicateMode, MatchKey};
//! use data_symmetry::scanner::FileRecord;
//!
//! let record = FileRecord::new("/cleanup", "a.txt", 10);
//! let key = MatchKey::for_record(&record, DuplicateMode::PathName).unwrap();
//! assert_eq!(key, MatchKey::PathSize { relative: "a.txt".into(), size: 10 });
//!
//! // Content modes need a digest first.
//! assert!(MatchKey::for_record(&record, DuplicateMode::HashOnly).is_none());
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::scanner::{FileRecord, Hash};

/// How cleanup files are matched against the reference tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DuplicateMode {
    /// Same relative path and same size; no hashing.
    PathName,
    /// Same relative path and same content digest.
    PathHash,
    /// Same content digest, anywhere.
    HashOnly,
}

impl DuplicateMode {
    /// Whether this mode needs content digests.
    #[must_use]
    pub fn needs_hash(self) -> bool {
        !matches!(self, DuplicateMode::PathName)
    }
}

impl fmt::Display for DuplicateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateMode::PathName => write!(f, "path+name"),
            DuplicateMode::PathHash => write!(f, "path+hash"),
            DuplicateMode::HashOnly => write!(f, "hash"),
        }
    }
}

/// Divergence detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashTier {
    /// Path and size only; never reads file contents.
    #[default]
    Off,
    /// Hash only files missing by path whose size exists on the other side.
    Smart,
    /// Hash every file whose size exists on both sides.
    Strict,
}

impl fmt::Display for HashTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashTier::Off => write!(f, "off"),
            HashTier::Smart => write!(f, "smart"),
            HashTier::Strict => write!(f, "strict"),
        }
    }
}

/// Attributes compared to decide whether two records are equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchKey {
    /// `path+name` mode.
    PathSize {
        /// Relative path
        relative: PathBuf,
        /// Size in bytes
        size: u64,
    },
    /// `path+hash` mode.
    PathHash {
        /// Relative path
        relative: PathBuf,
        /// Content digest
        hash: Hash,
    },
    /// `hash` mode.
    Content(Hash),
}

impl MatchKey {
    /// Build the key for `record` under `mode`.
    ///
    /// Returns `None` for content modes when the record has no digest
    /// (not hashed, or unreadable). Such records never match anything.
    #[must_use]
    pub fn for_record(record: &FileRecord, mode: DuplicateMode) -> Option<Self> {
        match mode {
            DuplicateMode::PathName => Some(MatchKey::PathSize {
                relative: record.relative.clone(),
                size: record.size,
            }),
            DuplicateMode::PathHash => record.content_hash().map(|hash| MatchKey::PathHash {
                relative: record.relative.clone(),
                hash: *hash,
            }),
            DuplicateMode::HashOnly => record.content_hash().map(|hash| MatchKey::Content(*hash)),
        }
    }
}

/// One reference file and every cleanup file that duplicates it.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// Key shared by all members
    pub key: MatchKey,
    /// The protected reference file; never mutated, moved, or deleted
    pub reference: Arc<FileRecord>,
    /// Redundant cleanup files, sorted by absolute path
    pub cleanup: Vec<Arc<FileRecord>>,
}

impl DuplicateGroup {
    /// Create a group with its first cleanup member.
    #[must_use]
    pub fn new(key: MatchKey, reference: Arc<FileRecord>, first: Arc<FileRecord>) -> Self {
        Self {
            key,
            reference,
            cleanup: vec![first],
        }
    }

    /// Sort cleanup entries by absolute path.
    pub fn sort(&mut self) {
        self.cleanup.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Number of cleanup files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cleanup.len()
    }

    /// Check if the group has no cleanup files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cleanup.is_empty()
    }

    /// Bytes freed by removing every cleanup file.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.cleanup.iter().map(|f| f.size).sum()
    }

    /// Absolute paths of the cleanup files.
    #[must_use]
    pub fn cleanup_paths(&self) -> Vec<PathBuf> {
        self.cleanup.iter().map(|f| f.path.clone()).collect()
    }
}

/// Counters describing how much work a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Records considered on the probing side
    pub probed: usize,
    /// Records settled by size alone
    pub settled_by_size: usize,
    /// Records submitted for hashing
    pub hashed: usize,
    /// Records whose hashing failed
    pub hash_failures: usize,
}

impl ReconcileStats {
    /// Add another pass's counters to this one.
    pub fn absorb(&mut self, other: &ReconcileStats) {
        self.probed += other.probed;
        self.settled_by_size += other.settled_by_size;
        self.hashed += other.hashed;
        self.hash_failures += other.hash_failures;
    }
}

/// Redundant cleanup files grouped by their reference file.
#[derive(Debug, Clone)]
pub struct DuplicateSet {
    /// Mode used to match
    pub mode: DuplicateMode,
    /// Groups sorted by reference absolute path
    pub groups: Vec<DuplicateGroup>,
    /// Work counters
    pub stats: ReconcileStats,
}

impl DuplicateSet {
    /// A set with no groups.
    #[must_use]
    pub fn empty(mode: DuplicateMode) -> Self {
        Self {
            mode,
            groups: Vec::new(),
            stats: ReconcileStats::default(),
        }
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if there are no duplicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total cleanup files across all groups.
    #[must_use]
    pub fn total_cleanup_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::len).sum()
    }

    /// Total bytes held by cleanup files.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::reclaimable).sum()
    }

    /// Every cleanup file, in group order.
    pub fn cleanup_records(&self) -> impl Iterator<Item = &Arc<FileRecord>> {
        self.groups.iter().flat_map(|g| g.cleanup.iter())
    }
}

/// Differences between two trees A and B.
///
/// All path sets hold relative paths and iterate in sorted order.
#[derive(Debug, Clone, Default)]
pub struct DivergenceReport {
    /// Tier used to build the report
    pub tier: HashTier,
    /// Files of A with no counterpart in B
    pub only_in_a: BTreeSet<PathBuf>,
    /// Files of B with no counterpart in A
    pub only_in_b: BTreeSet<PathBuf>,
    /// Paths present in both with differing sizes (tier off only)
    pub size_mismatch: BTreeSet<PathBuf>,
    /// Files of A missing by path but whose content exists in B
    pub found_elsewhere_a: BTreeSet<PathBuf>,
    /// Files of B missing by path but whose content exists in A
    pub found_elsewhere_b: BTreeSet<PathBuf>,
    /// Paths present in both trees with equal size
    pub identical: usize,
    /// Work counters (both directions)
    pub stats: ReconcileStats,
}

impl DivergenceReport {
    /// Files present in B but missing from A.
    #[must_use]
    pub fn missing_in_a(&self) -> &BTreeSet<PathBuf> {
        &self.only_in_b
    }

    /// Files present in A but missing from B.
    #[must_use]
    pub fn missing_in_b(&self) -> &BTreeSet<PathBuf> {
        &self.only_in_a
    }

    /// Whether the trees agree under the tier used.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty() && self.size_mismatch.is_empty()
    }

    /// Whether `relative` was reported divergent on either side.
    #[must_use]
    pub fn is_divergent(&self, relative: &Path) -> bool {
        self.only_in_a.contains(relative)
            || self.only_in_b.contains(relative)
            || self.size_mismatch.contains(relative)
    }
}
