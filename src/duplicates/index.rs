//! Size buckets for candidate narrowing.
//!
//! Two files of different sizes can never have equal content, so a record
//! whose size does not occur on the other side of a comparison is settled
//! without reading a byte. [`SizeIndex`] is built once per reconciliation
//! pass and is read-only afterwards.
//!
//! # Example
//!
//! ```
//! use data_symmetry::duplicates::SizeIndex;
//! use data_symmetry::scanner::{FileRecord, Tree};
//!
//! let tree = Tree::from_records(
//!     "/data",
//!     vec![
//!         FileRecord::new("/data", "a.txt", 10),
//!         FileRecord::new("/data", "b.txt", 10),
//!         FileRecord::new("/data", "c.txt", 20),
//!     ],
//! );
//! let index = SizeIndex::build([&tree]);
//!
//! assert!(index.contains_size(10));
//! assert_eq!(index.bucket(10).len(), 2);
//! assert!(!index.contains_size(30));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::scanner::{FileRecord, Tree};

/// Records grouped by exact byte size.
#[derive(Debug, Clone, Default)]
pub struct SizeIndex {
    buckets: HashMap<u64, Vec<Arc<FileRecord>>>,
    records: usize,
}

impl SizeIndex {
    /// Build an index over every record of the given trees.
    #[must_use]
    pub fn build<'a>(trees: impl IntoIterator<Item = &'a Tree>) -> Self {
        Self::from_records(trees.into_iter().flat_map(|t| t.records().iter()))
    }

    /// Build an index over an arbitrary record set.
    #[must_use]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Arc<FileRecord>>) -> Self {
        let mut buckets: HashMap<u64, Vec<Arc<FileRecord>>> = HashMap::new();
        let mut count = 0usize;
        for record in records {
            buckets
                .entry(record.size)
                .or_default()
                .push(Arc::clone(record));
            count += 1;
        }
        Self {
            buckets,
            records: count,
        }
    }

    /// Whether any record of `size` bytes exists.
    #[must_use]
    pub fn contains_size(&self, size: u64) -> bool {
        self.buckets.contains_key(&size)
    }

    /// All records of `size` bytes (empty if none).
    #[must_use]
    pub fn bucket(&self, size: u64) -> &[Arc<FileRecord>] {
        self.buckets
            .get(&size)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct sizes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of indexed records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Iterate over the distinct sizes.
    pub fn sizes(&self) -> impl Iterator<Item = u64> + '_ {
        self.buckets.keys().copied()
    }
}
