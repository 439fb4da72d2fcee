//! Tiered reconciliation of scanned trees.
//!
//! # Overview
//!
//! Both workflows run through one matching procedure, [`Reconciler::match_probes`]:
//!
//! 1. **Narrow**: every probe record is checked against the other side
//!    without reading contents. In content mode a probe survives only if a
//!    record of the same size exists anywhere on the other side; in path
//!    modes only if the same relative path exists with the same size.
//!    Everything else is settled as unmatched on the spot.
//! 2. **Hash** (content modes only): surviving probes plus the other-side
//!    records they could match go to the [`ContentHasher`] as one batch.
//! 3. **Key**: the other side's candidates are indexed by [`MatchKey`] and
//!    each surviving probe is looked up.
//!
//! Divergence tiers call it once per direction (A into B, then B into A)
//! with content keys; duplicate elimination calls it once with cleanup
//! records as probes and the reference tree as the other side.
//!
//! Unreadable files drop out of hashing and therefore never match, so they
//! are reported divergent and never classified as duplicates.
//!
//! # Example
//!
//! ```no_run
//! use data_symmetry::duplicates::{HashTier, Reconciler};
//! use data_symmetry::scanner::{TreeScanner, WalkerConfig};
//! use std::path::Path;
//!
//! let scanner = TreeScanner::new(WalkerConfig::default());
//! let a = scanner.scan(Path::new("/mnt/a")).unwrap();
//! let b = scanner.scan(Path::new("/mnt/b")).unwrap();
//!
//! let report = Reconciler::with_defaults().divergence(&a, &b, HashTier::Smart);
//! println!("{} files missing from B", report.missing_in_b().len());
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use super::groups::{
    DivergenceReport, DuplicateGroup, DuplicateMode, DuplicateSet, HashTier, MatchKey,
    ReconcileStats,
};
use super::index::SizeIndex;
use crate::scanner::{ContentHasher, FileRecord, Tree};

/// The side probes are matched against: a tree plus its size buckets.
#[derive(Debug)]
pub struct Side<'a> {
    tree: &'a Tree,
    sizes: SizeIndex,
}

impl<'a> Side<'a> {
    /// Index `tree` for matching.
    #[must_use]
    pub fn new(tree: &'a Tree) -> Self {
        Self {
            tree,
            sizes: SizeIndex::build([tree]),
        }
    }

    /// The underlying tree.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        self.tree
    }

    /// Size buckets of the tree.
    #[must_use]
    pub fn sizes(&self) -> &SizeIndex {
        &self.sizes
    }
}

/// Outcome of matching a probe set against one side.
#[derive(Debug, Default)]
pub struct Matching {
    /// Probes that found an equivalent record: (key, probe, other-side record)
    pub matched: Vec<(MatchKey, Arc<FileRecord>, Arc<FileRecord>)>,
    /// Probes with no equivalent record
    pub unmatched: Vec<Arc<FileRecord>>,
    /// Work counters
    pub stats: ReconcileStats,
}

/// Probes split by the narrowing step.
struct Narrowed {
    ambiguous: Vec<Arc<FileRecord>>,
    candidates: Vec<Arc<FileRecord>>,
    settled: Vec<Arc<FileRecord>>,
}

/// Applies the tiered matching policy.
#[derive(Debug)]
pub struct Reconciler {
    hasher: ContentHasher,
}

impl Reconciler {
    /// Create a reconciler hashing with `hasher`.
    #[must_use]
    pub fn new(hasher: ContentHasher) -> Self {
        Self { hasher }
    }

    /// Create a reconciler with the default hasher.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ContentHasher::default())
    }

    /// The hasher used for content tiers.
    #[must_use]
    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    /// Match `probes` against `side` under `mode`.
    ///
    /// This is the one matching procedure behind every tier and mode.
    /// Content digests are only computed for probes that survive narrowing
    /// and for the other-side records they could match. When several
    /// other-side records share a key, the one with the smallest absolute
    /// path is reported.
    pub fn match_probes(
        &self,
        probes: Vec<Arc<FileRecord>>,
        side: &Side<'_>,
        mode: DuplicateMode,
    ) -> Matching {
        let mut stats = ReconcileStats {
            probed: probes.len(),
            ..ReconcileStats::default()
        };

        let narrowed = match mode {
            DuplicateMode::HashOnly => narrow_by_size(probes, side.sizes()),
            DuplicateMode::PathName | DuplicateMode::PathHash => {
                narrow_by_path(probes, side.tree())
            }
        };
        stats.settled_by_size = narrowed.settled.len();
        log::debug!(
            "Narrowed {} probes: {} ambiguous against {} candidates, {} settled",
            stats.probed,
            narrowed.ambiguous.len(),
            narrowed.candidates.len(),
            narrowed.settled.len()
        );

        if mode.needs_hash() && !narrowed.ambiguous.is_empty() {
            let mut batch = narrowed.ambiguous.clone();
            batch.extend(narrowed.candidates.iter().cloned());
            let distinct: HashSet<&PathBuf> = batch.iter().map(|r| &r.path).collect();
            let requested = distinct.len();

            let digests = self.hasher.hash(&batch);
            stats.hashed = requested;
            stats.hash_failures = requested.saturating_sub(digests.len());
        }

        let index = index_by_key(&narrowed.candidates, mode);
        let mut matching = Matching {
            stats,
            unmatched: narrowed.settled,
            ..Matching::default()
        };

        for probe in narrowed.ambiguous {
            let hit = MatchKey::for_record(&probe, mode)
                .and_then(|key| index.get(&key).map(|other| (key, Arc::clone(other))));
            match hit {
                Some((key, other)) => matching.matched.push((key, probe, other)),
                None => matching.unmatched.push(probe),
            }
        }

        matching
    }

    /// Compare two trees and report what diverges under `tier`.
    ///
    /// - [`HashTier::Off`]: pure path arithmetic, plus size mismatches for
    ///   paths present in both trees.
    /// - [`HashTier::Smart`]: files missing by path (or present with a
    ///   different size) are looked up by content among same-size files of
    ///   the other tree.
    /// - [`HashTier::Strict`]: every file is looked up by content among
    ///   same-size files of the other tree, regardless of path.
    ///
    /// Each direction is reconciled independently.
    #[must_use]
    pub fn divergence(&self, a: &Tree, b: &Tree, tier: HashTier) -> DivergenceReport {
        log::info!(
            "Comparing {} ({} files) with {} ({} files), hashing: {}",
            a.root().display(),
            a.len(),
            b.root().display(),
            b.len(),
            tier
        );

        let mut report = DivergenceReport {
            tier,
            ..DivergenceReport::default()
        };

        for record in a.records() {
            match b.get(&record.relative) {
                Some(other) if other.size == record.size => report.identical += 1,
                Some(_) if tier == HashTier::Off => {
                    report.size_mismatch.insert(record.relative.clone());
                }
                _ => {}
            }
        }

        let side_a = Side::new(a);
        let side_b = Side::new(b);

        let (only_in_a, found_a, stats_a) = self.diverging_side(a, &side_b, tier);
        let (only_in_b, found_b, stats_b) = self.diverging_side(b, &side_a, tier);

        report.only_in_a = only_in_a;
        report.only_in_b = only_in_b;
        report.found_elsewhere_a = found_a;
        report.found_elsewhere_b = found_b;
        report.stats.absorb(&stats_a);
        report.stats.absorb(&stats_b);

        log::info!(
            "Divergence: {} only in A, {} only in B, {} size mismatches, {} files hashed",
            report.only_in_a.len(),
            report.only_in_b.len(),
            report.size_mismatch.len(),
            report.stats.hashed
        );

        report
    }

    /// Reconcile one direction: which files of `tree` have no counterpart on `other`.
    fn diverging_side(
        &self,
        tree: &Tree,
        other: &Side<'_>,
        tier: HashTier,
    ) -> (BTreeSet<PathBuf>, BTreeSet<PathBuf>, ReconcileStats) {
        let other_tree = other.tree();
        let probes: Vec<Arc<FileRecord>> = tree
            .records()
            .iter()
            .filter(|r| match tier {
                HashTier::Off => other_tree.get(&r.relative).is_none(),
                HashTier::Smart => !other_tree.contains_path_and_size(r),
                HashTier::Strict => true,
            })
            .cloned()
            .collect();

        if tier == HashTier::Off {
            let stats = ReconcileStats {
                probed: probes.len(),
                ..ReconcileStats::default()
            };
            let divergent = probes.iter().map(|r| r.relative.clone()).collect();
            return (divergent, BTreeSet::new(), stats);
        }

        let matching = self.match_probes(probes, other, DuplicateMode::HashOnly);

        let divergent = matching
            .unmatched
            .iter()
            .map(|r| r.relative.clone())
            .collect();
        let found_elsewhere = matching
            .matched
            .iter()
            .filter(|(_, probe, _)| !other_tree.contains_path_and_size(probe))
            .map(|(_, probe, _)| probe.relative.clone())
            .collect();

        (divergent, found_elsewhere, matching.stats)
    }

    /// Find cleanup files that are redundant with the reference tree.
    ///
    /// Cleanup records located inside the reference root are never
    /// considered. Groups are sorted by reference path; cleanup entries
    /// within a group by their own path. Cleanup files with identical keys
    /// are all kept as separate entries.
    #[must_use]
    pub fn duplicates(
        &self,
        reference: &Tree,
        cleanup: &[Tree],
        mode: DuplicateMode,
    ) -> DuplicateSet {
        log::info!("Finding duplicates using {} mode...", mode);

        let probes: Vec<Arc<FileRecord>> = cleanup
            .iter()
            .flat_map(|t| t.records().iter())
            .filter(|r| {
                let protected = r.is_under(reference.root());
                if protected {
                    log::warn!(
                        "Ignoring cleanup file inside the reference tree: {}",
                        r.path.display()
                    );
                }
                !protected
            })
            .cloned()
            .collect();

        let side = Side::new(reference);
        let matching = self.match_probes(probes, &side, mode);

        let mut groups: HashMap<MatchKey, DuplicateGroup> = HashMap::new();
        for (key, probe, reference_record) in matching.matched {
            if probe.path == reference_record.path {
                continue;
            }
            match groups.get_mut(&key) {
                Some(group) => group.cleanup.push(probe),
                None => {
                    groups.insert(
                        key.clone(),
                        DuplicateGroup::new(key, reference_record, probe),
                    );
                }
            }
        }

        let mut groups: Vec<DuplicateGroup> = groups.into_values().collect();
        for group in &mut groups {
            group.sort();
        }
        groups.sort_by(|a, b| a.reference.path.cmp(&b.reference.path));

        log::info!("Found {} duplicate groups", groups.len());

        DuplicateSet {
            mode,
            groups,
            stats: matching.stats,
        }
    }
}

/// Keep probes whose size occurs on the other side; collect those buckets.
fn narrow_by_size(probes: Vec<Arc<FileRecord>>, sizes: &SizeIndex) -> Narrowed {
    let mut ambiguous = Vec::new();
    let mut settled = Vec::new();
    let mut wanted: BTreeSet<u64> = BTreeSet::new();

    for probe in probes {
        if sizes.contains_size(probe.size) {
            wanted.insert(probe.size);
            ambiguous.push(probe);
        } else {
            log::trace!("Settled by size: {}", probe.path.display());
            settled.push(probe);
        }
    }

    let mut candidates: Vec<Arc<FileRecord>> = wanted
        .into_iter()
        .flat_map(|size| sizes.bucket(size).iter().cloned())
        .collect();
    candidates.sort_by(|a, b| a.path.cmp(&b.path));

    Narrowed {
        ambiguous,
        candidates,
        settled,
    }
}

/// Keep probes whose relative path exists on the other side with equal size.
fn narrow_by_path(probes: Vec<Arc<FileRecord>>, tree: &Tree) -> Narrowed {
    let mut ambiguous = Vec::new();
    let mut settled = Vec::new();
    let mut candidates: Vec<Arc<FileRecord>> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for probe in probes {
        match tree.get(&probe.relative) {
            Some(other) if other.size == probe.size => {
                if seen.insert(other.path.clone()) {
                    candidates.push(Arc::clone(other));
                }
                ambiguous.push(probe);
            }
            _ => settled.push(probe),
        }
    }
    candidates.sort_by(|a, b| a.path.cmp(&b.path));

    Narrowed {
        ambiguous,
        candidates,
        settled,
    }
}

/// Index records by key. `records` must be sorted by path; the first record
/// for a key wins.
fn index_by_key(
    records: &[Arc<FileRecord>],
    mode: DuplicateMode,
) -> HashMap<MatchKey, Arc<FileRecord>> {
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        if let Some(key) = MatchKey::for_record(record, mode) {
            index.entry(key).or_insert_with(|| Arc::clone(record));
        }
    }
    index
}
