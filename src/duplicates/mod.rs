//! Tree reconciliation.
//!
//! This module provides functionality for:
//! - Size bucketing of scanned records ([`SizeIndex`])
//! - Divergence reports between two trees ([`Reconciler::divergence`])
//! - Duplicate groups against a reference tree ([`Reconciler::duplicates`])

pub mod finder;
pub mod groups;
pub mod index;

pub use finder::{Matching, Reconciler, Side};
pub use groups::{
    DivergenceReport, DuplicateGroup, DuplicateMode, DuplicateSet, HashTier, MatchKey,
    ReconcileStats,
};
pub use index::SizeIndex;
