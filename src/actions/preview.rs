//! Dry-run rendering of a duplicate set.
//!
//! The preview is produced before any confirmation is requested and is
//! identical whether or not the run is destructive, so what the user
//! confirms is exactly what gets executed.
//!
//! # Example
//!
//! ```
//! use data_symmetry::actions::operation::FileAction;
//! use data_symmetry::actions::preview::render_preview;
//! use data_symmetry::duplicates::{DuplicateMode, DuplicateSet};
//!
//! let set = DuplicateSet::empty(DuplicateMode::HashOnly);
//! let lines = render_preview(&set, &FileAction::Delete);
//! assert_eq!(lines, vec!["No duplicates found.".to_string()]);
//! ```

use bytesize::ByteSize;

use super::operation::FileAction;
use crate::duplicates::DuplicateSet;

/// Line shown when there is nothing to do.
pub const NO_DUPLICATES: &str = "No duplicates found.";

/// Trailer printed after a dry-run preview.
pub const DRY_RUN_TRAILER: &str = "Dry-run enabled. No files affected.";

/// Render the preview for `set` under `action`, one entry per output line.
#[must_use]
pub fn render_preview(set: &DuplicateSet, action: &FileAction) -> Vec<String> {
    if set.is_empty() {
        return vec![NO_DUPLICATES.to_string()];
    }

    let (verb, label) = match action {
        FileAction::Delete => ("remove", "Delete"),
        FileAction::MoveTo(_) => ("move", "Move"),
    };

    let mut lines = Vec::with_capacity(1 + set.len() * 3);
    lines.push(format!(
        "Would {} {} duplicate files across {} groups ({})",
        verb,
        set.total_cleanup_files(),
        set.len(),
        ByteSize::b(set.reclaimable())
    ));

    for (i, group) in set.groups.iter().enumerate() {
        lines.push(format!("Group {}:", i + 1));
        lines.push(format!("  Reference: {}", group.reference.path.display()));
        for record in &group.cleanup {
            lines.push(format!("  {}: {}", label, record.path.display()));
        }
    }

    lines
}
