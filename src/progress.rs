//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements [`ProgressCallback`]
//! to display a spinner while trees are scanned and a bar while files are hashed.
//! Everything is drawn to stderr so it never mixes with the report output.
//!
//! Callbacks are only invoked from the single merge point of each phase. Roots
//! scanned concurrently each have their own merge point and share one spinner.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Phase name used by the tree scanner.
pub const PHASE_SCAN: &str = "scan";

/// Phase name used by the content hasher.
pub const PHASE_HASH: &str = "hash";

/// Progress callback for the scan and hash phases.
///
/// Implement this trait to receive progress updates from
/// [`crate::scanner::TreeScanner`] and [`crate::scanner::ContentHasher`].
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_SCAN`] or [`PHASE_HASH`])
    /// * `total` - Total number of items to process, 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    scanning: Mutex<Option<ProgressBar>>,
    hashing: Mutex<Option<ProgressBar>>,
    active_scans: AtomicUsize,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use data_symmetry::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::stderr())
        };
        Self {
            multi,
            scanning: Mutex::new(None),
            hashing: Mutex::new(None),
            active_scans: AtomicUsize::new(0),
            quiet,
        }
    }

    fn scanning_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn hashing_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        match phase {
            PHASE_SCAN => {
                // Roots scanned concurrently share one spinner.
                if self.active_scans.fetch_add(1, Ordering::SeqCst) > 0 {
                    return;
                }
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::scanning_style());
                pb.set_message("Scanning");
                pb.enable_steady_tick(Duration::from_millis(100));
                if let Ok(mut slot) = self.scanning.lock() {
                    *slot = Some(pb);
                }
            }
            PHASE_HASH => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::hashing_style());
                pb.set_message("Hashing");
                if let Ok(mut slot) = self.hashing.lock() {
                    *slot = Some(pb);
                }
            }
            other => log::trace!("No progress display for phase '{}'", other),
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let message = truncate_path(path, 40);
        let slots = [&self.hashing, &self.scanning];
        for slot in slots {
            if let Ok(guard) = slot.lock() {
                if let Some(ref pb) = *guard {
                    pb.set_position(current as u64);
                    pb.set_message(message.clone());
                    return;
                }
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if phase == PHASE_SCAN && self.active_scans.fetch_sub(1, Ordering::SeqCst) > 1 {
            return;
        }

        let (slot, done) = match phase {
            PHASE_SCAN => (&self.scanning, "Scan complete"),
            PHASE_HASH => (&self.hashing, "Hashing complete"),
            _ => return,
        };
        if let Some(pb) = slot.lock().ok().and_then(|mut s| s.take()) {
            pb.finish_with_message(done);
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
