//! Preview, confirm, execute.
//!
//! [`OperationExecutor`] drives a [`DuplicateSet`] through a fixed sequence:
//!
//! ```text
//! Preview -> AwaitingConfirmation -> Executing -> Done
//!        \                        \
//!         -> Done (dry run)        -> Aborted
//! ```
//!
//! The preview is always written first. Confirmation is a single line read
//! from the supplied input; only `y` or `yes` (case-insensitive, surrounding
//! whitespace ignored) proceeds. Anything else, including EOF or a read
//! error, aborts without touching the filesystem.
//!
//! Once executing, every cleanup file is processed independently. Failures
//! are reported per file and counted; files already processed stay
//! processed, there is no rollback.

use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use super::operation::{
    process_batch, BatchResult, FileAction, OperationCallback, OperationConfig, OperationError,
    OperationResult,
};
use super::preview::{render_preview, DRY_RUN_TRAILER};
use super::prune::{prune_empty_dirs, PruneResult};
use crate::duplicates::DuplicateSet;

/// Tokens accepted as confirmation.
pub const AFFIRMATIVE_TOKENS: &[&str] = &["y", "yes"];

/// Executor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// Rendering the dry-run preview
    Preview,
    /// Blocked on the confirmation prompt
    AwaitingConfirmation,
    /// Performing filesystem operations
    Executing,
    /// Finished (after execution, dry run, or with nothing to do)
    Done,
    /// Confirmation withheld
    Aborted,
}

impl ExecutorState {
    /// Check whether moving to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: ExecutorState) -> bool {
        use ExecutorState::*;
        matches!(
            (self, next),
            (Preview, AwaitingConfirmation)
                | (Preview, Done)
                | (AwaitingConfirmation, Executing)
                | (AwaitingConfirmation, Aborted)
                | (Executing, Done)
        )
    }

    /// Check whether this is a final state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// Whether a confirmation answer proceeds.
#[must_use]
pub fn confirm(answer: &str) -> bool {
    let answer = answer.trim().to_ascii_lowercase();
    AFFIRMATIVE_TOKENS.contains(&answer.as_str())
}

/// Executor settings, passed explicitly for each run.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Delete or move
    pub action: FileAction,
    /// Stop after the preview
    pub dry_run: bool,
    /// Remove directories left empty in the cleanup roots
    pub prune_empty_dirs: bool,
    /// Cleanup roots to prune below
    pub cleanup_roots: Vec<PathBuf>,
    /// Per-file operation settings
    pub operation: OperationConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            action: FileAction::Delete,
            dry_run: false,
            prune_empty_dirs: true,
            cleanup_roots: Vec::new(),
            operation: OperationConfig::default(),
        }
    }
}

impl ExecutorConfig {
    /// Set the file action.
    #[must_use]
    pub fn with_action(mut self, action: FileAction) -> Self {
        self.action = action;
        self
    }

    /// Enable/disable dry-run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable/disable empty-directory pruning.
    #[must_use]
    pub fn with_prune_empty_dirs(mut self, prune: bool) -> Self {
        self.prune_empty_dirs = prune;
        self
    }

    /// Set the cleanup roots used for pruning.
    #[must_use]
    pub fn with_cleanup_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.cleanup_roots = roots;
        self
    }

    /// Set per-file operation settings.
    #[must_use]
    pub fn with_operation(mut self, operation: OperationConfig) -> Self {
        self.operation = operation;
        self
    }
}

/// What a run did.
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// Final state, `Done` or `Aborted`
    pub state: ExecutorState,
    /// Files selected for the action
    pub planned: usize,
    /// Per-file results (empty unless executed)
    pub batch: BatchResult,
    /// Pruned directories (reported only, on dry runs)
    pub pruned: PruneResult,
}

impl ExecutionOutcome {
    /// Number of files processed successfully.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.batch.success_count()
    }

    /// Number of failed operations.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.batch.failure_count()
    }

    /// Check whether the run was aborted at the prompt.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.state == ExecutorState::Aborted
    }
}

/// Writes one line per failed file.
struct FailureReporter<'a, W: Write> {
    out: &'a mut W,
    error: Option<io::Error>,
}

impl<W: Write> OperationCallback for FailureReporter<'_, W> {
    fn on_before(&mut self, path: &Path, index: usize, total: usize) {
        log::trace!("[{}/{}] {}", index + 1, total, path.display());
    }

    fn on_success(&mut self, _result: &OperationResult) {}

    fn on_failure(&mut self, error: &OperationError) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(
            self.out,
            "Failed to process {}: {}",
            error.path().display(),
            error
        ) {
            self.error = Some(e);
        }
    }
}

/// Runs the preview/confirm/execute state machine over a duplicate set.
#[derive(Debug, Clone)]
pub struct OperationExecutor {
    config: ExecutorConfig,
}

impl OperationExecutor {
    /// Create an executor.
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Executor settings.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run over `set`.
    ///
    /// Report lines go to `out`; the confirmation prompt goes to `prompt`
    /// and the answer is read from `input`.
    ///
    /// # Errors
    ///
    /// Returns an error only if writing to `out` or `prompt` fails.
    /// Per-file failures are reported in the outcome.
    pub fn run<R, W, P>(
        &self,
        set: &DuplicateSet,
        input: &mut R,
        out: &mut W,
        prompt: &mut P,
    ) -> io::Result<ExecutionOutcome>
    where
        R: BufRead,
        W: Write,
        P: Write,
    {
        let mut state = ExecutorState::Preview;
        let planned: Vec<(PathBuf, u64)> = set
            .cleanup_records()
            .map(|r| (r.path.clone(), r.size))
            .collect();
        let mut outcome = ExecutionOutcome {
            state,
            planned: planned.len(),
            batch: BatchResult::default(),
            pruned: PruneResult::default(),
        };

        writeln!(out, "=== DRY RUN RESULTS ===")?;
        for line in render_preview(set, &self.config.action) {
            writeln!(out, "{}", line)?;
        }

        if planned.is_empty() {
            advance(&mut state, ExecutorState::Done);
            outcome.state = state;
            return Ok(outcome);
        }

        if self.config.dry_run {
            writeln!(out, "{}", DRY_RUN_TRAILER)?;
            if self.config.prune_empty_dirs {
                let pending: HashSet<PathBuf> = planned.iter().map(|(p, _)| p.clone()).collect();
                outcome.pruned = self.prune(out, true, &pending)?;
            }
            advance(&mut state, ExecutorState::Done);
            outcome.state = state;
            return Ok(outcome);
        }

        advance(&mut state, ExecutorState::AwaitingConfirmation);
        write!(
            prompt,
            "This will {} {} files. Proceed? (y/N): ",
            self.config.action.verb(),
            planned.len()
        )?;
        prompt.flush()?;

        let mut answer = String::new();
        let confirmed = match input.read_line(&mut answer) {
            Ok(0) => false,
            Ok(_) => confirm(&answer),
            Err(e) => {
                log::warn!("Failed to read confirmation: {}", e);
                false
            }
        };

        if !confirmed {
            log::info!("Confirmation withheld, nothing was changed");
            writeln!(out, "Aborted.")?;
            advance(&mut state, ExecutorState::Aborted);
            outcome.state = state;
            return Ok(outcome);
        }

        advance(&mut state, ExecutorState::Executing);
        writeln!(
            out,
            "=== {} OPERATIONS ===",
            self.config.action.verb().to_ascii_uppercase()
        )?;

        let mut reporter = FailureReporter {
            out: &mut *out,
            error: None,
        };
        outcome.batch = process_batch(
            &planned,
            &self.config.action,
            &self.config.operation,
            &mut reporter,
        );
        if let Some(e) = reporter.error {
            return Err(e);
        }
        writeln!(out, "{}", outcome.batch.summary())?;

        if self.config.prune_empty_dirs {
            outcome.pruned = self.prune(out, false, &HashSet::new())?;
        }

        advance(&mut state, ExecutorState::Done);
        outcome.state = state;
        Ok(outcome)
    }

    fn prune<W: Write>(
        &self,
        out: &mut W,
        dry_run: bool,
        pending: &HashSet<PathBuf>,
    ) -> io::Result<PruneResult> {
        let mut total = PruneResult::default();

        for root in &self.config.cleanup_roots {
            writeln!(out, "Cleaning empty directories in: {}", root.display())?;
            let result = prune_empty_dirs(root, dry_run, pending);
            for dir in &result.removed {
                if dry_run {
                    writeln!(out, "  Would remove empty directory: {}", dir.display())?;
                } else {
                    writeln!(out, "  Removed empty directory: {}", dir.display())?;
                }
            }
            if dry_run {
                writeln!(out, "Would remove {} empty directories", result.removed_count())?;
            } else {
                writeln!(out, "Removed {} empty directories", result.removed_count())?;
            }
            total.merge(result);
        }

        Ok(total)
    }
}

fn advance(state: &mut ExecutorState, next: ExecutorState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal executor transition {:?} -> {:?}",
        state,
        next
    );
    log::debug!("Executor: {:?} -> {:?}", state, next);
    *state = next;
}
