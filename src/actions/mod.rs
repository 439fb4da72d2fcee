//! File actions module.
//!
//! This module provides functionality for:
//! - Deleting or moving cleanup files, one independent operation per file
//! - Dry-run previews of a duplicate set
//! - The preview/confirm/execute state machine
//! - Post-order pruning of directories left empty
//!
//! ```no_run
//! use data_symmetry::actions::{ExecutorConfig, OperationExecutor};
//! use data_symmetry::duplicates::{DuplicateMode, DuplicateSet};
//! use std::io;
//!
//! let set = DuplicateSet::empty(DuplicateMode::HashOnly);
//! let executor = OperationExecutor::new(ExecutorConfig::default().with_dry_run(true));
//! let outcome = executor
//!     .run(&set, &mut io::stdin().lock(), &mut io::stdout(), &mut io::stderr())
//!     .unwrap();
//! assert_eq!(outcome.processed(), 0);
//! ```

pub mod executor;
pub mod operation;
pub mod preview;
pub mod prune;

pub use executor::{
    confirm, ExecutionOutcome, ExecutorConfig, ExecutorState, OperationExecutor,
    AFFIRMATIVE_TOKENS,
};
pub use operation::{
    apply, process_batch, BatchResult, FileAction, NoOpCallback, OperationCallback,
    OperationConfig, OperationError, OperationResult,
};
pub use preview::render_preview;
pub use prune::{prune_empty_dirs, PruneResult};
