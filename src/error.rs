//! Command-level errors and exit codes.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::scanner::ScanError;

/// Exit codes for `ds`.
///
/// - 0: Success (including dry runs and aborted confirmations)
/// - 1: General error (setup failure, unexpected I/O error)
/// - 3: Some file operations failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed normally.
    Success = 0,
    /// An error stopped the command.
    GeneralError = 1,
    /// Completed, but at least one delete or move failed.
    OperationsFailed = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::OperationsFailed => "DS003",
        }
    }

    /// Exit code for an error returned by a command.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<AppError>() {
            Some(AppError::OperationsFailed(_)) => Self::OperationsFailed,
            _ => Self::GeneralError,
        }
    }
}

/// Failures surfaced by a command.
///
/// Everything except `OperationsFailed` is raised before any scanning.
#[derive(Debug, Error)]
pub enum AppError {
    /// A root directory is missing or not a directory.
    #[error(transparent)]
    Root(#[from] ScanError),

    /// A cleanup root overlaps the reference root.
    #[error("cleanup directory {cleanup} overlaps reference directory {reference}")]
    OverlappingRoots {
        cleanup: PathBuf,
        reference: PathBuf,
    },

    /// The move target lies inside the reference root.
    #[error("move target {0} is inside the reference directory")]
    MoveTargetInReference(PathBuf),

    /// The move target exists but is not a directory.
    #[error("move target is not a directory: {0}")]
    MoveTargetNotDirectory(PathBuf),

    /// No cleanup roots were given.
    #[error("at least one cleanup directory required")]
    NoCleanupRoots,

    /// The report file cannot be created.
    #[error("cannot create output file {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Some destructive operations failed.
    #[error("{0} operations failed")]
    OperationsFailed(usize),
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
        }
    }
}
