//! Report sinks and line-oriented rendering.
//!
//! Reports are plain text, one item per line, written either to stdout or
//! to a file given with `--out`. Logging and progress go to stderr and are
//! never mixed into the report.

pub mod text;

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub use text::{write_divergence, write_scan_finished, write_scan_started};

/// Which part of a divergence report to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Both directions, size mismatches and the identical count
    #[default]
    All,
    /// Files present in B but missing in A
    MissingA,
    /// Files present in A but missing in B
    MissingB,
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::MissingA => write!(f, "missing_a"),
            Self::MissingB => write!(f, "missing_b"),
        }
    }
}

/// Open the report sink: the file at `path` (created or truncated) or stdout.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be created.
pub fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(p) => {
            let file = File::create(p)?;
            log::debug!("Writing report to {}", p.display());
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}
