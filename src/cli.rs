//! Command-line interface definitions for `ds`.
//!
//! Two subcommands share one set of global options (verbosity, config file,
//! worker counts).
//!
//! # Example
//!
//! ```bash
//! # Compare two drives by path and size
//! ds twincheck -a /mnt/old -b /mnt/new
//!
//! # Look for moved files by content, print only what B lacks
//! ds twincheck -a /mnt/old -b /mnt/new --hash smart --mode missing_b
//!
//! # Preview duplicates of a reference tree in two cleanup trees
//! ds dupekill --reference ~/Photos --cleanup /mnt/usb1 --cleanup /mnt/usb2 --dry-run
//!
//! # Move duplicates aside instead of deleting them
//! ds dupekill --reference ~/Photos --cleanup /mnt/usb1 --move-to /mnt/quarantine
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::duplicates::{DuplicateMode, HashTier};
use crate::output::ReportMode;

/// Directory-tree comparison and reference-protected duplicate cleanup.
#[derive(Debug, Parser)]
#[command(name = "ds")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress and log output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Worker threads for directory scanning
    #[arg(long, value_name = "N", global = true)]
    pub scan_workers: Option<usize>,

    /// Upper bound on hashing workers (1-32)
    #[arg(long, value_name = "N", global = true)]
    pub hash_workers: Option<usize>,

    /// Follow symbolic links while scanning
    ///
    /// Warning: symlink cycles are not detected.
    #[arg(long, global = true)]
    pub follow_symlinks: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare two directory trees (read-only)
    Twincheck(TwincheckArgs),
    /// Remove or move cleanup files duplicated in a reference tree
    Dupekill(DupekillArgs),
}

/// Arguments for `twincheck`.
#[derive(Debug, Args)]
pub struct TwincheckArgs {
    /// First tree (Drive A)
    #[arg(short = 'a', long = "drive-a", value_name = "DIR")]
    pub drive_a: PathBuf,

    /// Second tree (Drive B)
    #[arg(short = 'b', long = "drive-b", value_name = "DIR")]
    pub drive_b: PathBuf,

    /// Which differences to report
    #[arg(long, value_enum, default_value = "all")]
    pub mode: ReportArg,

    /// Content hashing tier
    ///
    /// off compares path and size only; smart hashes files that are missing
    /// by path and have a same-size file elsewhere; strict hashes every file
    /// whose size occurs in both trees.
    #[arg(long = "hash", value_enum, default_value = "off")]
    pub hash: TierArg,

    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

/// Arguments for `dupekill`.
#[derive(Debug, Args)]
pub struct DupekillArgs {
    /// Protected reference tree; never modified
    #[arg(long, value_name = "DIR")]
    pub reference: PathBuf,

    /// Cleanup tree (repeat for several)
    #[arg(long, value_name = "DIR", required = true)]
    pub cleanup: Vec<PathBuf>,

    /// How files are matched
    #[arg(long, value_enum, default_value = "hash")]
    pub mode: ModeArg,

    /// Move duplicates into this directory instead of deleting them
    #[arg(long, value_name = "DIR")]
    pub move_to: Option<PathBuf>,

    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Keep directories left empty after cleanup
    #[arg(long)]
    pub keep_empty_dirs: bool,

    /// Show what would happen and exit without prompting
    #[arg(long)]
    pub dry_run: bool,
}

/// Report selection for `twincheck --mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ReportArg {
    /// Both directions plus size differences
    #[default]
    All,
    /// Files missing in Drive A
    #[value(name = "missing_a")]
    MissingA,
    /// Files missing in Drive B
    #[value(name = "missing_b")]
    MissingB,
}

impl From<ReportArg> for ReportMode {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::All => ReportMode::All,
            ReportArg::MissingA => ReportMode::MissingA,
            ReportArg::MissingB => ReportMode::MissingB,
        }
    }
}

/// Hashing tier for `twincheck --hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum TierArg {
    /// Path and size only
    #[default]
    Off,
    /// Hash only ambiguous missing files
    Smart,
    /// Hash every file with a size shared by both trees
    Strict,
}

impl From<TierArg> for HashTier {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Off => HashTier::Off,
            TierArg::Smart => HashTier::Smart,
            TierArg::Strict => HashTier::Strict,
        }
    }
}

/// Match mode for `dupekill --mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ModeArg {
    /// Same relative path and size
    #[value(name = "path+name")]
    PathName,
    /// Same relative path and content
    #[value(name = "path+hash")]
    PathHash,
    /// Same content anywhere
    #[default]
    #[value(name = "hash")]
    Hash,
}

impl From<ModeArg> for DuplicateMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::PathName => DuplicateMode::PathName,
            ModeArg::PathHash => DuplicateMode::PathHash,
            ModeArg::Hash => DuplicateMode::HashOnly,
        }
    }
}
