//! Data Symmetry - directory-tree comparison and duplicate cleanup
//!
//! Scans directory trees concurrently, reconciles them by path, size and
//! BLAKE3 content digest, and either reports how two trees diverge or
//! removes cleanup-tree files that already exist in a protected reference
//! tree.
//!
//! ```no_run
//! use data_symmetry::duplicates::{DuplicateMode, Reconciler};
//! use data_symmetry::scanner::{TreeScanner, WalkerConfig};
//! use std::path::Path;
//!
//! let scanner = TreeScanner::new(WalkerConfig::default());
//! let reference = scanner.scan(Path::new("/photos")).unwrap();
//! let cleanup = scanner.scan(Path::new("/mnt/usb")).unwrap();
//!
//! let set = Reconciler::with_defaults().duplicates(&reference, &[cleanup], DuplicateMode::HashOnly);
//! println!("{} files are already in /photos", set.total_cleanup_files());
//! ```

pub mod actions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;

pub use commands::run_app;
