//! The `twincheck` and `dupekill` commands.
//!
//! Both commands validate every input before the first directory is read;
//! a setup error never leaves a half-written report behind a scan.

use std::io::{BufRead, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::actions::{ExecutorConfig, FileAction, OperationExecutor};
use crate::cli::{Cli, Commands, DupekillArgs, TwincheckArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateMode, HashTier, Reconciler};
use crate::error::{AppError, ExitCode};
use crate::logging::init_logging;
use crate::output::{open_output, write_divergence, write_scan_finished, write_scan_started, ReportMode};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::{ContentHasher, ScanError, TreeScanner};

/// Inputs of the divergence command.
#[derive(Debug, Clone)]
pub struct TwincheckOptions {
    /// Drive A
    pub drive_a: PathBuf,
    /// Drive B
    pub drive_b: PathBuf,
    /// Sections to print
    pub mode: ReportMode,
    /// Hashing tier
    pub tier: HashTier,
    /// Report file, stdout when `None`
    pub out: Option<PathBuf>,
}

impl From<&TwincheckArgs> for TwincheckOptions {
    fn from(args: &TwincheckArgs) -> Self {
        Self {
            drive_a: args.drive_a.clone(),
            drive_b: args.drive_b.clone(),
            mode: args.mode.into(),
            tier: args.hash.into(),
            out: args.out.clone(),
        }
    }
}

/// Inputs of the duplicate-elimination command.
#[derive(Debug, Clone)]
pub struct DupekillOptions {
    /// Protected reference root
    pub reference: PathBuf,
    /// Cleanup roots
    pub cleanup: Vec<PathBuf>,
    /// Match mode
    pub mode: DuplicateMode,
    /// Move target; delete when `None`
    pub move_to: Option<PathBuf>,
    /// Report file, stdout when `None`
    pub out: Option<PathBuf>,
    /// Skip empty-directory pruning
    pub keep_empty_dirs: bool,
    /// Preview only
    pub dry_run: bool,
}

impl From<&DupekillArgs> for DupekillOptions {
    fn from(args: &DupekillArgs) -> Self {
        Self {
            reference: args.reference.clone(),
            cleanup: args.cleanup.clone(),
            mode: args.mode.into(),
            move_to: args.move_to.clone(),
            out: args.out.clone(),
            keep_empty_dirs: args.keep_empty_dirs,
            dry_run: args.dry_run,
        }
    }
}

/// Roots and move target after the safety gates, all absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRoots {
    /// Canonical reference root
    pub reference: PathBuf,
    /// Canonical cleanup roots, in the order given
    pub cleanup: Vec<PathBuf>,
    /// Absolute move target
    pub move_to: Option<PathBuf>,
}

/// Parse-independent entry point used by the binary.
///
/// # Errors
///
/// Returns setup errors, I/O errors writing the report, and
/// `AppError::OperationsFailed` when some file operations failed.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref()).map_err(AppError::from)?;
    config.merge_cli(&cli);
    config.validate().map_err(AppError::from)?;
    log::debug!("Effective configuration: {:?}", config);

    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));

    match &cli.command {
        Commands::Twincheck(args) => {
            run_twincheck(&TwincheckOptions::from(args), &config, Some(progress))
        }
        Commands::Dupekill(args) => {
            let stdin = std::io::stdin();
            run_dupekill(
                &DupekillOptions::from(args),
                &config,
                Some(progress),
                &mut stdin.lock(),
                &mut std::io::stderr(),
            )
        }
    }
}

fn build_scanner(config: &Config, progress: Option<&Arc<dyn ProgressCallback>>) -> TreeScanner {
    let scanner = TreeScanner::new(config.walker_config());
    match progress {
        Some(p) => scanner.with_progress_callback(Arc::clone(p)),
        None => scanner,
    }
}

fn build_reconciler(config: &Config, progress: Option<&Arc<dyn ProgressCallback>>) -> Reconciler {
    let hasher = ContentHasher::new(config.hasher_config());
    let hasher = match progress {
        Some(p) => hasher.with_progress_callback(Arc::clone(p)),
        None => hasher,
    };
    Reconciler::new(hasher)
}

fn open_report(path: Option<&Path>) -> Result<Box<dyn Write>, AppError> {
    open_output(path).map_err(|source| AppError::Output {
        path: path.map(Path::to_path_buf).unwrap_or_default(),
        source,
    })
}

/// Compare two trees and write the divergence report.
///
/// # Errors
///
/// Returns a setup error if a root is invalid or the report file cannot be
/// created, or an I/O error while writing the report.
pub fn run_twincheck(
    opts: &TwincheckOptions,
    config: &Config,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<ExitCode> {
    ScanError::check_root(&opts.drive_a).map_err(AppError::from)?;
    ScanError::check_root(&opts.drive_b).map_err(AppError::from)?;
    let mut out = open_report(opts.out.as_deref())?;

    let start = Instant::now();
    let scanner = build_scanner(config, progress.as_ref());
    let roots = [opts.drive_a.clone(), opts.drive_b.clone()];
    for root in &roots {
        write_scan_started(&mut *out, root)?;
    }
    let mut trees = scanner.scan_all(&roots).map_err(AppError::from)?;
    for (root, tree) in roots.iter().zip(&trees) {
        write_scan_finished(&mut *out, root, tree.len())?;
    }
    let (tree_b, tree_a) = match (trees.pop(), trees.pop()) {
        (Some(b), Some(a)) => (b, a),
        _ => anyhow::bail!("scanner returned fewer trees than roots"),
    };

    writeln!(out)?;
    writeln!(out, "Comparing drives...")?;
    let report = build_reconciler(config, progress.as_ref()).divergence(&tree_a, &tree_b, opts.tier);
    write_divergence(&mut *out, &report, opts.mode)?;

    writeln!(out)?;
    writeln!(out, "Comparison complete. No files were modified or deleted.")?;
    writeln!(out, "Time taken: {:.2?}", start.elapsed())?;
    out.flush().context("failed to write report")?;

    Ok(ExitCode::Success)
}

/// Resolve `path` to an absolute path, canonicalizing its longest existing
/// ancestor so it compares correctly against canonical roots.
fn resolve(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut rest: Vec<&std::ffi::OsStr> = Vec::new();

    loop {
        if existing.exists() {
            let mut resolved = existing.canonicalize()?;
            for part in rest.iter().rev() {
                resolved.push(part);
            }
            return Ok(resolved);
        }
        match (existing.parent(), existing.components().next_back()) {
            (Some(parent), Some(Component::Normal(name))) => {
                rest.push(name);
                existing = parent;
            }
            _ => return Ok(absolute.clone()),
        }
    }
}

/// Apply the safety gates of `dupekill`.
///
/// # Errors
///
/// Returns the first violated gate as an `AppError`.
pub fn validate_dupekill(opts: &DupekillOptions) -> Result<ValidatedRoots, AppError> {
    if opts.cleanup.is_empty() {
        return Err(AppError::NoCleanupRoots);
    }

    ScanError::check_root(&opts.reference)?;
    let reference = opts
        .reference
        .canonicalize()
        .map_err(|e| ScanError::Io {
            path: opts.reference.clone(),
            source: e,
        })?;

    let mut cleanup = Vec::with_capacity(opts.cleanup.len());
    for root in &opts.cleanup {
        ScanError::check_root(root)?;
        let canonical = root.canonicalize().map_err(|e| ScanError::Io {
            path: root.clone(),
            source: e,
        })?;
        if canonical.starts_with(&reference) || reference.starts_with(&canonical) {
            return Err(AppError::OverlappingRoots {
                cleanup: root.clone(),
                reference: opts.reference.clone(),
            });
        }
        cleanup.push(canonical);
    }

    let move_to = match &opts.move_to {
        Some(target) => {
            if target.exists() && !target.is_dir() {
                return Err(AppError::MoveTargetNotDirectory(target.clone()));
            }
            let resolved = resolve(target).map_err(|source| AppError::Output {
                path: target.clone(),
                source,
            })?;
            if resolved.starts_with(&reference) {
                return Err(AppError::MoveTargetInReference(target.clone()));
            }
            Some(resolved)
        }
        None => None,
    };

    Ok(ValidatedRoots {
        reference,
        cleanup,
        move_to,
    })
}

/// Find duplicates of the reference tree and delete or move them.
///
/// The preview is always written; unless `dry_run` is set the user is
/// asked for confirmation on `prompt` and the answer is read from `input`.
///
/// # Errors
///
/// Returns a setup error before scanning, an I/O error while writing the
/// report, or `AppError::OperationsFailed` if any file operation failed.
pub fn run_dupekill<R: BufRead, P: Write>(
    opts: &DupekillOptions,
    config: &Config,
    progress: Option<Arc<dyn ProgressCallback>>,
    input: &mut R,
    prompt: &mut P,
) -> Result<ExitCode> {
    let roots = validate_dupekill(opts)?;
    let mut out = open_report(opts.out.as_deref())?;

    let start = Instant::now();
    let scanner = build_scanner(config, progress.as_ref());
    let mut all_roots = vec![roots.reference.clone()];
    all_roots.extend(roots.cleanup.iter().cloned());

    writeln!(out, "Scanning reference tree: {}", opts.reference.display())?;
    for root in &opts.cleanup {
        writeln!(out, "Scanning cleanup tree: {}", root.display())?;
    }
    let mut trees = scanner.scan_all(&all_roots).map_err(AppError::from)?;
    let cleanup_trees = trees.split_off(1);
    let reference_tree = trees
        .pop()
        .context("scanner returned no reference tree")?;

    writeln!(out, "Found {} files in reference tree", reference_tree.len())?;
    for (root, tree) in opts.cleanup.iter().zip(&cleanup_trees) {
        writeln!(out, "Found {} files in cleanup tree: {}", tree.len(), root.display())?;
    }

    let set = build_reconciler(config, progress.as_ref()).duplicates(
        &reference_tree,
        &cleanup_trees,
        opts.mode,
    );
    writeln!(out, "Found {} duplicate groups", set.len())?;

    let action = match &roots.move_to {
        Some(target) => FileAction::MoveTo(target.clone()),
        None => FileAction::Delete,
    };
    let executor = OperationExecutor::new(
        ExecutorConfig::default()
            .with_action(action)
            .with_dry_run(opts.dry_run)
            .with_prune_empty_dirs(!opts.keep_empty_dirs)
            .with_cleanup_roots(roots.cleanup.clone())
            .with_operation(config.operation_config()),
    );
    let outcome = executor.run(&set, input, &mut out, prompt)?;
    out.flush().context("failed to write report")?;

    log::info!(
        "dupekill finished in {:.2?}: {} processed, {} failed",
        start.elapsed(),
        outcome.processed(),
        outcome.failed()
    );

    if outcome.failed() > 0 {
        return Err(AppError::OperationsFailed(outcome.failed()).into());
    }
    Ok(ExitCode::Success)
}
