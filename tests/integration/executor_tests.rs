use super::common::{snapshot, write_file};
use data_symmetry::commands::{run_dupekill, DupekillOptions};
use data_symmetry::config::Config;
use data_symmetry::duplicates::DuplicateMode;
use data_symmetry::error::{AppError, ExitCode};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::{tempdir, TempDir};

struct Trees {
    reference: TempDir,
    cleanup: TempDir,
    out: TempDir,
}

fn trees() -> Trees {
    let reference = tempdir().unwrap();
    let cleanup = tempdir().unwrap();
    write_file(reference.path(), "music/song.mp3", b"la la la");
    write_file(reference.path(), "docs/report.pdf", b"%PDF quarterly");
    write_file(cleanup.path(), "old/music/song.mp3", b"la la la");
    write_file(cleanup.path(), "old/stuff/report-copy.pdf", b"%PDF quarterly");
    write_file(cleanup.path(), "old/stuff/unique.txt", b"nowhere else");
    Trees {
        reference,
        cleanup,
        out: tempdir().unwrap(),
    }
}

fn options(t: &Trees) -> DupekillOptions {
    DupekillOptions {
        reference: t.reference.path().to_path_buf(),
        cleanup: vec![t.cleanup.path().to_path_buf()],
        mode: DuplicateMode::HashOnly,
        move_to: None,
        out: Some(t.out.path().join("report.txt")),
        keep_empty_dirs: false,
        dry_run: false,
    }
}

fn run(opts: &DupekillOptions, answer: &str) -> (anyhow::Result<ExitCode>, String) {
    let mut input = Cursor::new(answer.as_bytes().to_vec());
    let mut prompt = Vec::new();
    let result = run_dupekill(opts, &Config::default(), None, &mut input, &mut prompt);
    (result, String::from_utf8(prompt).unwrap())
}

fn report(t: &Trees) -> String {
    fs::read_to_string(t.out.path().join("report.txt")).unwrap()
}

#[test]
fn test_declining_leaves_filesystem_untouched() {
    let t = trees();
    let before_cleanup = snapshot(t.cleanup.path());
    let before_reference = snapshot(t.reference.path());

    let (result, prompt) = run(&options(&t), "n\n");

    assert_eq!(result.unwrap(), ExitCode::Success);
    assert_eq!(prompt, "This will delete 2 files. Proceed? (y/N): ");
    assert_eq!(snapshot(t.cleanup.path()), before_cleanup);
    assert_eq!(snapshot(t.reference.path()), before_reference);
    let text = report(&t);
    assert!(text.contains("Aborted."));
    assert!(!text.contains("Successfully processed"));
}

#[test]
fn test_confirmed_delete_and_prune() {
    let t = trees();
    let before_reference = snapshot(t.reference.path());

    let (result, _) = run(&options(&t), "y\n");

    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(!t.cleanup.path().join("old/music").exists());
    assert!(t.cleanup.path().join("old/stuff/unique.txt").exists());
    assert!(!t.cleanup.path().join("old/stuff/report-copy.pdf").exists());
    assert!(t.cleanup.path().exists());
    assert_eq!(snapshot(t.reference.path()), before_reference);

    let text = report(&t);
    assert!(text.contains("Found 2 duplicate groups"));
    assert!(text.contains("Successfully processed 2 duplicate files"));
    assert!(text.contains("Removed 1 empty directories"));
}

#[test]
fn test_dry_run_changes_nothing() {
    let t = trees();
    let before = snapshot(t.cleanup.path());
    let mut opts = options(&t);
    opts.dry_run = true;

    let (result, prompt) = run(&opts, "y\n");

    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(prompt.is_empty());
    assert_eq!(snapshot(t.cleanup.path()), before);
    let text = report(&t);
    assert!(text.contains("Would remove 2 duplicate files across 2 groups"));
    assert!(text.contains("Dry-run enabled. No files affected."));
    // old/music only holds a duplicate; old/stuff keeps unique.txt.
    assert!(text.contains("Would remove 1 empty directories"));

    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("Scanning reference tree: "));
    assert!(lines[1].starts_with("Scanning cleanup tree: "));
    assert_eq!(lines[2], "Found 2 files in reference tree");
    assert!(lines[3].starts_with("Found 3 files in cleanup tree: "));
}

#[test]
fn test_move_to_target() {
    let t = trees();
    let target = tempdir().unwrap();
    let mut opts = options(&t);
    opts.move_to = Some(target.path().join("dupes"));
    opts.keep_empty_dirs = true;

    let (result, prompt) = run(&opts, "yes\n");

    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(prompt.starts_with("This will move 2 files."));
    assert_eq!(
        fs::read(target.path().join("dupes/song.mp3")).unwrap(),
        b"la la la"
    );
    assert!(target.path().join("dupes/report-copy.pdf").exists());
    assert!(t.cleanup.path().join("old/music").is_dir());
}

#[test]
fn test_move_collision_is_reported_as_failure() {
    let t = trees();
    let target = tempdir().unwrap();
    write_file(target.path(), "song.mp3", b"already here");
    let mut opts = options(&t);
    opts.move_to = Some(target.path().to_path_buf());

    let (result, _) = run(&opts, "y\n");

    let err = result.unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::OperationsFailed);
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::OperationsFailed(1))
    ));
    assert_eq!(
        fs::read(target.path().join("song.mp3")).unwrap(),
        b"already here"
    );
    assert!(t.cleanup.path().join("old/music/song.mp3").exists());
    assert!(target.path().join("report-copy.pdf").exists());

    let text = report(&t);
    assert!(text.contains("Failed to process "));
    assert!(text.contains("1 operations failed"));
}

#[test]
fn test_overlapping_roots_fail_before_scanning() {
    let t = trees();
    let mut opts = options(&t);
    opts.cleanup = vec![t.reference.path().join("music")];

    let (result, _) = run(&opts, "y\n");

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::OverlappingRoots { .. })
    ));
    assert!(!t.out.path().join("report.txt").exists());
    assert!(Path::new(&t.reference.path().join("music/song.mp3")).exists());
}

#[test]
fn test_no_duplicates() {
    let t = trees();
    let mut opts = options(&t);
    let other = tempdir().unwrap();
    write_file(other.path(), "fresh.txt", b"brand new");
    opts.cleanup = vec![other.path().to_path_buf()];

    let (result, prompt) = run(&opts, "y\n");

    assert_eq!(result.unwrap(), ExitCode::Success);
    assert!(prompt.is_empty());
    assert!(report(&t).contains("No duplicates found."));
    assert!(other.path().join("fresh.txt").exists());
}
