use super::common::{scan, write_file};
use data_symmetry::commands::{run_twincheck, TwincheckOptions};
use data_symmetry::config::Config;
use data_symmetry::duplicates::{HashTier, Reconciler};
use data_symmetry::output::ReportMode;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn paths(items: &[&str]) -> BTreeSet<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

#[test]
fn test_moved_file_found_by_content() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    let content: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    write_file(a.path(), "x/1.bin", &content);
    write_file(b.path(), "y/2.bin", &content);

    let (ta, tb) = (scan(a.path()), scan(b.path()));
    let reconciler = Reconciler::with_defaults();

    let off = reconciler.divergence(&ta, &tb, HashTier::Off);
    assert_eq!(off.only_in_a, paths(&["x/1.bin"]));
    assert_eq!(off.only_in_b, paths(&["y/2.bin"]));

    let smart = reconciler.divergence(&ta, &tb, HashTier::Smart);
    assert!(smart.only_in_a.is_empty());
    assert!(smart.only_in_b.is_empty());
    assert_eq!(smart.found_elsewhere_a, paths(&["x/1.bin"]));
}

#[test]
fn test_size_mismatch_is_subset_of_strict_divergence() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    write_file(a.path(), "doc.txt", b"short");
    write_file(b.path(), "doc.txt", b"much longer");
    write_file(a.path(), "same.txt", b"same");
    write_file(b.path(), "same.txt", b"same");

    let (ta, tb) = (scan(a.path()), scan(b.path()));
    let reconciler = Reconciler::with_defaults();
    let off = reconciler.divergence(&ta, &tb, HashTier::Off);
    let strict = reconciler.divergence(&ta, &tb, HashTier::Strict);

    assert_eq!(off.size_mismatch, paths(&["doc.txt"]));
    for path in &off.size_mismatch {
        assert!(strict.only_in_a.contains(path) || strict.only_in_b.contains(path));
    }
    assert!(strict.size_mismatch.is_empty());
}

#[test]
fn test_smart_and_strict_agree() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    write_file(a.path(), "photos/1.jpg", b"image one");
    write_file(b.path(), "backup/1.jpg", b"image one");
    write_file(a.path(), "photos/2.jpg", b"image two");
    write_file(b.path(), "photos/2.jpg", b"image two");
    write_file(a.path(), "notes.txt", b"aaaa");
    write_file(b.path(), "notes.txt", b"bbbbbbbb");
    write_file(b.path(), "other.txt", b"aaaa");
    write_file(a.path(), "lonely.txt", b"only here");

    let (ta, tb) = (scan(a.path()), scan(b.path()));
    let reconciler = Reconciler::with_defaults();
    let smart = reconciler.divergence(&ta, &tb, HashTier::Smart);
    let strict = reconciler.divergence(&ta, &tb, HashTier::Strict);

    assert_eq!(smart.only_in_a, strict.only_in_a);
    assert_eq!(smart.only_in_b, strict.only_in_b);
    assert_eq!(smart.only_in_a, paths(&["lonely.txt"]));
    assert_eq!(smart.only_in_b, paths(&["notes.txt"]));
}

#[test]
fn test_twincheck_writes_report_file() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    write_file(a.path(), "both.txt", b"same");
    write_file(b.path(), "both.txt", b"same");
    write_file(a.path(), "z_only_a.txt", b"a");
    write_file(a.path(), "a_only_a.txt", b"a");
    write_file(b.path(), "only_b.txt", b"b");
    let report_path = out_dir.path().join("report.txt");

    let opts = TwincheckOptions {
        drive_a: a.path().to_path_buf(),
        drive_b: b.path().to_path_buf(),
        mode: ReportMode::All,
        tier: HashTier::Off,
        out: Some(report_path.clone()),
    };
    run_twincheck(&opts, &Config::default(), None).unwrap();

    let report = fs::read_to_string(&report_path).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], format!("Scanning {}...", a.path().display()));
    assert_eq!(lines[1], format!("Scanning {}...", b.path().display()));
    assert_eq!(lines[2], format!("Found 3 files in {}", a.path().display()));
    assert_eq!(lines[3], format!("Found 2 files in {}", b.path().display()));
    assert!(report.contains("=== Only in Drive A ===\na_only_a.txt\nz_only_a.txt\n"));
    assert!(report.contains("=== Only in Drive B ===\nonly_b.txt\n"));
    assert!(report.contains("Total identical files (same path & size): 1"));
    assert!(report.contains("Comparison complete. No files were modified or deleted."));
}

#[test]
fn test_twincheck_missing_b_only() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    write_file(a.path(), "gone.txt", b"gone");
    write_file(b.path(), "new.txt", b"new!!");
    let report_path = out_dir.path().join("missing.txt");

    let opts = TwincheckOptions {
        drive_a: a.path().to_path_buf(),
        drive_b: b.path().to_path_buf(),
        mode: ReportMode::MissingB,
        tier: HashTier::Smart,
        out: Some(report_path.clone()),
    };
    run_twincheck(&opts, &Config::default(), None).unwrap();

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("=== Files missing in Drive B (present in A) ===\ngone.txt\n"));
    assert!(!report.contains("new.txt"));
}

#[test]
fn test_twincheck_rejects_missing_root_before_writing() {
    let a = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let report_path = out_dir.path().join("never.txt");

    let opts = TwincheckOptions {
        drive_a: a.path().to_path_buf(),
        drive_b: a.path().join("missing"),
        mode: ReportMode::All,
        tier: HashTier::Off,
        out: Some(report_path.clone()),
    };

    assert!(run_twincheck(&opts, &Config::default(), None).is_err());
    assert!(!report_path.exists());
}

#[test]
fn test_twincheck_unwritable_output() {
    let a = tempdir().unwrap();
    let opts = TwincheckOptions {
        drive_a: a.path().to_path_buf(),
        drive_b: a.path().to_path_buf(),
        mode: ReportMode::All,
        tier: HashTier::Off,
        out: Some(a.path().join("no/such/dir/report.txt")),
    };
    assert!(run_twincheck(&opts, &Config::default(), None).is_err());
}
