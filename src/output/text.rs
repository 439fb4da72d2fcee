//! Text rendering of scan progress lines and divergence reports.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::ReportMode;
use crate::duplicates::{DivergenceReport, HashTier};

/// `Scanning <root>...`
pub fn write_scan_started<W: Write + ?Sized>(out: &mut W, root: &Path) -> io::Result<()> {
    writeln!(out, "Scanning {}...", root.display())
}

/// `Found <n> files in <root>`
pub fn write_scan_finished<W: Write + ?Sized>(
    out: &mut W,
    root: &Path,
    files: usize,
) -> io::Result<()> {
    writeln!(out, "Found {} files in {}", files, root.display())
}

fn write_section<W: Write + ?Sized>(
    out: &mut W,
    title: &str,
    paths: &BTreeSet<PathBuf>,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== {} ===", title)?;
    for path in paths {
        writeln!(out, "{}", path.display())?;
    }
    Ok(())
}

/// Render `report` in the requested `mode`. Every list is sorted.
pub fn write_divergence<W: Write + ?Sized>(
    out: &mut W,
    report: &DivergenceReport,
    mode: ReportMode,
) -> io::Result<()> {
    match mode {
        ReportMode::All => {
            write_section(out, "Only in Drive A", &report.only_in_a)?;
            write_section(out, "Only in Drive B", &report.only_in_b)?;
            if report.tier == HashTier::Off {
                write_section(out, "Different Size", &report.size_mismatch)?;
            } else {
                write_section(
                    out,
                    "Found elsewhere in Drive B by content",
                    &report.found_elsewhere_a,
                )?;
                write_section(
                    out,
                    "Found elsewhere in Drive A by content",
                    &report.found_elsewhere_b,
                )?;
            }
            writeln!(out)?;
            writeln!(
                out,
                "Total identical files (same path & size): {}",
                report.identical
            )?;
        }
        ReportMode::MissingA => {
            write_section(
                out,
                "Files missing in Drive A (present in B)",
                report.missing_in_a(),
            )?;
        }
        ReportMode::MissingB => {
            write_section(
                out,
                "Files missing in Drive B (present in A)",
                report.missing_in_b(),
            )?;
        }
    }
    Ok(())
}
