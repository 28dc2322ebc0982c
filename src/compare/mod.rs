//! Equivalence checking between two algorithm runs.
//!
//! Counts are compared first; only when all three match is the external
//! line-level differ invoked against the two persisted dependency listings.
//! The check is deliberately line-order-sensitive: two semantically equal
//! dependency sets enumerated in different orders compare as unequal.
//! Switching to a set-based comparison would change which datasets get
//! reported as mismatches, so the line-level contract stays.

use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::Error;
use crate::parser::ExecutionResult;

const INFO_PREFIX: &str = "INFO: ";
const EQUAL_VERDICT: &str = "Equal";

/// First line at which two listings diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMismatch {
    /// Zero-based line index.
    pub index: usize,
    pub first: String,
    pub second: String,
}

/// Line-by-line comparison of two listing files.
#[derive(Debug, Clone)]
pub struct ListingDiff {
    pub first_lines: usize,
    pub second_lines: usize,
    pub mismatches: Vec<LineMismatch>,
}

impl ListingDiff {
    pub fn is_equal(&self) -> bool {
        self.first_lines == self.second_lines && self.mismatches.is_empty()
    }

    pub fn first_mismatch(&self) -> Option<&LineMismatch> {
        self.mismatches.first()
    }

    /// Console diagnosis: mismatched lines by index when counts are equal,
    /// the count mismatch otherwise.
    pub fn report(&self) {
        for m in &self.mismatches {
            println!("Line {}: SOURCE=\"{}\", NEW=\"{}\"", m.index + 1, m.first, m.second);
        }

        if self.first_lines != self.second_lines {
            println!(
                "DIFFERENT NUMBER OF LINES: SOURCE={}, NEW={}",
                self.first_lines, self.second_lines
            );
        } else if self.mismatches.is_empty() {
            println!("Results are equal");
        }
    }
}

/// Reads both files and compares them line by line over the common prefix;
/// trailing whitespace is ignored.
pub fn diff_listing_files(first: &Path, second: &Path) -> Result<ListingDiff, Error> {
    let first_lines: Vec<String> = fs::read_to_string(first)?
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect();
    let second_lines: Vec<String> = fs::read_to_string(second)?
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect();

    let mut mismatches = Vec::new();
    for (index, (a, b)) in first_lines.iter().zip(second_lines.iter()).enumerate() {
        if a != b {
            mismatches.push(LineMismatch { index, first: a.clone(), second: b.clone() });
        }
    }

    Ok(ListingDiff {
        first_lines: first_lines.len(),
        second_lines: second_lines.len(),
        mismatches,
    })
}

/// The external differ: a tool that prints `INFO: Equal` (or `INFO: ` plus
/// anything else) when given two file paths.
#[derive(Debug, Clone)]
pub struct ComparerTool {
    path: PathBuf,
}

impl ComparerTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn run(&self, first: &Path, second: &Path) -> Result<bool, Error> {
        let output = Command::new(&self.path)
            .arg(first)
            .arg(second)
            .stdout(Stdio::piped())
            .output()
            .map_err(|source| Error::Spawn {
                command: format!(
                    "{} {} {}",
                    self.path.display(),
                    first.display(),
                    second.display()
                ),
                source,
            })?;

        parse_comparer_verdict(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Scans differ output for the `INFO: ` line; equal iff its payload is
/// exactly `Equal`. A missing line is a recoverable error so an unexpected
/// differ output format cannot take down the batch.
pub fn parse_comparer_verdict(output: &str) -> Result<bool, Error> {
    output
        .lines()
        .find_map(|line| line.strip_prefix(INFO_PREFIX))
        .map(|payload| payload == EQUAL_VERDICT)
        .ok_or(Error::MissingComparerVerdict)
}

/// Verdict for one dataset, with the first diverging line when unequal.
#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    pub equal: bool,
    pub first_divergence: Option<LineMismatch>,
}

impl ComparisonOutcome {
    pub fn unequal() -> Self {
        Self { equal: false, first_divergence: None }
    }
}

/// Full equivalence check between two results: count fast path, then the
/// external differ over the persisted listings, with a local line diff
/// reported to the console for diagnosis when the deep check fails.
pub fn compare_results(
    first: &ExecutionResult,
    second: &ExecutionResult,
    comparer: &ComparerTool,
) -> Result<ComparisonOutcome, Error> {
    if !first.counts_match(second) {
        return Ok(ComparisonOutcome::unequal());
    }

    let (first_listing, second_listing) = match (&first.listing_path, &second.listing_path) {
        (Some(a), Some(b)) => (a, b),
        _ => return Ok(ComparisonOutcome::unequal()),
    };

    let equal = comparer.run(first_listing, second_listing)?;
    if equal {
        return Ok(ComparisonOutcome { equal: true, first_divergence: None });
    }

    let diff = diff_listing_files(first_listing, second_listing)?;
    if diff.is_equal() {
        warn!(
            "differ reported NotEqual but listings match line-for-line: {} vs {}",
            first_listing.display(),
            second_listing.display()
        );
    } else {
        diff.report();
    }

    Ok(ComparisonOutcome { equal: false, first_divergence: diff.first_mismatch().cloned() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_listing(name: &str, lines: &[&str]) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("odbench_cmp_{}_{}", std::process::id(), name));
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_verdict_equal() {
        assert!(parse_comparer_verdict("DEBUG: start\nINFO: Equal\n").unwrap());
    }

    #[test]
    fn test_verdict_not_equal() {
        assert!(!parse_comparer_verdict("INFO: NotEqual\n").unwrap());
    }

    #[test]
    fn test_verdict_missing_info_line() {
        assert!(matches!(
            parse_comparer_verdict("no tagged output"),
            Err(Error::MissingComparerVerdict)
        ));
    }

    #[test]
    fn test_diff_reports_single_differing_line() {
        let lines = ["{a}", "{b}", "{c}", "{d}", "{e}"];
        let mut changed = lines;
        changed[3] = "{x}";

        let first = write_listing("diff_a", &lines);
        let second = write_listing("diff_b", &changed);

        let diff = diff_listing_files(&first, &second).unwrap();
        assert!(!diff.is_equal());
        assert_eq!(diff.mismatches.len(), 1);
        assert_eq!(
            diff.first_mismatch().unwrap(),
            &LineMismatch { index: 3, first: "{d}".into(), second: "{x}".into() }
        );

        let _ = fs::remove_file(first);
        let _ = fs::remove_file(second);
    }

    #[test]
    fn test_diff_equal_listings() {
        let lines = ["{a}", "{b}"];
        let first = write_listing("eq_a", &lines);
        let second = write_listing("eq_b", &lines);

        let diff = diff_listing_files(&first, &second).unwrap();
        assert!(diff.is_equal());

        let _ = fs::remove_file(first);
        let _ = fs::remove_file(second);
    }

    #[test]
    fn test_diff_line_count_mismatch() {
        let first = write_listing("count_a", &["{a}", "{b}", "{c}"]);
        let second = write_listing("count_b", &["{a}", "{b}"]);

        let diff = diff_listing_files(&first, &second).unwrap();
        assert!(!diff.is_equal());
        assert!(diff.mismatches.is_empty());
        assert_eq!((diff.first_lines, diff.second_lines), (3, 2));

        let _ = fs::remove_file(first);
        let _ = fs::remove_file(second);
    }

    #[test]
    fn test_count_fast_path_skips_deep_check() {
        let a = crate::parser::parse_output("RESULT: Time=0,1, OD=1, FD=0, OCD=0")
            .unwrap()
            .result;
        let b = crate::parser::parse_output("RESULT: Time=0,1, OD=2, FD=0, OCD=0")
            .unwrap()
            .result;

        // Comparer path does not exist; the fast path must not touch it.
        let comparer = ComparerTool::new("/nonexistent/comparer");
        let outcome = compare_results(&a, &b, &comparer).unwrap();
        assert!(!outcome.equal);
    }
}
