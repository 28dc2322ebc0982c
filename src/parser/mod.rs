//! Parsing of algorithm stdout into an [`ExecutionResult`].
//!
//! The wire contract with the unmodified external binaries is a fixed
//! tagged-line grammar: exactly one `RESULT: Time=<t>, OD=<n>, FD=<n>,
//! OCD=<n>` line (extra comma-separated fields tolerated) plus zero or more
//! `{...}` lines, one per discovered dependency. Time values use a comma as
//! the decimal separator.

use serde::Serialize;
use std::path::PathBuf;

use crate::error::Error;

const RESULT_PREFIX: &str = "RESULT: ";
const TIME_PREFIX: &str = "Time=";
const OD_PREFIX: &str = "OD=";
const FD_PREFIX: &str = "FD=";
const OCD_PREFIX: &str = "OCD=";

/// Outcome of one algorithm run.
///
/// `listing_path` points at the persisted dependency listing; it is `None`
/// for the absent sentinel, which stands in for a failed run so downstream
/// table-building code has a uniform shape to consume.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub elapsed_time: f64,
    pub od_count: u64,
    pub fd_count: u64,
    pub ocd_count: u64,
    pub listing_path: Option<PathBuf>,
}

impl ExecutionResult {
    /// Sentinel for a run that produced no parseable result: infinite time,
    /// zero counts, no listing.
    pub fn absent() -> Self {
        Self {
            elapsed_time: f64::INFINITY,
            od_count: 0,
            fd_count: 0,
            ocd_count: 0,
            listing_path: None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.elapsed_time.is_infinite()
    }

    /// Fast-path equivalence: the three dependency counts match exactly.
    pub fn counts_match(&self, other: &Self) -> bool {
        self.od_count == other.od_count
            && self.fd_count == other.fd_count
            && self.ocd_count == other.ocd_count
    }
}

/// Parsed stdout of one run: the result line plus the raw dependency lines
/// in order of appearance. Line order is significant for later equality
/// checking.
#[derive(Debug, Clone)]
pub struct ParsedOutput {
    pub result: ExecutionResult,
    pub dependencies: Vec<String>,
}

fn tagged_field<'a>(fields: &[&'a str], prefix: &'static str) -> Result<&'a str, Error> {
    fields
        .iter()
        .find_map(|f| f.strip_prefix(prefix))
        .ok_or(Error::MissingField(prefix))
}

fn parse_count(fields: &[&str], prefix: &'static str) -> Result<u64, Error> {
    let raw = tagged_field(fields, prefix)?;
    raw.parse().map_err(|_| Error::MalformedField { field: prefix, value: raw.to_string() })
}

/// Extracts the `RESULT: ` line and the bracket-delimited dependency lines
/// from captured stdout.
///
/// A missing result line is the primary per-implementation failure mode and
/// is returned as a typed error so the orchestrator can catch it without
/// aborting the batch.
pub fn parse_output(output: &str) -> Result<ParsedOutput, Error> {
    let result_line = output
        .lines()
        .find_map(|line| line.strip_prefix(RESULT_PREFIX))
        .ok_or(Error::MissingResultLine)?;

    let fields: Vec<&str> = result_line.split(", ").collect();

    // Comma decimal separator normalized before conversion.
    let time_raw = tagged_field(&fields, TIME_PREFIX)?.replace(',', ".");
    let elapsed_time: f64 = time_raw
        .parse()
        .map_err(|_| Error::MalformedField { field: TIME_PREFIX, value: time_raw.clone() })?;

    let od_count = parse_count(&fields, OD_PREFIX)?;
    let fd_count = parse_count(&fields, FD_PREFIX)?;
    let ocd_count = parse_count(&fields, OCD_PREFIX)?;

    let dependencies = extract_dependency_lines(output);

    Ok(ParsedOutput {
        result: ExecutionResult {
            elapsed_time,
            od_count,
            fd_count,
            ocd_count,
            listing_path: None,
        },
        dependencies,
    })
}

/// Any line that begins with `{` and contains a closing `}` is one
/// serialized dependency; order of appearance is preserved.
pub fn extract_dependency_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.starts_with('{') && line.contains('}'))
        .map(|line| line.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_result_line() {
        let output = "noise\nRESULT: Time=0,500123, OD=2, FD=0, OCD=1\n";
        let parsed = parse_output(output).unwrap();

        assert_eq!(parsed.result.elapsed_time, 0.500123);
        assert_eq!(parsed.result.od_count, 2);
        assert_eq!(parsed.result.fd_count, 0);
        assert_eq!(parsed.result.ocd_count, 1);
        assert!(parsed.dependencies.is_empty());
    }

    #[test]
    fn test_comma_decimal_time() {
        let output = "RESULT: Time=1,234, OD=0, FD=0, OCD=0";
        let parsed = parse_output(output).unwrap();
        assert_eq!(parsed.result.elapsed_time, 1.234);
    }

    #[test]
    fn test_missing_result_line() {
        let output = "some log line\nanother line\n";
        assert!(matches!(parse_output(output), Err(Error::MissingResultLine)));
    }

    #[test]
    fn test_missing_count_field() {
        let output = "RESULT: Time=0,5, OD=1, OCD=0";
        assert!(matches!(parse_output(output), Err(Error::MissingField("FD="))));
    }

    #[test]
    fn test_extra_fields_tolerated() {
        let output = "RESULT: Phase=search, Time=2,0, OD=3, FD=1, OCD=2, Memory=17";
        let parsed = parse_output(output).unwrap();
        assert_eq!(parsed.result.elapsed_time, 2.0);
        assert_eq!(parsed.result.od_count, 3);
    }

    #[test]
    fn test_dependency_lines_keep_order() {
        let output = "\
{A} -> {B}
RESULT: Time=0,1, OD=2, FD=0, OCD=0
{C} -> {D}
not a dependency
{ incomplete";
        let parsed = parse_output(output).unwrap();
        assert_eq!(parsed.dependencies, vec!["{A} -> {B}", "{C} -> {D}"]);
    }

    #[test]
    fn test_absent_sentinel() {
        let absent = ExecutionResult::absent();
        assert!(absent.is_absent());
        assert!(absent.elapsed_time.is_infinite());
        assert_eq!(absent.od_count, 0);
        assert!(absent.listing_path.is_none());
    }

    #[test]
    fn test_counts_match() {
        let parsed = parse_output("RESULT: Time=0,1, OD=2, FD=3, OCD=4").unwrap();
        let same = parse_output("RESULT: Time=9,9, OD=2, FD=3, OCD=4").unwrap();
        let different = parse_output("RESULT: Time=0,1, OD=2, FD=3, OCD=5").unwrap();

        assert!(parsed.result.counts_match(&same.result));
        assert!(!parsed.result.counts_match(&different.result));
    }
}
