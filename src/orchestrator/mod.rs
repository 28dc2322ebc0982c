//! Batch orchestration: datasets × one or two implementations.
//!
//! Each implementation is attempted independently per dataset; an expected
//! failure (no result line, unlaunchable binary) is logged and replaced by
//! the absent sentinel so the batch always continues. The running summary is
//! an explicit accumulator threaded through the loop and returned at the
//! end — no module-level state.

use log::warn;
use prettytable::{row, Table};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compare::{self, ComparerTool, ComparisonOutcome};
use crate::error::Error;
use crate::parser::ExecutionResult;
use crate::runner::{execute_algorithm, CommandTemplate};

/// One or two implementations plus the supporting tool configuration.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub first: CommandTemplate,
    pub second: Option<CommandTemplate>,
    pub comparer: Option<ComparerTool>,
    pub results_dir: PathBuf,
}

/// Per-dataset summary entry, in dataset-processed order.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub dataset_name: String,
    pub first: ExecutionResult,
    pub second: Option<ExecutionResult>,
    pub first_acceleration: f64,
    pub second_acceleration: f64,
    /// `None` in single-implementation mode.
    pub passed: Option<bool>,
}

/// Accumulated outcome of a whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkSummary {
    pub first_label: String,
    pub second_label: Option<String>,
    pub rows: Vec<SummaryRow>,
    pub passed: u64,
    pub failed: u64,
}

impl BenchmarkSummary {
    fn new(first_label: String, second_label: Option<String>) -> Self {
        Self { first_label, second_label, rows: Vec::new(), passed: 0, failed: 0 }
    }

    fn record(&mut self, row: SummaryRow) {
        match row.passed {
            Some(true) => self.passed += 1,
            Some(false) => self.failed += 1,
            None => {}
        }
        self.rows.push(row);
    }

    /// Final cross-dataset table plus the pass/fail tally.
    pub fn print(&self) {
        let mut table = Table::new();
        match &self.second_label {
            Some(second_label) => {
                table.add_row(row!["Dataset", &self.first_label, second_label, "Acc factor"]);
                for entry in &self.rows {
                    let second_time = entry
                        .second
                        .as_ref()
                        .map_or_else(|| "-".to_string(), |r| format!("{:.6}", r.elapsed_time));
                    table.add_row(row![
                        entry.dataset_name,
                        format!("{:.6}", entry.first.elapsed_time),
                        second_time,
                        format!("{:.2}x", entry.first_acceleration),
                    ]);
                }
            }
            None => {
                table.add_row(row!["Dataset", "Time", "OD", "FD", "OCD"]);
                for entry in &self.rows {
                    table.add_row(row![
                        entry.dataset_name,
                        format!("{:.6}", entry.first.elapsed_time),
                        entry.first.od_count,
                        entry.first.fd_count,
                        entry.first.ocd_count,
                    ]);
                }
            }
        }
        table.printstd();

        if self.second_label.is_some() {
            println!();
            println!("[Summary]");
            println!("Passed: {}", self.passed);
            println!("Failed: {}", self.failed);
        }
    }

    /// Persists the summary as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidSpec(format!("summary serialization failed: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Each implementation's time relative to the other. Zero when either side
/// is the absent sentinel.
pub fn acceleration_factors(first: &ExecutionResult, second: &ExecutionResult) -> (f64, f64) {
    if first.is_absent() || second.is_absent() {
        return (0.0, 0.0);
    }
    (second.elapsed_time / first.elapsed_time, first.elapsed_time / second.elapsed_time)
}

fn run_one(
    template: &CommandTemplate,
    dataset: &Path,
    results_dir: &Path,
) -> Result<ExecutionResult, Error> {
    match execute_algorithm(template, dataset, results_dir) {
        Ok(result) => Ok(result),
        Err(err) if err.is_recoverable_per_run() => {
            warn!("{} failed on {}: {}", template.label(), dataset.display(), err);
            println!("{} failed on {}: {}", template.label(), dataset.display(), err);
            Ok(ExecutionResult::absent())
        }
        Err(err) => Err(err),
    }
}

fn print_detail_table(summary_row: &SummaryRow, config: &BenchmarkConfig) {
    let mut table = Table::new();
    table.add_row(row!["Algorithm", "Time", "Acc factor", "OD", "FD", "OCD"]);
    add_result_row(
        &mut table,
        config.first.label(),
        &summary_row.first,
        summary_row.first_acceleration,
    );
    if let (Some(second), Some(template)) = (&summary_row.second, &config.second) {
        add_result_row(&mut table, template.label(), second, summary_row.second_acceleration);
    }
    table.printstd();
    println!();
}

fn add_result_row(table: &mut Table, label: &str, result: &ExecutionResult, acceleration: f64) {
    table.add_row(row![
        label,
        format!("{:.6}", result.elapsed_time),
        format!("{:.2}x", acceleration),
        result.od_count,
        result.fd_count,
        result.ocd_count,
    ]);
}

fn compare_pair(
    first: &ExecutionResult,
    second: &ExecutionResult,
    comparer: Option<&ComparerTool>,
) -> ComparisonOutcome {
    if first.is_absent() || second.is_absent() {
        return ComparisonOutcome::unequal();
    }
    let Some(comparer) = comparer else {
        return ComparisonOutcome::unequal();
    };
    match compare::compare_results(first, second, comparer) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!("comparison failed: {}", err);
            println!("comparison failed: {}", err);
            ComparisonOutcome::unequal()
        }
    }
}

/// Runs the whole batch and returns the accumulated summary.
///
/// Fatal errors (I/O on the results directory) abort; everything scoped to
/// one implementation on one dataset is downgraded to the absent sentinel.
pub fn run_batch(config: &BenchmarkConfig, datasets: &[PathBuf]) -> Result<BenchmarkSummary, Error> {
    let mut summary = BenchmarkSummary::new(
        config.first.label().to_string(),
        config.second.as_ref().map(|t| t.label().to_string()),
    );

    for dataset in datasets {
        let dataset_name = dataset
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dataset.display().to_string());
        println!("Dataset: {}", dataset_name);

        let first = run_one(&config.first, dataset, &config.results_dir)?;

        let summary_row = match &config.second {
            Some(second_template) => {
                let second = run_one(second_template, dataset, &config.results_dir)?;
                let outcome = compare_pair(&first, &second, config.comparer.as_ref());
                let (first_acceleration, second_acceleration) =
                    acceleration_factors(&first, &second);

                println!("Passed: {}", outcome.equal);
                println!();

                SummaryRow {
                    dataset_name,
                    first,
                    second: Some(second),
                    first_acceleration,
                    second_acceleration,
                    passed: Some(outcome.equal),
                }
            }
            None => SummaryRow {
                dataset_name,
                first,
                second: None,
                first_acceleration: 0.0,
                second_acceleration: 0.0,
                passed: None,
            },
        };

        print_detail_table(&summary_row, config);
        summary.record(summary_row);
    }

    summary.print();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn result(time: f64, od: u64) -> ExecutionResult {
        let mut r = parser::parse_output(&format!("RESULT: Time={}, OD={}, FD=0, OCD=0", time, od))
            .unwrap()
            .result;
        r.elapsed_time = time;
        r
    }

    #[test]
    fn test_acceleration_factors() {
        let fast = result(1.0, 1);
        let slow = result(4.0, 1);

        let (first, second) = acceleration_factors(&fast, &slow);
        assert_eq!(first, 4.0);
        assert_eq!(second, 0.25);
    }

    #[test]
    fn test_acceleration_zero_when_absent() {
        let ok = result(1.0, 1);
        let absent = ExecutionResult::absent();
        assert_eq!(acceleration_factors(&ok, &absent), (0.0, 0.0));
        assert_eq!(acceleration_factors(&absent, &ok), (0.0, 0.0));
    }

    #[test]
    fn test_summary_tally() {
        let mut summary = BenchmarkSummary::new("a".into(), Some("b".into()));
        for passed in [true, false, true, true] {
            summary.record(SummaryRow {
                dataset_name: "d".into(),
                first: result(1.0, 1),
                second: Some(result(2.0, 1)),
                first_acceleration: 2.0,
                second_acceleration: 0.5,
                passed: Some(passed),
            });
        }
        assert_eq!(summary.passed, 3);
        assert_eq!(summary.failed, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_batch_with_stand_in_implementations() {
        use std::os::unix::fs::PermissionsExt;

        let base = std::env::temp_dir().join(format!("odbench_batch_{}", std::process::id()));
        std::fs::create_dir_all(&base).unwrap();

        // A comparer that always answers Equal.
        let comparer_path = base.join("comparer.sh");
        std::fs::write(&comparer_path, "#!/bin/sh\necho 'INFO: Equal'\n").unwrap();
        std::fs::set_permissions(&comparer_path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let dataset = base.join("tiny.csv");
        std::fs::write(&dataset, "c1,c2\n1,2\n").unwrap();

        let output = "RESULT: Time=0,5, OD=1, FD=0, OCD=0\n{c1} -> {c2}";
        let make_echo = |label: &str| {
            CommandTemplate::new(label, vec!["/bin/echo".to_string(), output.to_string()])
        };

        let config = BenchmarkConfig {
            first: make_echo("fast"),
            second: Some(make_echo("slow")),
            comparer: Some(ComparerTool::new(&comparer_path)),
            results_dir: base.join("results"),
        };

        let summary = run_batch(&config, &[dataset]).unwrap();
        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.rows[0].first_acceleration, 1.0);

        let _ = std::fs::remove_dir_all(&base);
    }

    #[cfg(unix)]
    #[test]
    fn test_batch_survives_broken_implementation() {
        let base = std::env::temp_dir().join(format!("odbench_broken_{}", std::process::id()));
        std::fs::create_dir_all(&base).unwrap();
        let dataset = base.join("tiny.csv");
        std::fs::write(&dataset, "c1\n1\n").unwrap();

        let good = CommandTemplate::new(
            "good",
            vec!["/bin/echo".to_string(), "RESULT: Time=0,1, OD=0, FD=0, OCD=0".to_string()],
        );
        let broken = CommandTemplate::native("broken", Path::new("/nonexistent/algorithm"));

        let config = BenchmarkConfig {
            first: good,
            second: Some(broken),
            comparer: Some(ComparerTool::new("/nonexistent/comparer")),
            results_dir: base.join("results"),
        };

        let summary = run_batch(&config, &[dataset]).unwrap();
        assert_eq!(summary.failed, 1);
        assert!(summary.rows[0].second.as_ref().unwrap().is_absent());
        assert_eq!(summary.rows[0].first_acceleration, 0.0);

        let _ = std::fs::remove_dir_all(&base);
    }
}
