//! Post-processing of memory-profiler transcripts.
//!
//! Two sequential text-filtering stages over `ms_print` output: Stage A
//! strips the transcript down to table separators and snapshot data rows,
//! Stage B scans the cleaned transcript for the peak of each tracked metric.
//! The profiler chain itself (valgrind massif + ms_print) is external and
//! only orchestrated here.

use log::debug;
use prettytable::{row, Table};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::Error;

/// ms_print emits a fixed preamble before the first snapshot table.
pub const DEFAULT_TRANSCRIPT_START_LINE: usize = 35;

/// Number of whitespace-separated tokens in one snapshot row:
/// index, time, total, useful heap, extra heap, stacks.
const SNAPSHOT_TOKENS: usize = 6;

/// Stage A: lines before `start_line` (1-based) pass through unchanged; from
/// there on only table separators (`--` prefix) and data lines (leading
/// whitespace, trimmed form starting with neither `-` nor `|`) are kept.
pub fn clean_transcript<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
    start_line: usize,
) -> Result<(), Error> {
    for (index, line) in reader.lines().enumerate() {
        let line = line?;

        if index + 1 < start_line {
            writeln!(writer, "{}", line)?;
            continue;
        }

        let trimmed = line.trim();
        let is_table = line.starts_with("--");
        let is_important = line.starts_with(|c: char| c == ' ' || c == '\t')
            && !trimmed.starts_with('-')
            && !trimmed.starts_with('|');

        if is_table || is_important {
            writeln!(writer, "{}", line)?;
        }
    }

    Ok(())
}

/// Peak value of one metric and the snapshot index where it first occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricPeak {
    pub value: u64,
    pub snapshot: usize,
}

impl MetricPeak {
    fn observe(&mut self, value: u64, snapshot: usize) {
        if value > self.value {
            self.value = value;
            self.snapshot = snapshot;
        }
    }
}

/// Per-column maxima over all snapshot rows of a cleaned transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeakReport {
    pub time: MetricPeak,
    pub total_memory: MetricPeak,
    pub useful_heap: MetricPeak,
    pub extra_heap: MetricPeak,
}

impl PeakReport {
    fn to_table(self) -> Table {
        let mut table = Table::new();
        table.add_row(row!["time(i)", "total(B)", "useful-heap(B)", "extra-heap(B)"]);
        table.add_row(row![
            format!("{} [{}]", self.time.value, self.time.snapshot),
            format!("{} [{}]", self.total_memory.value, self.total_memory.snapshot),
            format!("{} [{}]", self.useful_heap.value, self.useful_heap.snapshot),
            format!("{} [{}]", self.extra_heap.value, self.extra_heap.snapshot),
        ]);
        table
    }
}

impl fmt::Display for PeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_table())
    }
}

fn parse_metric(token: &str) -> Result<u64, Error> {
    token
        .parse()
        .map_err(|_| Error::MalformedField { field: "snapshot", value: token.to_string() })
}

/// Stage B: collects rows of exactly six comma-stripped tokens whose first
/// token equals the incrementing expected snapshot index; a gap in indices
/// halts further collection. Tracks the maximum of each numeric column
/// independently, keeping the first index at which it occurred.
pub fn find_peaks(transcript: &str) -> Result<PeakReport, Error> {
    let mut expected_snapshot = 0usize;
    let mut report: Option<PeakReport> = None;

    for line in transcript.lines() {
        let tokens: Vec<String> =
            line.split_whitespace().map(|t| t.replace(',', "")).collect();

        if tokens.len() != SNAPSHOT_TOKENS || tokens[0] != expected_snapshot.to_string() {
            continue;
        }

        let time = parse_metric(&tokens[1])?;
        let total = parse_metric(&tokens[2])?;
        let useful = parse_metric(&tokens[3])?;
        let extra = parse_metric(&tokens[4])?;
        let snapshot = expected_snapshot;
        expected_snapshot += 1;

        match report.as_mut() {
            None => {
                report = Some(PeakReport {
                    time: MetricPeak { value: time, snapshot },
                    total_memory: MetricPeak { value: total, snapshot },
                    useful_heap: MetricPeak { value: useful, snapshot },
                    extra_heap: MetricPeak { value: extra, snapshot },
                });
            }
            Some(report) => {
                report.time.observe(time, snapshot);
                report.total_memory.observe(total, snapshot);
                report.useful_heap.observe(useful, snapshot);
                report.extra_heap.observe(extra, snapshot);
            }
        }
    }

    report.ok_or(Error::EmptyTranscript)
}

/// File family produced by one profiling run of one dataset.
#[derive(Debug, Clone)]
pub struct ProfileRunPaths {
    pub valgrind_log: PathBuf,
    pub massif: PathBuf,
    pub msprint: PathBuf,
    pub msprint_cleaned: PathBuf,
    pub peaks: PathBuf,
}

impl ProfileRunPaths {
    pub fn new(results_dir: &Path, dataset: &Path, mark: &str) -> Self {
        let dataset_name = dataset
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = |suffix: &str| results_dir.join(format!("{}_{}_{}.txt", dataset_name, mark, suffix));

        Self {
            valgrind_log: file("valgrind"),
            massif: file("massif"),
            msprint: file("msprint"),
            msprint_cleaned: file("msprint_cleaned"),
            peaks: file("max_res"),
        }
    }
}

fn find_massif_output(dir: &Path) -> Result<PathBuf, Error> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_massif = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with("massif.out."))
            .unwrap_or(false);
        if path.is_file() && is_massif {
            return Ok(path);
        }
    }
    Err(Error::MissingMassifOutput)
}

fn run_tool(argv: &[String]) -> Result<Vec<u8>, Error> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::InvalidSpec("empty argument vector".into()))?;

    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .output()
        .map_err(|source| Error::Spawn { command: argv.join(" "), source })?;
    Ok(output.stdout)
}

/// Profiles one algorithm run against one dataset: valgrind massif around
/// the algorithm, ms_print over the snapshot file, then Stages A and B.
/// Returns the peak report after persisting the whole file family.
pub fn profile_dataset(
    algorithm: &Path,
    dataset: &Path,
    results_dir: &Path,
    mark: &str,
    start_line: usize,
) -> Result<PeakReport, Error> {
    fs::create_dir_all(results_dir)?;
    let paths = ProfileRunPaths::new(results_dir, dataset, mark);

    let valgrind_argv = vec![
        "valgrind".to_string(),
        format!("--log-file={}", paths.valgrind_log.display()),
        "--tool=massif".to_string(),
        algorithm.display().to_string(),
        dataset.display().to_string(),
        "/dev/null".to_string(),
    ];
    debug!("profiling: {:?}", valgrind_argv);
    run_tool(&valgrind_argv)?;

    // massif drops its snapshot file in the working directory under a
    // pid-suffixed name; relocate it next to the rest of the run's files.
    let massif_output = find_massif_output(Path::new("."))?;
    fs::rename(&massif_output, &paths.massif)?;

    let msprint = run_tool(&["ms_print".to_string(), paths.massif.display().to_string()])?;
    fs::write(&paths.msprint, &msprint)?;

    let reader = BufReader::new(File::open(&paths.msprint)?);
    let writer = BufWriter::new(File::create(&paths.msprint_cleaned)?);
    clean_transcript(reader, writer, start_line)?;

    let cleaned = fs::read_to_string(&paths.msprint_cleaned)?;
    let report = find_peaks(&cleaned)?;
    fs::write(&paths.peaks, format!("{}\n", report))?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TRANSCRIPT: &str = "\
--------------------------------------------------------------------------------
  n        time(i)         total(B)   useful-heap(B) extra-heap(B)    stacks(B)
--------------------------------------------------------------------------------
  0          1,069              536              500            36            0
  1          2,000            9,000            8,500           500            0
  2          3,500            4,200            4,000           200            0
  3          4,100            4,300            4,100           200            0
";

    #[test]
    fn test_clean_passes_preamble_through() {
        let input = "preamble one\npreamble two\n  0  1 2 3 4 0\nnoise\n";
        let mut output = Vec::new();
        clean_transcript(input.as_bytes(), &mut output, 3).unwrap();

        let cleaned = String::from_utf8(output).unwrap();
        assert_eq!(cleaned, "preamble one\npreamble two\n  0  1 2 3 4 0\n");
    }

    #[test]
    fn test_clean_keeps_tables_and_data_lines() {
        let input = "\
----------------
  0  1,069  536  500  36  0
 -> 95.0% (8,192B) alloc in main
 | some chart bar
::plain noise
";
        let mut output = Vec::new();
        clean_transcript(input.as_bytes(), &mut output, 1).unwrap();

        let cleaned = String::from_utf8(output).unwrap();
        assert_eq!(cleaned, "----------------\n  0  1,069  536  500  36  0\n");
    }

    #[test]
    fn test_peaks_track_each_column_independently() {
        let report = find_peaks(SAMPLE_TRANSCRIPT).unwrap();

        // time grows monotonically, the memory columns peak at snapshot 1.
        assert_eq!(report.time, MetricPeak { value: 4100, snapshot: 3 });
        assert_eq!(report.total_memory, MetricPeak { value: 9000, snapshot: 1 });
        assert_eq!(report.useful_heap, MetricPeak { value: 8500, snapshot: 1 });
        assert_eq!(report.extra_heap, MetricPeak { value: 500, snapshot: 1 });
    }

    #[test]
    fn test_peak_keeps_first_max_index() {
        let transcript = "\
  0  10  7  7  0  0
  1  20  7  7  0  0
";
        let report = find_peaks(transcript).unwrap();
        assert_eq!(report.total_memory, MetricPeak { value: 7, snapshot: 0 });
    }

    #[test]
    fn test_index_gap_halts_collection() {
        let transcript = "\
  0  10  100  90  10  0
  2  20  900  800 100  0
";
        let report = find_peaks(transcript).unwrap();
        // Snapshot 2 arrives while 1 is expected, so it is never collected.
        assert_eq!(report.total_memory, MetricPeak { value: 100, snapshot: 0 });
    }

    #[test]
    fn test_empty_transcript_is_an_error() {
        assert!(matches!(find_peaks("no rows here\n"), Err(Error::EmptyTranscript)));
    }

    #[test]
    fn test_report_rendering() {
        let report = find_peaks(SAMPLE_TRANSCRIPT).unwrap();
        let rendered = report.to_string();
        assert!(rendered.contains("time(i)"));
        assert!(rendered.contains("9000 [1]"));
        assert!(rendered.contains("4100 [3]"));
    }
}
