//! Launching external algorithm implementations and capturing their output.
//!
//! An implementation is described by an argument-vector template holding a
//! `{dataset}` placeholder. Execution is synchronous and unbounded: the
//! child is awaited to completion with its stdout buffered in memory, and a
//! hung binary blocks the whole batch. That is an explicit simplification,
//! not a guarantee.

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::Error;
use crate::parser::{self, ExecutionResult};

/// Placeholder token substituted with the dataset path at invocation time.
pub const DATASET_PLACEHOLDER: &str = "{dataset}";

/// Argument-vector template for one algorithm implementation.
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    label: String,
    argv: Vec<String>,
}

impl CommandTemplate {
    pub fn new(label: impl Into<String>, argv: Vec<String>) -> Self {
        Self { label: label.into(), argv }
    }

    /// Template for a native executable: `<path> {dataset}`.
    pub fn native(label: impl Into<String>, executable: &Path) -> Self {
        Self::new(
            label,
            vec![executable.display().to_string(), DATASET_PLACEHOLDER.to_string()],
        )
    }

    /// Template for a managed-runtime implementation:
    /// `java -Xmx<heap> -classpath <bin> <class> {dataset}`.
    pub fn jvm(label: impl Into<String>, classpath: &Path, class: &str, heap: &str) -> Self {
        Self::new(
            label,
            vec![
                "java".to_string(),
                format!("-Xmx{}", heap),
                "-classpath".to_string(),
                classpath.display().to_string(),
                class.to_string(),
                DATASET_PLACEHOLDER.to_string(),
            ],
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Concrete argument vector with every placeholder occurrence replaced
    /// by the dataset path.
    pub fn resolve(&self, dataset: &Path) -> Vec<String> {
        let dataset = dataset.display().to_string();
        self.argv
            .iter()
            .map(|arg| arg.replace(DATASET_PLACEHOLDER, &dataset))
            .collect()
    }
}

/// Path of the persisted dependency listing for one (implementation,
/// dataset) pair: `<results_dir>/res_<label>_<dataset_basename>.txt`.
pub fn listing_path(results_dir: &Path, label: &str, dataset: &Path) -> PathBuf {
    let dataset_name = dataset
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    results_dir.join(format!("res_{}_{}.txt", label, dataset_name))
}

/// Runs one implementation against one dataset: substitutes the placeholder,
/// executes the child process, parses the captured stdout, and persists the
/// dependency-listing lines under `results_dir` so equivalence comparisons
/// can operate on stable paths.
pub fn execute_algorithm(
    template: &CommandTemplate,
    dataset: &Path,
    results_dir: &Path,
) -> Result<ExecutionResult, Error> {
    let argv = template.resolve(dataset);
    debug!("running {}: {:?}", template.label(), argv);

    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::InvalidSpec("empty argument vector".into()))?;

    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .output()
        .map_err(|source| Error::Spawn { command: argv.join(" "), source })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed = parser::parse_output(&stdout)?;

    fs::create_dir_all(results_dir)?;
    let listing = listing_path(results_dir, template.label(), dataset);
    let mut content = parsed.dependencies.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(&listing, content)?;

    let mut result = parsed.result;
    result.listing_path = Some(listing);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_substitution() {
        let template = CommandTemplate::native("cpp", Path::new("/opt/fastod/run"));
        let argv = template.resolve(Path::new("/data/odds.csv"));
        assert_eq!(argv, vec!["/opt/fastod/run", "/data/odds.csv"]);
    }

    #[test]
    fn test_jvm_template() {
        let template = CommandTemplate::jvm("java", Path::new("bin"), "fastod.Main", "12g");
        let argv = template.resolve(Path::new("d.csv"));
        assert_eq!(argv, vec!["java", "-Xmx12g", "-classpath", "bin", "fastod.Main", "d.csv"]);
    }

    #[test]
    fn test_listing_path_naming() {
        let path = listing_path(Path::new("results"), "cpp", Path::new("/data/odds.csv"));
        assert_eq!(path, PathBuf::from("results/res_cpp_odds.csv.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_with_echo_stand_in() {
        // /bin/echo prints its arguments, so it doubles as a minimal
        // algorithm stand-in emitting the wire contract.
        let template = CommandTemplate::new(
            "echo",
            vec![
                "/bin/echo".to_string(),
                "RESULT: Time=0,250, OD=1, FD=0, OCD=0\n{c1} -> {c2}".to_string(),
            ],
        );

        let results_dir =
            std::env::temp_dir().join(format!("odbench_runner_{}", std::process::id()));
        let result =
            execute_algorithm(&template, Path::new("fake.csv"), &results_dir).unwrap();

        assert_eq!(result.elapsed_time, 0.25);
        assert_eq!(result.od_count, 1);

        let listing = result.listing_path.unwrap();
        let content = std::fs::read_to_string(&listing).unwrap();
        assert_eq!(content, "{c1} -> {c2}\n");

        let _ = std::fs::remove_dir_all(&results_dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_without_result_line_is_typed_failure() {
        let template =
            CommandTemplate::new("silent", vec!["/bin/echo".to_string(), "no result".to_string()]);
        let results_dir = std::env::temp_dir().join(format!("odbench_fail_{}", std::process::id()));
        let err = execute_algorithm(&template, Path::new("fake.csv"), &results_dir).unwrap_err();
        assert!(matches!(err, Error::MissingResultLine));
    }
}
