use thiserror::Error;

/// Failure taxonomy for the harness.
///
/// Spec/generator errors are fatal (a malformed run configuration), while
/// `MissingResultLine`, `MissingField` and `MalformedField` are caught per
/// implementation by the orchestrator so one broken binary cannot abort the
/// whole batch.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid dataset spec: {0}")]
    InvalidSpec(String),

    #[error("column length must be greater than zero")]
    EmptyColumn,

    #[error("number of partitions ({partitions}) is greater than the column length ({length})")]
    TooManyPartitions { partitions: usize, length: usize },

    #[error("no `RESULT: ` line found in algorithm output")]
    MissingResultLine,

    #[error("result line is missing the `{0}` field")]
    MissingField(&'static str),

    #[error("could not parse `{field}` value `{value}`")]
    MalformedField { field: &'static str, value: String },

    #[error("comparer output contains no `INFO: ` line")]
    MissingComparerVerdict,

    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no `massif.out.*` file found after profiling run")]
    MissingMassifOutput,

    #[error("profiler transcript contains no snapshot rows")]
    EmptyTranscript,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Failures scoped to a single implementation run on a single dataset.
    /// The orchestrator downgrades these to the absent sentinel and keeps
    /// the batch going; everything else propagates.
    pub fn is_recoverable_per_run(&self) -> bool {
        matches!(
            self,
            Error::MissingResultLine
                | Error::MissingField(_)
                | Error::MalformedField { .. }
                | Error::Spawn { .. }
        )
    }
}
