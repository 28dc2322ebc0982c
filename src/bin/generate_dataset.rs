use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use od_benchmark_rs::dataset::{
    DatasetGenerator, DatasetSpec, DEFAULT_MAX_VALUE, DEFAULT_MIN_VALUE,
};
use od_benchmark_rs::Error;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DatasetKind {
    /// Noisy-monotonic columns plus random filler
    Ordered,
    /// Range-partitioned columns plus random filler
    Range,
    /// Uniform random values in every column
    Chaotic,
}

#[derive(Parser)]
#[command(about = "Generate a synthetic dataset for OD discovery benchmarks")]
struct Args {
    /// Number of rows in the dataset
    #[arg(short, long)]
    rows: usize,

    /// Number of columns in the dataset
    #[arg(short, long)]
    columns: usize,

    /// Path to the output dataset
    #[arg(short, long)]
    output: PathBuf,

    /// Dataset separator
    #[arg(short, long, default_value = ",")]
    separator: String,

    /// Ordering character of the planted columns
    #[arg(long, value_enum, default_value = "range")]
    kind: DatasetKind,

    /// Number of ordered columns (random in [1, columns] when omitted)
    #[arg(long)]
    orderedcols: Option<usize>,

    /// Number of range-based columns (random in [1, columns] when omitted)
    #[arg(long)]
    rangebasedcols: Option<usize>,

    /// Minimum dataset value
    #[arg(long, default_value_t = DEFAULT_MIN_VALUE)]
    min: i64,

    /// Maximum dataset value
    #[arg(long, default_value_t = DEFAULT_MAX_VALUE)]
    max: i64,

    /// Skip the synthetic c1..cN header row
    #[arg(long)]
    no_header: bool,

    /// RNG seed for reproducible datasets
    #[arg(long)]
    seed: Option<u64>,
}

fn run(args: Args) -> Result<(), Error> {
    let spec = DatasetSpec::new(
        args.rows,
        args.columns,
        args.min,
        args.max,
        !args.no_header,
        args.separator,
    )?;
    let mut generator = DatasetGenerator::new(spec, args.seed);

    let matrix = match args.kind {
        DatasetKind::Ordered => generator.build_ordered_matrix(args.orderedcols)?,
        DatasetKind::Range => generator.build_range_matrix(args.rangebasedcols)?,
        DatasetKind::Chaotic => generator.build_chaotic_matrix()?,
    };

    generator.write_matrix(&matrix, &args.output)?;
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
