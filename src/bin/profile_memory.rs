use clap::Parser;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use od_benchmark_rs::profile::{profile_dataset, DEFAULT_TRANSCRIPT_START_LINE};
use od_benchmark_rs::Error;

#[derive(Parser)]
#[command(about = "Profile an OD discovery implementation's memory use per dataset")]
struct Args {
    /// Paths to the datasets
    #[arg(short, long, num_args = 1.., required = true)]
    datasets: Vec<PathBuf>,

    /// Path to the algorithm executable
    #[arg(short, long)]
    algorithm: PathBuf,

    /// Mark appended to output file names (unix timestamp when omitted)
    #[arg(short = 'o', long)]
    output_mark: Option<String>,

    /// Directory for the profiling file family
    #[arg(long, default_value = "results_mem")]
    results_dir: PathBuf,

    /// First transcript line (1-based) at which Stage A filtering starts
    #[arg(short, long, default_value_t = DEFAULT_TRANSCRIPT_START_LINE)]
    start: usize,
}

fn run(args: Args) -> Result<(), Error> {
    let mark = args.output_mark.clone().unwrap_or_else(|| {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        now.as_secs().to_string()
    });

    for dataset in &args.datasets {
        profile_dataset(&args.algorithm, dataset, &args.results_dir, &mark, args.start)?;

        let dataset_name = dataset
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dataset.display().to_string());
        println!("Tested {}", dataset_name);
    }
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
