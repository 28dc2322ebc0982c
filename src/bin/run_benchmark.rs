use clap::Parser;
use std::path::PathBuf;

use od_benchmark_rs::compare::ComparerTool;
use od_benchmark_rs::orchestrator::{run_batch, BenchmarkConfig};
use od_benchmark_rs::runner::CommandTemplate;
use od_benchmark_rs::Error;

#[derive(Parser)]
#[command(about = "Benchmark one or two OD discovery implementations over a set of datasets")]
struct Args {
    /// Path to the first algorithm executable
    #[arg(short = 'f', long)]
    first: PathBuf,

    /// Label for the first implementation
    #[arg(long, default_value = "first")]
    first_name: String,

    /// Path to a second native algorithm executable
    #[arg(short = 's', long)]
    second: Option<PathBuf>,

    /// Label for the second implementation
    #[arg(long, default_value = "second")]
    second_name: String,

    /// Classpath directory of a JVM second implementation
    #[arg(long, requires = "java_class", conflicts_with = "second")]
    java_classpath: Option<PathBuf>,

    /// Main class of the JVM second implementation
    #[arg(long)]
    java_class: Option<String>,

    /// Maximum JVM heap size
    #[arg(long, default_value = "12g")]
    heap: String,

    /// Path to the algorithm results comparer
    #[arg(short = 'C', long)]
    comparer: Option<PathBuf>,

    /// Paths to the datasets
    #[arg(short = 'd', long, num_args = 1.., required = true)]
    datasets: Vec<PathBuf>,

    /// Directory for persisted dependency listings
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// Optional path for a JSON dump of the final summary
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

fn second_template(args: &Args) -> Option<CommandTemplate> {
    if let Some(path) = &args.second {
        return Some(CommandTemplate::native(args.second_name.clone(), path));
    }
    if let (Some(classpath), Some(class)) = (&args.java_classpath, &args.java_class) {
        return Some(CommandTemplate::jvm(args.second_name.clone(), classpath, class, &args.heap));
    }
    None
}

fn run(args: Args) -> Result<(), Error> {
    let second = second_template(&args);
    if second.is_some() && args.comparer.is_none() {
        return Err(Error::InvalidSpec(
            "a comparer is required when two implementations are configured".into(),
        ));
    }

    let config = BenchmarkConfig {
        first: CommandTemplate::native(args.first_name.clone(), &args.first),
        second,
        comparer: args.comparer.map(ComparerTool::new),
        results_dir: args.results_dir,
    };

    let summary = run_batch(&config, &args.datasets)?;

    if let Some(output) = &args.output {
        summary.save_json(output)?;
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
