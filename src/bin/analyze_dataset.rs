use clap::Parser;
use prettytable::{row, Table};
use std::path::PathBuf;

use od_benchmark_rs::dataset::analyze_dataset;
use od_benchmark_rs::Error;

#[derive(Parser)]
#[command(about = "Summarize the shape and size of dataset files")]
struct Args {
    /// Dataset separator
    #[arg(short, long, default_value = ",")]
    separator: String,

    /// Treat the first line as data rather than a header
    #[arg(long)]
    no_header: bool,

    /// Paths to the datasets
    #[arg(short, long, num_args = 1.., required = true)]
    datasets: Vec<PathBuf>,
}

fn run(args: Args) -> Result<(), Error> {
    let mut table = Table::new();
    table.add_row(row!["Dataset", "Columns", "Rows", "Size (MB)"]);

    for path in &args.datasets {
        let info = analyze_dataset(path, &args.separator, !args.no_header)?;
        table.add_row(row![info.name, info.columns, info.rows, format!("{:.2}", info.size_mb())]);
    }

    table.printstd();
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
