use clap::Parser;
use std::path::PathBuf;

use od_benchmark_rs::compare::diff_listing_files;

#[derive(Parser)]
#[command(about = "Compare two dependency listing files line by line")]
struct Args {
    /// Path to the first file
    #[arg(short, long)]
    first: PathBuf,

    /// Path to the second file
    #[arg(short, long)]
    second: PathBuf,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match diff_listing_files(&args.first, &args.second) {
        Ok(diff) => diff.report(),
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}
