use clap::Parser;
use std::fs;
use std::path::PathBuf;

use od_benchmark_rs::profile::find_peaks;
use od_benchmark_rs::Error;

#[derive(Parser)]
#[command(about = "Report the peak of each tracked metric in a cleaned profiler transcript")]
struct Args {
    /// Path to the cleaned ms_print output file
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the output file (printed to stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), Error> {
    let transcript = fs::read_to_string(&args.input)?;
    let report = find_peaks(&transcript)?;

    match &args.output {
        Some(path) => fs::write(path, format!("{}\n", report))?,
        None => println!("{}", report),
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
