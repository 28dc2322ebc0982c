use clap::Parser;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use od_benchmark_rs::profile::{clean_transcript, DEFAULT_TRANSCRIPT_START_LINE};
use od_benchmark_rs::Error;

#[derive(Parser)]
#[command(about = "Strip an ms_print transcript down to its snapshot tables")]
struct Args {
    /// Path to the ms_print output file
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the output file
    #[arg(short, long)]
    output: PathBuf,

    /// First line (1-based) at which filtering starts
    #[arg(short, long, default_value_t = DEFAULT_TRANSCRIPT_START_LINE)]
    start: usize,
}

fn run(args: Args) -> Result<(), Error> {
    let reader = BufReader::new(File::open(&args.input)?);
    let writer = BufWriter::new(File::create(&args.output)?);
    clean_transcript(reader, writer, args.start)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
