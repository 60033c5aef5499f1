use anyhow::Result;
use chartsmith::{runtime, AnalysisOptions, OutputStyle};
use clap::Parser;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chartsmith")]
#[command(about = "Suggest charts, with plot-ready data, for a CSV or Excel file", long_about = None)]
struct Args {
    /// Dataset to analyze (.csv, .xlsx, .xls, .xlsm)
    file: PathBuf,

    /// Command that answers the chart prompt on stdout (e.g. "ollama run llama3:latest")
    #[arg(long, env = "CHARTSMITH_GENERATOR")]
    generator: Option<String>,

    /// Number of dataset rows included in the generator prompt
    #[arg(long)]
    sample_rows: Option<usize>,

    /// JSON file with default options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit single-line JSON
    #[arg(long)]
    compact: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();

    let mut options = match &args.config {
        Some(path) => AnalysisOptions::from_file(path)?,
        None => AnalysisOptions::default(),
    };
    if args.generator.is_some() {
        options.generator = args.generator.clone();
    }
    if let Some(n) = args.sample_rows {
        options.sample_rows = n;
    }
    if args.compact {
        options.output = OutputStyle::Compact;
    }

    let charts = runtime::run(&args.file, &options)?;

    let stdout = io::stdout();
    runtime::write_charts(&charts, stdout.lock(), options.output)?;

    Ok(())
}
