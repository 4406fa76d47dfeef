mod extract;
mod plot;

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Extract cache-size measurements from a node debug log and plot them
/// as a time-series chart.
#[derive(Parser, Debug)]
#[command(name = "cachegraph", version, about)]
struct Cli {
    /// Debug log file to analyze
    #[arg(value_name = "LOG_FILE")]
    log_file: PathBuf,

    /// Output image path (PNG)
    #[arg(value_name = "OUTPUT_IMAGE")]
    output_image: PathBuf,

    /// Extra logging (per-line skip decisions)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            let mut cause = e.source();
            while let Some(c) = cause {
                eprintln!("  caused by: {c}");
                cause = c.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let content = std::fs::read_to_string(&cli.log_file)
        .map_err(|e| format!("failed to read {}: {e}", cli.log_file.display()))?;

    let series = extract::analyze(&content)?;
    tracing::info!(samples = series.len(), "log analyzed");

    plot::render_chart(&series, &cli.output_image)?;

    println!("Graph saved as {}", cli.output_image.display());
    Ok(())
}
