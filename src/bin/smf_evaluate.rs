use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rusty_smf::workflow::{self, RunConfig};

/// Run a matched filter detection config headless and report its ROC curve.
#[derive(Parser)]
#[command(name = "smf-evaluate", version, about)]
struct Cli {
    /// JSON run config.
    config: PathBuf,

    /// Override the threshold spacing of the ROC sweep.
    #[arg(long)]
    threshold_step: Option<f64>,

    /// Write the ROC curve as CSV (overrides `roc_output`).
    #[arg(long)]
    roc_output: Option<PathBuf>,

    /// Write the colour-mapped score map as PNG (overrides `score_image`).
    #[arg(long)]
    score_image: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = RunConfig::load(&cli.config)?;
    if let Some(step) = cli.threshold_step {
        config.threshold_step = step;
    }
    if cli.roc_output.is_some() {
        config.roc_output = cli.roc_output;
    }
    if cli.score_image.is_some() {
        config.score_image = cli.score_image;
    }

    let output = workflow::run(&config)?;
    let roc = &output.roc;

    println!(
        "target '{}': {} bands, {}×{} pixels, {} thresholds",
        output.target.name,
        output.bands,
        output.scores.nrows(),
        output.scores.ncols(),
        roc.len()
    );
    println!("{:>12} {:>10} {:>12}", "threshold", "P(D)", "P(FA)");
    for i in 0..roc.len() {
        println!(
            "{:>12} {:>10.4} {:>12.3e}",
            roc.thresholds[i], roc.p_detection[i], roc.p_false_alarm[i]
        );
    }
    Ok(())
}
