//! CLI tool for batch-normalizing picture and chart geometry in PPTX decks.

use anyhow::Result;
use clap::Parser;
use deckfit_core::{BatchRunner, BorderWeight, WriteSink};
use deckfit_pptx::PptxStore;
use std::path::PathBuf;

/// Resize and reposition pictures and charts across PPTX files, and apply a
/// uniform black border.
#[derive(Parser, Debug)]
#[command(name = "deckfit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file(s) (.pptx), edited in place
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Border width in points, applied to every outline-capable shape
    #[arg(short, long, default_value = "1.5", value_parser = parse_weight)]
    weight: BorderWeight,

    /// Print the batch summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Weight validation happens here, before any file is touched.
fn parse_weight(input: &str) -> std::result::Result<BorderWeight, String> {
    BorderWeight::parse(input).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    log::debug!(
        "processing {} file(s) with border weight {} pt",
        args.input.len(),
        args.weight.points()
    );

    let runner = BatchRunner::new(PptxStore::new(), args.weight);
    let mut sink = WriteSink(std::io::stderr());
    let summary = runner.run(&args.input, &mut sink);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        eprintln!(
            "{} saved, {} failed to open, {} failed to save, {} shape error(s)",
            summary.saved(),
            summary.open_failures(),
            summary.save_failures(),
            summary.shape_errors
        );
    }

    // Individual file failures are reported above, not fatal: the batch ran
    // to completion either way.
    Ok(())
}
