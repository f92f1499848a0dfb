//! dfd-detect - command-line front end for the detection pipeline
//!
//! Loads the inference context once, then analyses each image given on the
//! command line and prints one JSON `AnalysisResult` per image to stdout.
//! Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dfd_detect::provenance::ProvenanceChecker;
use dfd_detect::{DetectorConfig, InferenceContext, Orchestrator, StagedImage};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Detect AI-generated images")]
struct Args {
    /// Configuration file (TOML); falls back to DFD_CONFIG, then the platform config dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full detection pipeline on one or more images
    Analyze {
        /// Images to analyse (png, jpg, jpeg, webp)
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Only check an image for an embedded provenance manifest
    Provenance {
        image: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = dfd_common::config::resolve_config_file(args.config.as_deref());
    let mut config = DetectorConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    dfd_common::logging::init_tracing(&config.logging)
        .context("Failed to initialise logging")?;

    info!("Starting dfd-detect {}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Analyze { images, pretty } => analyze(config, images, pretty).await,
        Command::Provenance { image, pretty } => {
            let record = ProvenanceChecker::new().check(&image);
            print_json(&record, pretty)
        }
    }
}

async fn analyze(config: DetectorConfig, images: Vec<PathBuf>, pretty: bool) -> Result<()> {
    // Model loading is CPU heavy; keep it off the async workers
    let models = config.models.clone();
    let context = tokio::task::spawn_blocking(move || InferenceContext::load(&models))
        .await
        .context("Model loading task failed")?;
    if !context.ensemble_ready() {
        warn!("Ensemble unavailable: results will rely on provenance only");
    }

    let orchestrator = Orchestrator::new(Arc::new(context), &config.pipeline);

    for image in images {
        let staged = match StagedImage::stage_file(&config.staging, &image) {
            Ok(staged) => staged,
            Err(e) => {
                warn!(image = %image.display(), "Skipping image: {}", e);
                print_json(
                    &serde_json::json!({
                        "success": false,
                        "filename": image.display().to_string(),
                        "error": e.to_string(),
                    }),
                    pretty,
                )?;
                continue;
            }
        };

        let result = orchestrator.analyze(staged).await;
        print_json(&result, pretty)?;
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
