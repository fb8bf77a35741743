// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! signmap - Extract sign numbers and hotspots from floor plan pages.
//!
//! Each image argument is one page. A `<stem>.text.json` file next to an
//! image supplies that page's embedded text layer; pages without one go
//! through color box detection and OCR.
//!
//! # Environment
//!
//! - `RUST_LOG` - log filter (default `info`)
//! - `SIGNMAP_WORKER_THREADS` - parallel page workers (default: CPU count)
//! - `SIGNMAP_CONFIG` - extraction config file used when `--config` is absent
//! - `SIGNMAP_LANG` - OCR language (default `eng`)

use anyhow::{Context, Result};
use clap::Parser;
use signmap_vision::{extract_document, extract_document_lenient, ExtractionConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod recognizer;
mod source;

use config::{load_extraction_config, Settings};
use source::ImagePageSource;

/// Extract sign numbers and their hotspots from floor plan page images.
#[derive(Parser, Debug)]
#[command(name = "signmap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page images, one per page, in page order
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Extraction config (JSON); overrides SIGNMAP_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write results here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not group series labels
    #[arg(long)]
    no_grouping: bool,

    /// Series grouping distance threshold (percent of page)
    #[arg(long)]
    threshold: Option<f64>,

    /// Height of a single marker box in pixels
    #[arg(long)]
    standard_height: Option<u32>,

    /// OCR language; overrides SIGNMAP_LANG
    #[arg(long)]
    lang: Option<String>,

    /// Skip pages that cannot be read instead of failing
    #[arg(long)]
    lenient: bool,

    /// Debug logging for the extraction pipeline
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Apply command line overrides on top of a loaded config.
    fn apply(&self, config: &mut ExtractionConfig) {
        if self.no_grouping {
            config.grouping.enabled = false;
        }
        if let Some(threshold) = self.threshold {
            config.grouping.distance_threshold = threshold;
        }
        if let Some(height) = self.standard_height {
            config.stacking.standard_height_px = height;
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "info,signmap_vision=debug,signmap=debug"
    } else {
        "info,signmap_vision=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = Settings::from_env();

    let mut config = match args.config.as_ref().or(settings.config_path.as_ref()) {
        Some(path) => load_extraction_config(path)?,
        None => ExtractionConfig::default(),
    };
    args.apply(&mut config);

    tracing::info!(
        pages = args.images.len(),
        worker_threads = settings.worker_threads,
        "Starting sign extraction"
    );

    rayon::ThreadPoolBuilder::new()
        .num_threads(settings.worker_threads)
        .build_global()
        .context("Failed to initialize rayon thread pool")?;

    let language = args.lang.clone().unwrap_or(settings.language);
    let recognizer = recognizer::build(&language)?;
    let source = ImagePageSource::new(args.images.clone());

    let result = if args.lenient {
        extract_document_lenient(&source, &config, &*recognizer)
    } else {
        extract_document(&source, &config, &*recognizer)?
    };

    tracing::info!(
        total = result.total_signs_detected,
        pages = result.pages.len(),
        "Extraction complete"
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_json(BufWriter::new(file), &result)?;
            tracing::info!("Results saved to {}", path.display());
        }
        None => write_json(io::stdout().lock(), &result)?,
    }

    Ok(())
}

fn write_json<W: Write, T: serde::Serialize>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value).context("Failed to serialize results")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
