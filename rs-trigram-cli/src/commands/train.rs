//! Train command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use rs_trigram_core::io::model_path;
use rs_trigram_core::{LanguageModel, Smoothing, SmoothingKind, TrainOptions};

use crate::config::Config;

/// Train command arguments.
#[derive(Parser)]
pub struct TrainCommand {
    /// Training corpus, one sentence per line
    pub corpus: PathBuf,

    /// Output model file (defaults to the corpus path with a .model extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Smoothing policy: uniform, add-lambda or backoff-add-lambda
    #[arg(short, long)]
    pub smoothing: Option<SmoothingKind>,

    /// Smoothing hyperparameter (> 0)
    #[arg(short, long)]
    pub lambda: Option<f64>,

    /// Tokens seen fewer times are replaced by OOV
    #[arg(short, long)]
    pub min_frequency: Option<u64>,

    /// Counting threads (0 = all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

pub fn run(cmd: TrainCommand, config: &Config) -> Result<()> {
    let kind = cmd.smoothing.unwrap_or(config.smoothing);
    let smoothing = Smoothing::new(kind, cmd.lambda.unwrap_or(config.lambda))?;
    let threads = match cmd.threads.unwrap_or(config.threads) {
        0 => TrainOptions::default().threads,
        n => n,
    };
    let options = TrainOptions {
        smoothing,
        min_frequency: cmd.min_frequency.unwrap_or(config.min_frequency),
        threads,
    };

    let output = match cmd.output {
        Some(path) => path,
        None => model_path(&cmd.corpus).with_context(|| format!("{} has no file name", cmd.corpus.display()))?,
    };
    if output == cmd.corpus {
        bail!("Refusing to overwrite the corpus {} with the model", output.display());
    }

    match options.smoothing.lambda() {
        Some(lambda) => info!(
            "Training with {} smoothing (lambda {}) on {} threads",
            options.smoothing.kind(),
            lambda,
            options.threads
        ),
        None => info!("Training with {} smoothing on {} threads", options.smoothing.kind(), options.threads),
    }
    let model = LanguageModel::train(&cmd.corpus, &options)?;
    model.save(&output)?;

    println!(
        "Trained {} ({} types, {} tokens) -> {}",
        cmd.corpus.display(),
        model.vocabulary().len(),
        model.corpus_tokens(),
        output.display()
    );
    Ok(())
}
