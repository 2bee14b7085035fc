//! Sample command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_trigram_core::LanguageModel;

use crate::config::Config;

/// Sample command arguments.
#[derive(Parser)]
pub struct SampleCommand {
    /// Path to the trained model
    pub model: PathBuf,

    /// Number of sentences to generate
    pub count: Option<usize>,

    /// Maximum number of tokens per sentence (0 = no limit)
    #[arg(short, long)]
    pub max_length: Option<usize>,

    /// Seed for reproducible output
    #[arg(short, long)]
    pub seed: Option<u64>,
}

pub fn run(cmd: SampleCommand, config: &Config) -> Result<()> {
    report(cmd, config, &mut io::stdout().lock())
}

/// Prints one sampled sentence per line.
fn report<W: Write>(cmd: SampleCommand, config: &Config, out: &mut W) -> Result<()> {
    let model = LanguageModel::load(&cmd.model)?;

    let count = cmd.count.unwrap_or(config.samples);
    let max_length = match cmd.max_length.unwrap_or(config.max_length) {
        0 => None,
        n => Some(n),
    };
    let mut rng = match cmd.seed.or(config.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    debug!("Sampling {count} sentences, max length {max_length:?}");

    for _ in 0..count {
        writeln!(out, "{}", model.sample_sentence(max_length, &mut rng))?;
    }
    Ok(())
}
