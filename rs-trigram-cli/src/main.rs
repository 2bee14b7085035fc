//! trigram - train, score, classify and sample with smoothed trigram models.
//!
//! This is the main entry point for the `trigram` command-line tool. Every
//! command is a thin caller of `rs-trigram-core`.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{ClassifyCommand, SampleCommand, ScoreCommand, TrainCommand};
use config::Config;
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "trigram")]
#[command(about = "Smoothed trigram language models", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model from a corpus
    Train(TrainCommand),
    /// Compute the log-probability and cross-entropy of files
    Score(ScoreCommand),
    /// Assign each file to the more probable of two models
    Classify(ClassifyCommand),
    /// Generate random sentences
    Sample(SampleCommand),
}

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);
    let config = Config::load(cli.config.as_deref());

    match cli.command {
        Commands::Train(cmd) => commands::train::run(cmd, &config)?,
        Commands::Score(cmd) => commands::score::run(cmd)?,
        Commands::Classify(cmd) => commands::classify::run(cmd)?,
        Commands::Sample(cmd) => commands::sample::run(cmd, &config)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags_conflict() {
        assert!(Cli::try_parse_from(["trigram", "-v", "-q", "score", "m", "f"]).is_err());
        assert!(Cli::try_parse_from(["trigram", "-q", "score", "m", "f"]).is_ok());
    }

    #[test]
    fn test_classify_arguments() {
        let cli = Cli::try_parse_from(["trigram", "classify", "gen.model", "spam.model", "0.7", "a.txt", "b.txt"]).unwrap();
        match cli.command {
            Commands::Classify(cmd) => {
                assert_eq!(cmd.prior, 0.7);
                assert_eq!(cmd.files.len(), 2);
            }
            _ => panic!("expected classify"),
        }
    }
}
