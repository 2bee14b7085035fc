//! Score command implementation.

use std::f64::consts::LN_2;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use log::{error, info};
use rs_trigram_core::io::num_tokens;
use rs_trigram_core::{LanguageModel, LmError, cross_entropy_bits};

use super::expand_files;

/// Score command arguments.
#[derive(Parser)]
pub struct ScoreCommand {
    /// Path to the trained model
    pub model: PathBuf,

    /// Files (or directories of files) to score, one sentence per line
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(cmd: ScoreCommand) -> Result<()> {
    report(cmd, &mut io::stdout().lock())
}

/// Prints one `<log2-probability>\t<file>` line per file, then the overall
/// cross-entropy. Unreadable files are logged and skipped; they make the
/// command fail once every other file has been scored.
fn report<W: Write>(cmd: ScoreCommand, out: &mut W) -> Result<()> {
    let model = LanguageModel::load(&cmd.model)?;

    info!("Per-file log2-probabilities:");
    let mut total_log_prob = 0.0;
    let mut total_tokens = 0u64;
    let mut failed = 0usize;

    for file in expand_files(&cmd.files)? {
        let log_prob = match model.file_log_prob(&file) {
            Ok(log_prob) => log_prob,
            Err(e @ LmError::UnreadableCorpus { .. }) => {
                error!("{e}");
                failed += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(out, "{:.6}\t{}", log_prob / LN_2, file.display())?;
        total_log_prob += log_prob;
        total_tokens += num_tokens(&file)?;
    }

    match cross_entropy_bits(total_log_prob, total_tokens) {
        Some(bits) => writeln!(out, "Overall cross-entropy:\t{bits:.5} bits per token")?,
        None => writeln!(out, "Overall cross-entropy:\tundefined (no tokens)")?,
    }

    if failed > 0 {
        bail!("{failed} file(s) could not be read");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{save_model, write_file};
    use std::fs;
    use tempfile::TempDir;

    fn score(model: PathBuf, files: Vec<PathBuf>) -> (Result<()>, String) {
        let mut out = Vec::new();
        let result = report(ScoreCommand { model, files }, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_prints_file_lines_and_cross_entropy() {
        let dir = TempDir::new().unwrap();
        let model = save_model(&dir, "en", "the cat sat\nthe dog ran\n");
        let held_out = write_file(&dir, "en.dev", "the cat ran\n");

        let (result, output) = score(model, vec![held_out.clone()]);
        result.unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(&format!("\t{}", held_out.display())));
        let log2_prob: f64 = lines[0].split('\t').next().unwrap().parse().unwrap();
        assert!(log2_prob < 0.0 && log2_prob.is_finite());
        assert!(lines[1].starts_with("Overall cross-entropy:\t"));
        assert!(lines[1].ends_with("bits per token"));
    }

    #[test]
    fn test_missing_model_fails() {
        let dir = TempDir::new().unwrap();
        let held_out = write_file(&dir, "en.dev", "a b\n");

        let (result, output) = score(dir.path().join("absent.model"), vec![held_out]);
        let err = result.unwrap_err();
        assert!(matches!(err.downcast_ref::<LmError>(), Some(LmError::ModelNotFound(_))));
        assert!(output.is_empty());
    }

    #[test]
    fn test_corrupt_model_fails() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("broken.model");
        fs::write(&model, b"definitely not postcard").unwrap();
        let held_out = write_file(&dir, "en.dev", "a b\n");

        let (result, _) = score(model, vec![held_out]);
        let err = result.unwrap_err();
        assert!(matches!(err.downcast_ref::<LmError>(), Some(LmError::CorruptModel(_))));
    }

    #[test]
    fn test_unreadable_file_is_skipped_then_fails() {
        let dir = TempDir::new().unwrap();
        let model = save_model(&dir, "en", "a b\nb a\n");
        let missing = dir.path().join("missing.dev");
        let held_out = write_file(&dir, "en.dev", "a b\n");

        let (result, output) = score(model, vec![missing, held_out.clone()]);
        assert!(result.is_err());
        assert!(output.contains(&format!("\t{}", held_out.display())));
        assert!(output.contains("Overall cross-entropy:"));
    }
}
