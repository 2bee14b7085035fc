//! Classify command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use log::{error, info};
use rs_trigram_core::{Choice, Classifier, LmError};

use super::expand_files;

/// Classify command arguments.
#[derive(Parser)]
pub struct ClassifyCommand {
    /// Model of the first category
    pub first_model: PathBuf,

    /// Model of the second category
    pub second_model: PathBuf,

    /// Prior probability of the first category, in (0, 1)
    pub prior: f64,

    /// Files (or directories of files) to classify
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(cmd: ClassifyCommand) -> Result<()> {
    report(cmd, &mut io::stdout().lock())
}

/// Prints `<category>\t<file>` per file, then the per-category totals.
fn report<W: Write>(cmd: ClassifyCommand, out: &mut W) -> Result<()> {
    // Fails on incompatible vocabularies before any file is scored
    let classifier = Classifier::load(&cmd.first_model, &cmd.second_model, cmd.prior)?;
    info!(
        "Classifying with prior {} for {} and {} for {}",
        classifier.prior_first(),
        classifier.category(Choice::First).name,
        1.0 - classifier.prior_first(),
        classifier.category(Choice::Second).name
    );

    let mut first_count = 0usize;
    let mut second_count = 0usize;
    let mut failed = 0usize;

    for file in expand_files(&cmd.files)? {
        let decision = match classifier.classify_file(&file) {
            Ok(decision) => decision,
            Err(e @ LmError::UnreadableCorpus { .. }) => {
                error!("{e}");
                failed += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        match decision.choice {
            Choice::First => first_count += 1,
            Choice::Second => second_count += 1,
        }
        writeln!(out, "{}\t{}", classifier.category(decision.choice).name, file.display())?;
    }

    let total = first_count + second_count;
    if total > 0 {
        for (choice, count) in [(Choice::First, first_count), (Choice::Second, second_count)] {
            writeln!(
                out,
                "{} files were more probably {} ({:.2}%)",
                count,
                classifier.category(choice).name,
                100.0 * count as f64 / total as f64
            )?;
        }
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
    use tempfile::TempDir;

    fn classify(first: PathBuf, second: PathBuf, files: Vec<PathBuf>) -> (Result<()>, String) {
        let mut out = Vec::new();
        let cmd = ClassifyCommand { first_model: first, second_model: second, prior: 0.5, files };
        let result = report(cmd, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_assigns_files_and_prints_totals() {
        let dir = TempDir::new().unwrap();
        let gen_model = save_model(&dir, "gen", "a a b\na a a b\na b\n");
        let spam_model = save_model(&dir, "spam", "b b a\nb b b a\nb a\n");
        let gen_doc = write_file(&dir, "one.txt", "a a a a b\n");
        let spam_doc = write_file(&dir, "two.txt", "b b b b a\n");

        let (result, output) = classify(gen_model, spam_model, vec![gen_doc.clone(), spam_doc.clone()]);
        result.unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], format!("gen\t{}", gen_doc.display()));
        assert_eq!(lines[1], format!("spam\t{}", spam_doc.display()));
        assert_eq!(lines[2], "1 files were more probably gen (50.00%)");
        assert_eq!(lines[3], "1 files were more probably spam (50.00%)");
    }

    #[test]
    fn test_incompatible_models_fail_before_scoring() {
        let dir = TempDir::new().unwrap();
        let first = save_model(&dir, "first", "a b\n");
        let second = save_model(&dir, "second", "c d\n");
        let doc = write_file(&dir, "doc.txt", "a b\n");

        let (result, output) = classify(first, second, vec![doc]);
        let err = result.unwrap_err();
        assert!(matches!(err.downcast_ref::<LmError>(), Some(LmError::IncompatibleModels { .. })));
        assert!(output.is_empty());
    }

    #[test]
    fn test_unreadable_file_is_skipped_then_fails() {
        let dir = TempDir::new().unwrap();
        let first = save_model(&dir, "first", "a b\n");
        let second = save_model(&dir, "second", "b a\n");
        let doc = write_file(&dir, "doc.txt", "a b\n");

        let (result, output) = classify(first, second, vec![dir.path().join("missing.txt"), doc.clone()]);
        assert!(result.is_err());
        assert!(output.contains(&format!("\t{}", doc.display())));
    }
}
