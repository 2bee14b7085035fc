//! CLI commands for the trigram tool.

pub mod classify;
pub mod sample;
pub mod score;
pub mod train;

pub use classify::ClassifyCommand;
pub use sample::SampleCommand;
pub use score::ScoreCommand;
pub use train::TrainCommand;

use std::path::PathBuf;

use anyhow::{Context, Result};
use rs_trigram_core::io::list_files;

/// Replaces every directory argument by the files it contains.
pub fn expand_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        if path.is_dir() {
            let listed = list_files(path).with_context(|| format!("cannot list {}", path.display()))?;
            files.extend(listed);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rs_trigram_core::{LanguageModel, TrainOptions};
    use std::fs;
    use tempfile::TempDir;

    pub(crate) fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Trains `<name>.model` on `corpus` inside `dir`.
    pub(crate) fn save_model(dir: &TempDir, name: &str, corpus: &str) -> PathBuf {
        let corpus = write_file(dir, &format!("{name}.train"), corpus);
        let options = TrainOptions { threads: 1, ..TrainOptions::default() };
        let path = dir.path().join(format!("{name}.model"));
        LanguageModel::train(&corpus, &options).unwrap().save(&path).unwrap();
        path
    }

    #[test]
    fn test_expand_files() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("dev");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("b.txt"), "b").unwrap();
        fs::write(nested.join("a.txt"), "a").unwrap();
        let single = dir.path().join("single.txt");

        let files = expand_files(&[single.clone(), nested.clone()]).unwrap();
        assert_eq!(files, vec![single, nested.join("a.txt"), nested.join("b.txt")]);
    }
}
