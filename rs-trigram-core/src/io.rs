use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{LmError, Result};
use crate::model::counts::Trigram;
use crate::model::vocabulary::{TokenId, Vocabulary};

/// Lazily reads a corpus, one whitespace-tokenized sentence per line.
///
/// - Empty (or whitespace-only) lines are skipped with a warning
/// - Read failures are reported as [`LmError::UnreadableCorpus`]
pub struct Sentences<R> {
	path: PathBuf,
	lines: Lines<R>,
	line_number: usize,
}

impl<R: BufRead> Sentences<R> {
	/// Wraps any buffered reader. `name` is only used in messages.
	pub fn from_reader<P: AsRef<Path>>(name: P, reader: R) -> Self {
		Self {
			path: name.as_ref().to_path_buf(),
			lines: reader.lines(),
			line_number: 0,
		}
	}
}

impl<R: BufRead> Iterator for Sentences<R> {
	type Item = Result<Vec<String>>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let line = match self.lines.next()? {
				Ok(line) => line,
				Err(source) => {
					return Some(Err(LmError::UnreadableCorpus { path: self.path.clone(), source }));
				}
			};
			self.line_number += 1;

			let tokens: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
			if tokens.is_empty() {
				warn!("{}:{}: skipping empty line", self.path.display(), self.line_number);
				continue;
			}
			return Some(Ok(tokens));
		}
	}
}

/// Opens a corpus file for sentence-by-sentence reading.
pub fn sentences<P: AsRef<Path>>(path: P) -> Result<Sentences<BufReader<File>>> {
	let path = path.as_ref();
	let file = File::open(path)
		.map_err(|source| LmError::UnreadableCorpus { path: path.to_path_buf(), source })?;
	Ok(Sentences::from_reader(path, BufReader::new(file)))
}

/// Reads a whole corpus into memory.
pub fn read_sentences<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
	sentences(path)?.collect()
}

/// Lazy sequence of the trigrams of a corpus, normalized against a vocabulary.
///
/// Each sentence is wrapped as `BOS BOS w1 .. wn EOS`, so a sentence of `n`
/// tokens yields `n + 1` trigrams.
pub struct Trigrams<'v, R> {
	sentences: Sentences<R>,
	vocab: &'v Vocabulary,
	window: Vec<TokenId>,
	position: usize,
}

impl<'v, R: BufRead> Trigrams<'v, R> {
	pub fn new(sentences: Sentences<R>, vocab: &'v Vocabulary) -> Self {
		Self { sentences, vocab, window: Vec::new(), position: 0 }
	}
}

impl<R: BufRead> Iterator for Trigrams<'_, R> {
	type Item = Result<Trigram>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if let Some(window) = self.window.get(self.position..self.position + 3) {
				self.position += 1;
				return Some(Ok(Trigram::new(window[0], window[1], window[2])));
			}
			match self.sentences.next()? {
				Ok(tokens) => {
					self.window = self.vocab.encode_sentence(&tokens);
					self.position = 0;
				}
				Err(e) => return Some(Err(e)),
			}
		}
	}
}

/// Opens a corpus file and iterates over its trigrams.
///
/// Each call reopens the file, so the sequence can be restarted.
pub fn read_trigrams<'v, P: AsRef<Path>>(path: P, vocab: &'v Vocabulary) -> Result<Trigrams<'v, BufReader<File>>> {
	Ok(Trigrams::new(sentences(path)?, vocab))
}

/// Counts the tokens of a corpus file, plus one `EOS` per sentence.
///
/// This is the number of events the model predicts when scoring the file,
/// which is the denominator of a bits-per-token figure.
pub fn num_tokens<P: AsRef<Path>>(path: P) -> Result<u64> {
	let mut total = 0u64;
	for sentence in sentences(path)? {
		total += sentence?.len() as u64 + 1;
	}
	Ok(total)
}

/// Extension given to model files written next to their corpus.
pub const MODEL_EXTENSION: &str = "model";

/// Default model path for a corpus: `data/en.train` → `data/en.model`.
///
/// `None` when the path has no file name to put the extension on.
pub fn model_path<P: AsRef<Path>>(corpus: P) -> Option<PathBuf> {
	let corpus = corpus.as_ref();
	corpus.file_stem()?;
	Some(corpus.with_extension(MODEL_EXTENSION))
}

/// Category name of a model file: its file name without the extension.
pub fn file_stem<P: AsRef<Path>>(path: P) -> Option<String> {
	path.as_ref().file_stem().map(|stem| stem.to_string_lossy().into_owned())
}

/// Lists the regular files directly inside a directory, sorted by path.
pub fn list_files<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() {
			files.push(path);
		}
	}
	files.sort();

	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	fn vocab_of(lines: &[&str]) -> Vocabulary {
		let sentences: Vec<Vec<String>> = lines
			.iter()
			.map(|line| line.split_whitespace().map(str::to_owned).collect())
			.collect();
		Vocabulary::build(sentences.iter().map(Vec::as_slice), 1).unwrap()
	}

	#[test]
	fn test_sentences_skip_empty_lines() {
		let text = "a b\n\n   \nc\n";
		let sentences: Vec<Vec<String>> = Sentences::from_reader("memory", Cursor::new(text))
			.collect::<Result<_>>()
			.unwrap();
		assert_eq!(sentences, vec![vec!["a".to_owned(), "b".to_owned()], vec!["c".to_owned()]]);
	}

	#[test]
	fn test_trigrams_are_padded_and_normalized() {
		let vocab = vocab_of(&["a b"]);
		let sentences = Sentences::from_reader("memory", Cursor::new("a x\nb\n"));
		let trigrams: Vec<[&str; 3]> = Trigrams::new(sentences, &vocab)
			.map(|t| {
				let t = t.unwrap();
				[vocab.token(t.x), vocab.token(t.y), vocab.token(t.z)]
			})
			.collect();

		assert_eq!(
			trigrams,
			vec![
				["BOS", "BOS", "a"],
				["BOS", "a", "OOV"],
				["a", "OOV", "EOS"],
				["BOS", "BOS", "b"],
				["BOS", "b", "EOS"],
			]
		);
	}

	#[test]
	fn test_missing_corpus_is_unreadable() {
		let vocab = vocab_of(&["a"]);
		assert!(matches!(
			read_trigrams("/definitely/not/here.txt", &vocab),
			Err(LmError::UnreadableCorpus { .. })
		));
	}

	#[test]
	fn test_num_tokens_counts_eos() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("held-out.txt");
		fs::write(&path, "a b c\n\nd\n").unwrap();
		assert_eq!(num_tokens(&path).unwrap(), 6);
	}

	#[test]
	fn test_model_path_replaces_the_extension() {
		assert_eq!(model_path("data/en.train"), Some(PathBuf::from("data/en.model")));
		assert_eq!(model_path("corpus"), Some(PathBuf::from("corpus.model")));
		assert_eq!(model_path(".."), None);
	}

	#[test]
	fn test_file_stem_names_the_category() {
		assert_eq!(file_stem("./models/gen.model").as_deref(), Some("gen"));
		assert_eq!(file_stem("spam.model").as_deref(), Some("spam"));
		assert_eq!(file_stem("/"), None);
	}

	#[test]
	fn test_list_files_is_sorted() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.txt"), "b").unwrap();
		fs::write(dir.path().join("a.txt"), "a").unwrap();
		fs::create_dir(dir.path().join("nested")).unwrap();

		let files = list_files(dir.path()).unwrap();
		assert_eq!(files, vec![dir.path().join("a.txt"), dir.path().join("b.txt")]);
	}
}
