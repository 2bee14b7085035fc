use std::fs;
use std::path::Path;

use ahash::AHashMap;
use log::info;
use serde::{Deserialize, Serialize};

use super::counts::{CountStore, Trigram};
use super::language_model::LanguageModel;
use super::smoothing::Smoothing;
use super::vocabulary::{TokenId, Vocabulary};
use crate::error::{LmError, Result};

const MAGIC: &str = "TRIGRAM-LM";
const VERSION: u32 = 1;

/// On-disk form of a [`LanguageModel`].
///
/// Tokens are stored as strings so that the file is self-describing and
/// every count can be checked against the stored vocabulary. All tables are
/// sorted, so equal models always encode to identical bytes. The context
/// tables are not stored: they are rebuilt from the trigram table.
#[derive(Serialize, Deserialize, Debug)]
struct ModelRecord {
	magic: String,
	version: u32,
	smoothing: Smoothing,
	corpus_tokens: u64,
	vocabulary: Vec<String>,
	unigrams: Vec<(String, u64)>,
	bigrams: Vec<(String, String, u64)>,
	trigrams: Vec<(String, String, String, u64)>,
}

impl ModelRecord {
	fn from_model(model: &LanguageModel) -> Self {
		let vocab = model.vocabulary();
		let token = |id: TokenId| vocab.token(id).to_owned();
		let counts = model.counts();

		Self {
			magic: MAGIC.to_owned(),
			version: VERSION,
			smoothing: model.smoothing(),
			corpus_tokens: model.corpus_tokens(),
			vocabulary: vocab.tokens().to_vec(),
			unigrams: counts.unigrams().into_iter().map(|(z, n)| (token(z), n)).collect(),
			bigrams: counts.bigrams().into_iter().map(|((y, z), n)| (token(y), token(z), n)).collect(),
			trigrams: counts
				.trigrams()
				.into_iter()
				.map(|(t, n)| (token(t.x), token(t.y), token(t.z), n))
				.collect(),
		}
	}

	/// Validates the record and rebuilds the model.
	fn into_model(self) -> Result<LanguageModel> {
		if self.magic != MAGIC {
			return Err(corrupt(format!("unexpected header {:?}", self.magic)));
		}
		if self.version != VERSION {
			return Err(corrupt(format!("unsupported format version {}", self.version)));
		}
		self.smoothing.validate().map_err(|e| corrupt(e.to_string()))?;

		let vocab = Vocabulary::from_sorted(self.vocabulary).map_err(corrupt)?;
		let resolve = |token: &str| {
			vocab
				.id(token)
				.ok_or_else(|| corrupt(format!("count table references {token:?}, which is not in the vocabulary")))
		};

		let mut counts = CountStore::new();
		for (x, y, z, occurrence) in &self.trigrams {
			check_positive(*occurrence, "trigram")?;
			counts.add(Trigram::new(resolve(x)?, resolve(y)?, resolve(z)?), *occurrence);
		}
		if counts.trigram_types() != self.trigrams.len() {
			return Err(corrupt("duplicate trigram entries".to_owned()));
		}

		let mut unigrams = AHashMap::with_capacity(self.unigrams.len());
		for (z, occurrence) in &self.unigrams {
			check_positive(*occurrence, "unigram")?;
			if unigrams.insert(resolve(z)?, *occurrence).is_some() {
				return Err(corrupt(format!("duplicate unigram entry {z:?}")));
			}
		}
		let mut bigrams = AHashMap::with_capacity(self.bigrams.len());
		for (y, z, occurrence) in &self.bigrams {
			check_positive(*occurrence, "bigram")?;
			if bigrams.insert((resolve(y)?, resolve(z)?), *occurrence).is_some() {
				return Err(corrupt(format!("duplicate bigram entry {y:?} {z:?}")));
			}
		}

		// Lower orders must be the marginals of the trigram table.
		let unigrams_match = unigrams.len() == counts.unigram_types()
			&& unigrams.iter().all(|(z, occurrence)| counts.unigram(*z) == *occurrence);
		let bigrams_match = bigrams.len() == counts.bigram_types()
			&& bigrams.iter().all(|((y, z), occurrence)| counts.bigram(*y, *z) == *occurrence);
		if !unigrams_match || !bigrams_match {
			return Err(corrupt("unigram or bigram counts disagree with the trigram counts".to_owned()));
		}

		Ok(LanguageModel::from_parts(vocab, counts, self.smoothing, self.corpus_tokens))
	}
}

fn corrupt(message: String) -> LmError {
	LmError::CorruptModel(message)
}

fn check_positive(occurrence: u64, table: &str) -> Result<()> {
	if occurrence == 0 {
		return Err(corrupt(format!("zero {table} count")));
	}
	Ok(())
}

impl LanguageModel {
	/// Serializes the model with `postcard` and writes it to `path`.
	///
	/// `load(save(model)) == model` for the vocabulary, every count table,
	/// the smoothing policy and the corpus size.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let bytes = postcard::to_stdvec(&ModelRecord::from_model(self))?;
		fs::write(path, bytes).map_err(|source| LmError::Io { path: path.to_path_buf(), source })?;
		info!("Saved model to {}", path.display());
		Ok(())
	}

	/// Reads a model written by [`LanguageModel::save`].
	///
	/// # Errors
	/// - [`LmError::ModelNotFound`] if nothing exists at `path`
	/// - [`LmError::CorruptModel`] if the bytes cannot be decoded or the
	///   decoded model is inconsistent (unknown tokens, zero or duplicate
	///   counts, lower-order tables that do not match the trigram table,
	///   invalid smoothing hyperparameters)
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let bytes = fs::read(path).map_err(|source| match source.kind() {
			std::io::ErrorKind::NotFound => LmError::ModelNotFound(path.to_path_buf()),
			_ => LmError::Io { path: path.to_path_buf(), source },
		})?;

		let record: ModelRecord = postcard::from_bytes(&bytes)
			.map_err(|e| corrupt(format!("{}: {e}", path.display())))?;
		let model = record.into_model()?;

		info!(
			"Loaded model {} ({} types, {} training tokens, {:?})",
			path.display(),
			model.vocabulary().len(),
			model.corpus_tokens(),
			model.smoothing()
		);
		Ok(model)
	}
}
