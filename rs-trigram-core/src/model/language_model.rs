use std::f64::consts::LN_2;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info};

use super::counts::{CountStore, Trigram};
use super::smoothing::{Estimator, Smoothing};
use super::vocabulary::Vocabulary;
use crate::error::{LmError, Result};
use crate::io;

/// Each worker thread receives this many chunks of the corpus on average.
const CHUNK_FACTOR: usize = 8;

/// Parameters of a training run.
#[derive(Clone, Debug)]
pub struct TrainOptions {
	/// Smoothing policy stored in the trained model.
	pub smoothing: Smoothing,
	/// Tokens seen fewer times than this are folded into `OOV`.
	pub min_frequency: u64,
	/// Worker threads for the counting pass. `1` counts on the caller's thread.
	pub threads: usize,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			smoothing: Smoothing::AddLambda { lambda: 0.01 },
			min_frequency: 1,
			threads: num_cpus::get(),
		}
	}
}

/// A smoothed trigram language model.
///
/// The model bundles a [`Vocabulary`], the [`CountStore`] gathered from the
/// training corpus, a [`Smoothing`] policy and the size of the training
/// corpus. It is immutable once built: querying only needs `&self`, so a
/// model can be shared by any number of readers. Re-tuning the smoothing
/// produces a new model with [`LanguageModel::with_smoothing`].
///
/// # Responsibilities
/// - Train from a corpus (vocabulary pass then counting pass)
/// - Compute `P(z | x, y)` for any three tokens
/// - Score held-out files in natural log space
/// - Sample tokens and sentences (see the `generator` module)
/// - Persist itself (see the `store` module)
#[derive(Clone, Debug, PartialEq)]
pub struct LanguageModel {
	vocab: Vocabulary,
	counts: CountStore,
	smoothing: Smoothing,
	/// Raw training tokens, sentinels excluded.
	corpus_tokens: u64,
}

impl LanguageModel {
	/// Assembles a model from already validated parts.
	pub(crate) fn from_parts(vocab: Vocabulary, counts: CountStore, smoothing: Smoothing, corpus_tokens: u64) -> Self {
		Self { vocab, counts, smoothing, corpus_tokens }
	}

	/// Trains a model on a corpus file, one sentence per line.
	///
	/// # Errors
	/// - [`LmError::UnreadableCorpus`] if the file cannot be read
	/// - [`LmError::InvalidParameter`] if the options are invalid
	pub fn train<P: AsRef<Path>>(path: P, options: &TrainOptions) -> Result<Self> {
		let path = path.as_ref();
		info!("Reading training corpus {}", path.display());
		let sentences = io::read_sentences(path)?;
		Self::from_sentences(&sentences, options)
	}

	/// Trains a model on tokenized sentences.
	///
	/// # Behavior
	/// - Builds the vocabulary from raw token frequencies
	/// - Splits sentences into `threads * 8` chunks and counts them on
	///   scoped worker threads
	/// - Merges all partial counts; the result does not depend on `threads`
	pub fn from_sentences(sentences: &[Vec<String>], options: &TrainOptions) -> Result<Self> {
		options.smoothing.validate()?;
		if options.threads == 0 {
			return Err(LmError::InvalidParameter("threads must be >= 1".to_owned()));
		}

		let vocab = Vocabulary::build(sentences.iter().map(Vec::as_slice), options.min_frequency)?;
		debug!("Vocabulary has {} types (min frequency {})", vocab.len(), options.min_frequency);

		let counts = count_sentences(&vocab, sentences, options.threads);
		let corpus_tokens = sentences.iter().map(|sentence| sentence.len() as u64).sum();

		info!(
			"Trained on {} sentences, {} tokens: {} trigram types, {} bigram types, {} unigram types",
			sentences.len(),
			corpus_tokens,
			counts.trigram_types(),
			counts.bigram_types(),
			counts.unigram_types()
		);

		Ok(Self { vocab, counts, smoothing: options.smoothing, corpus_tokens })
	}

	/// Returns a copy of this model with another smoothing policy.
	pub fn with_smoothing(&self, smoothing: Smoothing) -> Result<Self> {
		smoothing.validate()?;
		Ok(Self { smoothing, ..self.clone() })
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocab
	}

	pub fn counts(&self) -> &CountStore {
		&self.counts
	}

	pub fn smoothing(&self) -> Smoothing {
		self.smoothing
	}

	/// Number of raw tokens the model was trained on.
	pub fn corpus_tokens(&self) -> u64 {
		self.corpus_tokens
	}

	/// `P(z | x, y)`. Unknown tokens are mapped to `OOV` first.
	///
	/// The result lies in `(0, 1]` for every input.
	pub fn prob(&self, x: &str, y: &str, z: &str) -> f64 {
		let trigram = Trigram::new(self.vocab.normalize(x), self.vocab.normalize(y), self.vocab.normalize(z));
		self.prob_ids(trigram)
	}

	/// `P(z | x, y)` for ids of this model's vocabulary.
	pub fn prob_ids(&self, trigram: Trigram) -> f64 {
		self.smoothing.estimate(&self.counts, self.vocab.len(), trigram)
	}

	/// Natural log of [`LanguageModel::prob_ids`].
	///
	/// # Errors
	/// Returns [`LmError::ZeroProbability`] if the estimator produced a
	/// value that is not strictly positive and finite. That can only happen
	/// through a bug in a smoothing policy.
	pub fn log_prob(&self, trigram: Trigram) -> Result<f64> {
		let prob = self.prob_ids(trigram);
		if prob > 0.0 && prob.is_finite() {
			Ok(prob.ln())
		} else {
			Err(LmError::ZeroProbability {
				x: self.vocab.token(trigram.x).to_owned(),
				y: self.vocab.token(trigram.y).to_owned(),
				z: self.vocab.token(trigram.z).to_owned(),
				prob,
			})
		}
	}

	/// Total natural-log probability of every sentence of a file.
	///
	/// The sum is accumulated term by term in log space, so long files never
	/// underflow.
	pub fn file_log_prob<P: AsRef<Path>>(&self, path: P) -> Result<f64> {
		let path = path.as_ref();
		let mut log_prob = 0.0;
		for trigram in io::read_trigrams(path, &self.vocab)? {
			log_prob += self.log_prob(trigram?)?;
		}
		debug!("{}: log-probability {log_prob}", path.display());
		Ok(log_prob)
	}

	/// Fails with [`LmError::IncompatibleModels`] unless both models share
	/// the same vocabulary. The names only label the error.
	pub fn ensure_compatible(&self, other: &Self, name: &str, other_name: &str) -> Result<()> {
		if self.vocab == other.vocab {
			Ok(())
		} else {
			Err(LmError::IncompatibleModels { first: name.to_owned(), second: other_name.to_owned() })
		}
	}
}

/// Converts a natural-log probability into bits of surprisal per token.
///
/// Returns `None` when there are no tokens to average over.
pub fn cross_entropy_bits(log_prob: f64, tokens: u64) -> Option<f64> {
	if tokens == 0 {
		return None;
	}
	Some(-log_prob / LN_2 / tokens as f64)
}

/// Counts sentences, on worker threads when `threads > 1`.
fn count_sentences(vocab: &Vocabulary, sentences: &[Vec<String>], threads: usize) -> CountStore {
	if threads == 1 || sentences.len() < 2 {
		let mut counts = CountStore::new();
		for sentence in sentences {
			counts.accumulate(vocab, sentence);
		}
		return counts;
	}

	let chunks = threads * CHUNK_FACTOR;
	let chunk_size = sentences.len().div_ceil(chunks);

	let (tx, rx) = mpsc::channel();
	thread::scope(|scope| {
		for chunk in sentences.chunks(chunk_size) {
			let tx = tx.clone();
			scope.spawn(move || {
				let mut partial = CountStore::new();
				for sentence in chunk {
					partial.accumulate(vocab, sentence);
				}
				// The receiver outlives the scope
				let _ = tx.send(partial);
			});
		}
	});
	drop(tx);

	let mut counts = CountStore::new();
	for partial in rx.iter() {
		counts.merge(&partial);
	}
	counts
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::vocabulary::{BOS, EOS, OOV};

	fn sentences(lines: &[&str]) -> Vec<Vec<String>> {
		lines
			.iter()
			.map(|line| line.split_whitespace().map(str::to_owned).collect())
			.collect()
	}

	fn options(smoothing: Smoothing) -> TrainOptions {
		TrainOptions { smoothing, min_frequency: 1, threads: 1 }
	}

	#[test]
	fn test_single_sentence_reference_probability() {
		let model = LanguageModel::from_sentences(
			&sentences(&["a b"]),
			&options(Smoothing::AddLambda { lambda: 1.0 }),
		)
		.unwrap();

		assert_eq!(model.vocabulary().len(), 5);
		assert!((model.prob(BOS, BOS, "a") - 2.0 / 6.0).abs() < 1e-12);
		assert_eq!(model.corpus_tokens(), 2);
	}

	#[test]
	fn test_unknown_tokens_score_as_oov() {
		let model = LanguageModel::from_sentences(
			&sentences(&["a b", "b a"]),
			&options(Smoothing::AddLambda { lambda: 0.5 }),
		)
		.unwrap();

		assert_eq!(model.prob("a", "zebra", "b"), model.prob("a", OOV, "b"));
		assert_eq!(model.prob("a", "b", "yak"), model.prob("a", "b", OOV));
	}

	#[test]
	fn test_probabilities_are_positive_for_unseen_contexts() {
		let model = LanguageModel::from_sentences(
			&sentences(&["the cat sat"]),
			&options(Smoothing::BackoffAddLambda { lambda: 0.01 }),
		)
		.unwrap();

		let p = model.prob("sat", "the", EOS);
		assert!(p > 0.0 && p <= 1.0);
		assert!(model.log_prob(Trigram::new(model.vocab.eos(), model.vocab.eos(), model.vocab.bos())).unwrap().is_finite());
	}

	#[test]
	fn test_parallel_training_matches_sequential() {
		let corpus: Vec<Vec<String>> = (0..200)
			.map(|i| vec![format!("w{}", i % 7), format!("w{}", i % 5), format!("w{}", i % 3)])
			.collect();

		let sequential = LanguageModel::from_sentences(&corpus, &options(Smoothing::Uniform)).unwrap();
		let parallel = LanguageModel::from_sentences(
			&corpus,
			&TrainOptions { smoothing: Smoothing::Uniform, min_frequency: 1, threads: 4 },
		)
		.unwrap();

		assert_eq!(sequential, parallel);
	}

	#[test]
	fn test_with_smoothing_leaves_original_untouched() {
		let model = LanguageModel::from_sentences(
			&sentences(&["a b"]),
			&options(Smoothing::AddLambda { lambda: 1.0 }),
		)
		.unwrap();
		let retuned = model.with_smoothing(Smoothing::AddLambda { lambda: 2.0 }).unwrap();

		assert_eq!(model.smoothing(), Smoothing::AddLambda { lambda: 1.0 });
		assert!((retuned.prob(BOS, BOS, "a") - 3.0 / 11.0).abs() < 1e-12);
		assert!(model.with_smoothing(Smoothing::AddLambda { lambda: 0.0 }).is_err());
	}

	#[test]
	fn test_zero_threads_is_rejected() {
		let result = LanguageModel::from_sentences(
			&sentences(&["a"]),
			&TrainOptions { threads: 0, ..options(Smoothing::Uniform) },
		);
		assert!(matches!(result, Err(LmError::InvalidParameter(_))));
	}

	#[test]
	fn test_incompatible_vocabularies() {
		let first = LanguageModel::from_sentences(&sentences(&["a b"]), &options(Smoothing::Uniform)).unwrap();
		let second = LanguageModel::from_sentences(&sentences(&["a c"]), &options(Smoothing::Uniform)).unwrap();
		let third = LanguageModel::from_sentences(&sentences(&["b a b"]), &options(Smoothing::Uniform)).unwrap();

		assert!(matches!(
			first.ensure_compatible(&second, "first", "second"),
			Err(LmError::IncompatibleModels { .. })
		));
		assert!(first.ensure_compatible(&third, "first", "third").is_ok());
	}

	#[test]
	fn test_cross_entropy_bits() {
		let bits = cross_entropy_bits(-(8.0f64).ln(), 1).unwrap();
		assert!((bits - 3.0).abs() < 1e-12);
		assert_eq!(cross_entropy_bits(-1.0, 0), None);
	}
}
