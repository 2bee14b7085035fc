use ahash::AHashMap;

use super::vocabulary::{TokenId, Vocabulary};

/// A context pair `(x, y)` followed by the predicted token `z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Trigram {
	pub x: TokenId,
	pub y: TokenId,
	pub z: TokenId,
}

impl Trigram {
	pub fn new(x: TokenId, y: TokenId, z: TokenId) -> Self {
		Self { x, y, z }
	}
}

/// Frequency tables gathered from the training corpus.
///
/// Every trigram window `(x, y, z)` of a padded sentence is one *event*.
/// An event increments the trigram count `c(x,y,z)`, the bigram count
/// `c(y,z)` and the unigram count `c(z)`, together with the matching
/// context counts `c(x,y)` and `c(y)` and the event total `N`.
///
/// # Invariants
/// - `c(x,y) == Σ_z c(x,y,z)`, hence `c(x,y) >= c(x,y,z)`
/// - `c(y) == Σ_z c(y,z)` and `N == Σ_z c(z)`
/// - Every stored count is >= 1
///
/// Those sums are what make every smoothed conditional distribution add up
/// to one. Once a model is built the store is only reachable through `&`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CountStore {
	trigrams: AHashMap<(TokenId, TokenId, TokenId), u64>,
	bigrams: AHashMap<(TokenId, TokenId), u64>,
	unigrams: AHashMap<TokenId, u64>,
	trigram_contexts: AHashMap<(TokenId, TokenId), u64>,
	bigram_contexts: AHashMap<TokenId, u64>,
	total: u64,
}

impl CountStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Counts every trigram window of one raw sentence.
	///
	/// Tokens go through [`Vocabulary::normalize`] and the sentence is
	/// wrapped with two `BOS` and one `EOS` before windowing.
	pub fn accumulate<S: AsRef<str>>(&mut self, vocab: &Vocabulary, sentence: &[S]) {
		let ids = vocab.encode_sentence(sentence);
		for window in ids.windows(3) {
			self.add(Trigram::new(window[0], window[1], window[2]), 1);
		}
	}

	/// Records `occurrence` observations of a trigram event.
	pub(crate) fn add(&mut self, trigram: Trigram, occurrence: u64) {
		let Trigram { x, y, z } = trigram;
		*self.trigrams.entry((x, y, z)).or_insert(0) += occurrence;
		*self.bigrams.entry((y, z)).or_insert(0) += occurrence;
		*self.unigrams.entry(z).or_insert(0) += occurrence;
		*self.trigram_contexts.entry((x, y)).or_insert(0) += occurrence;
		*self.bigram_contexts.entry(y).or_insert(0) += occurrence;
		self.total += occurrence;
	}

	/// Merges another store built over the same vocabulary into this one.
	///
	/// Counts are summed, so merging is associative and commutative: partial
	/// stores built from any partition of the corpus merge into the store a
	/// single sequential pass would have produced.
	pub fn merge(&mut self, other: &Self) {
		for (key, occurrence) in &other.trigrams {
			*self.trigrams.entry(*key).or_insert(0) += occurrence;
		}
		for (key, occurrence) in &other.bigrams {
			*self.bigrams.entry(*key).or_insert(0) += occurrence;
		}
		for (key, occurrence) in &other.unigrams {
			*self.unigrams.entry(*key).or_insert(0) += occurrence;
		}
		for (key, occurrence) in &other.trigram_contexts {
			*self.trigram_contexts.entry(*key).or_insert(0) += occurrence;
		}
		for (key, occurrence) in &other.bigram_contexts {
			*self.bigram_contexts.entry(*key).or_insert(0) += occurrence;
		}
		self.total += other.total;
	}

	/// `c(x,y,z)`
	pub fn trigram(&self, trigram: Trigram) -> u64 {
		self.trigrams.get(&(trigram.x, trigram.y, trigram.z)).copied().unwrap_or(0)
	}

	/// `c(y,z)`
	pub fn bigram(&self, y: TokenId, z: TokenId) -> u64 {
		self.bigrams.get(&(y, z)).copied().unwrap_or(0)
	}

	/// `c(z)`
	pub fn unigram(&self, z: TokenId) -> u64 {
		self.unigrams.get(&z).copied().unwrap_or(0)
	}

	/// `c(x,y)`, the number of events observed in the context `(x, y)`.
	pub fn trigram_context(&self, x: TokenId, y: TokenId) -> u64 {
		self.trigram_contexts.get(&(x, y)).copied().unwrap_or(0)
	}

	/// `c(y)`, the number of events whose previous token is `y`.
	pub fn bigram_context(&self, y: TokenId) -> u64 {
		self.bigram_contexts.get(&y).copied().unwrap_or(0)
	}

	/// `N`, the number of trigram events.
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Trigram table in id order.
	pub fn trigrams(&self) -> Vec<(Trigram, u64)> {
		let mut entries: Vec<(Trigram, u64)> = self
			.trigrams
			.iter()
			.map(|((x, y, z), occurrence)| (Trigram::new(*x, *y, *z), *occurrence))
			.collect();
		entries.sort_unstable_by_key(|(trigram, _)| *trigram);
		entries
	}

	/// Bigram table in id order.
	pub fn bigrams(&self) -> Vec<((TokenId, TokenId), u64)> {
		let mut entries: Vec<_> = self.bigrams.iter().map(|(key, occurrence)| (*key, *occurrence)).collect();
		entries.sort_unstable_by_key(|(key, _)| *key);
		entries
	}

	/// Unigram table in id order.
	pub fn unigrams(&self) -> Vec<(TokenId, u64)> {
		let mut entries: Vec<_> = self.unigrams.iter().map(|(key, occurrence)| (*key, *occurrence)).collect();
		entries.sort_unstable_by_key(|(key, _)| *key);
		entries
	}

	/// Number of distinct trigram types.
	pub fn trigram_types(&self) -> usize {
		self.trigrams.len()
	}

	/// Number of distinct bigram types.
	pub fn bigram_types(&self) -> usize {
		self.bigrams.len()
	}

	/// Number of distinct unigram types.
	pub fn unigram_types(&self) -> usize {
		self.unigrams.len()
	}
}
