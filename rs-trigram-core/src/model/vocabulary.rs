use ahash::AHashMap;

use crate::error::{LmError, Result};

/// Start-of-sequence sentinel, emitted twice to seed every trigram context.
pub const BOS: &str = "BOS";
/// End-of-sequence sentinel, terminates a sentence.
pub const EOS: &str = "EOS";
/// Out-of-vocabulary sentinel, substitutes any token absent from the vocabulary.
pub const OOV: &str = "OOV";

/// Tokens every vocabulary contains regardless of the training data.
pub const RESERVED: [&str; 3] = [BOS, EOS, OOV];

/// Dense index of a token inside a [`Vocabulary`].
///
/// Ids follow the sorted order of the vocabulary tokens, which is also the
/// order the sampler walks when it builds a cumulative distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u32);

impl TokenId {
	/// Position of the token in the sorted vocabulary.
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

/// The fixed set of tokens a model knows about.
///
/// # Invariants
/// - `tokens` is sorted and free of duplicates
/// - `tokens` contains the three reserved sentinels
/// - `index[tokens[i]] == TokenId(i)` for every `i`
#[derive(Clone, Debug)]
pub struct Vocabulary {
	tokens: Vec<String>,
	index: AHashMap<String, TokenId>,
	bos: TokenId,
	eos: TokenId,
	oov: TokenId,
}

impl PartialEq for Vocabulary {
	fn eq(&self, other: &Self) -> bool {
		self.tokens == other.tokens
	}
}

impl Eq for Vocabulary {}

impl Vocabulary {
	/// Builds a vocabulary from tokenized training sentences.
	///
	/// A token is kept iff it occurs at least `min_frequency` times; rarer
	/// tokens are left out so that they map to [`OOV`], which lets the model
	/// learn how unknown words behave. The sentinels are always included.
	///
	/// # Errors
	/// Returns [`LmError::InvalidParameter`] if `min_frequency` is zero.
	pub fn build<'a, I>(sentences: I, min_frequency: u64) -> Result<Self>
	where
		I: IntoIterator<Item = &'a [String]>,
	{
		if min_frequency == 0 {
			return Err(LmError::InvalidParameter("min_frequency must be >= 1".to_owned()));
		}

		let mut frequencies: AHashMap<&str, u64> = AHashMap::new();
		for sentence in sentences {
			for token in sentence {
				*frequencies.entry(token.as_str()).or_insert(0) += 1;
			}
		}

		let mut tokens: Vec<String> = frequencies
			.into_iter()
			.filter(|(_, frequency)| *frequency >= min_frequency)
			.map(|(token, _)| token.to_owned())
			.chain(RESERVED.iter().map(|token| (*token).to_owned()))
			.collect();
		tokens.sort_unstable();
		tokens.dedup();

		Self::from_sorted(tokens).map_err(LmError::InvalidParameter)
	}

	/// Rebuilds a vocabulary from its persisted token list.
	///
	/// The list must be strictly sorted and contain every reserved token.
	/// Returns a description of the first violation otherwise.
	pub(crate) fn from_sorted(tokens: Vec<String>) -> std::result::Result<Self, String> {
		if let Some(pair) = tokens.windows(2).find(|pair| pair[0] >= pair[1]) {
			return Err(format!("vocabulary is not strictly sorted at {:?}, {:?}", pair[0], pair[1]));
		}
		if u32::try_from(tokens.len()).is_err() {
			return Err(format!("vocabulary of {} tokens is too large", tokens.len()));
		}

		let index: AHashMap<String, TokenId> = tokens
			.iter()
			.enumerate()
			.map(|(i, token)| (token.clone(), TokenId(i as u32)))
			.collect();

		let reserved = |name: &str| {
			index
				.get(name)
				.copied()
				.ok_or_else(|| format!("vocabulary is missing the reserved token {name}"))
		};
		let bos = reserved(BOS)?;
		let eos = reserved(EOS)?;
		let oov = reserved(OOV)?;

		Ok(Self { tokens, index, bos, eos, oov })
	}

	/// Number of tokens, sentinels included. This is `|V|` in the estimators.
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	/// Always false: the sentinels are part of every vocabulary.
	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	pub fn contains(&self, token: &str) -> bool {
		self.index.contains_key(token)
	}

	/// Looks a token up without falling back to [`OOV`].
	pub fn id(&self, token: &str) -> Option<TokenId> {
		self.index.get(token).copied()
	}

	/// Maps any token to its id, or to the id of [`OOV`] if it is unknown.
	pub fn normalize(&self, token: &str) -> TokenId {
		self.id(token).unwrap_or(self.oov)
	}

	/// Returns the token for an id produced by this vocabulary.
	///
	/// # Panics
	/// Panics if `id` comes from a different, larger vocabulary.
	pub fn token(&self, id: TokenId) -> &str {
		&self.tokens[id.index()]
	}

	/// Tokens in sorted order.
	pub fn tokens(&self) -> &[String] {
		&self.tokens
	}

	/// All ids in vocabulary order.
	pub fn ids(&self) -> impl Iterator<Item = TokenId> + '_ {
		(0..self.tokens.len()).map(|i| TokenId(i as u32))
	}

	pub fn bos(&self) -> TokenId {
		self.bos
	}

	pub fn eos(&self) -> TokenId {
		self.eos
	}

	pub fn oov(&self) -> TokenId {
		self.oov
	}

	/// Normalizes a raw sentence and wraps it as `BOS BOS w1 .. wn EOS`.
	pub fn encode_sentence<S: AsRef<str>>(&self, sentence: &[S]) -> Vec<TokenId> {
		let mut ids = Vec::with_capacity(sentence.len() + 3);
		ids.push(self.bos);
		ids.push(self.bos);
		ids.extend(sentence.iter().map(|token| self.normalize(token.as_ref())));
		ids.push(self.eos);
		ids
	}
}
