use rand::Rng;

use super::counts::Trigram;
use super::language_model::LanguageModel;
use super::vocabulary::TokenId;

/// Appended to a sentence cut off by the length cap.
pub const TRUNCATION_MARK: &str = "...";

impl LanguageModel {
	/// Draws the token that follows `(x, y)`.
	///
	/// Unknown context tokens are mapped to `OOV` first.
	pub fn sample<R: Rng + ?Sized>(&self, x: &str, y: &str, rng: &mut R) -> &str {
		let vocab = self.vocabulary();
		let z = self.sample_id(vocab.normalize(x), vocab.normalize(y), rng);
		vocab.token(z)
	}

	/// Draws the id of the token that follows `(x, y)`.
	///
	/// This method performs:
	/// - one uniform draw `r` in `[0, 1)`
	/// - an O(|V|) scan over the vocabulary in id order, accumulating
	///   `P(z | x, y)` until the running total exceeds `r`
	///
	/// The order of the scan is fixed, so a given draw always maps to the
	/// same token.
	pub fn sample_id<R: Rng + ?Sized>(&self, x: TokenId, y: TokenId, rng: &mut R) -> TokenId {
		let r: f64 = rng.random();
		let vocab = self.vocabulary();

		let mut cumulative = 0.0;
		let mut fallback = vocab.eos();
		for z in vocab.ids() {
			cumulative += self.prob_ids(Trigram::new(x, y, z));
			if r < cumulative {
				return z;
			}
			fallback = z;
		}

		// Rounding left the total just below r: the last token takes the slack.
		fallback
	}

	/// Starts a new sentence drawn from the model.
	///
	/// The context is seeded with `BOS BOS`. Generation stops after `EOS`
	/// is drawn (it is yielded as the final item) or once `max_length`
	/// tokens were emitted. `None` means no limit; callers should set one to
	/// guarantee termination.
	pub fn generate<'a, R: Rng + ?Sized>(&'a self, max_length: Option<usize>, rng: &'a mut R) -> Generate<'a, R> {
		let bos = self.vocabulary().bos();
		Generate {
			model: self,
			rng,
			context: (bos, bos),
			emitted: 0,
			max_length,
			finished: false,
		}
	}

	/// Samples one sentence and renders it as text.
	///
	/// Tokens are joined with spaces and `EOS` is dropped. A sentence that
	/// hit the length cap ends with [`TRUNCATION_MARK`].
	pub fn sample_sentence<R: Rng + ?Sized>(&self, max_length: Option<usize>, rng: &mut R) -> String {
		let eos = self.vocabulary().eos();
		let mut words: Vec<&str> = Vec::new();
		let mut ended = false;

		for z in self.generate(max_length, rng).ids() {
			if z == eos {
				ended = true;
			} else {
				words.push(self.vocabulary().token(z));
			}
		}
		if !ended {
			words.push(TRUNCATION_MARK);
		}
		words.join(" ")
	}
}

/// Lazy, finite-by-cap sequence of sampled tokens.
///
/// Created by [`LanguageModel::generate`]. The only state is the sliding
/// context window; the model itself is only read.
pub struct Generate<'a, R: ?Sized> {
	model: &'a LanguageModel,
	rng: &'a mut R,
	context: (TokenId, TokenId),
	emitted: usize,
	max_length: Option<usize>,
	finished: bool,
}

impl<'a, R: Rng + ?Sized> Generate<'a, R> {
	/// Yields ids instead of token strings.
	pub fn ids(self) -> GenerateIds<'a, R> {
		GenerateIds(self)
	}

	fn next_id(&mut self) -> Option<TokenId> {
		if self.finished || self.max_length.is_some_and(|max| self.emitted >= max) {
			return None;
		}

		let (x, y) = self.context;
		let z = self.model.sample_id(x, y, self.rng);
		self.context = (y, z);
		self.emitted += 1;
		if z == self.model.vocabulary().eos() {
			self.finished = true;
		}
		Some(z)
	}
}

impl<'a, R: Rng + ?Sized> Iterator for Generate<'a, R> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		let model = self.model;
		self.next_id().map(|z| model.vocabulary().token(z))
	}
}

/// Id form of [`Generate`].
pub struct GenerateIds<'a, R: ?Sized>(Generate<'a, R>);

impl<R: Rng + ?Sized> Iterator for GenerateIds<'_, R> {
	type Item = TokenId;

	fn next(&mut self) -> Option<Self::Item> {
		self.0.next_id()
	}
}
