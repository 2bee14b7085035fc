use std::path::Path;

use log::debug;

use super::language_model::LanguageModel;
use crate::error::{LmError, Result};
use crate::io;

/// Which of the two categories a text was assigned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
	First,
	Second,
}

/// Bayes decision between two categories.
///
/// Picks `First` iff `prior * exp(log_prob_first)` is strictly greater than
/// `(1 - prior) * exp(log_prob_second)`. The comparison is made in log
/// space, so very negative log-probabilities do not underflow. Ties go to
/// `Second`.
pub fn decide(log_prob_first: f64, log_prob_second: f64, prior_first: f64) -> Choice {
	let first = prior_first.ln() + log_prob_first;
	let second = (1.0 - prior_first).ln() + log_prob_second;
	if first > second { Choice::First } else { Choice::Second }
}

/// A category: a display name and the model trained on its texts.
#[derive(Debug)]
pub struct Category {
	pub name: String,
	pub model: LanguageModel,
}

/// Outcome of classifying one file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
	pub choice: Choice,
	/// Natural-log probability of the file under each model.
	pub log_probs: [f64; 2],
}

/// Text classifier over two vocabulary-compatible models.
///
/// # Invariants
/// - Both models share the same vocabulary
/// - `prior_first` lies strictly between 0 and 1
#[derive(Debug)]
pub struct Classifier {
	categories: [Category; 2],
	prior_first: f64,
}

impl Classifier {
	/// Pairs two categories.
	///
	/// # Errors
	/// - [`LmError::InvalidParameter`] if `prior_first` is not in `(0, 1)`
	/// - [`LmError::IncompatibleModels`] if the vocabularies differ
	pub fn new(first: Category, second: Category, prior_first: f64) -> Result<Self> {
		if !(prior_first > 0.0 && prior_first < 1.0) {
			return Err(LmError::InvalidParameter(format!(
				"prior probability must be between 0 and 1 (exclusive), got {prior_first}"
			)));
		}
		first.model.ensure_compatible(&second.model, &first.name, &second.name)?;
		Ok(Self { categories: [first, second], prior_first })
	}

	/// Loads both models from disk. Category names are the file stems.
	pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(first: P, second: Q, prior_first: f64) -> Result<Self> {
		let category = |path: &Path| -> Result<Category> {
			let name = io::file_stem(path)
				.ok_or_else(|| LmError::InvalidParameter(format!("{} has no file name", path.display())))?;
			Ok(Category { name, model: LanguageModel::load(path)? })
		};
		Self::new(category(first.as_ref())?, category(second.as_ref())?, prior_first)
	}

	pub fn category(&self, choice: Choice) -> &Category {
		match choice {
			Choice::First => &self.categories[0],
			Choice::Second => &self.categories[1],
		}
	}

	pub fn prior_first(&self) -> f64 {
		self.prior_first
	}

	/// Scores a file under both models and decides between them.
	pub fn classify_file<P: AsRef<Path>>(&self, path: P) -> Result<Decision> {
		let path = path.as_ref();
		let log_probs = [
			self.categories[0].model.file_log_prob(path)?,
			self.categories[1].model.file_log_prob(path)?,
		];
		let choice = decide(log_probs[0], log_probs[1], self.prior_first);
		debug!("{}: {:?} -> {}", path.display(), log_probs, self.category(choice).name);
		Ok(Decision { choice, log_probs })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::language_model::TrainOptions;
	use crate::model::smoothing::Smoothing;
	use std::fs;

	fn category(name: &str, lines: &[&str]) -> Category {
		let sentences: Vec<Vec<String>> = lines
			.iter()
			.map(|line| line.split_whitespace().map(str::to_owned).collect())
			.collect();
		let options = TrainOptions { smoothing: Smoothing::AddLambda { lambda: 0.1 }, min_frequency: 1, threads: 1 };
		Category { name: name.to_owned(), model: LanguageModel::from_sentences(&sentences, &options).unwrap() }
	}

	#[test]
	fn test_decide_with_equal_priors() {
		assert_eq!(decide(-10.0, -12.0, 0.5), Choice::First);
		assert_eq!(decide(-12.0, -10.0, 0.5), Choice::Second);
	}

	#[test]
	fn test_ties_go_to_second() {
		assert_eq!(decide(-10.0, -10.0, 0.5), Choice::Second);
	}

	#[test]
	fn test_prior_shifts_the_decision() {
		// ln(0.9) - ln(0.1) ≈ 2.197 outweighs a gap of 2 nats.
		assert_eq!(decide(-12.0, -10.0, 0.9), Choice::First);
		assert_eq!(decide(-1e6, -1e6 + 2.0, 0.9), Choice::First);
	}

	#[test]
	fn test_invalid_prior() {
		for prior in [0.0, 1.0, -0.5, f64::NAN] {
			let result = Classifier::new(category("gen", &["a b"]), category("spam", &["b a"]), prior);
			assert!(matches!(result, Err(LmError::InvalidParameter(_))));
		}
	}

	#[test]
	fn test_incompatible_models_fail_fast() {
		let result = Classifier::new(category("gen", &["a b"]), category("spam", &["c d"]), 0.5);
		assert!(matches!(result, Err(LmError::IncompatibleModels { .. })));
	}

	#[test]
	fn test_classify_file() {
		let gen_text = ["a a b", "a a a b", "a b"];
		let spam_text = ["b b a", "b b b a", "b a"];
		let classifier = Classifier::new(category("gen", &gen_text), category("spam", &spam_text), 0.5).unwrap();

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("doc.txt");
		fs::write(&path, "a a a a b\n").unwrap();

		let decision = classifier.classify_file(&path).unwrap();
		assert_eq!(decision.choice, Choice::First);
		assert!(decision.log_probs[0] > decision.log_probs[1]);
		assert_eq!(classifier.category(decision.choice).name, "gen");
	}
}
