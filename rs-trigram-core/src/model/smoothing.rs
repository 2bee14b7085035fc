use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::counts::{CountStore, Trigram};
use super::vocabulary::TokenId;
use crate::error::{LmError, Result};

/// A smoothing policy: turns raw counts into `P(z | x, y)`.
///
/// Implementations must return a strictly positive value for every
/// trigram, and the values must sum to one over `z` for any fixed context.
pub trait Estimator {
	/// Smoothed probability of `trigram.z` following `(trigram.x, trigram.y)`.
	fn estimate(&self, counts: &CountStore, vocab_size: usize, trigram: Trigram) -> f64;

	/// Conditional distribution for the context `(x, y)`, one value per id
	/// in `ids`, in the same order.
	fn distribution(&self, counts: &CountStore, vocab_size: usize, x: TokenId, y: TokenId, ids: &[TokenId]) -> Vec<f64> {
		ids.iter()
			.map(|z| self.estimate(counts, vocab_size, Trigram::new(x, y, *z)))
			.collect()
	}
}

/// The smoothing policies a model can carry.
///
/// The variant is persisted with the model and selects the estimator at
/// load time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Smoothing {
	/// Ignores the counts: `1 / |V|`.
	Uniform,
	/// `(c(x,y,z) + λ) / (c(x,y) + λ|V|)`
	AddLambda { lambda: f64 },
	/// Add-λ where the pseudo-counts are spread according to the next lower
	/// order estimate instead of uniformly.
	BackoffAddLambda { lambda: f64 },
}

impl Smoothing {
	/// Builds the policy of the given kind.
	///
	/// # Errors
	/// Returns [`LmError::InvalidParameter`] if `lambda` is not a finite,
	/// strictly positive number (ignored for [`SmoothingKind::Uniform`]).
	pub fn new(kind: SmoothingKind, lambda: f64) -> Result<Self> {
		let smoothing = match kind {
			SmoothingKind::Uniform => Smoothing::Uniform,
			SmoothingKind::AddLambda => Smoothing::AddLambda { lambda },
			SmoothingKind::BackoffAddLambda => Smoothing::BackoffAddLambda { lambda },
		};
		smoothing.validate()?;
		Ok(smoothing)
	}

	pub fn kind(&self) -> SmoothingKind {
		match self {
			Smoothing::Uniform => SmoothingKind::Uniform,
			Smoothing::AddLambda { .. } => SmoothingKind::AddLambda,
			Smoothing::BackoffAddLambda { .. } => SmoothingKind::BackoffAddLambda,
		}
	}

	pub fn lambda(&self) -> Option<f64> {
		match self {
			Smoothing::Uniform => None,
			Smoothing::AddLambda { lambda } | Smoothing::BackoffAddLambda { lambda } => Some(*lambda),
		}
	}

	/// Checks the hyperparameters.
	pub fn validate(&self) -> Result<()> {
		match self.lambda() {
			Some(lambda) if !(lambda.is_finite() && lambda > 0.0) => Err(LmError::InvalidParameter(format!(
				"lambda must be a finite number > 0, got {lambda}"
			))),
			_ => Ok(()),
		}
	}
}

impl Estimator for Smoothing {
	fn estimate(&self, counts: &CountStore, vocab_size: usize, trigram: Trigram) -> f64 {
		let v = vocab_size as f64;
		match *self {
			Smoothing::Uniform => 1.0 / v,
			Smoothing::AddLambda { lambda } => {
				let numerator = counts.trigram(trigram) as f64 + lambda;
				let denominator = counts.trigram_context(trigram.x, trigram.y) as f64 + lambda * v;
				numerator / denominator
			}
			Smoothing::BackoffAddLambda { lambda } => {
				let Trigram { x, y, z } = trigram;
				let mass = lambda * v;
				let p_z = (counts.unigram(z) as f64 + lambda) / (counts.total() as f64 + mass);
				let p_zy = (counts.bigram(y, z) as f64 + mass * p_z) / (counts.bigram_context(y) as f64 + mass);
				(counts.trigram(trigram) as f64 + mass * p_zy) / (counts.trigram_context(x, y) as f64 + mass)
			}
		}
	}
}

/// Name of a smoothing policy, as used in configuration files and flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmoothingKind {
	Uniform,
	AddLambda,
	BackoffAddLambda,
}

impl fmt::Display for SmoothingKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SmoothingKind::Uniform => "uniform",
			SmoothingKind::AddLambda => "add-lambda",
			SmoothingKind::BackoffAddLambda => "backoff-add-lambda",
		};
		f.write_str(name)
	}
}

impl FromStr for SmoothingKind {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_ascii_lowercase().replace('_', "-").as_str() {
			"uniform" => Ok(SmoothingKind::Uniform),
			"add-lambda" => Ok(SmoothingKind::AddLambda),
			"backoff-add-lambda" => Ok(SmoothingKind::BackoffAddLambda),
			other => Err(format!(
				"unknown smoothing '{other}', expected uniform, add-lambda or backoff-add-lambda"
			)),
		}
	}
}
