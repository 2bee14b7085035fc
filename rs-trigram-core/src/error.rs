//! Error types for the trigram language model.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, persisting or querying a language model.
#[derive(Error, Debug)]
pub enum LmError {
	/// A training or held-out corpus could not be opened or read.
	#[error("Unreadable corpus {path}: {source}")]
	UnreadableCorpus {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// No model file exists at the given path.
	#[error("Model file not found: {0}")]
	ModelNotFound(PathBuf),

	/// A persisted model failed structural validation.
	#[error("Corrupt model: {0}")]
	CorruptModel(String),

	/// Two models were compared although their vocabularies differ.
	#[error("Incompatible models: {first} and {second} have different vocabularies")]
	IncompatibleModels { first: String, second: String },

	/// The smoothing policy produced a probability that cannot be logged.
	///
	/// This is a bug in the estimator, never a user error.
	#[error("Estimator returned p({z} | {x}, {y}) = {prob}, expected a strictly positive probability")]
	ZeroProbability { x: String, y: String, z: String, prob: f64 },

	/// I/O error with file context
	#[error("I/O error for {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Model encoding failure
	#[error("Serialization error: {0}")]
	Serialization(#[from] postcard::Error),

	/// Invalid hyperparameter or argument
	#[error("Invalid parameter: {0}")]
	InvalidParameter(String),
}

/// Result type alias for language model operations.
pub type Result<T> = std::result::Result<T, LmError>;
