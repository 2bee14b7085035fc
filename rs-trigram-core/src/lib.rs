//! Smoothed trigram language models.
//!
//! This crate provides:
//! - Vocabulary construction with out-of-vocabulary handling
//! - Count accumulation, sequential or on worker threads
//! - Smoothed conditional probabilities `P(z | x, y)`
//! - Sampling of tokens and whole sentences
//! - A stable binary model format
//! - Corpus scoring (cross-entropy) and two-model classification
//!
//! Training is a single batch pass producing an immutable model; every
//! query takes `&self`.

/// Error taxonomy shared by every operation.
pub mod error;

/// Language model, smoothing, sampling and classification.
pub mod model;

/// Corpus reading and path helpers.
pub mod io;

pub use error::{LmError, Result};
pub use model::classifier::{Category, Choice, Classifier, Decision};
pub use model::language_model::{LanguageModel, TrainOptions, cross_entropy_bits};
pub use model::smoothing::{Estimator, Smoothing, SmoothingKind};
pub use model::vocabulary::{BOS, EOS, OOV, Vocabulary};
