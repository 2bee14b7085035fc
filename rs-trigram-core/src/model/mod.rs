//! Top-level module for the trigram language model.
//!
//! This module provides:
//! - The token inventory (`Vocabulary`) with its sentinels
//! - Frequency tables (`CountStore`)
//! - Pluggable smoothing policies (`Smoothing`, `Estimator`)
//! - The model itself (`LanguageModel`) with scoring
//! - Sampling and sentence generation
//! - Persistence of trained models
//! - A two-category classifier built on top of scoring

/// Token inventory, sentinels and token ids.
pub mod vocabulary;

/// Unigram, bigram and trigram frequency tables.
///
/// Supports accumulation from sentences and associative merging of
/// partial stores.
pub mod counts;

/// Smoothing policies that turn counts into conditional probabilities.
pub mod smoothing;

/// The trained, immutable language model.
pub mod language_model;

/// Sampling of tokens and sentences from a model.
pub mod generator;

/// Binary model files (`save` / `load`).
mod store;

/// Bayes decision between two models.
pub mod classifier;
