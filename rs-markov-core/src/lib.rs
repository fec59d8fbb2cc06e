//! Word-level Markov text generation library.
//!
//! This crate builds a multi-order n-gram index over a word corpus and
//! synthesizes sentences from it, falling back to lower chain orders when
//! the requested order hits a dead end:
//! - Multi-order index construction from a single sliding window
//! - Sentence synthesis with length-biased, jittered candidate ranking
//! - A registry of named corpora with binary index caching
//! - Configuration and error types shared by the front ends

/// Error type shared by every fallible operation.
pub mod error;

/// Generation settings (order, minimum length, retry bound, ...).
pub mod config;

/// Core chain index and synthesis logic.
pub mod model;

/// I/O utilities (word streams, path helpers).
pub mod io;

pub use config::MarkovConfig;
pub use error::{MarkovError, Result};
pub use model::generator::Generator;
pub use model::multi_order_index::MultiOrderIndex;
pub use model::synthesizer::Synthesizer;

/// A single word of the corpus.
pub type Token = String;
