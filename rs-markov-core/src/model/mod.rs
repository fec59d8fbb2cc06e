//! Top-level module for the word chain system.
//!
//! - One order level of the chain (`ChainIndex`)
//! - All levels of a corpus, highest order first (`MultiOrderIndex`)
//! - Sentence synthesis with order fallback (`Synthesizer`)
//! - A registry of named corpora (`Generator`)

/// Key → continuations map for a single chain order.
pub mod chain_index;

/// Multi-order index built from one sliding window over the corpus.
///
/// Supports sequential and parallel construction and a binary cache.
pub mod multi_order_index;

/// Sentence synthesis with graceful order degradation.
pub mod synthesizer;

/// High-level interface managing several corpora.
pub mod generator;
