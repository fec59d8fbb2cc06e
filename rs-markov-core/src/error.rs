//! Error types for corpus indexing and sentence synthesis.

use thiserror::Error;

/// Errors raised while building an index or generating from it.
#[derive(Debug, Error)]
pub enum MarkovError {
	/// The token stream was too short to populate any order level.
	#[error("corpus is too small to populate any chain order")]
	EmptyCorpus,

	/// No candidate reached the minimum length within the attempt budget.
	#[error("no sentence of at least {min_length} words after {attempts} attempts")]
	UnreachableMinLength { min_length: usize, attempts: usize },

	/// A configuration value is outside its domain.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// The requested corpus is not loaded.
	#[error("unknown corpus '{0}'")]
	UnknownCorpus(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// Binary index cache could not be encoded or decoded.
	#[error("index cache: {0}")]
	Cache(#[from] postcard::Error),

	#[error("config parse: {0}")]
	ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, MarkovError>;
