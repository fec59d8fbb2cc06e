use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, Result};

/// Smallest chain order that still carries context.
pub const MIN_ORDER: usize = 2;

/// Generation settings shared by the library and its front ends.
///
/// Every field has a default, so a TOML file only needs the values it
/// overrides:
///
/// ```toml
/// order = 4
/// min_sentence_length = 12
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkovConfig {
	/// Highest chain order (number of context words). Clamped to >= 2.
	pub order: usize,

	/// Candidates shorter than this are discarded.
	pub min_sentence_length: usize,

	/// Upper bound on candidates tried by a single `generate` call.
	pub max_attempts: usize,

	/// Scale of the random term added to a word length when ranking continuations.
	pub jitter: f64,

	/// Folder scanned for `.txt` corpora.
	pub data_dir: PathBuf,

	/// Persist built indexes next to their corpus.
	pub cache: bool,
}

impl Default for MarkovConfig {
	fn default() -> Self {
		Self {
			order: 3,
			min_sentence_length: 10,
			max_attempts: 10_000,
			jitter: 5.0,
			data_dir: PathBuf::from("./data"),
			cache: true,
		}
	}
}

impl MarkovConfig {
	/// Order actually used for indexing. Values below 2 are clamped, not rejected.
	pub fn effective_order(&self) -> usize {
		self.order.max(MIN_ORDER)
	}

	/// Checks the values that cannot be normalized silently.
	///
	/// # Errors
	/// Returns `InvalidConfig` if `max_attempts` is zero or `jitter` is
	/// negative or not finite.
	pub fn validate(&self) -> Result<()> {
		if self.max_attempts == 0 {
			return Err(MarkovError::InvalidConfig("max_attempts must be at least 1".to_owned()));
		}
		if !self.jitter.is_finite() || self.jitter < 0.0 {
			return Err(MarkovError::InvalidConfig(format!("jitter must be a finite value >= 0.0, got {}", self.jitter)));
		}
		Ok(())
	}

	/// Parses and validates a TOML document.
	pub fn from_toml_str(contents: &str) -> Result<Self> {
		let config: Self = toml::from_str(contents)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and validates a TOML configuration file.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let contents = std::fs::read_to_string(path)?;
		Self::from_toml_str(&contents)
	}

	/// Like `load`, but a missing file yields the defaults.
	///
	/// A file that exists but does not parse is still an error.
	pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		if !path.exists() {
			log::debug!("No config file at {}, using defaults", path.display());
			return Ok(Self::default());
		}
		let config = Self::load(path)?;
		log::info!("Loaded config from {}", path.display());
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_follow_the_reference_generator() {
		let config = MarkovConfig::default();
		assert_eq!(config.order, 3);
		assert_eq!(config.min_sentence_length, 10);
		assert_eq!(config.jitter, 5.0);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn low_orders_are_clamped() {
		for order in [0, 1, 2] {
			let config = MarkovConfig { order, ..Default::default() };
			assert_eq!(config.effective_order(), 2);
		}
		let config = MarkovConfig { order: 5, ..Default::default() };
		assert_eq!(config.effective_order(), 5);
	}

	#[test]
	fn partial_toml_keeps_other_defaults() {
		let config = MarkovConfig::from_toml_str("order = 4\nmin_sentence_length = 3\n").unwrap();
		assert_eq!(config.order, 4);
		assert_eq!(config.min_sentence_length, 3);
		assert_eq!(config.max_attempts, 10_000);
		assert!(config.cache);
	}

	#[test]
	fn zero_attempts_is_rejected() {
		let err = MarkovConfig::from_toml_str("max_attempts = 0").unwrap_err();
		assert!(matches!(err, MarkovError::InvalidConfig(_)));
	}

	#[test]
	fn negative_jitter_is_rejected() {
		let config = MarkovConfig { jitter: -1.0, ..Default::default() };
		assert!(matches!(config.validate(), Err(MarkovError::InvalidConfig(_))));
	}

	#[test]
	fn malformed_toml_is_a_parse_error() {
		let err = MarkovConfig::from_toml_str("order = \"three\"").unwrap_err();
		assert!(matches!(err, MarkovError::ConfigParse(_)));
	}

	#[test]
	fn missing_file_falls_back_to_defaults() {
		let config = MarkovConfig::load_or_default("/no/such/markov.toml").unwrap();
		assert_eq!(config, MarkovConfig::default());
	}
}
