use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::seq::IteratorRandom;

use super::multi_order_index::MultiOrderIndex;
use super::synthesizer::Synthesizer;
use crate::config::MarkovConfig;
use crate::error::{MarkovError, Result};
use crate::{Token, io};

/// Extension of the corpus files picked up from the data folder.
pub const CORPUS_EXTENSION: &str = "txt";

/// Registry of named corpora, each indexed once and shared read-only by
/// every generation request.
///
/// # Responsibilities
/// - Load every `.txt` corpus of a folder (name = file stem)
/// - Rebuild a corpus when its source is loaded again
/// - Generate sentences from a named or random corpus with the configured
///   order, retry bound and jitter
#[derive(Debug)]
pub struct Generator {
	config: MarkovConfig,
	corpora: HashMap<String, MultiOrderIndex>,
}

impl Generator {
	/// Creates a registry and loads every corpus of `config.data_dir`.
	///
	/// A corpus that cannot be indexed (too short, unreadable) is skipped
	/// with a warning; the others still load.
	///
	/// # Errors
	/// - `InvalidConfig` if the configuration does not validate or
	///   `data_dir` is not a directory
	/// - I/O errors while listing the folder
	pub fn new(config: MarkovConfig) -> Result<Self> {
		let mut generator = Self::empty(config)?;

		let folder = match generator.config.data_dir.to_str() {
			Some(s) => io::normalize_folder(s),
			None => return Err(MarkovError::InvalidConfig("data_dir is not valid UTF-8".to_owned())),
		};
		if !folder.is_dir() {
			return Err(MarkovError::InvalidConfig(format!("Expected a directory, got: {}", folder.display())));
		}

		for file in io::list_files(&folder, CORPUS_EXTENSION)? {
			match generator.load_corpus(folder.join(&file)) {
				Ok(_) => (),
				Err(MarkovError::EmptyCorpus) => log::warn!("Skipping {file}: too few words to index"),
				Err(e) => log::warn!("Skipping {file}: {e}"),
			}
		}

		log::info!("Loaded {} corpora from {}", generator.corpora.len(), folder.display());
		Ok(generator)
	}

	/// Creates a registry with nothing loaded.
	pub fn empty(config: MarkovConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { config, corpora: HashMap::new() })
	}

	pub fn config(&self) -> &MarkovConfig {
		&self.config
	}

	/// Indexes a corpus file and registers it under its file stem.
	///
	/// An already loaded corpus with the same name is replaced: the index is
	/// never patched in place.
	pub fn load_corpus<P: AsRef<Path>>(&mut self, path: P) -> Result<String> {
		let path = path.as_ref();
		let name = io::get_filename(path)?;
		let index = MultiOrderIndex::from_file(path, self.config.effective_order(), self.config.cache)?;
		self.insert(&name, index);
		Ok(name)
	}

	/// Loads `<data_dir>/<name>.txt`.
	///
	/// # Errors
	/// `UnknownCorpus` if `name` is not a plain file stem or the file does
	/// not exist.
	pub fn load_named(&mut self, name: &str) -> Result<String> {
		let path = Self::corpus_path(&self.config, name)?;
		self.load_corpus(path)
	}

	/// Builds the indexes of several named corpora without touching any
	/// registry, so the work can run off the caller's thread.
	///
	/// # Errors
	/// The first corpus that fails; nothing is returned in that case.
	pub fn build_corpora(config: &MarkovConfig, names: &[String]) -> Result<HashMap<String, MultiOrderIndex>> {
		let mut corpora = HashMap::with_capacity(names.len());
		for name in names {
			let path = Self::corpus_path(config, name)?;
			let index = MultiOrderIndex::from_file(&path, config.effective_order(), config.cache)?;
			corpora.insert(name.clone(), index);
		}
		Ok(corpora)
	}

	/// Replaces the whole loaded set at once.
	pub fn replace_corpora(&mut self, corpora: HashMap<String, MultiOrderIndex>) {
		log::info!("Loaded set replaced by {} corpora", corpora.len());
		self.corpora = corpora;
	}

	/// Loads exactly the named corpora. On error the loaded set is unchanged.
	pub fn load_exclusive(&mut self, names: &[String]) -> Result<()> {
		let corpora = Self::build_corpora(&self.config, names)?;
		self.replace_corpora(corpora);
		Ok(())
	}

	/// Path of a named corpus inside the data folder.
	///
	/// Only a single plain path component is accepted: no separators, no
	/// `..`, not empty.
	fn corpus_path(config: &MarkovConfig, name: &str) -> Result<PathBuf> {
		let plain = !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..") && !name.contains('\0');
		if !plain {
			log::warn!("Rejected corpus name {name:?}");
			return Err(MarkovError::UnknownCorpus(name.to_owned()));
		}
		let path = config.data_dir.join(format!("{name}.{CORPUS_EXTENSION}"));
		if !path.is_file() {
			return Err(MarkovError::UnknownCorpus(name.to_owned()));
		}
		Ok(path)
	}

	/// Registers an already built index.
	pub fn insert(&mut self, name: &str, index: MultiOrderIndex) {
		if self.corpora.insert(name.to_owned(), index).is_some() {
			log::info!("Rebuilt corpus '{name}'");
		} else {
			log::debug!("Registered corpus '{name}'");
		}
	}

	/// Drops a corpus. Returns whether it was loaded.
	pub fn unload(&mut self, name: &str) -> bool {
		self.corpora.remove(name).is_some()
	}

	/// Names of the loaded corpora, sorted.
	pub fn corpus_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.corpora.keys().cloned().collect();
		names.sort();
		names
	}

	pub fn index(&self, name: &str) -> Option<&MultiOrderIndex> {
		self.corpora.get(name)
	}

	/// Generates a sentence of at least `min_length` words from `name`.
	///
	/// # Errors
	/// `UnknownCorpus` if `name` is not loaded, `UnreachableMinLength` once
	/// the configured attempts are used up.
	pub fn generate(&self, name: &str, min_length: usize) -> Result<Vec<Token>> {
		let index = self.index(name).ok_or_else(|| MarkovError::UnknownCorpus(name.to_owned()))?;
		Synthesizer::new(index)
			.with_jitter(self.config.jitter)
			.generate(min_length, self.config.max_attempts)
	}

	/// `generate`, joined with single spaces.
	pub fn generate_sentence(&self, name: &str, min_length: usize) -> Result<String> {
		Ok(self.generate(name, min_length)?.join(" "))
	}

	/// Generates from a uniformly chosen corpus. Returns its name and the sentence.
	///
	/// # Errors
	/// `EmptyCorpus` if nothing is loaded.
	pub fn generate_random(&self, min_length: usize) -> Result<(String, String)> {
		let name = self.corpora.keys().choose(&mut rand::rng()).ok_or(MarkovError::EmptyCorpus)?;
		Ok((name.clone(), self.generate_sentence(name, min_length)?))
	}
}
