use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Token;
use crate::error::{MarkovError, Result};

/// One order level of the chain: every key of a fixed length mapped to the
/// words observed right after it.
///
/// # Responsibilities
/// - Accumulate continuations during indexing (duplicates are kept, they
///   carry the sampling weight)
/// - Answer key lookups during synthesis
/// - Pick a uniformly random starting key
/// - Merge with a level built from another slice of the same corpus
///
/// # Invariants
/// - `key_len >= 2`
/// - Every key has exactly `key_len` words
/// - Every continuation list is non-empty and in corpus order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChainIndex {
	/// Number of words per key at this level.
	key_len: usize,

	/// Keys in first-seen order, so a seeded RNG picks the same start key
	/// across runs.
	entries: IndexMap<Box<[Token]>, Vec<Token>>,
}

impl ChainIndex {
	/// Creates an empty level for keys of `key_len` words.
	///
	/// # Errors
	/// Returns `InvalidConfig` if `key_len < 2`.
	pub fn new(key_len: usize) -> Result<Self> {
		if key_len < 2 {
			return Err(MarkovError::InvalidConfig(format!("key length must be >= 2, got {key_len}")));
		}
		Ok(Self { key_len, entries: IndexMap::new() })
	}

	/// Number of words per key.
	pub fn key_len(&self) -> usize {
		self.key_len
	}

	/// Number of distinct keys.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Records that `next` followed `key` in the corpus.
	///
	/// # Errors
	/// Returns `InvalidConfig` if `key` does not have `key_len` words.
	pub fn add(&mut self, key: &[Token], next: Token) -> Result<()> {
		self.check_key(key)?;
		if let Some(continuations) = self.entries.get_mut(key) {
			continuations.push(next);
		} else {
			self.entries.insert(key.into(), vec![next]);
		}
		Ok(())
	}

	/// Words observed after `key`, in corpus order.
	pub fn continuations(&self, key: &[Token]) -> Option<&[Token]> {
		self.entries.get(key).map(Vec::as_slice)
	}

	pub fn contains_key(&self, key: &[Token]) -> bool {
		self.entries.contains_key(key)
	}

	/// Picks a key uniformly at random. `None` if the level is empty.
	pub fn random_key<R: Rng>(&self, rng: &mut R) -> Option<&[Token]> {
		if self.entries.is_empty() {
			return None;
		}
		let i = rng.random_range(0..self.entries.len());
		self.entries.get_index(i).map(|(key, _)| &**key)
	}

	/// Iterates over keys and their continuations in first-seen order.
	pub fn iter(&self) -> impl Iterator<Item = (&[Token], &[Token])> {
		self.entries.iter().map(|(key, next)| (&**key, next.as_slice()))
	}

	/// Appends the continuations of `other` after the ones already stored.
	///
	/// Merging levels built from consecutive slices of a corpus, in order,
	/// yields the same lists as indexing the whole corpus at once.
	///
	/// # Errors
	/// Returns an error if the key lengths differ.
	pub fn merge(&mut self, other: Self) -> Result<()> {
		if self.key_len != other.key_len {
			return Err(MarkovError::InvalidConfig(format!(
				"key length mismatch: self={}, other={}",
				self.key_len, other.key_len
			)));
		}

		for (key, next) in other.entries {
			self.entries.entry(key).or_default().extend(next);
		}
		Ok(())
	}

	fn check_key(&self, key: &[Token]) -> Result<()> {
		if key.len() != self.key_len {
			return Err(MarkovError::InvalidConfig(format!(
				"key of {} words in a level of {}-word keys",
				key.len(),
				self.key_len
			)));
		}
		Ok(())
	}
}
