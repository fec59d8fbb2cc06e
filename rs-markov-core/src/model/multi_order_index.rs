use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use super::chain_index::ChainIndex;
use crate::Token;
use crate::config::MIN_ORDER;
use crate::error::{MarkovError, Result};
use crate::io::{build_output_path, is_up_to_date, read_words};

/// Chain levels for every order from the configured maximum down to 2.
///
/// `levels[0]` is the highest order still populated, the last level uses
/// 2-word keys. Levels that ended up empty are pruned after indexing, so
/// every level is non-empty and key lengths strictly decrease along the
/// vector.
///
/// The index is built once per corpus and never mutated afterwards;
/// synthesis only borrows it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MultiOrderIndex {
	/// Configured order after clamping (may exceed `levels[0].key_len()`
	/// when the corpus was too short for the top levels).
	order: usize,
	levels: Vec<ChainIndex>,
}

impl MultiOrderIndex {
	/// Indexes a word stream, consuming it exactly once.
	///
	/// A window of `order + 1` words slides over the stream. Each full window
	/// contributes one key/continuation pair per order level: the first `k`
	/// words as key and word `k` as continuation, for `k` in `2..=order`.
	/// Once the stream is exhausted the window is drained from the front so
	/// trailing words are indexed at the orders they still fit.
	///
	/// `order` below 2 is clamped to 2.
	///
	/// # Errors
	/// Returns `EmptyCorpus` if no level received a single key (fewer than
	/// three words).
	pub fn build<I>(tokens: I, order: usize) -> Result<Self>
	where
		I: IntoIterator<Item = Token>,
	{
		let order = order.max(MIN_ORDER);
		let mut levels = Self::empty_levels(order)?;
		let mut window: VecDeque<Token> = VecDeque::with_capacity(order + 1);

		for token in tokens {
			window.push_back(token);
			if window.len() > order {
				Self::index_from(&mut levels, order, window.make_contiguous(), order)?;
				window.pop_front();
			}
		}

		// Tail: shrink the window one word at a time
		while window.len() > MIN_ORDER {
			let longest = window.len() - 1;
			Self::index_from(&mut levels, order, window.make_contiguous(), longest)?;
			window.pop_front();
		}

		Self::finish(order, levels)
	}

	/// Same result as `build`, computed on worker threads.
	///
	/// Start positions are split into `chunks` contiguous ranges (0 means one
	/// range per CPU times a small factor). Each worker indexes its range
	/// against the whole slice, then the partial levels are merged in range
	/// order so continuation lists stay in corpus order.
	pub fn build_parallel(tokens: &[Token], order: usize, chunks: usize) -> Result<Self> {
		let order = order.max(MIN_ORDER);
		let chunks = if chunks == 0 { num_cpus::get() * 8 } else { chunks };
		let chunk_size = tokens.len().div_ceil(chunks).max(1);

		let mut partials: Vec<(usize, Vec<ChainIndex>)> = thread::scope(|scope| {
			let (tx, rx) = mpsc::channel();
			for (chunk_id, start) in (0..tokens.len()).step_by(chunk_size).enumerate() {
				let tx = tx.clone();
				let end = (start + chunk_size).min(tokens.len());
				scope.spawn(move || {
					let partial = Self::empty_levels(order).and_then(|mut levels| {
						for position in start..end {
							let longest = order.min(tokens.len() - position - 1);
							Self::index_from(&mut levels, order, &tokens[position..], longest)?;
						}
						Ok(levels)
					});
					// The receiver outlives every worker inside the scope
					let _ = tx.send(partial.map(|levels| (chunk_id, levels)));
				});
			}
			drop(tx);
			rx.iter().collect::<Result<Vec<_>>>()
		})?;

		partials.sort_by_key(|(chunk_id, _)| *chunk_id);

		let mut levels = Self::empty_levels(order)?;
		for (_, partial) in partials {
			for (level, other) in levels.iter_mut().zip(partial) {
				level.merge(other)?;
			}
		}

		Self::finish(order, levels)
	}

	/// Loads the index of a corpus file, building it if needed.
	///
	/// - With `cache` set, `<stem>.o<order>.bin` next to the corpus is reused
	///   when it is more recent than the corpus.
	/// - Otherwise (or if the cache is unreadable) the corpus is read, indexed
	///   in parallel and, with `cache` set, written back for the next run.
	///
	/// # Errors
	/// I/O failures on the corpus itself and `EmptyCorpus`. Cache write
	/// failures are only logged.
	pub fn from_file<P: AsRef<Path>>(path: P, order: usize, cache: bool) -> Result<Self> {
		let path = path.as_ref();
		let order = order.max(MIN_ORDER);
		let cache_path = build_output_path(path, &format!("o{order}.bin"))?;

		if cache && is_up_to_date(&cache_path, path) {
			match Self::load_cache(&cache_path, order) {
				Ok(index) => {
					log::debug!("Loaded cached index {}", cache_path.display());
					return Ok(index);
				}
				Err(e) => log::warn!("Ignoring cache {}: {e}", cache_path.display()),
			}
		}

		let tokens = read_words(path)?.collect::<std::io::Result<Vec<Token>>>()?;
		log::info!("Indexing {} ({} words, order {order})", path.display(), tokens.len());
		let index = Self::build_parallel(&tokens, order, 0)?;

		if cache {
			if let Err(e) = index.save_cache(&cache_path) {
				log::warn!("Could not write cache {}: {e}", cache_path.display());
			}
		}
		Ok(index)
	}

	/// Serializes the index with `postcard`.
	pub fn save_cache<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes)?;
		Ok(())
	}

	/// Deserializes an index and checks it was built at `order`.
	pub fn load_cache<P: AsRef<Path>>(path: P, order: usize) -> Result<Self> {
		let bytes = std::fs::read(path)?;
		let index: Self = postcard::from_bytes(&bytes)?;
		if index.order != order.max(MIN_ORDER) {
			return Err(MarkovError::InvalidConfig(format!(
				"cache was built at order {}, expected {order}",
				index.order
			)));
		}
		index.validate()?;
		Ok(index)
	}

	/// Configured order after clamping.
	pub fn order(&self) -> usize {
		self.order
	}

	/// Populated levels, highest order first.
	pub fn levels(&self) -> &[ChainIndex] {
		&self.levels
	}

	pub fn level(&self, i: usize) -> Option<&ChainIndex> {
		self.levels.get(i)
	}

	/// Number of populated levels.
	pub fn depth(&self) -> usize {
		self.levels.len()
	}

	/// Highest populated order. `None` only for an index that failed validation.
	pub fn highest(&self) -> Option<&ChainIndex> {
		self.levels.first()
	}

	/// The 2-word-key level.
	pub fn lowest(&self) -> Option<&ChainIndex> {
		self.levels.last()
	}

	pub fn is_empty(&self) -> bool {
		self.levels.is_empty()
	}

	/// One empty level per key length, `order` down to 2.
	fn empty_levels(order: usize) -> Result<Vec<ChainIndex>> {
		(MIN_ORDER..=order).rev().map(ChainIndex::new).collect()
	}

	/// Adds the pairs whose key starts at `window[0]`, for key lengths
	/// `2..=longest`. `window` must hold at least `longest + 1` words.
	fn index_from(levels: &mut [ChainIndex], order: usize, window: &[Token], longest: usize) -> Result<()> {
		for key_len in MIN_ORDER..=longest {
			levels[order - key_len].add(&window[..key_len], window[key_len].clone())?;
		}
		Ok(())
	}

	fn finish(order: usize, mut levels: Vec<ChainIndex>) -> Result<Self> {
		levels.retain(|level| !level.is_empty());
		let index = Self { order, levels };
		index.validate()?;
		log::debug!(
			"Built index: order {order}, keys per level {:?}",
			index.levels.iter().map(ChainIndex::len).collect::<Vec<_>>()
		);
		Ok(index)
	}

	fn validate(&self) -> Result<()> {
		if self.levels.is_empty() || self.levels.iter().any(ChainIndex::is_empty) {
			return Err(MarkovError::EmptyCorpus);
		}
		let descending = self.levels.windows(2).all(|pair| pair[0].key_len() > pair[1].key_len());
		if !descending || self.levels[0].key_len() > self.order {
			return Err(MarkovError::InvalidConfig("order levels are out of sequence".to_owned()));
		}
		Ok(())
	}
}
