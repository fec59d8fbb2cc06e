use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;

use super::chain_index::ChainIndex;
use super::multi_order_index::MultiOrderIndex;
use crate::Token;
use crate::error::{MarkovError, Result};

/// Scale of the random term added to a word length when ranking continuations.
pub const DEFAULT_JITTER: f64 = 5.0;

/// Walks a `MultiOrderIndex` to produce sentences.
///
/// A candidate starts from a random key of the highest order. At each step
/// the last words of the candidate are looked up at the current order and
/// the continuations are ranked by `word length + uniform(0, 1) * jitter`,
/// longest first. The first continuation that is not already in the
/// candidate and that can itself be continued at this order is appended,
/// and the walk resumes at the highest order. When no continuation
/// qualifies the walk drops one order; at the lowest order a random
/// continuation is appended and the candidate ends. A key missing from the
/// order under consideration ends the candidate as is.
///
/// The index is only borrowed, several synthesizers can share one index.
pub struct Synthesizer<'a, R: Rng = ThreadRng> {
	index: &'a MultiOrderIndex,
	rng: R,
	jitter: f64,
}

impl<'a> Synthesizer<'a, ThreadRng> {
	/// Synthesizer driven by the thread-local RNG.
	pub fn new(index: &'a MultiOrderIndex) -> Self {
		Self::with_rng(index, rand::rng())
	}
}

impl<'a, R: Rng> Synthesizer<'a, R> {
	/// Synthesizer driven by the given RNG (seed it for reproducible output).
	pub fn with_rng(index: &'a MultiOrderIndex, rng: R) -> Self {
		Self { index, rng, jitter: DEFAULT_JITTER }
	}

	/// Overrides the ranking jitter. `0.0` ranks by word length alone.
	pub fn with_jitter(mut self, jitter: f64) -> Self {
		self.jitter = jitter;
		self
	}

	/// Produces a single candidate, whatever its length.
	///
	/// Always terminates: every regular step appends a word not yet in the
	/// candidate, so the walk is bounded by the corpus vocabulary.
	///
	/// # Errors
	/// Returns `EmptyCorpus` if the index has no levels.
	pub fn generate_one(&mut self) -> Result<Vec<Token>> {
		let index = self.index;
		let levels = index.levels();
		let lowest = levels.len().checked_sub(1).ok_or(MarkovError::EmptyCorpus)?;
		let start = levels[0].random_key(&mut self.rng).ok_or(MarkovError::EmptyCorpus)?;

		let mut candidate: Vec<Token> = start.to_vec();
		let mut current = 0;

		loop {
			let level = &levels[current];
			let Some(options) = candidate
				.len()
				.checked_sub(level.key_len())
				.and_then(|from| level.continuations(&candidate[from..]))
			else {
				return Ok(candidate);
			};

			match self.select(level, &candidate, options) {
				Some(next) => {
					candidate.push(next);
					current = 0;
				}
				None if current == lowest => {
					// Dead end at every order: take anything and stop
					if let Some(next) = options.choose(&mut self.rng) {
						candidate.push(next.clone());
					}
					return Ok(candidate);
				}
				None => current += 1,
			}
		}
	}

	/// Generates candidates until one has at least `min_length` words.
	///
	/// # Errors
	/// - `EmptyCorpus` if the index has no levels
	/// - `UnreachableMinLength` if `max_attempts` candidates were all too short
	pub fn generate(&mut self, min_length: usize, max_attempts: usize) -> Result<Vec<Token>> {
		for attempt in 1..=max_attempts {
			let candidate = self.generate_one()?;
			if candidate.len() >= min_length {
				log::debug!("Accepted a {}-word candidate after {attempt} attempt(s)", candidate.len());
				return Ok(candidate);
			}
			log::debug!("Attempt {attempt}: {} words < {min_length}", candidate.len());
		}

		Err(MarkovError::UnreachableMinLength { min_length, attempts: max_attempts })
	}

	/// `generate`, joined with single spaces.
	pub fn generate_sentence(&mut self, min_length: usize, max_attempts: usize) -> Result<String> {
		Ok(self.generate(min_length, max_attempts)?.join(" "))
	}

	/// Picks the best continuation of `candidate` at `level`.
	///
	/// Requires `candidate.len() >= level.key_len()`.
	fn select(&mut self, level: &ChainIndex, candidate: &[Token], options: &[Token]) -> Option<Token> {
		let mut ranked: Vec<(f64, &Token)> = options
			.iter()
			.map(|option| (option.chars().count() as f64 + self.rng.random::<f64>() * self.jitter, option))
			.collect();
		ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

		let tail = &candidate[candidate.len() + 1 - level.key_len()..];
		let mut next_key: Vec<Token> = Vec::with_capacity(level.key_len());

		ranked
			.into_iter()
			.map(|(_, option)| option)
			.find(|option| {
				if candidate.contains(option) {
					return false;
				}
				next_key.clear();
				next_key.extend_from_slice(tail);
				next_key.push((*option).clone());
				level.contains_key(&next_key)
			})
			.cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::io::split_words;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	const TALE: &str = "it was the best of times it was the worst of times it was the age of wisdom \
		it was the age of foolishness it was the epoch of belief it was the epoch of incredulity \
		it was the season of light it was the season of darkness";

	fn index(text: &str, order: usize) -> MultiOrderIndex {
		MultiOrderIndex::build(split_words(text), order).unwrap()
	}

	fn seeded(index: &MultiOrderIndex, seed: u64) -> Synthesizer<'_, StdRng> {
		Synthesizer::with_rng(index, StdRng::seed_from_u64(seed))
	}

	#[test]
	fn candidate_starts_with_a_highest_order_key() {
		let index = index(TALE, 3);
		let highest = index.highest().unwrap();
		for seed in 0..50 {
			let candidate = seeded(&index, seed).generate_one().unwrap();
			assert!(candidate.len() >= highest.key_len());
			assert!(highest.contains_key(&candidate[..highest.key_len()]));
		}
	}

	#[test]
	fn appended_words_are_new_except_the_last() {
		let index = index(TALE, 3);
		let start = index.highest().unwrap().key_len();
		for seed in 0..50 {
			let candidate = seeded(&index, seed).generate_one().unwrap();
			let last = candidate.len().saturating_sub(1);
			for i in start..last {
				assert!(!candidate[..i].contains(&candidate[i]), "seed {seed}: {candidate:?}");
			}
		}
	}

	#[test]
	fn every_word_follows_its_context_at_some_order() {
		let index = index(TALE, 4);
		let start = index.highest().unwrap().key_len();
		for seed in 0..50 {
			let candidate = seeded(&index, seed).generate_one().unwrap();
			for i in start..candidate.len() {
				let observed = index.levels().iter().any(|level| {
					i >= level.key_len()
						&& level
							.continuations(&candidate[i - level.key_len()..i])
							.is_some_and(|next| next.contains(&candidate[i]))
				});
				assert!(observed, "seed {seed}: {candidate:?} at {i}");
			}
		}
	}

	#[test]
	fn same_seed_same_sentence() {
		let index = index(TALE, 3);
		let first = seeded(&index, 42).generate_sentence(4, 100).unwrap();
		let second = seeded(&index, 42).generate_sentence(4, 100).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn generate_respects_min_length() {
		let index = index(TALE, 2);
		let mut synthesizer = seeded(&index, 3);
		for _ in 0..20 {
			assert!(synthesizer.generate(5, 10_000).unwrap().len() >= 5);
		}
	}

	#[test]
	fn repeated_word_is_forced_to_stop() {
		let index = index("x x x x x x", 2);
		let mut synthesizer = seeded(&index, 1);
		assert_eq!(synthesizer.generate_one().unwrap(), ["x", "x", "x"]);
		assert_eq!(synthesizer.generate(3, 5).unwrap().len(), 3);

		let err = synthesizer.generate(4, 25).unwrap_err();
		assert!(matches!(err, MarkovError::UnreachableMinLength { min_length: 4, attempts: 25 }));
	}

	#[test]
	fn zero_attempts_fail_immediately() {
		let index = index(TALE, 3);
		let err = seeded(&index, 0).generate(1, 0).unwrap_err();
		assert!(matches!(err, MarkovError::UnreachableMinLength { attempts: 0, .. }));
	}

	#[test]
	fn select_prefers_longer_continuable_words() {
		let index = index("a b elephant c a b ox c a b elephant", 2);
		let level = index.highest().unwrap();
		let mut synthesizer = seeded(&index, 9).with_jitter(0.0);
		let options = level.continuations(&split_words("a b")).unwrap().to_vec();

		let picked = synthesizer.select(level, &split_words("a b"), &options);
		assert_eq!(picked.as_deref(), Some("elephant"));

		// Already used words are skipped
		let picked = synthesizer.select(level, &split_words("elephant a b"), &options);
		assert_eq!(picked.as_deref(), Some("ox"));
	}

	#[test]
	fn select_skips_dead_ends() {
		// "zzzzzz" closes the corpus, so "b zzzzzz" is never a key
		let index = index("a b y q a b zzzzzz", 2);
		let level = index.highest().unwrap();
		let mut synthesizer = seeded(&index, 9).with_jitter(0.0);
		let options = level.continuations(&split_words("a b")).unwrap().to_vec();
		assert_eq!(options, ["y", "zzzzzz"]);

		let picked = synthesizer.select(level, &split_words("a b"), &options);
		assert_eq!(picked.as_deref(), Some("y"));
	}

	#[test]
	fn dead_end_at_high_order_continues_at_lower_order() {
		// "x y z" only leads to the final "b"; the 2-word key "y z" also offers "m"
		let index = index("k y z m n x y z b", 3);
		let walked = (0..500)
			.map(|seed| seeded(&index, seed).generate_one().unwrap())
			.find(|candidate| candidate.starts_with(&split_words("x y z")))
			.expect("some seed starts from \"x y z\"");
		assert_eq!(walked, split_words("x y z m n x"));
	}
}
