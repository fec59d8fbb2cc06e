//! End-to-end scenarios: corpus file → index → sentence.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_markov_core::io::{read_words, split_words};
use rs_markov_core::{Generator, MarkovConfig, MarkovError, MultiOrderIndex, Synthesizer};

#[test]
fn cat_corpus_at_order_two() {
	let index = MultiOrderIndex::build(split_words("the cat sat on the mat the cat ran"), 2).unwrap();
	let level = index.highest().unwrap();
	assert_eq!(level.continuations(&split_words("the cat")).unwrap(), ["sat", "ran"]);

	for seed in 0..20 {
		let sentence = Synthesizer::with_rng(&index, StdRng::seed_from_u64(seed)).generate(3, 1000).unwrap();
		assert!(sentence.len() >= 3);
		assert!(level.contains_key(&sentence[..2]));
	}
}

#[test]
fn two_words_at_order_three_is_empty() {
	let err = MultiOrderIndex::build(split_words("a b"), 3).unwrap_err();
	assert!(matches!(err, MarkovError::EmptyCorpus));
}

#[test]
fn repeated_single_word_cannot_grow() {
	let index = MultiOrderIndex::build(split_words("x x x x x x x x"), 2).unwrap();
	assert_eq!(index.highest().unwrap().continuations(&split_words("x x")).unwrap().len(), 6);

	let mut synthesizer = Synthesizer::with_rng(&index, StdRng::seed_from_u64(11));
	assert_eq!(synthesizer.generate_one().unwrap().len(), 3);
	let err = synthesizer.generate(5, 100).unwrap_err();
	assert!(matches!(err, MarkovError::UnreachableMinLength { min_length: 5, attempts: 100 }));
}

#[test]
fn file_corpus_through_the_registry() {
	let dir = tempfile::tempdir().unwrap();
	let corpus = dir.path().join("raven.txt");
	std::fs::write(
		&corpus,
		"Once upon a midnight dreary, while I pondered, weak and weary,\n\
		 Over many a quaint and curious volume of forgotten lore,\n\
		 While I nodded, nearly napping, suddenly there came a tapping,\n\
		 As of some one gently rapping, rapping at my chamber door.\n",
	)
	.unwrap();

	let words: Vec<String> = read_words(&corpus).unwrap().collect::<std::io::Result<_>>().unwrap();
	assert_eq!(words.len(), 42);

	let config = MarkovConfig {
		data_dir: dir.path().to_path_buf(),
		min_sentence_length: 4,
		..Default::default()
	};
	let generator = Generator::new(config).unwrap();
	assert_eq!(generator.corpus_names(), ["raven"]);
	assert!(dir.path().join("raven.o3.bin").exists());

	let sentence = generator.generate_sentence("raven", 4).unwrap();
	assert!(sentence.split(' ').count() >= 4);
	for word in sentence.split(' ') {
		assert!(words.iter().any(|w| w == word));
	}

	// A second registry reuses the cached index
	let again = Generator::new(generator.config().clone()).unwrap();
	assert_eq!(again.index("raven"), generator.index("raven"));
}
